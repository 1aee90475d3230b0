// ==========================================
// SKU 列表导入集成测试
// ==========================================
// 覆盖: 单列/纯 SKU/两列模式 → PASTE_SKU 会话
// ==========================================

mod helpers;

use product_import_staging::api::ApiError;
use product_import_staging::domain::types::{Delimiter, ImportMethod, SessionStatus};
use product_import_staging::repository::StagingRepository;
use test_helpers::TestEnv;

#[tokio::test]
async fn test_two_columns_pairs_by_index_and_imports() {
    let env = TestEnv::new().await;
    let api = &env.state.import_api;

    let parsed = api
        .parse_two_columns("A1\nA2\nA3", "Widget\nGadget")
        .await
        .unwrap();

    assert_eq!(parsed.parsed_items.len(), 3);
    assert!(parsed.has_warning("count_mismatch"));
    assert_eq!(parsed.parsed_items[0].name.as_deref(), Some("Widget"));
    assert_eq!(parsed.parsed_items[1].name.as_deref(), Some("Gadget"));
    assert_eq!(parsed.parsed_items[2].name.as_deref(), Some(""));

    let response = api.import_sku_items(&parsed.parsed_items, "u-5").await.unwrap();
    assert_eq!(response.outcome.created, 3);
    assert_eq!(response.session.method, ImportMethod::PasteSku);
    assert_eq!(response.session.status, SessionStatus::Ready);

    let a3 = env.staging.find_product_by_sku("A3").await.unwrap().unwrap();
    assert_eq!(a3.name, None);
    assert_eq!(a3.completion_status["name"], false);

    let a1 = env.staging.find_product_by_sku("a1").await.unwrap().unwrap();
    assert_eq!(a1.name.as_deref(), Some("Widget"));
    assert_eq!(a1.completion_status["name"], true);
}

#[tokio::test]
async fn test_single_column_flags_duplicates_and_batch_skips_them() {
    let env = TestEnv::new().await;
    let api = &env.state.import_api;

    let parsed = api
        .parse_sku_list("abc-1\tBrake pad\nABC-1\tCopy\nxyz-9\tFilter\n", "auto")
        .await
        .unwrap();

    assert_eq!(parsed.detected_separator, Some(Delimiter::Tab));
    assert_eq!(parsed.parsed_items.len(), 3);
    assert!(parsed.parsed_items[1].is_duplicate);
    assert_eq!(parsed.stats.duplicates_in_batch, 1);

    let response = api.import_sku_items(&parsed.parsed_items, "u-5").await.unwrap();
    assert_eq!(response.outcome.created, 2);
    assert_eq!(response.outcome.skipped, 1);
}

#[tokio::test]
async fn test_sku_only_blob() {
    let env = TestEnv::new().await;
    let parsed = env
        .state
        .import_api
        .parse_sku_only("A1, A2;A3\n\nA4   A5")
        .await
        .unwrap();

    let skus: Vec<&str> = parsed.parsed_items.iter().map(|i| i.sku.as_str()).collect();
    assert_eq!(skus, vec!["A1", "A2", "A3", "A4", "A5"]);
}

#[tokio::test]
async fn test_invalid_separator_and_empty_input() {
    let env = TestEnv::new().await;
    let api = &env.state.import_api;

    let err = api.parse_sku_list("A1;x", "colon").await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let err = api.import_sku_items(&[], "u-5").await.unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));
}
