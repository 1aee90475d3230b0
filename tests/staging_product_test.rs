// ==========================================
// 暂存商品集成测试
// ==========================================
// 覆盖: 跳过标记审计、暂存图片、完成状态只反映实际数据
// ==========================================

mod helpers;

use helpers::test_data_builder::CsvBuilder;
use product_import_staging::domain::types::{ImportMethod, SkipFlag};
use product_import_staging::engine::StagingEvent;
use product_import_staging::repository::StagingRepository;
use test_helpers::TestEnv;

async fn import_one(env: &TestEnv, sku: &str) -> i64 {
    let api = &env.state.import_api;
    let csv = CsvBuilder::new(&["sku", "name"]).row(&[sku, "Widget"]).build();
    let table = api.ingest_text(&csv).await.unwrap();
    let mapping = api.suggest_mapping(&table.headers).await.unwrap().mapping;
    let response = api
        .import_table(&table, &mapping, ImportMethod::Csv, "u-1")
        .await
        .unwrap();
    response.outcome.created_ids[0]
}

#[tokio::test]
async fn test_skip_flag_audit_survives_reload() {
    let mut env = TestEnv::new().await;
    let product_id = import_one(&env, "skip-1").await;
    env.drain_events();

    let api = &env.state.staging_product_api;
    assert!(api
        .set_skip_flag(product_id, "skip_compatibility", true, "u-7", "Anna Nowak")
        .await
        .unwrap());
    // 重复设置不改变状态
    assert!(!api
        .set_skip_flag(product_id, "skip_compatibility", true, "u-7", "Anna Nowak")
        .await
        .unwrap());

    let stored = env.staging.find_product(product_id).await.unwrap().unwrap();
    assert!(stored.is_skipped(SkipFlag::SkipCompatibility));
    let audit = &stored.skip_history[&SkipFlag::SkipCompatibility];
    assert_eq!(audit.set_by, "u-7");
    assert_eq!(audit.set_by_name, "Anna Nowak");
    assert_eq!(stored.completion_status["compatibility_data"], false);

    api.set_skip_flag(product_id, "skip_compatibility", false, "u-8", "Piotr")
        .await
        .unwrap();
    let stored = env.staging.find_product(product_id).await.unwrap().unwrap();
    assert!(!stored.is_skipped(SkipFlag::SkipCompatibility));
    assert!(stored.skip_history.is_empty());

    let events = env.drain_events();
    assert_eq!(
        events
            .iter()
            .filter(|e| matches!(e, StagingEvent::SkipFlagChanged { .. }))
            .count(),
        3
    );
}

#[tokio::test]
async fn test_images_are_stored_under_unique_names() {
    let env = TestEnv::new().await;
    let product_id = import_one(&env, "img-1").await;
    let api = &env.state.staging_product_api;

    let first = api.add_image(product_id, b"jpeg-1", "jpg").await.unwrap();
    let second = api.add_image(product_id, b"jpeg-1", ".JPG").await.unwrap();
    assert_ne!(first, second);

    let copied = api.copy_image(product_id, &first).await.unwrap();
    assert_ne!(copied, first);

    let view = api.get_product(product_id).await.unwrap();
    assert_eq!(view.image_urls.len(), 3);
    assert_eq!(view.product.completion_status["temp_media_paths"], true);
    assert!(view.missing_required.contains(&"manufacturer".to_string()));
    assert!(!view.missing_required.contains(&"name".to_string()));

    let err = api.add_image(product_id, b"not an image", "exe").await.unwrap_err();
    assert!(matches!(
        err,
        product_import_staging::api::ApiError::StorageError(_)
    ));
}

#[tokio::test]
async fn test_list_by_session() {
    let env = TestEnv::new().await;
    let product_id = import_one(&env, "list-1").await;
    let product = env.staging.find_product(product_id).await.unwrap().unwrap();

    let listed = env
        .state
        .staging_product_api
        .list_by_session(product.import_session_id.unwrap())
        .await
        .unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].sku, "LIST-1");
}
