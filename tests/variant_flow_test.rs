// ==========================================
// 变体生成集成测试
// ==========================================
// 覆盖: 目录属性 → 笛卡尔积 → 编辑 → variant_data 持久化与恢复
// ==========================================

mod helpers;

use chrono::Utc;
use helpers::test_data_builder::seed_variant_attributes;
use product_import_staging::api::ApiError;
use product_import_staging::domain::staging_product::StagingProduct;
use product_import_staging::domain::types::SkuMode;
use product_import_staging::engine::{StagingEvent, VariantSelection};
use product_import_staging::repository::StagingRepository;
use test_helpers::TestEnv;

async fn staged_product(env: &TestEnv, sku: &str) -> i64 {
    env.staging
        .insert_product(&StagingProduct::new(sku, "u-1", Utc::now()))
        .await
        .unwrap()
}

#[tokio::test]
async fn test_two_by_three_generates_six_variants_with_db_tokens() {
    let env = TestEnv::new().await;
    let attrs = seed_variant_attributes(&env.catalog);
    let product_id = staged_product(&env, "base").await;

    let api = &env.state.variant_api;
    let mut selection = api.open_selection(product_id).await.unwrap();
    assert!(selection.config.use_db_suffix_prefix);

    for value in [attrs.red, attrs.blue] {
        selection.toggle_value(attrs.color_type, value);
    }
    for value in [attrs.small, attrs.medium, attrs.large] {
        selection.toggle_value(attrs.size_type, value);
    }

    let count = api.generate(product_id, &mut selection).await.unwrap();
    assert_eq!(count, 6);

    let variants = selection.variants();
    assert_eq!(variants[0].name, "Red, Small");
    assert_eq!(variants[0].full_sku, "BASE-RS");
    assert_eq!(variants[0].sku_suffix, "-RS");
    // Medium 的后缀未启用
    assert_eq!(variants[1].full_sku, "BASE-R");
    assert_eq!(variants[5].name, "Blue, Large");
    assert_eq!(variants[5].full_sku, "BASE-BL");
    assert_eq!(selection.value_usage_count(attrs.color_type, attrs.red), 3);
}

#[tokio::test]
async fn test_manual_codes_and_empty_dimension() {
    let env = TestEnv::new().await;
    let attrs = seed_variant_attributes(&env.catalog);
    let product_id = staged_product(&env, "base").await;

    let api = &env.state.variant_api;
    let mut selection = api.open_selection(product_id).await.unwrap();
    selection.config.use_db_suffix_prefix = false;
    selection.config.sku_mode = SkuMode::Suffix;

    selection.toggle_value(attrs.color_type, attrs.blue);
    selection.toggle_value(attrs.size_type, attrs.medium);
    // 选中但没有取值的维度被排除
    selection.toggle_attribute_type(9_999);

    let count = api.generate(product_id, &mut selection).await.unwrap();
    assert_eq!(count, 1);
    assert_eq!(selection.variants()[0].full_sku, "BASE-BLU-MED");
}

#[tokio::test]
async fn test_save_and_restore_round_trip() {
    let mut env = TestEnv::new().await;
    let attrs = seed_variant_attributes(&env.catalog);
    let product_id = staged_product(&env, "pad-1").await;

    let api = &env.state.variant_api;
    let mut selection = api.open_selection(product_id).await.unwrap();
    selection.toggle_value(attrs.color_type, attrs.red);
    selection.toggle_value(attrs.color_type, attrs.blue);
    selection.toggle_value(attrs.size_type, attrs.large);
    assert_eq!(api.generate(product_id, &mut selection).await.unwrap(), 2);

    assert_eq!(selection.toggle_active(1), Some(false));
    assert!(selection.set_price(0, Some(149.0)));

    let response = api
        .save_variants(product_id, &mut selection, "u-7")
        .await
        .unwrap();
    assert_eq!(response.variant_count, 2);
    assert_eq!(response.active_count, 1);

    let stored = env.staging.find_product(product_id).await.unwrap().unwrap();
    let data = stored.variant_data.clone().unwrap();
    assert_eq!(data.attribute_types_used, vec![attrs.color_type, attrs.size_type]);
    assert_eq!(data.variants[0].price, Some(149.0));
    assert!(!data.variants[1].is_active);
    assert_eq!(stored.completion_status["variant_data"], true);

    let restored = api.open_selection(product_id).await.unwrap();
    assert_eq!(restored, VariantSelection::from_variant_data(&data));
    assert_eq!(restored.variants(), data.variants.as_slice());
    assert_eq!(restored.dimensions[0].value_ids, vec![attrs.red, attrs.blue]);

    assert!(env
        .drain_events()
        .iter()
        .any(|e| matches!(e, StagingEvent::VariantsSaved { variant_count: 2, .. })));
}

#[tokio::test]
async fn test_save_empty_is_rejected_and_clear_resets_section() {
    let env = TestEnv::new().await;
    let attrs = seed_variant_attributes(&env.catalog);
    let product_id = staged_product(&env, "pad-2").await;
    let api = &env.state.variant_api;

    let mut empty = api.open_selection(product_id).await.unwrap();
    let err = api
        .save_variants(product_id, &mut empty, "u-7")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::ValidationError(_)));

    let mut selection = api.open_selection(product_id).await.unwrap();
    selection.toggle_value(attrs.size_type, attrs.small);
    api.generate(product_id, &mut selection).await.unwrap();
    api.save_variants(product_id, &mut selection, "u-7")
        .await
        .unwrap();

    api.clear_variants(product_id, "u-7").await.unwrap();
    let stored = env.staging.find_product(product_id).await.unwrap().unwrap();
    assert!(stored.variant_data.is_none());
    assert_eq!(stored.completion_status["variant_data"], false);
}

#[tokio::test]
async fn test_default_separator_comes_from_config() {
    let env = TestEnv::new().await;
    env.state
        .config_manager
        .set_global_config_value("variant.default_separator", "_")
        .unwrap();
    let product_id = staged_product(&env, "pad-3").await;

    let selection = env.state.variant_api.open_selection(product_id).await.unwrap();
    assert_eq!(selection.config.separator, "_");
}
