// ==========================================
// 配置与语言集成测试
// ==========================================

mod helpers;

use helpers::mock_config::MockConfig;
use product_import_staging::api::ApiError;
use product_import_staging::config::{config_keys, ConfigManager, ImportConfigReader};
use product_import_staging::i18n;
use test_helpers::create_test_db;

#[tokio::test]
async fn test_config_manager_defaults_and_overrides() {
    let (_temp_file, db_path) = create_test_db().unwrap();
    let config = ConfigManager::new(&db_path).unwrap();

    assert_eq!(config.get_sku_min_length().await.unwrap(), 2);
    assert_eq!(config.get_auto_map_threshold().await.unwrap(), 0.7);

    config
        .set_global_config_value(config_keys::SKU_MAX_LENGTH, "12")
        .unwrap();
    assert_eq!(config.get_sku_max_length().await.unwrap(), 12);

    config
        .set_global_config_value(config_keys::MAX_ALTERNATES, "many")
        .unwrap();
    assert!(config.get_max_alternates().await.is_err());
}

// 语言为全局状态，本文件内只有此测试修改它
#[tokio::test]
async fn test_configured_locale_drives_user_messages() {
    let locale = i18n::apply_configured_locale(&MockConfig::with_locale("en"))
        .await
        .unwrap();
    assert_eq!(locale, "en");
    let message = ApiError::ParseError("raw detail".to_string()).user_message();
    assert!(message.contains("parsed"));

    let locale = i18n::apply_configured_locale(&MockConfig::with_locale("fr"))
        .await
        .unwrap();
    assert_eq!(locale, "zh-CN");
    let message = ApiError::ParseError("raw detail".to_string()).user_message();
    assert!(message.contains("解析"));
    assert!(!message.contains("raw detail"));
}
