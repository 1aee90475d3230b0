// ==========================================
// 商品导入暂存系统 - 配置层
// ==========================================
// 职责: 导入参数配置（阈值、上限、默认分隔符、默认语言）
// 存储: config_kv 表
// ==========================================

pub mod config_manager;
pub mod import_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, defaults, ConfigManager, ConfigValueError};
pub use import_config_trait::ImportConfigReader;
