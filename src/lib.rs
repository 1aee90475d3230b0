// ==========================================
// 商品导入暂存系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 外部商品数据 → 暂存草稿（发布前由人工补全）
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 变体/适配/事件
pub mod engine;

// 导入层 - 外部数据
pub mod importer;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一）
pub mod db;

// 日志系统
pub mod logging;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 共享状态
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{
    CompatibilityClass, Delimiter, ImportMethod, ListSeparator, SessionStatus, SkipFlag, SkuMode,
};

// 领域实体
pub use domain::{
    BatchImportOutcome, CompatibilityData, ImportSession, IngestedTable, StagingProduct,
    VariantData,
};

// 引擎
pub use engine::{
    CompatibilityResolver, CompatibilitySelection, VariantGenerator, VariantSelection,
};

// API
pub use api::{CompatibilityApi, ImportApi, StagingProductApi, VariantApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "商品导入暂存系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!VERSION.is_empty());
        assert!(!APP_NAME.is_empty());
    }
}
