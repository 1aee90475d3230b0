// ==========================================
// 商品导入暂存系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// 约束: 所有 API 共享同一个数据库连接
// ==========================================

use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use crate::api::{CompatibilityApi, ImportApi, StagingProductApi, VariantApi};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::db::{init_schema, open_sqlite_connection};
use crate::engine::events::OptionalEventPublisher;
use crate::repository::{
    CatalogRepositoryImpl, LocalMediaStorage, MediaStorage, StagingRepositoryImpl,
};

/// 数据库路径环境变量
pub const DB_PATH_ENV: &str = "PRODUCT_IMPORT_STAGING_DB_PATH";

/// 应用状态
///
/// 包含所有API实例和共享资源
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 文件/表格/SKU 列表导入API
    pub import_api: Arc<ImportApi>,

    /// 变体API
    pub variant_api: Arc<VariantApi>,

    /// 适配车型API
    pub compatibility_api: Arc<CompatibilityApi>,

    /// 暂存商品API
    pub staging_product_api: Arc<StagingProductApi>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,

    /// 暂存事件发布器（刷新列表通知）
    pub event_publisher: OptionalEventPublisher,
}

impl AppState {
    /// 创建新的AppState实例（本地媒体目录，无事件订阅）
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub async fn new(db_path: String) -> Result<Self, String> {
        Self::with_options(db_path, OptionalEventPublisher::none(), None).await
    }

    /// 创建AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    /// - event_publisher: 暂存事件发布器
    /// - media_root: 图片根目录（None 时使用默认数据目录）
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开共享连接并初始化表结构
    /// 2. 初始化 Repository 与配置
    /// 3. 创建所有API实例
    pub async fn with_options(
        db_path: String,
        event_publisher: OptionalEventPublisher,
        media_root: Option<PathBuf>,
    ) -> Result<Self, String> {
        tracing::info!(db_path = %db_path, "初始化AppState");

        let conn = open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        init_schema(&conn).map_err(|e| format!("无法初始化表结构: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        let staging_repo = Arc::new(StagingRepositoryImpl::from_connection(conn.clone()));
        let catalog_repo = Arc::new(CatalogRepositoryImpl::from_connection(conn.clone()));
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法初始化配置管理器: {}", e))?,
        );

        let max_image_size = config_manager
            .get_max_image_size_bytes()
            .await
            .map_err(|e| format!("配置读取失败: {}", e))?;
        let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(
            media_root.unwrap_or_else(LocalMediaStorage::default_root),
            "/media",
            max_image_size,
        ));

        let import_api = Arc::new(
            ImportApi::new(
                staging_repo.clone(),
                catalog_repo.clone(),
                config_manager.clone(),
            )
            .with_event_publisher(event_publisher.clone()),
        );
        let variant_api = Arc::new(
            VariantApi::new(
                staging_repo.clone(),
                catalog_repo.clone(),
                config_manager.clone(),
            )
            .with_event_publisher(event_publisher.clone()),
        );
        let compatibility_api = Arc::new(
            CompatibilityApi::new(staging_repo.clone(), catalog_repo)
                .with_event_publisher(event_publisher.clone()),
        );
        let staging_product_api = Arc::new(
            StagingProductApi::new(staging_repo, media)
                .with_event_publisher(event_publisher.clone()),
        );

        tracing::info!(
            events = event_publisher.is_configured(),
            "AppState初始化完成"
        );

        Ok(Self {
            db_path,
            import_api,
            variant_api,
            compatibility_api,
            staging_product_api,
            config_manager,
            event_publisher,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

/// 默认数据库路径
///
/// 优先级: 环境变量 PRODUCT_IMPORT_STAGING_DB_PATH > 用户数据目录 > 当前目录
pub fn get_default_db_path() -> String {
    if let Ok(path) = std::env::var(DB_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./product_import_staging.db");

    if let Some(data_dir) = dirs::data_dir() {
        let dir = data_dir.join("product-import-staging");
        // 目录创建失败时回退到当前目录
        if std::fs::create_dir_all(&dir).is_ok() {
            path = dir.join("product_import_staging.db");
        }
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::ImportMethod;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[tokio::test]
    async fn test_app_state_shares_schema() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("state.db").to_string_lossy().to_string();

        let state = AppState::with_options(
            db_path.clone(),
            OptionalEventPublisher::none(),
            Some(dir.path().join("media")),
        )
        .await
        .unwrap();

        assert_eq!(state.get_db_path(), db_path);
        let session = state.import_api.start_session(ImportMethod::Csv, "u-1").await.unwrap();
        assert!(session.id > 0);
    }
}
