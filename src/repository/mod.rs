// ==========================================
// 商品导入暂存系统 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库与文件系统细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod catalog_repo;
pub mod catalog_repo_impl;
pub mod error;
pub mod media_storage;
pub mod staging_repo;
pub mod staging_repo_impl;

// 重导出核心仓储
pub use catalog_repo::CatalogLookup;
pub use catalog_repo_impl::CatalogRepositoryImpl;
pub use error::{RepositoryError, RepositoryResult};
pub use media_storage::{LocalMediaStorage, MediaStorage};
pub use staging_repo::StagingRepository;
pub use staging_repo_impl::StagingRepositoryImpl;
