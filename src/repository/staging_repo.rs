// ==========================================
// 商品导入暂存系统 - 暂存区 Repository Trait
// ==========================================
// 职责: 定义导入会话与暂存商品的数据访问接口（不包含业务逻辑）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::domain::import_session::ImportSession;
use crate::domain::staging_product::StagingProduct;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// StagingRepository Trait
// ==========================================
// 用途: import_session / pending_product 数据访问
// 实现者: StagingRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait StagingRepository: Send + Sync {
    // ===== 导入会话 =====

    /// 插入会话
    ///
    /// # 返回
    /// - Ok(i64): 新会话主键
    async fn insert_session(&self, session: &ImportSession) -> RepositoryResult<i64>;

    /// 按主键查询会话
    async fn find_session(&self, session_id: i64) -> RepositoryResult<Option<ImportSession>>;

    /// 覆盖写入会话（状态、计数、错误日志）
    async fn update_session(&self, session: &ImportSession) -> RepositoryResult<()>;

    // ===== 暂存商品 =====

    /// 插入单个暂存商品
    async fn insert_product(&self, product: &StagingProduct) -> RepositoryResult<i64>;

    /// 批量插入暂存商品（单事务，任一失败整体回滚）
    ///
    /// # 返回
    /// - Ok(Vec<i64>): 新记录主键（与输入顺序一致）
    /// - Err: 数据库错误（没有任何记录被写入）
    async fn insert_products_in_transaction(
        &self,
        products: &[StagingProduct],
    ) -> RepositoryResult<Vec<i64>>;

    async fn find_product(&self, product_id: i64) -> RepositoryResult<Option<StagingProduct>>;

    /// 按 SKU 查询（大小写不敏感，多条时取最早一条）
    async fn find_product_by_sku(&self, sku: &str) -> RepositoryResult<Option<StagingProduct>>;

    async fn list_products_by_session(
        &self,
        session_id: i64,
    ) -> RepositoryResult<Vec<StagingProduct>>;

    /// 覆盖写入暂存商品
    async fn update_product(&self, product: &StagingProduct) -> RepositoryResult<()>;

    /// 查询已在暂存区（任意会话）的 SKU
    ///
    /// # 返回
    /// - 规范化（大写）后已存在的 SKU 集合
    async fn existing_staged_skus(&self, skus: &[String]) -> RepositoryResult<HashSet<String>>;

    /// 批量覆盖写入暂存商品（单事务）
    ///
    /// # 返回
    /// - Ok(usize): 更新的记录数
    /// - Err(NotFound): 任一 id 不存在，整体回滚
    async fn update_products_in_transaction(
        &self,
        products: &[StagingProduct],
    ) -> RepositoryResult<usize>;
}
