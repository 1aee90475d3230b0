// ==========================================
// 商品导入暂存系统 - 商品目录查询 Trait
// ==========================================
// 职责: 已发布目录的只读查询接口（SKU 查重、属性值、车辆、适配属性）
// 红线: 本系统不写目录数据（测试/初始化数据除外）
// ==========================================

use crate::domain::compatibility::{CompatibilityAttribute, CompatibilityData, VehicleInfo};
use crate::domain::variant::AttributeValueInfo;
use crate::repository::error::RepositoryResult;
use async_trait::async_trait;
use std::collections::HashSet;

// ==========================================
// CatalogLookup Trait
// ==========================================
// 用途: 目录按 SKU 查询 + 变体/适配所需的元数据
// 实现者: CatalogRepositoryImpl（使用 rusqlite）
#[async_trait]
pub trait CatalogLookup: Send + Sync {
    /// SKU 是否已在目录中（大小写不敏感）
    async fn sku_exists(&self, sku: &str) -> RepositoryResult<bool>;

    /// 批量查询已在目录中的 SKU
    ///
    /// # 返回
    /// - 规范化（大写）后已存在的 SKU 集合
    async fn existing_skus(&self, skus: &[String]) -> RepositoryResult<HashSet<String>>;

    /// 目录商品的适配数据（用于“从商品复制”）
    ///
    /// # 返回
    /// - Ok(None): 商品不存在
    /// - Ok(Some(data)): 商品存在（无适配数据时为空集合）
    async fn compatibility_by_sku(&self, sku: &str)
        -> RepositoryResult<Option<CompatibilityData>>;

    /// 按属性值 id 查询属性值元数据（未知 id 忽略）
    async fn attribute_values(&self, value_ids: &[i64])
        -> RepositoryResult<Vec<AttributeValueInfo>>;

    /// 按车辆 id 查询快照字段（未知 id 忽略）
    async fn vehicles(&self, vehicle_ids: &[i64]) -> RepositoryResult<Vec<VehicleInfo>>;

    /// 适配属性（原厂件 / 替代件）
    async fn compatibility_attributes(&self) -> RepositoryResult<Vec<CompatibilityAttribute>>;
}
