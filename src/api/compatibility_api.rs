// ==========================================
// 商品导入暂存系统 - 适配车型API
// ==========================================
// 职责: 单个/批量保存适配车型、从其他商品复制、恢复选择
// 红线: 批量保存在一个事务内写入完全相同的 compatibility_data
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::compatibility::{CompatibilityData, COMPATIBILITY_DATA_VERSION};
use crate::domain::staging_product::{normalize_sku, StagingProduct};
use crate::engine::compatibility_resolver::{CompatibilityAttributes, CompatibilitySelection};
use crate::engine::completion::{
    notify_recalculation, CompletionRecalculator, NoOpCompletionRecalculator,
};
use crate::engine::events::{OptionalEventPublisher, StagingEvent};
use crate::repository::{
    CatalogLookup, CatalogRepositoryImpl, StagingRepository, StagingRepositoryImpl,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 适配保存响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompatibilitySaveResponse {
    pub product_ids: Vec<i64>,
    pub entry_count: usize,
    pub compatibility_data: CompatibilityData,
}

// ==========================================
// CompatibilityApi - 适配车型API
// ==========================================
pub struct CompatibilityApi {
    staging_repo: Arc<StagingRepositoryImpl>,
    catalog_repo: Arc<CatalogRepositoryImpl>,
    events: OptionalEventPublisher,
    recalculator: Arc<dyn CompletionRecalculator>,
}

impl CompatibilityApi {
    pub fn new(
        staging_repo: Arc<StagingRepositoryImpl>,
        catalog_repo: Arc<CatalogRepositoryImpl>,
    ) -> Self {
        Self {
            staging_repo,
            catalog_repo,
            events: OptionalEventPublisher::none(),
            recalculator: Arc::new(NoOpCompletionRecalculator),
        }
    }

    pub fn with_event_publisher(mut self, events: OptionalEventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn with_recalculator(mut self, recalculator: Arc<dyn CompletionRecalculator>) -> Self {
        self.recalculator = recalculator;
        self
    }

    async fn load_product(&self, product_id: i64) -> ApiResult<StagingProduct> {
        self.staging_repo
            .find_product(product_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("暂存商品(id={})不存在", product_id)))
    }

    /// 解析选择为快照（车型与属性从目录读取）
    async fn resolve(&self, selection: &CompatibilitySelection) -> ApiResult<CompatibilityData> {
        let vehicles = self.catalog_repo.vehicles(&selection.vehicle_ids()).await?;
        let attributes =
            CompatibilityAttributes::from_catalog(&self.catalog_repo.compatibility_attributes().await?);
        Ok(selection.resolve(&vehicles, &attributes, Utc::now()))
    }

    /// 由已保存的快照恢复选择
    pub async fn load_selection(&self, product_id: i64) -> ApiResult<CompatibilitySelection> {
        let product = self.load_product(product_id).await?;
        Ok(product
            .compatibility_data
            .as_ref()
            .map(CompatibilitySelection::load)
            .unwrap_or_default())
    }

    /// 从其他商品复制（先查暂存区，再查商品目录）
    ///
    /// # 返回
    /// - 新加入的车型 id 数
    pub async fn copy_from_sku(
        &self,
        selection: &mut CompatibilitySelection,
        sku: &str,
    ) -> ApiResult<usize> {
        let sku = normalize_sku(sku);
        let source = match self.staging_repo.find_product_by_sku(&sku).await? {
            Some(product) => product.compatibility_data.unwrap_or(CompatibilityData {
                version: COMPATIBILITY_DATA_VERSION,
                compatibilities: Vec::new(),
                updated_at: Utc::now(),
            }),
            None => self
                .catalog_repo
                .compatibility_by_sku(&sku)
                .await?
                .ok_or_else(|| ApiError::NotFound(format!("商品(SKU={})不存在", sku)))?,
        };

        let added = selection.copy_from(&source);
        info!(sku = %sku, added, "已复制适配车型");
        Ok(added)
    }

    /// 保存单个商品的适配车型
    #[instrument(skip(self, selection))]
    pub async fn save(
        &self,
        product_id: i64,
        selection: &CompatibilitySelection,
        actor_id: &str,
    ) -> ApiResult<CompatibilitySaveResponse> {
        let mut product = self.load_product(product_id).await?;
        let data = self.resolve(selection).await?;

        product.compatibility_data = Some(data.clone());
        product.updated_at = data.updated_at;
        product.recalculate_completion_status();
        self.staging_repo.update_product(&product).await?;

        let entry_count = data.compatibilities.len();
        info!(product_id, actor_id, entry_count, "适配车型已保存");
        self.events.publish(StagingEvent::CompatibilitySaved {
            product_ids: vec![product_id],
            entry_count,
        });
        notify_recalculation(self.recalculator.as_ref(), &product);

        Ok(CompatibilitySaveResponse {
            product_ids: vec![product_id],
            entry_count,
            compatibility_data: data,
        })
    }

    /// 批量保存: 同一快照写入全部目标商品（单事务）
    ///
    /// # 返回
    /// - Err(NotFound): 任一 id 不存在，未写入任何记录
    #[instrument(skip(self, selection), fields(targets = product_ids.len()))]
    pub async fn save_bulk(
        &self,
        product_ids: &[i64],
        selection: &CompatibilitySelection,
        actor_id: &str,
    ) -> ApiResult<CompatibilitySaveResponse> {
        let mut seen = HashSet::new();
        let targets: Vec<i64> = product_ids
            .iter()
            .copied()
            .filter(|id| seen.insert(*id))
            .collect();
        if targets.is_empty() {
            return Err(ApiError::InvalidInput("未选择任何商品".to_string()));
        }

        let data = self.resolve(selection).await?;

        let mut products = Vec::with_capacity(targets.len());
        for id in &targets {
            let mut product = self.load_product(*id).await.map_err(|e| {
                warn!(product_id = *id, "批量保存目标不存在");
                e
            })?;
            product.compatibility_data = Some(data.clone());
            product.updated_at = data.updated_at;
            product.recalculate_completion_status();
            products.push(product);
        }

        let updated = self
            .staging_repo
            .update_products_in_transaction(&products)
            .await?;

        let entry_count = data.compatibilities.len();
        info!(actor_id, updated, entry_count, "批量保存适配车型完成");
        self.events.publish(StagingEvent::CompatibilitySaved {
            product_ids: targets.clone(),
            entry_count,
        });
        for product in &products {
            notify_recalculation(self.recalculator.as_ref(), product);
        }

        Ok(CompatibilitySaveResponse {
            product_ids: targets,
            entry_count,
            compatibility_data: data,
        })
    }
}
