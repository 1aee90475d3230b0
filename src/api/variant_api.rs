// ==========================================
// 商品导入暂存系统 - 变体API
// ==========================================
// 职责: 打开/生成/保存/清除暂存商品的变体
// 流程: 读取商品 → 属性元数据 → VariantSelection → variant_data 写回
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::staging_product::StagingProduct;
use crate::engine::completion::{
    notify_recalculation, CompletionRecalculator, NoOpCompletionRecalculator,
};
use crate::engine::events::{OptionalEventPublisher, StagingEvent};
use crate::engine::variant_generator::{VariantConfig, VariantSelection};
use crate::repository::{CatalogLookup, CatalogRepositoryImpl, StagingRepository, StagingRepositoryImpl};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// 变体保存响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VariantSaveResponse {
    pub product_id: i64,
    pub variant_count: usize,
    pub active_count: usize,
}

// ==========================================
// VariantApi - 变体API
// ==========================================
pub struct VariantApi {
    staging_repo: Arc<StagingRepositoryImpl>,
    catalog_repo: Arc<CatalogRepositoryImpl>,
    config: Arc<ConfigManager>,
    events: OptionalEventPublisher,
    recalculator: Arc<dyn CompletionRecalculator>,
}

impl VariantApi {
    pub fn new(
        staging_repo: Arc<StagingRepositoryImpl>,
        catalog_repo: Arc<CatalogRepositoryImpl>,
        config: Arc<ConfigManager>,
    ) -> Self {
        Self {
            staging_repo,
            catalog_repo,
            config,
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

    /// 打开变体编辑状态
    ///
    /// 已有 variant_data 时恢复选择与变体；否则使用配置的默认分隔符
    pub async fn open_selection(&self, product_id: i64) -> ApiResult<VariantSelection> {
        let product = self.load_product(product_id).await?;
        if let Some(data) = product.variant_data.as_ref() {
            debug!(product_id, variants = data.variants.len(), "恢复已保存的变体");
            return Ok(VariantSelection::from_variant_data(data));
        }

        let separator = self
            .config
            .get_variant_default_separator()
            .await
            .map_err(|e| ApiError::InternalError(format!("配置读取失败: {}", e)))?;
        Ok(VariantSelection::new(VariantConfig {
            separator,
            ..VariantConfig::default()
        }))
    }

    /// 按当前选择生成变体
    ///
    /// # 返回
    /// - 生成的变体数（空维度被排除）
    pub async fn generate(
        &self,
        product_id: i64,
        selection: &mut VariantSelection,
    ) -> ApiResult<usize> {
        let product = self.load_product(product_id).await?;
        let values = self
            .catalog_repo
            .attribute_values(&selection.selected_value_ids())
            .await?;
        let count = selection.generate(&product.sku, &values);
        info!(product_id, count, "变体已生成");
        Ok(count)
    }

    /// 保存变体（同步价格/启用状态后写入 variant_data）
    #[instrument(skip(self, selection))]
    pub async fn save_variants(
        &self,
        product_id: i64,
        selection: &mut VariantSelection,
        actor_id: &str,
    ) -> ApiResult<VariantSaveResponse> {
        if selection.variants().is_empty() {
            return Err(ApiError::ValidationError("没有可保存的变体".to_string()));
        }

        let mut product = self.load_product(product_id).await?;
        let now = Utc::now();
        let data = selection.to_variant_data(now);
        let response = VariantSaveResponse {
            product_id,
            variant_count: data.variants.len(),
            active_count: data.active_count(),
        };

        product.variant_data = Some(data);
        product.updated_at = now;
        product.recalculate_completion_status();
        self.staging_repo.update_product(&product).await?;

        info!(
            product_id,
            actor_id,
            variants = response.variant_count,
            "变体已保存"
        );
        self.events.publish(StagingEvent::VariantsSaved {
            product_id,
            variant_count: response.variant_count,
        });
        notify_recalculation(self.recalculator.as_ref(), &product);
        Ok(response)
    }

    /// 清除变体（variant_data 置空）
    #[instrument(skip(self))]
    pub async fn clear_variants(&self, product_id: i64, actor_id: &str) -> ApiResult<()> {
        let mut product = self.load_product(product_id).await?;
        product.variant_data = None;
        product.updated_at = Utc::now();
        product.recalculate_completion_status();
        self.staging_repo.update_product(&product).await?;

        info!(product_id, actor_id, "变体已清除");
        self.events.publish(StagingEvent::VariantsSaved {
            product_id,
            variant_count: 0,
        });
        notify_recalculation(self.recalculator.as_ref(), &product);
        Ok(())
    }
}
