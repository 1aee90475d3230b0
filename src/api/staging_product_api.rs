// ==========================================
// 商品导入暂存系统 - 暂存商品API
// ==========================================
// 职责: 暂存商品查询、跳过标记、暂存图片
// 红线: 跳过标记只记录审计，不改变区块完成状态
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::domain::staging_product::{MediaPaths, StagingProduct};
use crate::domain::types::SkipFlag;
use crate::engine::completion::{
    notify_recalculation, CompletionRecalculator, NoOpCompletionRecalculator,
};
use crate::engine::events::{OptionalEventPublisher, StagingEvent};
use crate::repository::{MediaStorage, StagingRepository, StagingRepositoryImpl};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// 商品详情（含缺失的必填区块）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagingProductView {
    pub product: StagingProduct,
    pub missing_required: Vec<String>,
    pub image_urls: Vec<String>,
}

// ==========================================
// StagingProductApi - 暂存商品API
// ==========================================
pub struct StagingProductApi {
    staging_repo: Arc<StagingRepositoryImpl>,
    media: Arc<dyn MediaStorage>,
    events: OptionalEventPublisher,
    recalculator: Arc<dyn CompletionRecalculator>,
}

impl StagingProductApi {
    pub fn new(staging_repo: Arc<StagingRepositoryImpl>, media: Arc<dyn MediaStorage>) -> Self {
        Self {
            staging_repo,
            media,
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

    async fn persist(&self, product: &StagingProduct) -> ApiResult<()> {
        self.staging_repo.update_product(product).await?;
        notify_recalculation(self.recalculator.as_ref(), product);
        Ok(())
    }

    /// 查询暂存商品详情
    pub async fn get_product(&self, product_id: i64) -> ApiResult<StagingProductView> {
        let product = self.load_product(product_id).await?;
        let missing_required = product
            .missing_required_sections()
            .into_iter()
            .map(str::to_string)
            .collect();
        let image_urls = product
            .temp_media_paths
            .as_ref()
            .map(|m| m.images.iter().map(|p| self.media.url(p)).collect())
            .unwrap_or_default();

        Ok(StagingProductView {
            product,
            missing_required,
            image_urls,
        })
    }

    pub async fn list_by_session(&self, session_id: i64) -> ApiResult<Vec<StagingProduct>> {
        Ok(self.staging_repo.list_products_by_session(session_id).await?)
    }

    /// 设置/清除跳过标记
    ///
    /// # 参数
    /// - flag: skip_features / skip_compatibility / skip_images / skip_descriptions
    /// - actor_id / actor_name: 审计记录的操作人
    ///
    /// # 返回
    /// - Ok(true): 标记状态发生变化
    #[instrument(skip(self))]
    pub async fn set_skip_flag(
        &self,
        product_id: i64,
        flag: &str,
        value: bool,
        actor_id: &str,
        actor_name: &str,
    ) -> ApiResult<bool> {
        let flag = SkipFlag::parse(flag)
            .ok_or_else(|| ApiError::InvalidInput(format!("未知的跳过标记: {}", flag)))?;

        let mut product = self.load_product(product_id).await?;
        let changed = product.set_skip_flag(flag, value, actor_id, actor_name, Utc::now());
        self.persist(&product).await?;

        info!(product_id, flag = %flag, value, changed, "跳过标记已更新");
        self.events.publish(StagingEvent::SkipFlagChanged {
            product_id,
            flag: flag.as_str().to_string(),
            value,
        });
        Ok(changed)
    }

    /// 上传暂存图片
    ///
    /// # 返回
    /// - 存储相对路径（已追加到 temp_media_paths）
    pub async fn add_image(
        &self,
        product_id: i64,
        content: &[u8],
        extension: &str,
    ) -> ApiResult<String> {
        let mut product = self.load_product(product_id).await?;
        let path = self.media.store(content, extension).await?;

        product
            .temp_media_paths
            .get_or_insert_with(MediaPaths::default)
            .images
            .push(path.clone());
        product.updated_at = Utc::now();
        product.recalculate_completion_status();

        if let Err(e) = self.persist(&product).await {
            // 写库失败时清理已保存的文件
            if let Err(cleanup) = self.media.delete(&path).await {
                warn!(product_id, path = %path, error = %cleanup, "清理图片失败");
            }
            return Err(e);
        }

        info!(product_id, path = %path, "暂存图片已添加");
        Ok(path)
    }

    /// 复制暂存图片到目标商品
    pub async fn copy_image(&self, product_id: i64, from: &str) -> ApiResult<String> {
        let mut product = self.load_product(product_id).await?;
        if !self.media.exists(from).await? {
            return Err(ApiError::NotFound(format!("图片不存在: {}", from)));
        }
        let path = self.media.copy(from).await?;

        product
            .temp_media_paths
            .get_or_insert_with(MediaPaths::default)
            .images
            .push(path.clone());
        product.updated_at = Utc::now();
        product.recalculate_completion_status();
        self.persist(&product).await?;
        Ok(path)
    }

    /// 移除暂存图片
    ///
    /// # 返回
    /// - Ok(false): 商品未引用该路径
    pub async fn remove_image(&self, product_id: i64, path: &str) -> ApiResult<bool> {
        let mut product = self.load_product(product_id).await?;
        let removed = match product.temp_media_paths.as_mut() {
            Some(media) => {
                let before = media.images.len();
                media.images.retain(|p| p != path);
                media.images.len() != before
            }
            None => false,
        };
        if !removed {
            return Ok(false);
        }

        product.updated_at = Utc::now();
        product.recalculate_completion_status();
        self.persist(&product).await?;
        self.media.delete(path).await?;

        info!(product_id, path = %path, "暂存图片已移除");
        Ok(true)
    }
}
