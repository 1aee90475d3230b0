// ==========================================
// 商品导入暂存系统 - 完成度重算接口
// ==========================================
// 职责: 每次暂存商品变更后通知外部完成度计算
// 说明: 百分比计算不在本系统内，这里只定义调用接缝
// ==========================================

use crate::domain::staging_product::StagingProduct;
use std::error::Error;

/// 完成度重算 Trait
///
/// 调用时机: 批量创建、变体保存/清除、适配保存、跳过标记变更之后
pub trait CompletionRecalculator: Send + Sync {
    fn recalculate(&self, product: &StagingProduct) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作实现（仅记录缺失的必填区块）
#[derive(Debug, Clone, Default)]
pub struct NoOpCompletionRecalculator;

impl CompletionRecalculator for NoOpCompletionRecalculator {
    fn recalculate(&self, product: &StagingProduct) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            product_id = product.id,
            sku = %product.sku,
            missing = ?product.missing_required_sections(),
            "完成度重算（未配置外部实现）"
        );
        Ok(())
    }
}

/// 通知重算，失败只记录日志
pub fn notify_recalculation(recalculator: &dyn CompletionRecalculator, product: &StagingProduct) {
    if let Err(e) = recalculator.recalculate(product) {
        tracing::warn!(product_id = product.id, error = %e, "完成度重算失败");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use std::sync::Mutex;

    struct Recording(Mutex<Vec<i64>>);

    impl CompletionRecalculator for Recording {
        fn recalculate(
            &self,
            product: &StagingProduct,
        ) -> Result<(), Box<dyn Error + Send + Sync>> {
            self.0.lock().unwrap().push(product.id);
            Err("downstream unavailable".into())
        }
    }

    #[test]
    fn test_notify_swallows_errors() {
        let recorder = Recording(Mutex::new(Vec::new()));
        let mut product = StagingProduct::new("A1", "u", Utc::now());
        product.id = 5;

        notify_recalculation(&recorder, &product);
        assert_eq!(*recorder.0.lock().unwrap(), vec![5]);

        notify_recalculation(&NoOpCompletionRecalculator, &product);
    }
}
