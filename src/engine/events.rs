// ==========================================
// 商品导入暂存系统 - 暂存事件发布
// ==========================================
// 职责: 定义暂存事件发布 trait（列表刷新等跨组件通知）
// 说明: 引擎层只依赖 trait，界面/外部适配器实现具体发布方式
// ==========================================

use serde::{Deserialize, Serialize};
use std::error::Error;
use std::sync::Arc;
use tokio::sync::mpsc;

// ==========================================
// 暂存事件类型
// ==========================================

/// 暂存事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StagingEvent {
    /// 批量导入完成（会话进入 READY）
    BatchImported {
        session_id: i64,
        created: usize,
        skipped: usize,
        failed: usize,
    },
    /// 批量导入失败（整批回滚）
    BatchFailed { session_id: i64, message: String },
    /// 变体数据已保存/清除
    VariantsSaved { product_id: i64, variant_count: usize },
    /// 适配数据已保存（单个或批量）
    CompatibilitySaved {
        product_ids: Vec<i64>,
        entry_count: usize,
    },
    /// 跳过标记变更
    SkipFlagChanged {
        product_id: i64,
        flag: String,
        value: bool,
    },
}

impl StagingEvent {
    /// 转换为字符串标识
    pub fn as_str(&self) -> &str {
        match self {
            StagingEvent::BatchImported { .. } => "BatchImported",
            StagingEvent::BatchFailed { .. } => "BatchFailed",
            StagingEvent::VariantsSaved { .. } => "VariantsSaved",
            StagingEvent::CompatibilitySaved { .. } => "CompatibilitySaved",
            StagingEvent::SkipFlagChanged { .. } => "SkipFlagChanged",
        }
    }
}

// ==========================================
// 事件发布 Trait
// ==========================================

/// 暂存事件发布者 Trait
///
/// # 实现说明
/// - `ChannelEventPublisher`: 写入 tokio mpsc 通道，由订阅方刷新列表
/// - `NoOpEventPublisher`: 单元测试/命令行场景
pub trait StagingEventPublisher: Send + Sync {
    /// 发布暂存事件
    ///
    /// # 返回
    /// - `Ok(())`: 已发布
    /// - `Err`: 发布失败（调用方记录日志，不影响主流程）
    fn publish(&self, event: StagingEvent) -> Result<(), Box<dyn Error + Send + Sync>>;
}

/// 空操作事件发布者
#[derive(Debug, Clone, Default)]
pub struct NoOpEventPublisher;

impl StagingEventPublisher for NoOpEventPublisher {
    fn publish(&self, event: StagingEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        tracing::debug!(
            "NoOpEventPublisher: 跳过事件发布 - event_type={}",
            event.as_str()
        );
        Ok(())
    }
}

/// 通道事件发布者（非阻塞发送）
#[derive(Debug, Clone)]
pub struct ChannelEventPublisher {
    sender: mpsc::UnboundedSender<StagingEvent>,
}

impl ChannelEventPublisher {
    /// 创建发布者与接收端
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<StagingEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self { sender }, receiver)
    }
}

impl StagingEventPublisher for ChannelEventPublisher {
    fn publish(&self, event: StagingEvent) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.sender
            .send(event)
            .map_err(|e| format!("事件通道已关闭: {}", e.0.as_str()).into())
    }
}

/// 可选的事件发布者包装
///
/// 简化 Option<Arc<dyn StagingEventPublisher>> 的使用；发布失败只记录日志
#[derive(Clone)]
pub struct OptionalEventPublisher {
    inner: Option<Arc<dyn StagingEventPublisher>>,
}

impl OptionalEventPublisher {
    /// 创建带发布者的实例
    pub fn with_publisher(publisher: Arc<dyn StagingEventPublisher>) -> Self {
        Self {
            inner: Some(publisher),
        }
    }

    /// 创建空实例（不发布事件）
    pub fn none() -> Self {
        Self { inner: None }
    }

    /// 发布事件（如果有发布者）
    pub fn publish(&self, event: StagingEvent) {
        match &self.inner {
            Some(publisher) => {
                let event_type = event.as_str().to_string();
                if let Err(e) = publisher.publish(event) {
                    tracing::warn!(event_type = %event_type, error = %e, "暂存事件发布失败");
                }
            }
            None => {
                tracing::debug!(
                    "OptionalEventPublisher: 未配置发布者，跳过事件 - event_type={}",
                    event.as_str()
                );
            }
        }
    }

    /// 检查是否配置了发布者
    pub fn is_configured(&self) -> bool {
        self.inner.is_some()
    }
}

impl Default for OptionalEventPublisher {
    fn default() -> Self {
        Self::none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn imported() -> StagingEvent {
        StagingEvent::BatchImported {
            session_id: 1,
            created: 4,
            skipped: 1,
            failed: 0,
        }
    }

    #[test]
    fn test_noop_publisher() {
        assert!(NoOpEventPublisher.publish(imported()).is_ok());
    }

    #[test]
    fn test_optional_publisher_none() {
        let publisher = OptionalEventPublisher::none();
        assert!(!publisher.is_configured());
        publisher.publish(imported());
    }

    #[tokio::test]
    async fn test_channel_publisher_delivers() {
        let (publisher, mut receiver) = ChannelEventPublisher::channel();
        let optional = OptionalEventPublisher::with_publisher(Arc::new(publisher));
        assert!(optional.is_configured());

        optional.publish(imported());
        let received = receiver.recv().await.unwrap();
        assert_eq!(received, imported());
    }

    #[test]
    fn test_channel_publisher_closed_receiver() {
        let (publisher, receiver) = ChannelEventPublisher::channel();
        drop(receiver);
        assert!(publisher.publish(imported()).is_err());
    }

    #[test]
    fn test_event_serialization_tag() {
        let json = serde_json::to_string(&imported()).unwrap();
        assert!(json.contains("\"type\":\"batch_imported\""));
    }
}
