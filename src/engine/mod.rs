// ==========================================
// 商品导入暂存系统 - 引擎层
// ==========================================
// 职责: 变体生成、适配解析、完成度/事件接缝
// 红线: Engine 不拼 SQL, 数据由 api 层经仓储取得后传入
// ==========================================

pub mod compatibility_resolver;
pub mod completion;
pub mod events;
pub mod variant_generator;

// 重导出核心引擎
pub use compatibility_resolver::{
    classify_attribute_name, CompatibilityAttributes, CompatibilityResolver,
    CompatibilitySelection,
};
pub use completion::{notify_recalculation, CompletionRecalculator, NoOpCompletionRecalculator};
pub use events::{
    ChannelEventPublisher, NoOpEventPublisher, OptionalEventPublisher, StagingEvent,
    StagingEventPublisher,
};
pub use variant_generator::{
    manual_code, DimensionSelection, VariantConfig, VariantGenerator, VariantSelection,
    FALLBACK_BASE_SKU,
};
