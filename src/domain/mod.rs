// ==========================================
// 商品导入暂存系统 - 领域模型层
// ==========================================
// 职责: 定义导入会话、暂存商品及其派生结构的值类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod batch;
pub mod compatibility;
pub mod import_session;
pub mod ingest;
pub mod mapping;
pub mod staging_product;
pub mod types;
pub mod variant;

// 重导出核心类型
pub use batch::{BatchImportOutcome, RowIssue, RowIssueKind};
pub use compatibility::{
    CompatibilityAttribute, CompatibilityData, CompatibilityEntry, VehicleInfo,
};
pub use ingest::{
    IngestRequest, IngestedTable, ParsedSkuItem, SkuParseError, SkuParseResult, SkuParseStats,
    SkuParseWarning,
};
pub use import_session::{ImportSession, InvalidSessionTransition, SessionErrorEntry, SessionStats};
pub use mapping::{ColumnMapping, MappedRow, MappingAlternate, MappingSuggestion, TargetField};
pub use staging_product::{
    normalize_sku, FeatureData, MediaPaths, PriceData, PriceGroup, SkipHistoryEntry,
    StagingProduct, OPTIONAL_SECTIONS, REQUIRED_SECTIONS,
};
pub use types::{
    CompatibilityClass, Delimiter, ImportMethod, ListSeparator, SessionStatus, SkipFlag, SkuMode,
};
pub use variant::{AttributeValueInfo, Variant, VariantAttribute, VariantData};
