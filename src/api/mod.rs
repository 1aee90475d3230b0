// ==========================================
// 商品导入暂存系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口,供 CLI 与上层界面调用
// ==========================================

pub mod compatibility_api;
pub mod error;
pub mod import_api;
pub mod staging_product_api;
pub mod variant_api;

// 重导出核心类型
pub use compatibility_api::{CompatibilityApi, CompatibilitySaveResponse};
pub use error::{ApiError, ApiResult};
pub use import_api::{
    batch_summary, FileIngestResult, ImportApi, MappingResponse, TableImportResponse,
};
pub use staging_product_api::{StagingProductApi, StagingProductView};
pub use variant_api::{VariantApi, VariantSaveResponse};
