// ==========================================
// 商品导入暂存系统 - 导入层
// ==========================================
// 职责: 外部数据 → 暂存商品
// 支持: CSV / TXT / Excel / 粘贴文本 / SKU 列表
// ==========================================

// 模块声明
pub mod batch_import_processor;
pub mod column_mapper;
pub mod error;
pub mod field_catalog;
pub mod file_ingestor;
pub mod header_normalizer;
pub mod sku_list_parser;
pub mod staging_importer_trait;
pub mod value_cleaner;

// 重导出核心类型
pub use batch_import_processor::{rows_from_sku_items, BatchImportProcessor, BatchSettings};
pub use column_mapper::{ColumnMapperImpl, MappingSettings};
pub use error::{ErrorCategory, ImportError, ImportResult};
pub use field_catalog::DefaultFieldCatalog;
pub use file_ingestor::{DelimitedTextIngestor, ExcelIngestor, UniversalFileIngestor};
pub use sku_list_parser::{SkuListParserImpl, SkuParserSettings};
pub use value_cleaner::ValueCleaner as ValueCleanerImpl;

// 重导出 Trait 接口
pub use staging_importer_trait::{
    BatchImporter, ColumnMapper, FileIngestor, SkuListParser, TargetFieldProvider, ValueCleaner,
};
