// ==========================================
// 商品导入暂存系统 - 导入组件 Trait
// ==========================================
// 职责: 定义导入管道各阶段接口（不包含实现）
// 流程: 摄取 → SKU 列表解析 → 列映射 → 值清洗 → 批量暂存
// ==========================================

use crate::domain::batch::BatchImportOutcome;
use crate::domain::ingest::{IngestRequest, IngestedTable, SkuParseResult};
use crate::domain::mapping::{ColumnMapping, MappedRow, MappingSuggestion, TargetField};
use crate::domain::types::ListSeparator;
use crate::importer::error::ImportResult;
use async_trait::async_trait;

// ==========================================
// FileIngestor Trait
// ==========================================
// 用途: 原始字节/粘贴文本 → 表头 + 行
// 实现者: DelimitedTextIngestor, ExcelIngestor, UniversalFileIngestor
pub trait FileIngestor: Send + Sync {
    /// 摄取原始内容
    ///
    /// # 参数
    /// - content: 原始字节
    /// - request: 文件名与声明的 MIME 类型
    ///
    /// # 返回
    /// - Ok(IngestedTable): 表头、行、检测到的分隔符/编码
    /// - Err: 解析错误（不返回部分结果）
    fn ingest(&self, content: &[u8], request: &IngestRequest) -> ImportResult<IngestedTable>;
}

// ==========================================
// SkuListParser Trait
// ==========================================
// 用途: 粘贴的 SKU / 名称列表解析
// 实现者: SkuListParserImpl
pub trait SkuListParser: Send + Sync {
    /// 单列模式: 每行 `sku[分隔符]name`
    fn parse_single_column(
        &self,
        text: &str,
        separator: ListSeparator,
    ) -> ImportResult<SkuParseResult>;

    /// 纯 SKU 模式: 空白/逗号/分号混合分隔
    fn parse_sku_only(&self, text: &str) -> ImportResult<SkuParseResult>;

    /// 两列模式: SKU 与名称按行号配对
    fn parse_two_columns(&self, sku_text: &str, name_text: &str) -> ImportResult<SkuParseResult>;
}

// ==========================================
// ColumnMapper Trait
// ==========================================
// 用途: 源列 → 目标字段映射建议
// 实现者: ColumnMapperImpl
pub trait ColumnMapper: Send + Sync {
    /// 为每个源列生成映射建议（按列顺序）
    fn suggest(&self, headers: &[String]) -> Vec<MappingSuggestion>;

    /// 将建议折叠为列映射（仅取达到自动映射阈值的建议）
    fn auto_mapping(&self, suggestions: &[MappingSuggestion]) -> ColumnMapping;

    /// 校验映射（SKU 必须映射，字段不得重复）
    fn validate_mapping(&self, mapping: &ColumnMapping) -> ImportResult<()>;

    /// 按映射转换数据行（仅保留有 SKU 的行）
    fn apply_mapping(&self, table: &IngestedTable, mapping: &ColumnMapping) -> Vec<MappedRow>;

    /// 目标字段目录
    fn target_fields(&self) -> Vec<TargetField>;
}

// ==========================================
// TargetFieldProvider Trait
// ==========================================
// 用途: 目标字段目录的外部提供者
// 实现者: DefaultFieldCatalog
pub trait TargetFieldProvider: Send + Sync {
    fn available_fields(&self) -> Vec<TargetField>;
}

// ==========================================
// ValueCleaner Trait
// ==========================================
// 用途: 单元格文本清洗与数值解析
// 实现者: ValueCleanerImpl
pub trait ValueCleaner: Send + Sync {
    /// TRIM（可选 UPPER）
    fn clean_text(&self, value: &str, uppercase: bool) -> String;

    /// 空白 → None
    fn normalize_null(&self, value: Option<&str>) -> Option<String>;

    /// 宽松小数解析（逗号小数点、剔除非数字字符）
    fn parse_decimal(&self, value: Option<&str>) -> Option<f64>;

    /// 宽松整数解析
    fn parse_integer(&self, value: Option<&str>) -> Option<i64>;
}

// ==========================================
// BatchImporter Trait
// ==========================================
// 用途: 事务化批量创建暂存商品
// 实现者: BatchImportProcessor
#[async_trait]
pub trait BatchImporter: Send + Sync {
    /// 处理一批已映射的行
    ///
    /// # 参数
    /// - session_id: 活动导入会话
    /// - rows: 已映射行
    ///
    /// # 返回
    /// - Ok(BatchImportOutcome): created / skipped / failed / errors
    /// - Err: 持久化错误（整批回滚）或会话状态错误
    async fn process_batch(
        &self,
        session_id: i64,
        rows: Vec<MappedRow>,
    ) -> ImportResult<BatchImportOutcome>;
}
