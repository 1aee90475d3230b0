// ==========================================
// 商品导入暂存系统 - 导入API
// ==========================================
// 职责: 摄取 → SKU 列表 → 列映射 → 批量暂存 的命令入口
// 说明: 组件参数每次调用时从 ConfigManager 读取
// ==========================================

use crate::api::error::{ApiError, ApiResult};
use crate::i18n::t_with_args;
use crate::config::{ConfigManager, ImportConfigReader};
use crate::domain::batch::BatchImportOutcome;
use crate::domain::import_session::ImportSession;
use crate::domain::ingest::{IngestRequest, IngestedTable, ParsedSkuItem, SkuParseResult};
use crate::domain::mapping::{ColumnMapping, MappedRow, MappingSuggestion};
use crate::domain::types::{ImportMethod, ListSeparator};
use crate::engine::completion::{CompletionRecalculator, NoOpCompletionRecalculator};
use crate::engine::events::OptionalEventPublisher;
use crate::importer::{
    rows_from_sku_items, BatchImportProcessor, BatchImporter, BatchSettings, ColumnMapper,
    ColumnMapperImpl, DefaultFieldCatalog, FileIngestor, ImportError, MappingSettings,
    SkuListParser, SkuListParserImpl, SkuParserSettings, UniversalFileIngestor,
};
use crate::repository::{CatalogRepositoryImpl, StagingRepositoryImpl, StagingRepository};
use serde::{Deserialize, Serialize};
use std::error::Error;
use std::path::Path;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 列映射建议响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MappingResponse {
    /// 每个源列的建议（按列顺序）
    pub suggestions: Vec<MappingSuggestion>,
    /// 达到自动映射阈值的列映射
    pub mapping: ColumnMapping,
}

/// 表格导入响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableImportResponse {
    pub session: ImportSession,
    pub outcome: BatchImportOutcome,
    /// 本地化结果摘要
    pub summary: String,
}

/// 批量结果摘要（当前语言）
pub fn batch_summary(outcome: &BatchImportOutcome) -> String {
    let key = if outcome.created == 0 && outcome.skipped + outcome.failed > 0 {
        "import.batch_nothing_created"
    } else {
        "import.batch_summary"
    };
    let created = outcome.created.to_string();
    let skipped = outcome.skipped.to_string();
    let failed = outcome.failed.to_string();
    t_with_args(
        key,
        &[
            ("created", created.as_str()),
            ("skipped", skipped.as_str()),
            ("failed", failed.as_str()),
        ],
    )
}

/// 多文件摄取中单个文件的结果
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileIngestResult {
    pub path: String,
    pub table: Option<IngestedTable>,
    /// 本地化错误摘要
    pub error: Option<String>,
}

fn config_error(e: Box<dyn Error>) -> ApiError {
    ApiError::InternalError(format!("配置读取失败: {}", e))
}

/// 文件扩展名 → 导入方式
fn method_for_path(path: &str) -> ImportMethod {
    let ext = Path::new(path)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "xlsx" | "xls" => ImportMethod::Excel,
        _ => ImportMethod::Csv,
    }
}

// ==========================================
// ImportApi - 导入API
// ==========================================
pub struct ImportApi {
    staging_repo: Arc<StagingRepositoryImpl>,
    catalog_repo: Arc<CatalogRepositoryImpl>,
    config: Arc<ConfigManager>,
    events: OptionalEventPublisher,
    recalculator: Arc<dyn CompletionRecalculator>,
}

impl ImportApi {
    /// 创建新的ImportApi实例
    ///
    /// # 参数
    /// - staging_repo: 暂存仓储
    /// - catalog_repo: 商品目录查询
    /// - config: 配置管理器
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

    // ==========================================
    // 组件构造（读取配置）
    // ==========================================

    async fn ingestor(&self) -> ApiResult<UniversalFileIngestor> {
        let max_size = self
            .config
            .get_max_file_size_bytes()
            .await
            .map_err(config_error)?;
        let sample_lines = self
            .config
            .get_delimiter_sample_lines()
            .await
            .map_err(config_error)?;
        Ok(UniversalFileIngestor::new(max_size, sample_lines))
    }

    async fn sku_settings(&self) -> ApiResult<(usize, usize)> {
        let min_length = self.config.get_sku_min_length().await.map_err(config_error)?;
        let max_length = self.config.get_sku_max_length().await.map_err(config_error)?;
        Ok((min_length, max_length))
    }

    async fn sku_parser(&self) -> ApiResult<SkuListParserImpl> {
        let (min_length, max_length) = self.sku_settings().await?;
        let sample_lines = self
            .config
            .get_delimiter_sample_lines()
            .await
            .map_err(config_error)?;
        Ok(SkuListParserImpl::new(SkuParserSettings {
            min_length,
            max_length,
            sample_lines,
        }))
    }

    async fn mapper(&self) -> ApiResult<ColumnMapperImpl> {
        let settings = MappingSettings {
            auto_map_threshold: self.config.get_auto_map_threshold().await.map_err(config_error)?,
            suggestion_threshold: self
                .config
                .get_suggestion_threshold()
                .await
                .map_err(config_error)?,
            max_alternates: self.config.get_max_alternates().await.map_err(config_error)?,
        };
        Ok(ColumnMapperImpl::new(Box::new(DefaultFieldCatalog), settings))
    }

    async fn processor(
        &self,
    ) -> ApiResult<BatchImportProcessor<StagingRepositoryImpl, CatalogRepositoryImpl>> {
        let (sku_min_length, sku_max_length) = self.sku_settings().await?;
        Ok(
            BatchImportProcessor::new(self.staging_repo.clone(), self.catalog_repo.clone())
                .with_settings(BatchSettings {
                    sku_min_length,
                    sku_max_length,
                })
                .with_event_publisher(self.events.clone())
                .with_recalculator(self.recalculator.clone()),
        )
    }

    // ==========================================
    // 摄取
    // ==========================================

    /// 摄取原始字节
    ///
    /// # 返回
    /// - Err(ApiError::ParseError): 空内容/编码/格式错误（不返回部分结果）
    pub async fn ingest_bytes(
        &self,
        content: &[u8],
        request: &IngestRequest,
    ) -> ApiResult<IngestedTable> {
        let ingestor = self.ingestor().await?;
        ingestor.ingest(content, request).map_err(|e| {
            warn!(file = request.file_name.as_deref().unwrap_or("<pasted>"), error = %e, "文件摄取失败");
            ApiError::from(e)
        })
    }

    /// 从磁盘读取文件并摄取
    #[instrument(skip(self))]
    pub async fn ingest_file(
        &self,
        path: &str,
        declared_mime: Option<&str>,
    ) -> ApiResult<IngestedTable> {
        let content = match tokio::fs::read(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ImportError::FileNotFound(path.to_string()).into());
            }
            Err(e) => return Err(ImportError::from(e).into()),
        };

        let file_name = Path::new(path)
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or(path);
        self.ingest_bytes(&content, &IngestRequest::file(file_name, declared_mime))
            .await
    }

    /// 粘贴的 CSV 文本
    pub async fn ingest_text(&self, text: &str) -> ApiResult<IngestedTable> {
        let ingestor = self.ingestor().await?;
        Ok(ingestor.ingest_text(text)?)
    }

    /// 并发摄取多个文件（单个失败不影响其余）
    pub async fn ingest_files(&self, paths: &[String]) -> Vec<FileIngestResult> {
        use futures::future::join_all;

        info!(count = paths.len(), "开始批量摄取文件");

        let tasks = paths.iter().map(|path| async move {
            match self.ingest_file(path, None).await {
                Ok(table) => FileIngestResult {
                    path: path.clone(),
                    table: Some(table),
                    error: None,
                },
                Err(e) => {
                    error!(file = %path, error = %e, "文件摄取失败");
                    FileIngestResult {
                        path: path.clone(),
                        table: None,
                        error: Some(e.user_message()),
                    }
                }
            }
        });
        let results = join_all(tasks).await;

        info!(
            total = results.len(),
            success = results.iter().filter(|r| r.table.is_some()).count(),
            "批量摄取完成"
        );
        results
    }

    // ==========================================
    // SKU 列表
    // ==========================================

    /// 单列模式（separator: auto/tab/semicolon/comma/pipe）
    pub async fn parse_sku_list(&self, text: &str, separator: &str) -> ApiResult<SkuParseResult> {
        let separator = ListSeparator::parse(separator)
            .ok_or_else(|| ImportError::InvalidSeparator(separator.to_string()))?;
        let parser = self.sku_parser().await?;
        Ok(parser.parse_single_column(text, separator)?)
    }

    /// 纯 SKU 模式
    pub async fn parse_sku_only(&self, text: &str) -> ApiResult<SkuParseResult> {
        let parser = self.sku_parser().await?;
        Ok(parser.parse_sku_only(text)?)
    }

    /// 两列模式
    pub async fn parse_two_columns(
        &self,
        sku_text: &str,
        name_text: &str,
    ) -> ApiResult<SkuParseResult> {
        let parser = self.sku_parser().await?;
        Ok(parser.parse_two_columns(sku_text, name_text)?)
    }

    // ==========================================
    // 列映射
    // ==========================================

    /// 为表头生成映射建议
    pub async fn suggest_mapping(&self, headers: &[String]) -> ApiResult<MappingResponse> {
        let mapper = self.mapper().await?;
        let suggestions = mapper.suggest(headers);
        let mapping = mapper.auto_mapping(&suggestions);
        Ok(MappingResponse {
            suggestions,
            mapping,
        })
    }

    /// 校验映射并转换数据行
    ///
    /// # 返回
    /// - Err(ApiError::ValidationError): SKU 未映射 / 字段重复 / 未知字段（不落库）
    pub async fn prepare_rows(
        &self,
        table: &IngestedTable,
        mapping: &ColumnMapping,
    ) -> ApiResult<Vec<MappedRow>> {
        let mapper = self.mapper().await?;
        mapper.validate_mapping(mapping)?;
        Ok(mapper.apply_mapping(table, mapping))
    }

    // ==========================================
    // 会话与批量暂存
    // ==========================================

    pub async fn start_session(
        &self,
        method: ImportMethod,
        imported_by: &str,
    ) -> ApiResult<ImportSession> {
        let processor = self.processor().await?;
        Ok(processor.start_session(method, imported_by).await?)
    }

    /// 对已有会话执行一批导入
    pub async fn run_batch_import(
        &self,
        session_id: i64,
        rows: Vec<MappedRow>,
    ) -> ApiResult<BatchImportOutcome> {
        let processor = self.processor().await?;
        processor.process_batch(session_id, rows).await.map_err(|e| {
            error!(session_id, error = %e, "批量暂存失败");
            ApiError::from(e)
        })
    }

    /// 表格导入: 校验映射 → 新建会话 → 批量暂存
    #[instrument(skip(self, table, mapping), fields(rows = table.total_rows))]
    pub async fn import_table(
        &self,
        table: &IngestedTable,
        mapping: &ColumnMapping,
        method: ImportMethod,
        imported_by: &str,
    ) -> ApiResult<TableImportResponse> {
        let rows = self.prepare_rows(table, mapping).await?;
        let session = self.start_session(method, imported_by).await?;
        let outcome = self.run_batch_import(session.id, rows).await?;
        let session = self.get_session(session.id).await?;
        let summary = batch_summary(&outcome);
        Ok(TableImportResponse {
            session,
            outcome,
            summary,
        })
    }

    /// 文件导入: 摄取 → 自动映射 → 表格导入
    pub async fn import_file(&self, path: &str, imported_by: &str) -> ApiResult<TableImportResponse> {
        let table = self.ingest_file(path, None).await?;
        let MappingResponse { mapping, .. } = self.suggest_mapping(&table.headers).await?;
        self.import_table(&table, &mapping, method_for_path(path), imported_by)
            .await
    }

    /// SKU 列表导入（PASTE_SKU 会话）
    pub async fn import_sku_items(
        &self,
        items: &[ParsedSkuItem],
        imported_by: &str,
    ) -> ApiResult<TableImportResponse> {
        if items.is_empty() {
            return Err(ImportError::EmptySkuInput.into());
        }
        let session = self.start_session(ImportMethod::PasteSku, imported_by).await?;
        let outcome = self
            .run_batch_import(session.id, rows_from_sku_items(items))
            .await?;
        let session = self.get_session(session.id).await?;
        let summary = batch_summary(&outcome);
        Ok(TableImportResponse {
            session,
            outcome,
            summary,
        })
    }

    pub async fn get_session(&self, session_id: i64) -> ApiResult<ImportSession> {
        self.staging_repo
            .find_session(session_id)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("导入会话(id={})不存在", session_id)))
    }

    /// 取消会话（仅活动会话）
    pub async fn cancel_session(&self, session_id: i64) -> ApiResult<ImportSession> {
        let mut session = self.get_session(session_id).await?;
        session
            .mark_as_cancelled(chrono::Utc::now())
            .map_err(|e| ApiError::InvalidStateTransition(e.to_string()))?;
        self.staging_repo.update_session(&session).await?;
        info!(session_id, "导入会话已取消");
        Ok(session)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_method_for_path() {
        assert_eq!(method_for_path("/tmp/a.XLSX"), ImportMethod::Excel);
        assert_eq!(method_for_path("/tmp/a.csv"), ImportMethod::Csv);
        assert_eq!(method_for_path("noext"), ImportMethod::Csv);
    }

    #[test]
    fn test_batch_summary_mentions_counts() {
        let outcome = BatchImportOutcome {
            session_id: 1,
            created: 4,
            skipped: 1,
            failed: 0,
            ..Default::default()
        };
        let summary = batch_summary(&outcome);
        assert!(summary.contains('4'));
        assert!(summary.contains('1'));
    }
}
