// ==========================================
// 商品导入暂存系统 - 批量暂存处理器
// ==========================================
// 职责: 已映射行 → 暂存商品（单事务，全有或全无）
// 流程: 载入会话 → 冲突集合查询 → 逐行校验/去重 → 事务写入 → 会话计数 → 事件
// 说明: 冲突检查先查后插，跨会话并发导入可能产生重复 SKU（无唯一约束）
// ==========================================

use crate::domain::batch::{BatchImportOutcome, RowIssue, RowIssueKind};
use crate::domain::import_session::ImportSession;
use crate::domain::ingest::ParsedSkuItem;
use crate::domain::mapping::MappedRow;
use crate::domain::staging_product::{normalize_sku, StagingProduct};
use crate::domain::types::ImportMethod;
use crate::engine::completion::{
    notify_recalculation, CompletionRecalculator, NoOpCompletionRecalculator,
};
use crate::engine::events::{OptionalEventPublisher, StagingEvent};
use crate::importer::error::{ImportError, ImportResult};
use crate::importer::sku_list_parser::validate_sku;
use crate::importer::staging_importer_trait::{BatchImporter, ValueCleaner as _};
use crate::importer::value_cleaner::ValueCleaner;
use crate::repository::{CatalogLookup, StagingRepository};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// 批量处理参数
#[derive(Debug, Clone)]
pub struct BatchSettings {
    pub sku_min_length: usize,
    pub sku_max_length: usize,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            sku_min_length: 2,
            sku_max_length: 64,
        }
    }
}

/// SKU 列表条目 → 已映射行（行号沿用列表行号）
pub fn rows_from_sku_items(items: &[ParsedSkuItem]) -> Vec<MappedRow> {
    items
        .iter()
        .map(|item| {
            let row = MappedRow::new(item.line_number).with("sku", &item.sku);
            match item.name.as_deref() {
                Some(name) if !name.trim().is_empty() => row.with("name", name),
                _ => row,
            }
        })
        .collect()
}

// ==========================================
// BatchImportProcessor
// ==========================================
pub struct BatchImportProcessor<R, L>
where
    R: StagingRepository,
    L: CatalogLookup,
{
    staging_repo: Arc<R>,
    catalog: Arc<L>,
    cleaner: ValueCleaner,
    settings: BatchSettings,
    events: OptionalEventPublisher,
    recalculator: Arc<dyn CompletionRecalculator>,
}

impl<R, L> BatchImportProcessor<R, L>
where
    R: StagingRepository,
    L: CatalogLookup,
{
    /// 创建处理器（默认参数、不发布事件、空操作完成度重算）
    pub fn new(staging_repo: Arc<R>, catalog: Arc<L>) -> Self {
        Self {
            staging_repo,
            catalog,
            cleaner: ValueCleaner,
            settings: BatchSettings::default(),
            events: OptionalEventPublisher::none(),
            recalculator: Arc::new(NoOpCompletionRecalculator),
        }
    }

    pub fn with_settings(mut self, settings: BatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn with_event_publisher(mut self, events: OptionalEventPublisher) -> Self {
        self.events = events;
        self
    }

    pub fn with_recalculator(mut self, recalculator: Arc<dyn CompletionRecalculator>) -> Self {
        self.recalculator = recalculator;
        self
    }

    /// 新建导入会话（状态 PARSING）
    #[instrument(skip(self))]
    pub async fn start_session(
        &self,
        method: ImportMethod,
        imported_by: &str,
    ) -> ImportResult<ImportSession> {
        let mut session = ImportSession::new(method, imported_by, Utc::now());
        session.id = self.staging_repo.insert_session(&session).await?;
        info!(session_id = session.id, uuid = %session.uuid, "导入会话已创建");
        Ok(session)
    }

    fn text(&self, row: &MappedRow, field: &str) -> Option<String> {
        self.cleaner.normalize_null(row.get(field))
    }

    fn decimal(&self, row: &MappedRow, field: &str) -> Option<f64> {
        self.cleaner.parse_decimal(row.get(field))
    }

    /// 由已映射行构造暂存商品
    fn build_product(
        &self,
        sku: &str,
        row: &MappedRow,
        session: &ImportSession,
        now: DateTime<Utc>,
    ) -> StagingProduct {
        let mut product = StagingProduct::new(sku, &session.imported_by, now);
        product.import_session_id = Some(session.id);

        product.name = self.text(row, "name");
        product.product_type = self.text(row, "product_type");
        product.manufacturer = self.text(row, "manufacturer");
        product.supplier_id = self.text(row, "supplier_id");
        product.importer_id = self.text(row, "importer_id");
        product.supplier_code = self.text(row, "supplier_code");
        product.ean = self.text(row, "ean");

        product.weight = self.decimal(row, "weight");
        product.height = self.decimal(row, "height");
        product.width = self.decimal(row, "width");
        product.length = self.decimal(row, "length");
        product.base_price = self.decimal(row, "price");
        product.purchase_price = self.decimal(row, "purchase_price");
        product.quantity = self.cleaner.parse_integer(row.get("quantity"));

        product.short_description = self.text(row, "short_description");
        product.long_description = self.text(row, "long_description");
        product.category = self.text(row, "category");

        product.vin = self.text(row, "vin");
        product.engine_number = self.text(row, "engine_number");
        product.model = self.text(row, "model");
        product.year = self.cleaner.parse_year(row.get("year"));
        product.original_code = self.text(row, "original_code");
        product.replacement_code = self.text(row, "replacement_code");

        product.recalculate_completion_status();
        product
    }

    /// 逐行分类: 失败 / 跳过 / 待创建
    fn classify_rows(
        &self,
        rows: &[MappedRow],
        catalog_skus: &HashSet<String>,
        staged_skus: &HashSet<String>,
        session: &ImportSession,
        now: DateTime<Utc>,
    ) -> (Vec<StagingProduct>, Vec<RowIssue>) {
        let mut products = Vec::new();
        let mut issues = Vec::new();
        let mut batch_skus = HashSet::new();

        for row in rows {
            let raw = row.get("sku").unwrap_or_default();
            let sku = normalize_sku(raw);

            let issue = if sku.is_empty() {
                Some((RowIssueKind::MissingSku, "SKU 为空".to_string()))
            } else if let Err(message) =
                validate_sku(&sku, self.settings.sku_min_length, self.settings.sku_max_length)
            {
                Some((RowIssueKind::InvalidSku, message))
            } else if catalog_skus.contains(&sku) {
                Some((
                    RowIssueKind::DuplicateInCatalog,
                    "SKU 已存在于商品目录".to_string(),
                ))
            } else if staged_skus.contains(&sku) || batch_skus.contains(&sku) {
                Some((
                    RowIssueKind::DuplicateInStaging,
                    "SKU 已存在于暂存区".to_string(),
                ))
            } else {
                None
            };

            match issue {
                Some((kind, message)) => {
                    debug!(row_number = row.row_number, sku = %sku, kind = ?kind, "行被跳过");
                    issues.push(RowIssue {
                        row_number: row.row_number,
                        sku,
                        kind,
                        message,
                    });
                }
                None => {
                    batch_skus.insert(sku.clone());
                    products.push(self.build_product(&sku, row, session, now));
                }
            }
        }

        (products, issues)
    }

    /// 持久化失败: 会话标记 FAILED（在已回滚的事务之外）
    async fn fail_session(&self, session: &mut ImportSession, message: &str) {
        let now = Utc::now();
        if let Err(e) = session.mark_as_failed(message, now) {
            warn!(session_id = session.id, error = %e, "会话状态无法置为 FAILED");
            return;
        }
        if let Err(e) = self.staging_repo.update_session(session).await {
            error!(session_id = session.id, error = %e, "会话失败状态写入失败");
        }
        self.events.publish(StagingEvent::BatchFailed {
            session_id: session.id,
            message: message.to_string(),
        });
    }
}

#[async_trait]
impl<R, L> BatchImporter for BatchImportProcessor<R, L>
where
    R: StagingRepository + Send + Sync,
    L: CatalogLookup + Send + Sync,
{
    #[instrument(skip(self, rows), fields(row_count = rows.len()))]
    async fn process_batch(
        &self,
        session_id: i64,
        rows: Vec<MappedRow>,
    ) -> ImportResult<BatchImportOutcome> {
        let mut session = self
            .staging_repo
            .find_session(session_id)
            .await?
            .ok_or_else(|| ImportError::InvalidSessionState(format!("会话不存在: {}", session_id)))?;

        let now = Utc::now();
        session
            .mark_as_parsing(now)
            .map_err(|e| ImportError::InvalidSessionState(e.to_string()))?;
        self.staging_repo.update_session(&session).await?;

        info!(session_id, rows = rows.len(), "开始批量暂存");

        // === 冲突集合 ===
        let skus: Vec<String> = rows
            .iter()
            .filter_map(|r| r.get("sku"))
            .map(normalize_sku)
            .collect();

        let conflict_sets = async {
            let catalog = self.catalog.existing_skus(&skus).await?;
            let staged = self.staging_repo.existing_staged_skus(&skus).await?;
            Ok::<_, crate::repository::RepositoryError>((catalog, staged))
        }
        .await;
        let (catalog_skus, staged_skus) = match conflict_sets {
            Ok(sets) => sets,
            Err(e) => {
                let message = e.to_string();
                error!(session_id, error = %message, "冲突集合查询失败");
                self.fail_session(&mut session, &message).await;
                return Err(ImportError::PersistenceError(message));
            }
        };

        // === 逐行分类 ===
        let (mut products, issues) =
            self.classify_rows(&rows, &catalog_skus, &staged_skus, &session, now);

        // === 单事务写入 ===
        let ids = match self
            .staging_repo
            .insert_products_in_transaction(&products)
            .await
        {
            Ok(ids) => ids,
            Err(e) => {
                let message = e.to_string();
                error!(session_id, error = %message, "批量写入失败，已回滚");
                self.fail_session(&mut session, &message).await;
                return Err(ImportError::PersistenceError(message));
            }
        };
        for (product, id) in products.iter_mut().zip(ids.iter()) {
            product.id = *id;
        }

        let created = products.len();
        let skipped = issues.iter().filter(|i| i.kind.is_conflict()).count();
        let failed = issues.len() - skipped;

        // === 会话计数与错误日志 ===
        let finished_at = Utc::now();
        session.total_rows += rows.len() as i64;
        for issue in &issues {
            let identifier = if issue.sku.is_empty() {
                format!("row {}", issue.row_number)
            } else {
                issue.sku.clone()
            };
            session.add_error(&identifier, &issue.message, finished_at);
        }
        session
            .mark_as_ready(created as i64, skipped as i64, failed as i64, finished_at)
            .map_err(|e| ImportError::InvalidSessionState(e.to_string()))?;
        self.staging_repo.update_session(&session).await?;

        info!(session_id, created, skipped, failed, "批量暂存完成");

        self.events.publish(StagingEvent::BatchImported {
            session_id,
            created,
            skipped,
            failed,
        });
        for product in &products {
            notify_recalculation(self.recalculator.as_ref(), product);
        }

        Ok(BatchImportOutcome {
            session_id,
            created,
            skipped,
            failed,
            created_ids: ids,
            errors: issues,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{configure_sqlite_connection, init_schema};
    use crate::domain::types::SessionStatus;
    use crate::repository::{CatalogRepositoryImpl, StagingRepositoryImpl};
    use rusqlite::Connection;
    use std::sync::Mutex;

    type Processor = BatchImportProcessor<StagingRepositoryImpl, CatalogRepositoryImpl>;

    fn setup() -> (Processor, Arc<StagingRepositoryImpl>, Arc<CatalogRepositoryImpl>) {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        let conn = Arc::new(Mutex::new(conn));
        let staging = Arc::new(StagingRepositoryImpl::from_connection(conn.clone()));
        let catalog = Arc::new(CatalogRepositoryImpl::from_connection(conn));
        (
            BatchImportProcessor::new(staging.clone(), catalog.clone()),
            staging,
            catalog,
        )
    }

    #[tokio::test]
    async fn test_row_classification() {
        let (processor, staging, catalog) = setup();
        catalog.insert_catalog_product("CAT-1", "Existing", None).unwrap();
        let session = processor.start_session(ImportMethod::Csv, "u-1").await.unwrap();

        let rows = vec![
            MappedRow::new(1).with("sku", "new-1").with("price", "12,50 zł"),
            MappedRow::new(2).with("sku", "cat-1"),
            MappedRow::new(3).with("sku", "NEW-1"),
            MappedRow::new(4).with("sku", "bad sku!"),
            MappedRow::new(5).with("name", "no sku"),
        ];
        let outcome = processor.process_batch(session.id, rows).await.unwrap();

        assert_eq!(outcome.created, 1);
        assert_eq!(outcome.skipped, 2);
        assert_eq!(outcome.failed, 2);
        let kinds: Vec<RowIssueKind> = outcome.errors.iter().map(|i| i.kind).collect();
        assert_eq!(
            kinds,
            vec![
                RowIssueKind::DuplicateInCatalog,
                RowIssueKind::DuplicateInStaging,
                RowIssueKind::InvalidSku,
                RowIssueKind::MissingSku,
            ]
        );

        let product = staging.find_product(outcome.created_ids[0]).await.unwrap().unwrap();
        assert_eq!(product.sku, "NEW-1");
        assert_eq!(product.base_price, Some(12.5));
        assert_eq!(product.import_session_id, Some(session.id));
        assert_eq!(product.completion_status["base_price"], true);

        let stored = staging.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(stored.status, SessionStatus::Ready);
        assert_eq!(stored.total_rows, 5);
        assert_eq!(stored.error_log.len(), 4);
        assert_eq!(stored.error_log[3].identifier, "row 5");
    }

    #[tokio::test]
    async fn test_unknown_session_is_rejected() {
        let (processor, _, _) = setup();
        let err = processor.process_batch(42, vec![]).await.unwrap_err();
        assert!(matches!(err, ImportError::InvalidSessionState(_)));
    }

    #[test]
    fn test_rows_from_sku_items() {
        let items = vec![
            ParsedSkuItem {
                sku: "A1".to_string(),
                name: Some("Widget".to_string()),
                line_number: 1,
                is_duplicate: false,
            },
            ParsedSkuItem {
                sku: "A3".to_string(),
                name: Some(String::new()),
                line_number: 3,
                is_duplicate: false,
            },
        ];
        let rows = rows_from_sku_items(&items);
        assert_eq!(rows[0].get("name"), Some("Widget"));
        assert_eq!(rows[1].row_number, 3);
        assert_eq!(rows[1].get("name"), None);
    }
}
