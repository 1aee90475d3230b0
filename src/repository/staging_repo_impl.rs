// ==========================================
// 商品导入暂存系统 - 暂存区 Repository 实现
// ==========================================
// 职责: 实现 import_session / pending_product 数据访问（使用 rusqlite）
// 存储: 派生结构以 JSON 文本列保存（serde 序列化）
// 红线: Repository 不含业务规则，只做数据 CRUD
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::import_session::{ImportSession, SessionErrorEntry};
use crate::domain::staging_product::StagingProduct;
use crate::domain::types::{ImportMethod, SessionStatus};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::staging_repo::StagingRepository;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

// ==========================================
// JSON 列工具
// ==========================================

fn to_json<T: Serialize>(column: &str, value: &T) -> RepositoryResult<String> {
    serde_json::to_string(value).map_err(|e| RepositoryError::SerializationError {
        column: column.to_string(),
        message: e.to_string(),
    })
}

fn to_json_opt<T: Serialize>(column: &str, value: &Option<T>) -> RepositoryResult<Option<String>> {
    value.as_ref().map(|v| to_json(column, v)).transpose()
}

fn from_json<T: DeserializeOwned>(column: &str, raw: &str) -> RepositoryResult<T> {
    serde_json::from_str(raw).map_err(|e| RepositoryError::SerializationError {
        column: column.to_string(),
        message: e.to_string(),
    })
}

fn from_json_opt<T: DeserializeOwned>(
    column: &str,
    raw: Option<String>,
) -> RepositoryResult<Option<T>> {
    match raw {
        Some(text) if !text.trim().is_empty() && text.trim() != "null" => {
            from_json(column, &text).map(Some)
        }
        _ => Ok(None),
    }
}

// ==========================================
// 行快照（原始列值，JSON 解析在闭包外完成）
// ==========================================

const SESSION_COLUMNS: &str = "id, uuid, session_name, import_method, status, total_rows, \
     created_count, skipped_count, failed_count, published_count, error_log, imported_by, \
     started_at, completed_at, created_at, updated_at";

struct SessionRow {
    id: i64,
    uuid: String,
    session_name: String,
    import_method: String,
    status: String,
    total_rows: i64,
    created_count: i64,
    skipped_count: i64,
    failed_count: i64,
    published_count: i64,
    error_log: String,
    imported_by: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl SessionRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            session_name: row.get(2)?,
            import_method: row.get(3)?,
            status: row.get(4)?,
            total_rows: row.get(5)?,
            created_count: row.get(6)?,
            skipped_count: row.get(7)?,
            failed_count: row.get(8)?,
            published_count: row.get(9)?,
            error_log: row.get(10)?,
            imported_by: row.get(11)?,
            started_at: row.get(12)?,
            completed_at: row.get(13)?,
            created_at: row.get(14)?,
            updated_at: row.get(15)?,
        })
    }

    fn into_domain(self) -> RepositoryResult<ImportSession> {
        let method = ImportMethod::from_db_str(&self.import_method).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "import_method".to_string(),
                message: self.import_method.clone(),
            }
        })?;
        let status = SessionStatus::from_db_str(&self.status).ok_or_else(|| {
            RepositoryError::FieldValueError {
                field: "status".to_string(),
                message: self.status.clone(),
            }
        })?;
        let error_log: Vec<SessionErrorEntry> = from_json("error_log", &self.error_log)?;

        Ok(ImportSession {
            id: self.id,
            uuid: self.uuid,
            session_name: self.session_name,
            method,
            status,
            total_rows: self.total_rows,
            created_count: self.created_count,
            skipped_count: self.skipped_count,
            failed_count: self.failed_count,
            published_count: self.published_count,
            error_log,
            imported_by: self.imported_by,
            started_at: self.started_at,
            completed_at: self.completed_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

const PRODUCT_COLUMNS: &str = "id, import_session_id, sku, name, product_type, manufacturer, \
     supplier_id, importer_id, supplier_code, ean, weight, height, width, length, base_price, \
     purchase_price, quantity, short_description, long_description, category, category_ids, \
     publication_targets, shop_categories, vin, engine_number, model, year, original_code, \
     replacement_code, temp_media_paths, variant_data, compatibility_data, feature_data, \
     price_data, skip_flags, skip_history, completion_status, imported_by, imported_at, updated_at";

struct ProductRow {
    id: i64,
    import_session_id: Option<i64>,
    sku: String,
    name: Option<String>,
    product_type: Option<String>,
    manufacturer: Option<String>,
    supplier_id: Option<String>,
    importer_id: Option<String>,
    supplier_code: Option<String>,
    ean: Option<String>,
    weight: Option<f64>,
    height: Option<f64>,
    width: Option<f64>,
    length: Option<f64>,
    base_price: Option<f64>,
    purchase_price: Option<f64>,
    quantity: Option<i64>,
    short_description: Option<String>,
    long_description: Option<String>,
    category: Option<String>,
    category_ids: String,
    publication_targets: String,
    shop_categories: String,
    vin: Option<String>,
    engine_number: Option<String>,
    model: Option<String>,
    year: Option<i32>,
    original_code: Option<String>,
    replacement_code: Option<String>,
    temp_media_paths: Option<String>,
    variant_data: Option<String>,
    compatibility_data: Option<String>,
    feature_data: Option<String>,
    price_data: Option<String>,
    skip_flags: String,
    skip_history: String,
    completion_status: String,
    imported_by: String,
    imported_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl ProductRow {
    fn read(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            import_session_id: row.get(1)?,
            sku: row.get(2)?,
            name: row.get(3)?,
            product_type: row.get(4)?,
            manufacturer: row.get(5)?,
            supplier_id: row.get(6)?,
            importer_id: row.get(7)?,
            supplier_code: row.get(8)?,
            ean: row.get(9)?,
            weight: row.get(10)?,
            height: row.get(11)?,
            width: row.get(12)?,
            length: row.get(13)?,
            base_price: row.get(14)?,
            purchase_price: row.get(15)?,
            quantity: row.get(16)?,
            short_description: row.get(17)?,
            long_description: row.get(18)?,
            category: row.get(19)?,
            category_ids: row.get(20)?,
            publication_targets: row.get(21)?,
            shop_categories: row.get(22)?,
            vin: row.get(23)?,
            engine_number: row.get(24)?,
            model: row.get(25)?,
            year: row.get(26)?,
            original_code: row.get(27)?,
            replacement_code: row.get(28)?,
            temp_media_paths: row.get(29)?,
            variant_data: row.get(30)?,
            compatibility_data: row.get(31)?,
            feature_data: row.get(32)?,
            price_data: row.get(33)?,
            skip_flags: row.get(34)?,
            skip_history: row.get(35)?,
            completion_status: row.get(36)?,
            imported_by: row.get(37)?,
            imported_at: row.get(38)?,
            updated_at: row.get(39)?,
        })
    }

    fn into_domain(self) -> RepositoryResult<StagingProduct> {
        Ok(StagingProduct {
            id: self.id,
            import_session_id: self.import_session_id,
            sku: self.sku,
            name: self.name,
            product_type: self.product_type,
            manufacturer: self.manufacturer,
            supplier_id: self.supplier_id,
            importer_id: self.importer_id,
            supplier_code: self.supplier_code,
            ean: self.ean,
            weight: self.weight,
            height: self.height,
            width: self.width,
            length: self.length,
            base_price: self.base_price,
            purchase_price: self.purchase_price,
            quantity: self.quantity,
            short_description: self.short_description,
            long_description: self.long_description,
            category: self.category,
            category_ids: from_json("category_ids", &self.category_ids)?,
            publication_targets: from_json("publication_targets", &self.publication_targets)?,
            shop_categories: from_json("shop_categories", &self.shop_categories)?,
            vin: self.vin,
            engine_number: self.engine_number,
            model: self.model,
            year: self.year,
            original_code: self.original_code,
            replacement_code: self.replacement_code,
            temp_media_paths: from_json_opt("temp_media_paths", self.temp_media_paths)?,
            variant_data: from_json_opt("variant_data", self.variant_data)?,
            compatibility_data: from_json_opt("compatibility_data", self.compatibility_data)?,
            feature_data: from_json_opt("feature_data", self.feature_data)?,
            price_data: from_json_opt("price_data", self.price_data)?,
            skip_flags: from_json("skip_flags", &self.skip_flags)?,
            skip_history: from_json("skip_history", &self.skip_history)?,
            completion_status: from_json("completion_status", &self.completion_status)?,
            imported_by: self.imported_by,
            imported_at: self.imported_at,
            updated_at: self.updated_at,
        })
    }
}

/// 已序列化的 JSON 列
struct ProductJson {
    category_ids: String,
    publication_targets: String,
    shop_categories: String,
    temp_media_paths: Option<String>,
    variant_data: Option<String>,
    compatibility_data: Option<String>,
    feature_data: Option<String>,
    price_data: Option<String>,
    skip_flags: String,
    skip_history: String,
    completion_status: String,
}

impl ProductJson {
    fn from_product(p: &StagingProduct) -> RepositoryResult<Self> {
        Ok(Self {
            category_ids: to_json("category_ids", &p.category_ids)?,
            publication_targets: to_json("publication_targets", &p.publication_targets)?,
            shop_categories: to_json("shop_categories", &p.shop_categories)?,
            temp_media_paths: to_json_opt("temp_media_paths", &p.temp_media_paths)?,
            variant_data: to_json_opt("variant_data", &p.variant_data)?,
            compatibility_data: to_json_opt("compatibility_data", &p.compatibility_data)?,
            feature_data: to_json_opt("feature_data", &p.feature_data)?,
            price_data: to_json_opt("price_data", &p.price_data)?,
            skip_flags: to_json("skip_flags", &p.skip_flags)?,
            skip_history: to_json("skip_history", &p.skip_history)?,
            completion_status: to_json("completion_status", &p.completion_status)?,
        })
    }
}

// ==========================================
// StagingRepositoryImpl
// ==========================================
pub struct StagingRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl StagingRepositoryImpl {
    /// 创建新的 Repository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入暂存商品（可在事务内调用）
    fn insert_product_tx(conn: &Connection, p: &StagingProduct) -> RepositoryResult<i64> {
        let json = ProductJson::from_product(p)?;
        conn.execute(
            r#"
            INSERT INTO pending_product (
                import_session_id, sku, name, product_type, manufacturer,
                supplier_id, importer_id, supplier_code, ean, weight, height, width, length,
                base_price, purchase_price, quantity, short_description, long_description,
                category, category_ids, publication_targets, shop_categories, vin,
                engine_number, model, year, original_code, replacement_code, temp_media_paths,
                variant_data, compatibility_data, feature_data, price_data, skip_flags,
                skip_history, completion_status, imported_by, imported_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17,
                ?18, ?19, ?20, ?21, ?22, ?23, ?24, ?25, ?26, ?27, ?28, ?29, ?30, ?31, ?32,
                ?33, ?34, ?35, ?36, ?37, ?38, ?39
            )
            "#,
            params![
                p.import_session_id,
                p.sku,
                p.name,
                p.product_type,
                p.manufacturer,
                p.supplier_id,
                p.importer_id,
                p.supplier_code,
                p.ean,
                p.weight,
                p.height,
                p.width,
                p.length,
                p.base_price,
                p.purchase_price,
                p.quantity,
                p.short_description,
                p.long_description,
                p.category,
                json.category_ids,
                json.publication_targets,
                json.shop_categories,
                p.vin,
                p.engine_number,
                p.model,
                p.year,
                p.original_code,
                p.replacement_code,
                json.temp_media_paths,
                json.variant_data,
                json.compatibility_data,
                json.feature_data,
                json.price_data,
                json.skip_flags,
                json.skip_history,
                json.completion_status,
                p.imported_by,
                p.imported_at,
                p.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 覆盖写入暂存商品（可在事务内调用）
    fn update_product_tx(conn: &Connection, p: &StagingProduct) -> RepositoryResult<()> {
        let json = ProductJson::from_product(p)?;
        let affected = conn.execute(
            r#"
            UPDATE pending_product SET
                import_session_id = ?2, sku = ?3, name = ?4, product_type = ?5,
                manufacturer = ?6, supplier_id = ?7, importer_id = ?8, supplier_code = ?9,
                ean = ?10, weight = ?11, height = ?12, width = ?13, length = ?14,
                base_price = ?15, purchase_price = ?16, quantity = ?17,
                short_description = ?18, long_description = ?19, category = ?20,
                category_ids = ?21, publication_targets = ?22, shop_categories = ?23,
                vin = ?24, engine_number = ?25, model = ?26, year = ?27, original_code = ?28,
                replacement_code = ?29, temp_media_paths = ?30, variant_data = ?31,
                compatibility_data = ?32, feature_data = ?33, price_data = ?34,
                skip_flags = ?35, skip_history = ?36, completion_status = ?37,
                updated_at = ?38
            WHERE id = ?1
            "#,
            params![
                p.id,
                p.import_session_id,
                p.sku,
                p.name,
                p.product_type,
                p.manufacturer,
                p.supplier_id,
                p.importer_id,
                p.supplier_code,
                p.ean,
                p.weight,
                p.height,
                p.width,
                p.length,
                p.base_price,
                p.purchase_price,
                p.quantity,
                p.short_description,
                p.long_description,
                p.category,
                json.category_ids,
                json.publication_targets,
                json.shop_categories,
                p.vin,
                p.engine_number,
                p.model,
                p.year,
                p.original_code,
                p.replacement_code,
                json.temp_media_paths,
                json.variant_data,
                json.compatibility_data,
                json.feature_data,
                json.price_data,
                json.skip_flags,
                json.skip_history,
                json.completion_status,
                p.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "pending_product".to_string(),
                id: p.id.to_string(),
            });
        }
        Ok(())
    }

    fn query_products(
        conn: &Connection,
        where_clause: &str,
        params: &[&dyn rusqlite::ToSql],
    ) -> RepositoryResult<Vec<StagingProduct>> {
        let sql = format!(
            "SELECT {} FROM pending_product {} ORDER BY id",
            PRODUCT_COLUMNS, where_clause
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params, ProductRow::read)?
            .collect::<Result<Vec<_>, _>>()?;
        rows.into_iter().map(ProductRow::into_domain).collect()
    }
}

#[async_trait]
impl StagingRepository for StagingRepositoryImpl {
    // ===== 导入会话 =====

    async fn insert_session(&self, session: &ImportSession) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let error_log = to_json("error_log", &session.error_log)?;
        conn.execute(
            r#"
            INSERT INTO import_session (
                uuid, session_name, import_method, status, total_rows, created_count,
                skipped_count, failed_count, published_count, error_log, imported_by,
                started_at, completed_at, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            "#,
            params![
                session.uuid,
                session.session_name,
                session.method.to_db_str(),
                session.status.to_db_str(),
                session.total_rows,
                session.created_count,
                session.skipped_count,
                session.failed_count,
                session.published_count,
                error_log,
                session.imported_by,
                session.started_at,
                session.completed_at,
                session.created_at,
                session.updated_at,
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    async fn find_session(&self, session_id: i64) -> RepositoryResult<Option<ImportSession>> {
        let conn = self.get_conn()?;
        let sql = format!("SELECT {} FROM import_session WHERE id = ?1", SESSION_COLUMNS);
        let row = conn
            .query_row(&sql, params![session_id], SessionRow::read)
            .optional()?;
        row.map(SessionRow::into_domain).transpose()
    }

    async fn update_session(&self, session: &ImportSession) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        let error_log = to_json("error_log", &session.error_log)?;
        let affected = conn.execute(
            r#"
            UPDATE import_session SET
                session_name = ?2, status = ?3, total_rows = ?4, created_count = ?5,
                skipped_count = ?6, failed_count = ?7, published_count = ?8, error_log = ?9,
                started_at = ?10, completed_at = ?11, updated_at = ?12
            WHERE id = ?1
            "#,
            params![
                session.id,
                session.session_name,
                session.status.to_db_str(),
                session.total_rows,
                session.created_count,
                session.skipped_count,
                session.failed_count,
                session.published_count,
                error_log,
                session.started_at,
                session.completed_at,
                session.updated_at,
            ],
        )?;

        if affected == 0 {
            return Err(RepositoryError::NotFound {
                entity: "import_session".to_string(),
                id: session.id.to_string(),
            });
        }
        Ok(())
    }

    // ===== 暂存商品 =====

    async fn insert_product(&self, product: &StagingProduct) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        Self::insert_product_tx(&conn, product)
    }

    async fn insert_products_in_transaction(
        &self,
        products: &[StagingProduct],
    ) -> RepositoryResult<Vec<i64>> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        let mut ids = Vec::with_capacity(products.len());
        for product in products {
            // 出错时 tx 被 drop，自动回滚
            ids.push(Self::insert_product_tx(&tx, product)?);
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(ids)
    }

    async fn find_product(&self, product_id: i64) -> RepositoryResult<Option<StagingProduct>> {
        let conn = self.get_conn()?;
        let mut products = Self::query_products(&conn, "WHERE id = ?1", params![product_id])?;
        Ok(products.pop())
    }

    async fn find_product_by_sku(&self, sku: &str) -> RepositoryResult<Option<StagingProduct>> {
        let conn = self.get_conn()?;
        let normalized = sku.trim().to_uppercase();
        let products =
            Self::query_products(&conn, "WHERE UPPER(sku) = ?1", params![normalized])?;
        Ok(products.into_iter().next())
    }

    async fn list_products_by_session(
        &self,
        session_id: i64,
    ) -> RepositoryResult<Vec<StagingProduct>> {
        let conn = self.get_conn()?;
        Self::query_products(&conn, "WHERE import_session_id = ?1", params![session_id])
    }

    async fn update_product(&self, product: &StagingProduct) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::update_product_tx(&conn, product)
    }

    async fn existing_staged_skus(&self, skus: &[String]) -> RepositoryResult<HashSet<String>> {
        if skus.is_empty() {
            return Ok(HashSet::new());
        }
        let conn = self.get_conn()?;
        let normalized: Vec<String> = skus.iter().map(|s| s.trim().to_uppercase()).collect();

        let mut found = HashSet::new();
        // SQLite 参数上限，分块查询
        for chunk in normalized.chunks(500) {
            let placeholders = vec!["?"; chunk.len()].join(", ");
            let sql = format!(
                "SELECT DISTINCT UPPER(sku) FROM pending_product WHERE UPPER(sku) IN ({})",
                placeholders
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                row.get::<_, String>(0)
            })?;
            for row in rows {
                found.insert(row?);
            }
        }
        Ok(found)
    }

    async fn update_products_in_transaction(
        &self,
        products: &[StagingProduct],
    ) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn
            .unchecked_transaction()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;

        for product in products {
            Self::update_product_tx(&tx, product)?;
        }

        tx.commit()
            .map_err(|e| RepositoryError::DatabaseTransactionError(e.to_string()))?;
        Ok(products.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;
    use crate::domain::compatibility::{CompatibilityData, CompatibilityEntry};
    use crate::domain::types::SkipFlag;

    fn repo() -> StagingRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        crate::db::configure_sqlite_connection(&conn).unwrap();
        init_schema(&conn).unwrap();
        StagingRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_session_round_trip() {
        let repo = repo();
        let now = Utc::now();
        let mut session = ImportSession::new(ImportMethod::Csv, "user-1", now);
        session.id = repo.insert_session(&session).await.unwrap();

        session.add_error("A1", "duplicate", now);
        session.mark_as_ready(3, 1, 0, now).unwrap();
        repo.update_session(&session).await.unwrap();

        let loaded = repo.find_session(session.id).await.unwrap().unwrap();
        assert_eq!(loaded.status, SessionStatus::Ready);
        assert_eq!(loaded.created_count, 3);
        assert_eq!(loaded.error_log.len(), 1);
        assert_eq!(loaded.uuid, session.uuid);
        assert!(repo.find_session(999).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_product_json_columns_round_trip() {
        let repo = repo();
        let now = Utc::now();
        let mut product = StagingProduct::new("ab-1", "user-1", now);
        product.name = Some("Brake pad".to_string());
        product.category_ids = vec![3, 7];
        product.compatibility_data = Some(CompatibilityData {
            version: 1,
            compatibilities: vec![CompatibilityEntry {
                vehicle_id: 10,
                vehicle_sku: "V-10".into(),
                vehicle_name: "Quad".into(),
                attribute_id: 1,
                attribute_name: "Original".into(),
                source_id: 1,
                source_name: "Manual".into(),
                notes: String::new(),
                classification: None,
            }],
            updated_at: now,
        });
        product.set_skip_flag(SkipFlag::SkipImages, true, "user-1", "Anna", now);
        product.recalculate_completion_status();

        product.id = repo.insert_product(&product).await.unwrap();
        let loaded = repo.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(loaded, product);

        let by_sku = repo.find_product_by_sku(" ab-1 ").await.unwrap().unwrap();
        assert_eq!(by_sku.id, product.id);
    }

    #[tokio::test]
    async fn test_batch_insert_rolls_back_on_failure() {
        let repo = repo();
        let now = Utc::now();
        let good = StagingProduct::new("OK-1", "u", now);
        let mut bad = StagingProduct::new("BAD-1", "u", now);
        // 外键违反
        bad.import_session_id = Some(4242);

        let result = repo
            .insert_products_in_transaction(&[good.clone(), bad])
            .await;
        assert!(result.is_err());
        assert!(repo.find_product_by_sku("OK-1").await.unwrap().is_none());

        let ids = repo.insert_products_in_transaction(&[good]).await.unwrap();
        assert_eq!(ids.len(), 1);
    }

    #[tokio::test]
    async fn test_existing_staged_skus_case_insensitive() {
        let repo = repo();
        let now = Utc::now();
        repo.insert_product(&StagingProduct::new("X-1", "u", now))
            .await
            .unwrap();

        let found = repo
            .existing_staged_skus(&["x-1".to_string(), "Y-2".to_string()])
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains("X-1"));
    }

    #[tokio::test]
    async fn test_update_in_transaction_unknown_id() {
        let repo = repo();
        let now = Utc::now();
        let mut product = StagingProduct::new("K-1", "u", now);
        product.id = repo.insert_product(&product).await.unwrap();
        product.name = Some("changed".into());

        let mut ghost = StagingProduct::new("G-1", "u", now);
        ghost.id = 777;

        let result = repo
            .update_products_in_transaction(&[product.clone(), ghost])
            .await;
        assert!(matches!(result, Err(RepositoryError::NotFound { .. })));

        let loaded = repo.find_product(product.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, None);
    }
}
