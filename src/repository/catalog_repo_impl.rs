// ==========================================
// 商品导入暂存系统 - 商品目录查询实现
// ==========================================
// 职责: 实现 CatalogLookup（使用 rusqlite）
// 表: catalog_product / attribute_type / attribute_value / vehicle / compatibility_attribute
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::compatibility::{CompatibilityAttribute, CompatibilityData, VehicleInfo};
use crate::domain::variant::AttributeValueInfo;
use crate::repository::catalog_repo::CatalogLookup;
use crate::repository::error::{RepositoryError, RepositoryResult};
use async_trait::async_trait;
use chrono::Utc;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension};
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

/// 分块查询大小（SQLite 参数上限）
const CHUNK_SIZE: usize = 500;

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

// ==========================================
// CatalogRepositoryImpl
// ==========================================
pub struct CatalogRepositoryImpl {
    conn: Arc<Mutex<Connection>>,
}

impl CatalogRepositoryImpl {
    /// 创建新的 Repository 实例
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

    // ===== 目录数据写入（初始化/测试数据） =====

    /// 插入目录商品
    pub fn insert_catalog_product(
        &self,
        sku: &str,
        name: &str,
        compatibility: Option<&CompatibilityData>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let compatibility_json = compatibility
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| RepositoryError::SerializationError {
                column: "compatibility_data".to_string(),
                message: e.to_string(),
            })?;
        conn.execute(
            "INSERT INTO catalog_product (sku, name, compatibility_data) VALUES (?1, ?2, ?3)",
            params![sku.trim().to_uppercase(), name, compatibility_json],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入属性类型
    pub fn insert_attribute_type(&self, name: &str, code: &str, position: i64) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO attribute_type (name, code, position) VALUES (?1, ?2, ?3)",
            params![name, code, position],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入属性值
    ///
    /// # 参数
    /// - auto_prefix / auto_suffix: (token, enabled)
    pub fn insert_attribute_value(
        &self,
        attribute_type_id: i64,
        label: &str,
        color_hex: Option<&str>,
        auto_prefix: Option<(&str, bool)>,
        auto_suffix: Option<(&str, bool)>,
    ) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO attribute_value (
                attribute_type_id, label, color_hex,
                auto_prefix, auto_prefix_enabled, auto_suffix, auto_suffix_enabled, position
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7,
                (SELECT COALESCE(MAX(position), 0) + 1 FROM attribute_value WHERE attribute_type_id = ?1))
            "#,
            params![
                attribute_type_id,
                label,
                color_hex,
                auto_prefix.map(|(t, _)| t),
                auto_prefix.map(|(_, e)| e).unwrap_or(false),
                auto_suffix.map(|(t, _)| t),
                auto_suffix.map(|(_, e)| e).unwrap_or(false),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入车辆
    pub fn insert_vehicle(&self, sku: &str, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO vehicle (sku, name) VALUES (?1, ?2)",
            params![sku, name],
        )?;
        Ok(conn.last_insert_rowid())
    }

    /// 插入适配属性（同名已存在时返回已有 id）
    pub fn ensure_compatibility_attribute(&self, name: &str) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR IGNORE INTO compatibility_attribute (name) VALUES (?1)",
            params![name],
        )?;
        let id = conn.query_row(
            "SELECT id FROM compatibility_attribute WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

#[async_trait]
impl CatalogLookup for CatalogRepositoryImpl {
    async fn sku_exists(&self, sku: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let found: Option<i64> = conn
            .query_row(
                "SELECT 1 FROM catalog_product WHERE UPPER(sku) = ?1 LIMIT 1",
                params![sku.trim().to_uppercase()],
                |row| row.get(0),
            )
            .optional()?;
        Ok(found.is_some())
    }

    async fn existing_skus(&self, skus: &[String]) -> RepositoryResult<HashSet<String>> {
        let conn = self.get_conn()?;
        let normalized: Vec<String> = skus.iter().map(|s| s.trim().to_uppercase()).collect();

        let mut found = HashSet::new();
        for chunk in normalized.chunks(CHUNK_SIZE) {
            let sql = format!(
                "SELECT UPPER(sku) FROM catalog_product WHERE UPPER(sku) IN ({})",
                placeholders(chunk.len())
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

    async fn compatibility_by_sku(
        &self,
        sku: &str,
    ) -> RepositoryResult<Option<CompatibilityData>> {
        let conn = self.get_conn()?;
        let raw: Option<Option<String>> = conn
            .query_row(
                "SELECT compatibility_data FROM catalog_product WHERE UPPER(sku) = ?1",
                params![sku.trim().to_uppercase()],
                |row| row.get(0),
            )
            .optional()?;

        match raw {
            None => Ok(None),
            Some(None) => Ok(Some(CompatibilityData {
                version: crate::domain::compatibility::COMPATIBILITY_DATA_VERSION,
                compatibilities: Vec::new(),
                updated_at: Utc::now(),
            })),
            Some(Some(text)) => serde_json::from_str(&text).map(Some).map_err(|e| {
                RepositoryError::SerializationError {
                    column: "compatibility_data".to_string(),
                    message: e.to_string(),
                }
            }),
        }
    }

    async fn attribute_values(
        &self,
        value_ids: &[i64],
    ) -> RepositoryResult<Vec<AttributeValueInfo>> {
        let conn = self.get_conn()?;
        let mut values = Vec::new();
        for chunk in value_ids.chunks(CHUNK_SIZE) {
            let sql = format!(
                r#"
                SELECT v.id, v.attribute_type_id, t.name, t.code, v.label, v.color_hex,
                       v.auto_prefix, v.auto_prefix_enabled, v.auto_suffix, v.auto_suffix_enabled
                FROM attribute_value v
                JOIN attribute_type t ON t.id = v.attribute_type_id
                WHERE v.id IN ({})
                ORDER BY t.position, v.position, v.id
                "#,
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok(AttributeValueInfo {
                    value_id: row.get(0)?,
                    attribute_type_id: row.get(1)?,
                    attribute_type_name: row.get(2)?,
                    attribute_type_code: row.get(3)?,
                    label: row.get(4)?,
                    color_hex: row.get(5)?,
                    auto_prefix: row.get(6)?,
                    auto_prefix_enabled: row.get(7)?,
                    auto_suffix: row.get(8)?,
                    auto_suffix_enabled: row.get(9)?,
                })
            })?;
            for row in rows {
                values.push(row?);
            }
        }
        Ok(values)
    }

    async fn vehicles(&self, vehicle_ids: &[i64]) -> RepositoryResult<Vec<VehicleInfo>> {
        let conn = self.get_conn()?;
        let mut vehicles = Vec::new();
        for chunk in vehicle_ids.chunks(CHUNK_SIZE) {
            let sql = format!(
                "SELECT id, sku, name FROM vehicle WHERE id IN ({}) ORDER BY id",
                placeholders(chunk.len())
            );
            let mut stmt = conn.prepare(&sql)?;
            let rows = stmt.query_map(params_from_iter(chunk.iter()), |row| {
                Ok(VehicleInfo {
                    vehicle_id: row.get(0)?,
                    sku: row.get(1)?,
                    name: row.get(2)?,
                })
            })?;
            for row in rows {
                vehicles.push(row?);
            }
        }
        Ok(vehicles)
    }

    async fn compatibility_attributes(&self) -> RepositoryResult<Vec<CompatibilityAttribute>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare("SELECT id, name FROM compatibility_attribute ORDER BY id")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(CompatibilityAttribute {
                    id: row.get(0)?,
                    name: row.get(1)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn repo() -> CatalogRepositoryImpl {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        CatalogRepositoryImpl::from_connection(Arc::new(Mutex::new(conn)))
    }

    #[tokio::test]
    async fn test_sku_lookup_is_case_insensitive() {
        let repo = repo();
        repo.insert_catalog_product("abc-1", "Existing", None).unwrap();

        assert!(repo.sku_exists("ABC-1").await.unwrap());
        assert!(!repo.sku_exists("ABC-2").await.unwrap());

        let found = repo
            .existing_skus(&["abc-1".into(), "zzz".into()])
            .await
            .unwrap();
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec!["ABC-1".to_string()]);

        let compat = repo.compatibility_by_sku("abc-1").await.unwrap().unwrap();
        assert!(compat.is_empty());
        assert!(repo.compatibility_by_sku("nope").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_attribute_values_join_type() {
        let repo = repo();
        let color = repo.insert_attribute_type("Kolor", "color", 1).unwrap();
        let red = repo
            .insert_attribute_value(color, "Red", Some("#ff0000"), Some(("R", true)), None)
            .unwrap();

        let values = repo.attribute_values(&[red, 999]).await.unwrap();
        assert_eq!(values.len(), 1);
        assert_eq!(values[0].attribute_type_code, "color");
        assert_eq!(values[0].enabled_prefix(), Some("R"));
        assert_eq!(values[0].enabled_suffix(), None);
    }

    #[tokio::test]
    async fn test_compatibility_attribute_is_idempotent() {
        let repo = repo();
        let first = repo.ensure_compatibility_attribute("Oryginał").unwrap();
        let second = repo.ensure_compatibility_attribute("Oryginał").unwrap();
        assert_eq!(first, second);
        assert_eq!(repo.compatibility_attributes().await.unwrap().len(), 1);
    }
}
