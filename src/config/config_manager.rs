// ==========================================
// 商品导入暂存系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::import_config_trait::ImportConfigReader;
use crate::db::open_sqlite_connection;
use async_trait::async_trait;
use rusqlite::{params, Connection};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use thiserror::Error as ThisError;

/// 配置值格式错误
#[derive(ThisError, Debug)]
#[error("配置值格式错误 (key: {key}): {value}")]
pub struct ConfigValueError {
    pub key: String,
    pub value: String,
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    fn get_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 读取 global scope 的配置值（公开方法，供其他模块复用）
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        self.get_config_value(key)
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES ('global', ?1, ?2, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![key, value],
        )?;
        Ok(())
    }

    /// 从 config_kv 表读取配置值，带默认值
    fn get_config_or_default(&self, key: &str, default: &str) -> Result<String, Box<dyn Error>> {
        Ok(self.get_config_value(key)?.unwrap_or_else(|| default.to_string()))
    }

    /// 读取并解析为指定类型；缺失取默认值，格式错误返回 ConfigValueError
    fn get_parsed<T: FromStr>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>> {
        match self.get_config_value(key)? {
            None => Ok(default),
            Some(raw) => raw.trim().parse::<T>().map_err(|_| {
                Box::new(ConfigValueError {
                    key: key.to_string(),
                    value: raw.clone(),
                }) as Box<dyn Error>
            }),
        }
    }

    /// 获取所有 global 配置的快照（JSON）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }
}

#[async_trait]
impl ImportConfigReader for ConfigManager {
    // ===== 摄取 =====

    async fn get_max_file_size_bytes(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed(config_keys::MAX_FILE_SIZE_BYTES, defaults::MAX_FILE_SIZE_BYTES)
    }

    async fn get_max_image_size_bytes(&self) -> Result<u64, Box<dyn Error>> {
        self.get_parsed(config_keys::MAX_IMAGE_SIZE_BYTES, defaults::MAX_IMAGE_SIZE_BYTES)
    }

    async fn get_delimiter_sample_lines(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(
            config_keys::DELIMITER_SAMPLE_LINES,
            defaults::DELIMITER_SAMPLE_LINES,
        )
    }

    // ===== SKU =====

    async fn get_sku_min_length(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(config_keys::SKU_MIN_LENGTH, defaults::SKU_MIN_LENGTH)
    }

    async fn get_sku_max_length(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(config_keys::SKU_MAX_LENGTH, defaults::SKU_MAX_LENGTH)
    }

    // ===== 列映射 =====

    async fn get_auto_map_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed(config_keys::AUTO_MAP_THRESHOLD, defaults::AUTO_MAP_THRESHOLD)
    }

    async fn get_suggestion_threshold(&self) -> Result<f64, Box<dyn Error>> {
        self.get_parsed(
            config_keys::SUGGESTION_THRESHOLD,
            defaults::SUGGESTION_THRESHOLD,
        )
    }

    async fn get_max_alternates(&self) -> Result<usize, Box<dyn Error>> {
        self.get_parsed(config_keys::MAX_ALTERNATES, defaults::MAX_ALTERNATES)
    }

    // ===== 变体 / 本地化 =====

    async fn get_variant_default_separator(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(
            config_keys::VARIANT_DEFAULT_SEPARATOR,
            defaults::VARIANT_DEFAULT_SEPARATOR,
        )
    }

    async fn get_default_locale(&self) -> Result<String, Box<dyn Error>> {
        self.get_config_or_default(config_keys::DEFAULT_LOCALE, defaults::DEFAULT_LOCALE)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 摄取
    pub const MAX_FILE_SIZE_BYTES: &str = "import.max_file_size_bytes";
    pub const MAX_IMAGE_SIZE_BYTES: &str = "import.max_image_size_bytes";
    pub const DELIMITER_SAMPLE_LINES: &str = "import.delimiter_sample_lines";

    // SKU
    pub const SKU_MIN_LENGTH: &str = "import.sku_min_length";
    pub const SKU_MAX_LENGTH: &str = "import.sku_max_length";

    // 列映射
    pub const AUTO_MAP_THRESHOLD: &str = "mapping.auto_map_threshold";
    pub const SUGGESTION_THRESHOLD: &str = "mapping.suggestion_threshold";
    pub const MAX_ALTERNATES: &str = "mapping.max_alternates";

    // 变体
    pub const VARIANT_DEFAULT_SEPARATOR: &str = "variant.default_separator";

    // 本地化
    pub const DEFAULT_LOCALE: &str = "i18n.default_locale";
}

/// 默认值
pub mod defaults {
    pub const MAX_FILE_SIZE_BYTES: u64 = 50 * 1024 * 1024;
    pub const MAX_IMAGE_SIZE_BYTES: u64 = 10 * 1024 * 1024;
    pub const DELIMITER_SAMPLE_LINES: usize = 10;
    pub const SKU_MIN_LENGTH: usize = 2;
    pub const SKU_MAX_LENGTH: usize = 64;
    pub const AUTO_MAP_THRESHOLD: f64 = 0.7;
    pub const SUGGESTION_THRESHOLD: f64 = 0.5;
    pub const MAX_ALTERNATES: usize = 3;
    pub const VARIANT_DEFAULT_SEPARATOR: &str = "-";
    pub const DEFAULT_LOCALE: &str = "zh-CN";
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_schema;

    fn manager() -> ConfigManager {
        let conn = Connection::open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        ConfigManager::from_connection(Arc::new(Mutex::new(conn))).unwrap()
    }

    #[tokio::test]
    async fn test_defaults_when_missing() {
        let config = manager();
        assert_eq!(config.get_max_file_size_bytes().await.unwrap(), 52_428_800);
        assert_eq!(config.get_max_image_size_bytes().await.unwrap(), 10_485_760);
        assert_eq!(config.get_delimiter_sample_lines().await.unwrap(), 10);
        assert_eq!(config.get_sku_min_length().await.unwrap(), 2);
        assert_eq!(config.get_sku_max_length().await.unwrap(), 64);
        assert_eq!(config.get_auto_map_threshold().await.unwrap(), 0.7);
        assert_eq!(config.get_max_alternates().await.unwrap(), 3);
        assert_eq!(config.get_variant_default_separator().await.unwrap(), "-");
        assert_eq!(config.get_default_locale().await.unwrap(), "zh-CN");
    }

    #[tokio::test]
    async fn test_set_and_override() {
        let config = manager();
        config
            .set_global_config_value(config_keys::AUTO_MAP_THRESHOLD, "0.85")
            .unwrap();
        assert_eq!(config.get_auto_map_threshold().await.unwrap(), 0.85);

        config
            .set_global_config_value(config_keys::AUTO_MAP_THRESHOLD, "0.9")
            .unwrap();
        assert_eq!(config.get_auto_map_threshold().await.unwrap(), 0.9);

        let snapshot = config.get_config_snapshot().unwrap();
        assert!(snapshot.contains("mapping.auto_map_threshold"));
    }

    #[tokio::test]
    async fn test_malformed_value_is_error() {
        let config = manager();
        config
            .set_global_config_value(config_keys::SKU_MAX_LENGTH, "many")
            .unwrap();
        let err = config.get_sku_max_length().await.unwrap_err();
        assert!(err.to_string().contains("import.sku_max_length"));
    }
}
