// ==========================================
// 商品导入暂存系统 - SQLite 连接初始化与建表
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为（外键 + busy_timeout）
// - 提供幂等的建表入口，测试与 CLI 共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前建表脚本对应的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：
/// - foreign_keys 需要“每个连接”单独开启
/// - busy_timeout 需要“每个连接”单独配置
pub fn configure_sqlite_connection(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn)?;
    Ok(conn)
}

/// 建表 SQL
///
/// pending_product.sku 不加唯一约束: 去重由导入流程先查后插完成。
const SCHEMA_SQL: &str = r#"
CREATE TABLE IF NOT EXISTS schema_version (
    version     INTEGER PRIMARY KEY,
    applied_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_scope (
    scope_id    TEXT PRIMARY KEY,
    scope_type  TEXT NOT NULL,
    scope_key   TEXT NOT NULL,
    created_at  TEXT NOT NULL DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS config_kv (
    scope_id    TEXT NOT NULL REFERENCES config_scope(scope_id),
    key         TEXT NOT NULL,
    value       TEXT NOT NULL,
    updated_at  TEXT NOT NULL DEFAULT (datetime('now')),
    PRIMARY KEY (scope_id, key)
);

CREATE TABLE IF NOT EXISTS import_session (
    id               INTEGER PRIMARY KEY AUTOINCREMENT,
    uuid             TEXT NOT NULL UNIQUE,
    session_name     TEXT NOT NULL,
    import_method    TEXT NOT NULL,
    status           TEXT NOT NULL,
    total_rows       INTEGER NOT NULL DEFAULT 0,
    created_count    INTEGER NOT NULL DEFAULT 0,
    skipped_count    INTEGER NOT NULL DEFAULT 0,
    failed_count     INTEGER NOT NULL DEFAULT 0,
    published_count  INTEGER NOT NULL DEFAULT 0,
    error_log        TEXT NOT NULL DEFAULT '[]',
    imported_by      TEXT NOT NULL,
    started_at       TEXT,
    completed_at     TEXT,
    created_at       TEXT NOT NULL,
    updated_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS pending_product (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    import_session_id    INTEGER REFERENCES import_session(id),
    sku                  TEXT NOT NULL,
    name                 TEXT,
    product_type         TEXT,
    manufacturer         TEXT,
    supplier_id          TEXT,
    importer_id          TEXT,
    supplier_code        TEXT,
    ean                  TEXT,
    weight               REAL,
    height               REAL,
    width                REAL,
    length               REAL,
    base_price           REAL,
    purchase_price       REAL,
    quantity             INTEGER,
    short_description    TEXT,
    long_description     TEXT,
    category             TEXT,
    category_ids         TEXT NOT NULL DEFAULT '[]',
    publication_targets  TEXT NOT NULL DEFAULT '[]',
    shop_categories      TEXT NOT NULL DEFAULT '{}',
    vin                  TEXT,
    engine_number        TEXT,
    model                TEXT,
    year                 INTEGER,
    original_code        TEXT,
    replacement_code     TEXT,
    temp_media_paths     TEXT,
    variant_data         TEXT,
    compatibility_data   TEXT,
    feature_data         TEXT,
    price_data           TEXT,
    skip_flags           TEXT NOT NULL DEFAULT '[]',
    skip_history         TEXT NOT NULL DEFAULT '{}',
    completion_status    TEXT NOT NULL DEFAULT '{}',
    imported_by          TEXT NOT NULL,
    imported_at          TEXT NOT NULL,
    updated_at           TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_pending_product_sku ON pending_product(sku);
CREATE INDEX IF NOT EXISTS idx_pending_product_session ON pending_product(import_session_id);

CREATE TABLE IF NOT EXISTS catalog_product (
    id                  INTEGER PRIMARY KEY AUTOINCREMENT,
    sku                 TEXT NOT NULL UNIQUE,
    name                TEXT NOT NULL,
    compatibility_data  TEXT
);

CREATE TABLE IF NOT EXISTS attribute_type (
    id        INTEGER PRIMARY KEY AUTOINCREMENT,
    name      TEXT NOT NULL,
    code      TEXT NOT NULL UNIQUE,
    position  INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS attribute_value (
    id                   INTEGER PRIMARY KEY AUTOINCREMENT,
    attribute_type_id    INTEGER NOT NULL REFERENCES attribute_type(id),
    label                TEXT NOT NULL,
    color_hex            TEXT,
    auto_prefix          TEXT,
    auto_prefix_enabled  INTEGER NOT NULL DEFAULT 0,
    auto_suffix          TEXT,
    auto_suffix_enabled  INTEGER NOT NULL DEFAULT 0,
    position             INTEGER NOT NULL DEFAULT 0
);

CREATE TABLE IF NOT EXISTS vehicle (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    sku   TEXT NOT NULL,
    name  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS compatibility_attribute (
    id    INTEGER PRIMARY KEY AUTOINCREMENT,
    name  TEXT NOT NULL UNIQUE
);

INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
VALUES ('global', 'GLOBAL', 'global');
"#;

/// 建表（幂等）并写入 schema_version
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_SQL)?;
    conn.execute(
        "INSERT OR IGNORE INTO schema_version (version) VALUES (?1)",
        [CURRENT_SCHEMA_VERSION],
    )?;
    Ok(())
}

/// 读取 schema_version（若表不存在则返回 None）
pub fn read_schema_version(conn: &Connection) -> rusqlite::Result<Option<i64>> {
    let has_table: bool = conn
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version' LIMIT 1",
            [],
            |_row| Ok(true),
        )
        .optional()?
        .unwrap_or(false);

    if !has_table {
        return Ok(None);
    }

    let v: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), None);

        init_schema(&conn).unwrap();
        init_schema(&conn).unwrap();
        assert_eq!(
            read_schema_version(&conn).unwrap(),
            Some(CURRENT_SCHEMA_VERSION)
        );
    }
}
