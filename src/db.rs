// ==========================================
// 建材价格解析引擎 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，查询/事务等待上限由存储自身约束
// - 统一建表（幂等），引擎只依赖这里定义的表结构
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
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

/// 建表（幂等）并登记 schema_version
///
/// 表:
/// - material / tier_assignment / price_revision / commodity_price / customer_override
/// - config_kv（配置）
/// - schema_version
pub fn ensure_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS material (
            material_id TEXT PRIMARY KEY,
            sku TEXT NOT NULL,
            description TEXT,
            category_code INTEGER CHECK (category_code IS NULL OR category_code BETWEEN 1 AND 15),
            vendor_cost REAL,
            is_commodity_linked INTEGER NOT NULL DEFAULT 0,
            commodity_tag TEXT,
            commodity_base_price REAL,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS tier_assignment (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            customer_id TEXT NOT NULL,
            category_code INTEGER NOT NULL CHECK (category_code BETWEEN 1 AND 15),
            tier TEXT NOT NULL,
            effective_from TEXT NOT NULL,
            effective_until TEXT,
            created_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_tier_assignment_lookup
            ON tier_assignment(customer_id, category_code, effective_from);

        CREATE TABLE IF NOT EXISTS price_revision (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            material_id TEXT NOT NULL REFERENCES material(material_id),
            revision_number INTEGER NOT NULL,
            revision_type TEXT NOT NULL,
            tier_prices TEXT NOT NULL,
            vendor_cost REAL NOT NULL,
            freight REAL NOT NULL,
            base_margin REAL NOT NULL,
            commodity_factor REAL,
            effective_from TEXT NOT NULL,
            expires_at TEXT,
            created_at TEXT NOT NULL,
            UNIQUE (material_id, revision_number)
        );

        CREATE INDEX IF NOT EXISTS idx_price_revision_lookup
            ON price_revision(material_id, effective_from);

        CREATE TABLE IF NOT EXISTS commodity_price (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag TEXT NOT NULL,
            price REAL NOT NULL,
            effective_from TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_commodity_price_lookup
            ON commodity_price(tag, effective_from);

        CREATE TABLE IF NOT EXISTS customer_override (
            customer_id TEXT NOT NULL,
            material_id TEXT NOT NULL,
            override_price REAL,
            updated_at TEXT NOT NULL,
            PRIMARY KEY (customer_id, material_id)
        );
        "#,
    )?;

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

    let v: Option<i64> = conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_schema_is_idempotent() {
        let conn = Connection::open_in_memory().unwrap();
        configure_sqlite_connection(&conn).unwrap();

        assert_eq!(read_schema_version(&conn).unwrap(), None);
        ensure_schema(&conn).unwrap();
        ensure_schema(&conn).unwrap();
        assert_eq!(read_schema_version(&conn).unwrap(), Some(CURRENT_SCHEMA_VERSION));
    }
}
