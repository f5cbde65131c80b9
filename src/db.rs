// ==========================================
// 展会访客分析导出 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为
// - 统一 busy_timeout，避免查询在锁竞争时无限等待
// - 提供只读分析库的建表脚本（测试/本地演示使用）
// ==========================================

use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 配置 SQLite 连接的统一 PRAGMA
///
/// 说明：busy_timeout 需要"每个连接"单独配置
pub fn configure_sqlite_connection(conn: &Connection, busy_timeout: Duration) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(busy_timeout)?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn, Duration::from_millis(DEFAULT_BUSY_TIMEOUT_MS))?;
    Ok(conn)
}

/// 创建分析库表结构（幂等）
///
/// entry_exit_log.building_id 不设外键: 楼栋缺失的入场记录本身就是异常报表的统计对象
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS building (
            building_id TEXT PRIMARY KEY,
            dept_name TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS entry_exit_log (
            log_id INTEGER PRIMARY KEY AUTOINCREMENT,
            tag_id TEXT NOT NULL,
            building_id TEXT NOT NULL,
            entry_time TEXT NOT NULL,
            exit_time TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_entry_exit_entry_time ON entry_exit_log(entry_time);
        CREATE INDEX IF NOT EXISTS idx_entry_exit_tag ON entry_exit_log(tag_id, entry_time);

        CREATE TABLE IF NOT EXISTS events (
            event_id INTEGER PRIMARY KEY,
            event_name TEXT NOT NULL,
            location TEXT,
            start_time TEXT NOT NULL,
            end_time TEXT
        );
        CREATE INDEX IF NOT EXISTS idx_events_start_time ON events(start_time);

        CREATE TABLE IF NOT EXISTS event_category (
            event_id INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
            category_name TEXT NOT NULL,
            PRIMARY KEY (event_id, category_name)
        );

        CREATE TABLE IF NOT EXISTS event_speaker (
            event_id INTEGER NOT NULL REFERENCES events(event_id) ON DELETE CASCADE,
            speaker_name TEXT NOT NULL,
            PRIMARY KEY (event_id, speaker_name)
        );

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL DEFAULT 'global',
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
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
