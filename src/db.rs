// ==========================================
// 生产批次排产核心 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 提供 schema 初始化入口，供维护脚本与测试共用
// ==========================================

use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
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

/// 初始化数据库 schema（幂等）
///
/// 说明：
/// - production_block.parent_id / planned_reactor 为软引用，不建外键：
///   拆分后父批次被删除，历史批次可能引用已退役反应釜
/// - code_sequence 是编号分配的原子计数器表（每 (prefix, year) 一行）
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS config_scope (
            scope_id TEXT PRIMARY KEY,
            scope_type TEXT NOT NULL,
            scope_key TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE(scope_type, scope_key)
        );

        INSERT OR IGNORE INTO config_scope (scope_id, scope_type, scope_key)
        VALUES ('global', 'GLOBAL', 'global');

        CREATE TABLE IF NOT EXISTS config_kv (
            scope_id TEXT NOT NULL REFERENCES config_scope(scope_id) ON DELETE CASCADE,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (scope_id, key)
        );

        CREATE TABLE IF NOT EXISTS production_block (
            block_id TEXT PRIMARY KEY,
            erp_id TEXT UNIQUE,
            parent_id TEXT,
            batch_label TEXT,
            article_code TEXT NOT NULL,
            article_desc TEXT,
            client_name TEXT,
            order_no TEXT,
            qty_ordered INTEGER NOT NULL DEFAULT 0,
            qty_served INTEGER NOT NULL DEFAULT 0,
            qty_pending INTEGER NOT NULL DEFAULT 0,
            deadline TEXT,
            order_date TEXT,
            units INTEGER NOT NULL CHECK (units > 0),
            status TEXT NOT NULL DEFAULT 'PENDING',
            planned_date TEXT,
            planned_reactor TEXT,
            planned_shift TEXT,
            real_kg REAL,
            real_duration_h REAL,
            operator_notes TEXT,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_block_status ON production_block(status);
        CREATE INDEX IF NOT EXISTS idx_block_planned_date ON production_block(planned_date);
        CREATE INDEX IF NOT EXISTS idx_block_parent ON production_block(parent_id);

        CREATE TABLE IF NOT EXISTS reactor (
            reactor_name TEXT PRIMARY KEY,
            plant TEXT NOT NULL,
            capacity_kg REAL NOT NULL DEFAULT 0,
            daily_target_kg REAL NOT NULL DEFAULT 0,
            active INTEGER NOT NULL DEFAULT 1,
            created_at TEXT NOT NULL,
            updated_at TEXT NOT NULL
        );

        CREATE TABLE IF NOT EXISTS holiday (
            holiday_date TEXT PRIMARY KEY,
            description TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now'))
        );

        CREATE TABLE IF NOT EXISTS maintenance_window (
            window_id TEXT PRIMARY KEY,
            reactor_name TEXT NOT NULL,
            start_date TEXT NOT NULL,
            end_date TEXT NOT NULL,
            reason TEXT,
            created_at TEXT NOT NULL DEFAULT (datetime('now')),
            CHECK (start_date <= end_date)
        );

        CREATE TABLE IF NOT EXISTS code_sequence (
            prefix TEXT NOT NULL,
            year_2d INTEGER NOT NULL,
            next_seq INTEGER NOT NULL,
            PRIMARY KEY (prefix, year_2d)
        );

        CREATE TABLE IF NOT EXISTS code_allocation (
            code TEXT PRIMARY KEY,
            prefix TEXT NOT NULL,
            year_2d INTEGER NOT NULL,
            seq_no INTEGER NOT NULL,
            allocated_at TEXT NOT NULL DEFAULT (datetime('now')),
            UNIQUE (prefix, year_2d, seq_no)
        );

        CREATE TABLE IF NOT EXISTS code_revision (
            code TEXT NOT NULL,
            rev_no INTEGER NOT NULL,
            allocated_at TEXT NOT NULL DEFAULT (datetime('now')),
            PRIMARY KEY (code, rev_no)
        );

        INSERT OR IGNORE INTO schema_version (version) VALUES (1);
        "#,
    )?;

    Ok(())
}

/// 打开连接并校验 schema_version（不匹配只告警，不中断）
pub fn open_and_check(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = open_sqlite_connection(db_path)?;

    match read_schema_version(&conn)? {
        Some(v) if v == CURRENT_SCHEMA_VERSION => {}
        Some(v) => {
            tracing::warn!(
                expected = CURRENT_SCHEMA_VERSION,
                actual = v,
                "schema_version 与代码期望不一致"
            );
        }
        None => {
            tracing::warn!("数据库缺少 schema_version 表，可能未初始化");
        }
    }

    Ok(conn)
}
