// ==========================================
// 生产成本台账系统 - SQLite 连接初始化与建库
// ==========================================
// 目标:
// - 统一所有 Connection::open 的 PRAGMA 行为，避免“部分模块外键开启/部分不开启”
// - 统一 busy_timeout，减少并发写入时的偶发 busy 错误
// - 集中管理建库 DDL，库结构只有一个事实来源
// ==========================================

use chrono::Local;
use rusqlite::Connection;
use rusqlite::OptionalExtension;
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 当前代码所期望的 schema_version
///
/// 说明：
/// - 这里的版本号用于**提示/告警**（不做自动迁移），避免静默在旧库上运行导致隐性错误。
pub const CURRENT_SCHEMA_VERSION: i64 = 1;

/// 建库 DDL（幂等，可重复执行）
///
/// 约定：
/// - 日期列统一 TEXT `YYYY-MM-DD`，时间戳列统一 TEXT `YYYY-MM-DD HH:MM:SS`
/// - 金额/数量统一 REAL
/// - 子表（明细项/汇总）通过 record_id 级联删除
const SCHEMA_DDL: &str = "
CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER NOT NULL,
    applied_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS organization (
    org_id TEXT PRIMARY KEY,
    org_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS product (
    product_id TEXT PRIMARY KEY,
    product_name TEXT NOT NULL,
    created_at TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS cost_record (
    record_id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    product_id TEXT NOT NULL,
    record_date TEXT NOT NULL,
    unit_of_measure TEXT,
    produced_quantity REAL,
    estimated_losses REAL,
    final_quantity REAL,
    created_at TEXT NOT NULL,
    FOREIGN KEY (organization_id) REFERENCES organization(org_id),
    FOREIGN KEY (product_id) REFERENCES product(product_id)
);

CREATE INDEX IF NOT EXISTS idx_cost_record_date ON cost_record(record_date);
CREATE INDEX IF NOT EXISTS idx_cost_record_org_created ON cost_record(organization_id, created_at);

CREATE TABLE IF NOT EXISTS cost_item_unit (
    item_id TEXT PRIMARY KEY,
    record_id TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    category TEXT NOT NULL,
    item_name TEXT NOT NULL,
    unit_of_measure TEXT,
    quantity REAL,
    unit_cost REAL,
    total_cost REAL,
    FOREIGN KEY (record_id) REFERENCES cost_record(record_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_cost_item_unit_record ON cost_item_unit(record_id);

CREATE TABLE IF NOT EXISTS cost_item_value (
    item_id TEXT PRIMARY KEY,
    record_id TEXT NOT NULL,
    organization_id TEXT NOT NULL,
    category TEXT NOT NULL,
    item_name TEXT NOT NULL,
    amount REAL,
    FOREIGN KEY (record_id) REFERENCES cost_record(record_id) ON DELETE CASCADE
);

CREATE INDEX IF NOT EXISTS idx_cost_item_value_record ON cost_item_value(record_id);

CREATE TABLE IF NOT EXISTS cost_summary (
    record_id TEXT PRIMARY KEY,
    organization_id TEXT NOT NULL,
    total_sales_expense REAL NOT NULL,
    total_operating_cost REAL NOT NULL,
    total_production_cost REAL NOT NULL,
    unit_production_cost REAL NOT NULL,
    unit_sale_price REAL NOT NULL,
    unit_profit_margin REAL NOT NULL,
    FOREIGN KEY (record_id) REFERENCES cost_record(record_id) ON DELETE CASCADE
);

CREATE TABLE IF NOT EXISTS audit_log (
    log_id INTEGER PRIMARY KEY AUTOINCREMENT,
    action_type TEXT NOT NULL,
    entity_type TEXT NOT NULL,
    entity_id TEXT,
    organization_id TEXT,
    detail TEXT,
    payload_json TEXT,
    action_ts TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_audit_log_ts ON audit_log(action_ts);
";

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

/// 初始化库结构（幂等）
///
/// 首次建库时写入 schema_version 记录；已有版本记录则不重复写入。
pub fn init_schema(conn: &Connection) -> rusqlite::Result<()> {
    conn.execute_batch(SCHEMA_DDL)?;

    let existing: Option<i64> =
        conn.query_row("SELECT MAX(version) FROM schema_version", [], |row| row.get(0))?;
    if existing.is_none() {
        let now = Local::now().naive_local().format("%Y-%m-%d %H:%M:%S").to_string();
        conn.execute(
            "INSERT INTO schema_version (version, applied_at) VALUES (?1, ?2)",
            rusqlite::params![CURRENT_SCHEMA_VERSION, now],
        )?;
    }
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
