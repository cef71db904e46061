use rusqlite::Connection;
use std::cell::Cell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::{Duration, Instant};

static PERF_SQL_ENABLED: AtomicBool = AtomicBool::new(false);
static SLOW_SQL_THRESHOLD_MS: AtomicU64 = AtomicU64::new(0);

/// 线程内 SQL 计数 (语句数 + 慢语句数)
#[derive(Clone, Copy, Default)]
struct SqlCounters {
    statements: u64,
    slow: u64,
}

thread_local! {
    static PERF_DEPTH: Cell<u32> = Cell::new(0);
    static COUNTERS: Cell<SqlCounters> = Cell::new(SqlCounters::default());
}

fn env_flag(v: &str) -> bool {
    matches!(
        v.trim().to_lowercase().as_str(),
        "1" | "true" | "yes" | "y" | "on"
    )
}

/// 截断过长的 SQL, 按字符边界截断
fn truncate_sql(sql: &str, max_chars: usize) -> String {
    let s = sql.trim().replace('\n', " ");
    match s.char_indices().nth(max_chars) {
        Some((byte_idx, _)) => format!("{}…", &s[..byte_idx]),
        None => s,
    }
}

/// 安装 SQLite 语句 trace/profile（用于 SQL 计数 + 慢查询日志）
///
/// 开关：
/// - Debug 默认开启；Release 默认关闭（可通过环境变量开启）
/// - `COST_LEDGER_PERF_SQL=1` 强制开启
/// - `COST_LEDGER_SLOW_SQL_MS=50` 配置慢 SQL 阈值（毫秒）
pub fn install_sqlite_tracing(conn: &mut Connection) {
    let enabled = std::env::var("COST_LEDGER_PERF_SQL")
        .map(|v| env_flag(&v))
        .unwrap_or(cfg!(debug_assertions));
    PERF_SQL_ENABLED.store(enabled, Ordering::Relaxed);

    if !enabled {
        // 显式清理，避免复用连接导致残留 callback
        conn.trace(None);
        conn.profile(None);
        return;
    }

    let slow_ms = std::env::var("COST_LEDGER_SLOW_SQL_MS")
        .ok()
        .and_then(|v| v.trim().parse::<u64>().ok())
        .unwrap_or(if cfg!(debug_assertions) { 50 } else { 200 });
    SLOW_SQL_THRESHOLD_MS.store(slow_ms, Ordering::Relaxed);

    conn.trace(Some(on_statement));
    conn.profile(Some(on_statement_profiled));
}

fn in_guarded_scope() -> bool {
    PERF_DEPTH.with(|d| d.get() > 0)
}

fn on_statement(_sql: &str) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) || !in_guarded_scope() {
        return;
    }
    COUNTERS.with(|c| {
        let mut counters = c.get();
        counters.statements = counters.statements.saturating_add(1);
        c.set(counters);
    });
}

fn on_statement_profiled(sql: &str, duration: Duration) {
    if !PERF_SQL_ENABLED.load(Ordering::Relaxed) {
        return;
    }

    let ms = duration.as_millis() as u64;
    let threshold = SLOW_SQL_THRESHOLD_MS.load(Ordering::Relaxed);
    if threshold == 0 || ms < threshold {
        return;
    }

    tracing::warn!(
        target: "slow_sql",
        duration_ms = ms,
        sql = %truncate_sql(sql, 420),
        "slow sql"
    );
    if in_guarded_scope() {
        COUNTERS.with(|c| {
            let mut counters = c.get();
            counters.slow = counters.slow.saturating_add(1);
            c.set(counters);
        });
    }
}

/// 性能统计 Guard：记录 elapsed_ms + SQL 语句数 + 慢 SQL 数
///
/// 使用方式：
/// ```ignore
/// let _perf = production_cost_ledger::perf::PerfGuard::new("api.create_cost_record");
/// // do work...
/// ```
pub struct PerfGuard {
    op: &'static str,
    start: Instant,
    counters_at_start: SqlCounters,
}

impl PerfGuard {
    pub fn new(op: &'static str) -> Self {
        PERF_DEPTH.with(|d| d.set(d.get().saturating_add(1)));
        Self {
            op,
            start: Instant::now(),
            counters_at_start: COUNTERS.with(|c| c.get()),
        }
    }
}

impl Drop for PerfGuard {
    fn drop(&mut self) {
        let elapsed_ms = self.start.elapsed().as_millis() as u64;
        let now = COUNTERS.with(|c| c.get());
        let sql_count = now.statements.saturating_sub(self.counters_at_start.statements);
        let slow_sql_count = now.slow.saturating_sub(self.counters_at_start.slow);

        tracing::info!(
            target: "perf",
            op = self.op,
            elapsed_ms,
            sql_count,
            slow_sql_count,
            "done"
        );

        PERF_DEPTH.with(|d| d.set(d.get().saturating_sub(1)));
    }
}
