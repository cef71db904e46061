// ==========================================
// 日志系统初始化
// ==========================================
// 使用 tracing 和 tracing-subscriber
// 支持环境变量配置日志级别与输出格式
// ==========================================

use tracing_subscriber::{fmt, EnvFilter};

fn build_filter() -> EnvFilter {
    // 从环境变量读取日志级别，默认为 info
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
}

/// 初始化日志系统
///
/// # 环境变量
/// - RUST_LOG: 日志级别过滤器（默认: info）
///   例如: RUST_LOG=debug 或 RUST_LOG=production_cost_ledger=trace
/// - COST_LEDGER_LOG_FORMAT: 输出格式, `json` 输出结构化 JSON 行,
///   其余值输出人类可读格式
///
/// # 示例
/// ```no_run
/// use production_cost_ledger::logging;
/// logging::init();
/// ```
pub fn init() {
    let json_output = std::env::var("COST_LEDGER_LOG_FORMAT")
        .map(|v| v.trim().eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json_output {
        fmt()
            .with_env_filter(build_filter())
            .json()
            .with_current_span(false)
            .init();
    } else {
        fmt()
            .with_env_filter(build_filter())
            .with_target(true)
            .with_thread_ids(false)
            .with_line_number(true)
            .init();
    }
}

/// 初始化测试环境的日志系统
///
/// 使用更详细的日志级别，便于调试
pub fn init_test() {
    let _ = fmt()
        .with_env_filter(EnvFilter::new("debug"))
        .with_test_writer()
        .try_init();
}
