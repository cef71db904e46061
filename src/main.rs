// ==========================================
// 生产成本台账系统 - 主入口
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 成本记录台账 + 成本演化分析
// ==========================================

use production_cost_ledger::app::{get_default_db_path, AppState};

fn main() {
    // 初始化日志系统
    production_cost_ledger::logging::init();

    tracing::info!("==================================================");
    tracing::info!("生产成本台账系统");
    tracing::info!("系统版本: {}", production_cost_ledger::VERSION);
    tracing::info!("==================================================");

    // 获取数据库路径
    let db_path = get_default_db_path();
    tracing::info!("使用数据库: {}", db_path);

    // 创建AppState (打开连接 + 幂等建表 + 组装API)
    tracing::info!("正在初始化AppState...");
    let app_state = AppState::new(db_path).expect("无法初始化AppState");

    tracing::info!("AppState初始化成功");

    // 报告台账现状
    let record_count = app_state.cost_record_repo.count_all().unwrap_or(0);
    let org_count = app_state.reference_repo.count_organizations().unwrap_or(0);
    let product_count = app_state.reference_repo.count_products().unwrap_or(0);
    let audit_count = app_state.audit_log_repo.count_all().unwrap_or(0);

    println!("==================================================");
    println!("生产成本台账系统 v{}", production_cost_ledger::VERSION);
    println!("==================================================");
    println!("数据库: {}", app_state.get_db_path());
    println!("组织数: {}", org_count);
    println!("产品数: {}", product_count);
    println!("成本记录数: {}", record_count);
    println!("审计日志数: {}", audit_count);
    println!();
    println!("库模式使用:");
    println!("use production_cost_ledger::app::AppState;");
    println!();
    println!("演示数据: cargo run --bin seed_demo_db");
}
