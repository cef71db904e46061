// ==========================================
// 生产成本台账系统 - 演示数据种子工具
// ==========================================
// 用法: cargo run --bin seed_demo_db [db_path] [days]
// 效果: 备份并重置目标库, 写入一个月的成本记录,
//       随后打印 day / week 两种演化序列预览
// ==========================================

use chrono::{Duration, Local, NaiveDate};
use std::error::Error;
use std::fs;
use std::path::Path;

use production_cost_ledger::app::{get_default_db_path, AppState};
use production_cost_ledger::domain::audit::{AuditActionType, AuditLog};
use production_cost_ledger::domain::cost_summary::CostSummaryDraft;
use production_cost_ledger::domain::line_item::{UnitCostItemDraft, ValueCostItemDraft};
use production_cost_ledger::i18n;
use production_cost_ledger::repository::{OrganizationEntity, ProductEntity};
use production_cost_ledger::{CreateCostRecordRequest, EvolutionQueryRequest};

const ORG_ID: &str = "ORG-DEMO";
const PRODUCT_FLOUR: &str = "PROD-FLOUR";
const PRODUCT_BREAD: &str = "PROD-BREAD";
const DEFAULT_DAYS: i64 = 28;

fn main() -> Result<(), Box<dyn Error>> {
    production_cost_ledger::logging::init();

    let db_path = std::env::args().nth(1).unwrap_or_else(get_default_db_path);

    let days = std::env::args()
        .nth(2)
        .and_then(|s| s.parse::<i64>().ok())
        .unwrap_or(DEFAULT_DAYS)
        .max(7);

    backup_and_reset_db(&db_path)?;

    // AppState 负责建连接 + 幂等建表 + 组装 API
    let state = AppState::new(db_path.clone())?;

    seed_reference_data(&state)?;

    let end = Local::now().date_naive();
    let start = end - Duration::days(days - 1);
    let record_count = seed_cost_records(&state, start, days)?;
    eprintln!("已写入成本记录: {} 条 ({} ~ {})", record_count, start, end);

    // 种子动作本身也留痕
    let log = AuditLog::new(AuditActionType::SeedDemoData, "database")
        .with_organization(ORG_ID.to_string())
        .with_detail(format!("演示数据: {}天, {}条记录", days, record_count));
    if let Err(e) = state.audit_log_repo.insert(&log) {
        eprintln!("审计日志写入失败(忽略): {}", e);
    }

    print_evolution_preview(&state, start, end)?;
    print_quick_counts(&state)?;

    println!("{}", i18n::t("common.success"));
    Ok(())
}

fn backup_and_reset_db(db_path: &str) -> Result<(), Box<dyn Error>> {
    let path = Path::new(db_path);
    if !path.exists() {
        return Ok(());
    }

    let ts = Local::now().format("%Y%m%d_%H%M%S").to_string();
    let backup_path = format!("{}.bak.{}", db_path, ts);
    fs::copy(path, &backup_path)?;
    fs::remove_file(path)?;

    eprintln!("Backed up {} -> {}", db_path, backup_path);
    Ok(())
}

fn seed_reference_data(state: &AppState) -> Result<(), Box<dyn Error>> {
    let now = Local::now().naive_local();

    state.reference_repo.upsert_organization(&OrganizationEntity {
        org_id: ORG_ID.to_string(),
        org_name: "演示食品厂".to_string(),
        created_at: now,
    })?;

    state.reference_repo.upsert_product(&ProductEntity {
        product_id: PRODUCT_FLOUR.to_string(),
        product_name: "面粉".to_string(),
        created_at: now,
    })?;
    state.reference_repo.upsert_product(&ProductEntity {
        product_id: PRODUCT_BREAD.to_string(),
        product_name: "面包".to_string(),
        created_at: now,
    })?;

    eprintln!("基础数据就绪: 1 组织, 2 产品");
    Ok(())
}

/// 按天生成成本记录, 公式确定可复现
///
/// 面粉每天一条; 面包每三天一条 (用于演示产品过滤)。
/// 部分分类周期性留空, 覆盖"空集合也是合法集合"的路径。
fn seed_cost_records(state: &AppState, start: NaiveDate, days: i64) -> Result<usize, Box<dyn Error>> {
    let mut count = 0usize;

    for i in 0..days {
        let date = start + Duration::days(i);
        let date_str = date.format("%Y-%m-%d").to_string();

        count += seed_flour_record(state, &date_str, i)?;

        if i % 3 == 0 {
            count += seed_bread_record(state, &date_str, i)?;
        }
    }

    Ok(count)
}

fn seed_flour_record(state: &AppState, date_str: &str, i: i64) -> Result<usize, Box<dyn Error>> {
    let produced = 1000.0 + (i % 7) as f64 * 60.0;
    let losses = produced * 0.02;
    let final_qty = produced - losses;

    // 小麦单价按周缓慢抬升, 让演化曲线有肉眼可见的趋势
    let wheat_unit = 2.35 + 0.01 * (i / 7) as f64;
    let wheat_qty = produced * 1.08;
    let wheat_total = wheat_qty * wheat_unit;

    let bag_qty = (final_qty / 25.0).ceil();
    let bag_total = bag_qty * 1.2;

    let labor_total = 1500.0 + (i % 7) as f64 * 30.0;
    let power_total = 420.0 + (i % 5) as f64 * 15.0;
    let depreciation = 300.0;

    // 质检工资按周分摊, 只落在每周首日
    let quality_labor = if i % 7 == 0 { Some(560.0) } else { None };

    let total_production_cost = wheat_total
        + bag_total
        + labor_total
        + power_total
        + depreciation
        + quality_labor.unwrap_or(0.0);
    let unit_production_cost = total_production_cost / final_qty;
    let unit_sale_price = 7.5;

    let mut request = CreateCostRecordRequest {
        product_id: PRODUCT_FLOUR.to_string(),
        record_date: Some(date_str.to_string()),
        unit_of_measure: Some("千克".to_string()),
        produced_quantity: Some(produced),
        estimated_losses: Some(losses),
        final_quantity: Some(final_qty),
        raw_material_items: vec![
            UnitCostItemDraft {
                item_name: "小麦".to_string(),
                unit_of_measure: Some("千克".to_string()),
                quantity: Some(wheat_qty),
                unit_cost: Some(wheat_unit),
                total_cost: Some(wheat_total),
            },
            UnitCostItemDraft {
                item_name: "包装袋".to_string(),
                unit_of_measure: Some("个".to_string()),
                quantity: Some(bag_qty),
                unit_cost: Some(1.2),
                total_cost: Some(bag_total),
            },
        ],
        direct_labor_items: vec![UnitCostItemDraft {
            item_name: "制粉车间工资".to_string(),
            unit_of_measure: Some("班次".to_string()),
            quantity: Some(3.0),
            unit_cost: Some(labor_total / 3.0),
            total_cost: Some(labor_total),
        }],
        indirect_overhead_items: vec![UnitCostItemDraft {
            item_name: "电费".to_string(),
            unit_of_measure: Some("度".to_string()),
            quantity: Some(power_total / 0.65),
            unit_cost: Some(0.65),
            total_cost: Some(power_total),
        }],
        general_overhead_items: vec![ValueCostItemDraft {
            item_name: "厂房折旧".to_string(),
            amount: Some(depreciation),
        }],
        operating_cost_items: vec![ValueCostItemDraft {
            item_name: "办公费".to_string(),
            amount: Some(120.0),
        }],
        summary: Some(CostSummaryDraft {
            total_sales_expense: if i % 2 == 0 { 200.0 } else { 0.0 },
            total_operating_cost: 120.0,
            total_production_cost,
            unit_production_cost,
            unit_sale_price,
            unit_profit_margin: unit_sale_price - unit_production_cost,
        }),
        ..Default::default()
    };

    if let Some(amount) = quality_labor {
        request.indirect_labor_items.push(UnitCostItemDraft {
            item_name: "质检工资".to_string(),
            unit_of_measure: Some("周".to_string()),
            quantity: Some(1.0),
            unit_cost: Some(amount),
            total_cost: Some(amount),
        });
    }
    if i % 2 == 0 {
        request.sales_expense_items.push(ValueCostItemDraft {
            item_name: "运费".to_string(),
            amount: Some(200.0),
        });
    }

    state.costs_api.create_cost_record(ORG_ID, request)?;
    Ok(1)
}

fn seed_bread_record(state: &AppState, date_str: &str, i: i64) -> Result<usize, Box<dyn Error>> {
    let produced = 400.0 + (i % 6) as f64 * 20.0;
    let final_qty = produced;

    let flour_total = produced * 0.55 * 3.1;
    let labor_total = 820.0;
    let total_production_cost = flour_total + labor_total + 180.0;
    let unit_production_cost = total_production_cost / final_qty;
    let unit_sale_price = 12.0;

    let request = CreateCostRecordRequest {
        product_id: PRODUCT_BREAD.to_string(),
        record_date: Some(date_str.to_string()),
        unit_of_measure: Some("千克".to_string()),
        produced_quantity: Some(produced),
        final_quantity: Some(final_qty),
        raw_material_items: vec![UnitCostItemDraft {
            item_name: "面粉".to_string(),
            unit_of_measure: Some("千克".to_string()),
            quantity: Some(produced * 0.55),
            unit_cost: Some(3.1),
            total_cost: Some(flour_total),
        }],
        direct_labor_items: vec![UnitCostItemDraft {
            item_name: "烘焙车间工资".to_string(),
            unit_of_measure: Some("班次".to_string()),
            quantity: Some(2.0),
            unit_cost: Some(labor_total / 2.0),
            total_cost: Some(labor_total),
        }],
        general_overhead_items: vec![ValueCostItemDraft {
            item_name: "烤炉能耗".to_string(),
            amount: Some(180.0),
        }],
        summary: Some(CostSummaryDraft {
            total_sales_expense: 90.0,
            total_operating_cost: 60.0,
            total_production_cost,
            unit_production_cost,
            unit_sale_price,
            unit_profit_margin: unit_sale_price - unit_production_cost,
        }),
        ..Default::default()
    };

    state.costs_api.create_cost_record(ORG_ID, request)?;
    Ok(1)
}

fn print_evolution_preview(
    state: &AppState,
    start: NaiveDate,
    end: NaiveDate,
) -> Result<(), Box<dyn Error>> {
    let start_str = start.format("%Y-%m-%d").to_string();
    let end_str = end.format("%Y-%m-%d").to_string();

    let day_points = state.costs_api.get_cost_evolution(EvolutionQueryRequest {
        start_date: Some(start_str.clone()),
        end_date: Some(end_str.clone()),
        product_id: Some(PRODUCT_FLOUR.to_string()),
        mode: Some("day".to_string()),
    })?;

    println!();
    println!("面粉成本演化 (day, {} 个点):", day_points.len());
    for p in day_points.iter().take(7) {
        println!(
            "  {}  单位成本={:.4}  单位利润={:.4}",
            p.bucket_key, p.unit_production_cost, p.unit_profit_margin
        );
    }
    if day_points.len() > 7 {
        println!("  ... (其余 {} 个点省略)", day_points.len() - 7);
    }

    let week_points = state.costs_api.get_cost_evolution(EvolutionQueryRequest {
        start_date: Some(start_str),
        end_date: Some(end_str),
        product_id: Some(PRODUCT_FLOUR.to_string()),
        mode: Some("week".to_string()),
    })?;

    println!();
    println!("面粉成本演化 (week, {} 个点):", week_points.len());
    for p in &week_points {
        println!(
            "  周一={}  平均单位成本={:.4}  利润合计={:.4}",
            p.bucket_key, p.unit_production_cost, p.unit_profit_margin
        );
    }

    Ok(())
}

fn print_quick_counts(state: &AppState) -> Result<(), Box<dyn Error>> {
    println!();
    println!("Row counts:");
    println!("  {:<20} {}", "organization", state.reference_repo.count_organizations()?);
    println!("  {:<20} {}", "product", state.reference_repo.count_products()?);
    println!("  {:<20} {}", "cost_record", state.cost_record_repo.count_all()?);
    println!("  {:<20} {}", "audit_log", state.audit_log_repo.count_all()?);
    Ok(())
}
