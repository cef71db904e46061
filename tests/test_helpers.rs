// ==========================================
// 测试辅助函数
// ==========================================
// 职责: 提供测试所需的数据库初始化、测试环境组装、测试数据生成等功能
// ==========================================

use std::error::Error;
use std::sync::Arc;
use tempfile::NamedTempFile;

use production_cost_ledger::app::AppState;
use production_cost_ledger::db::{init_schema, open_sqlite_connection};
use production_cost_ledger::domain::cost_summary::CostSummaryDraft;
use production_cost_ledger::domain::line_item::{UnitCostItemDraft, ValueCostItemDraft};
use production_cost_ledger::repository::{
    AuditLogRepository, CostRecordRepository, ReferenceRepository,
};
use production_cost_ledger::{CostsApi, CreateCostRecordRequest};

// 测试用基础数据 (所有集成测试共用)
pub const TEST_ORG: &str = "ORG-TEST";
pub const TEST_ORG_B: &str = "ORG-OTHER";
pub const TEST_PRODUCT_FLOUR: &str = "PROD-FLOUR";
pub const TEST_PRODUCT_BREAD: &str = "PROD-BREAD";

/// 创建临时测试数据库并初始化 schema
///
/// # 返回
/// - NamedTempFile: 临时数据库文件（需要保持存活）
/// - String: 数据库文件路径
pub fn create_test_db() -> Result<(NamedTempFile, String), Box<dyn Error>> {
    let temp_file = NamedTempFile::new()?;
    let db_path = temp_file.path().to_str().unwrap().to_string();

    let conn = open_sqlite_connection(&db_path)?;
    init_schema(&conn)?;
    seed_reference_rows(&conn)?;

    Ok((temp_file, db_path))
}

/// 预置组织/产品基础数据 (用于外键约束)
fn seed_reference_rows(conn: &rusqlite::Connection) -> Result<(), Box<dyn Error>> {
    conn.execute_batch(&format!(
        r#"
        INSERT OR IGNORE INTO organization (org_id, org_name, created_at)
        VALUES ('{org}', '测试组织', datetime('now', 'localtime'));
        INSERT OR IGNORE INTO organization (org_id, org_name, created_at)
        VALUES ('{org_b}', '另一组织', datetime('now', 'localtime'));
        INSERT OR IGNORE INTO product (product_id, product_name, created_at)
        VALUES ('{flour}', '面粉', datetime('now', 'localtime'));
        INSERT OR IGNORE INTO product (product_id, product_name, created_at)
        VALUES ('{bread}', '面包', datetime('now', 'localtime'));
        "#,
        org = TEST_ORG,
        org_b = TEST_ORG_B,
        flour = TEST_PRODUCT_FLOUR,
        bread = TEST_PRODUCT_BREAD,
    ))?;
    Ok(())
}

// ==========================================
// 测试环境
// ==========================================

/// 集成测试环境
///
/// 基于临时数据库组装完整的 API / 仓储栈
pub struct TestEnv {
    pub db_path: String,
    pub costs_api: Arc<CostsApi>,
    pub cost_record_repo: Arc<CostRecordRepository>,
    pub reference_repo: Arc<ReferenceRepository>,
    pub audit_log_repo: Arc<AuditLogRepository>,

    // 临时文件（确保生命周期）
    _temp_file: NamedTempFile,
}

impl TestEnv {
    /// 创建新的集成测试环境
    ///
    /// # 说明
    /// - 使用临时数据库文件, 已预置组织/产品基础数据
    /// - 通过 AppState 组装仓储、引擎与 API
    pub fn new() -> Result<Self, String> {
        let (temp_file, db_path) =
            create_test_db().map_err(|e| format!("无法创建测试数据库: {}", e))?;

        let state = AppState::new(db_path.clone())?;

        Ok(Self {
            db_path,
            costs_api: state.costs_api,
            cost_record_repo: state.cost_record_repo,
            reference_repo: state.reference_repo,
            audit_log_repo: state.audit_log_repo,
            _temp_file: temp_file,
        })
    }

    /// 通过 API 写入一条带汇总的成本记录, 返回 record_id
    ///
    /// 单位成本/单位利润由调用方指定, 其余汇总字段取确定的派生值
    pub fn create_summarized_record(
        &self,
        product_id: &str,
        record_date: &str,
        unit_cost: f64,
        unit_margin: f64,
    ) -> Result<String, Box<dyn Error>> {
        let request = CreateCostRecordRequest {
            product_id: product_id.to_string(),
            record_date: Some(record_date.to_string()),
            unit_of_measure: Some("千克".to_string()),
            produced_quantity: Some(100.0),
            final_quantity: Some(100.0),
            raw_material_items: vec![make_unit_draft("主料", 100.0, unit_cost, unit_cost * 100.0)],
            summary: Some(make_summary_draft(unit_cost, unit_margin)),
            ..Default::default()
        };

        let response = self.costs_api.create_cost_record(TEST_ORG, request)?;
        Ok(response.record_id)
    }

    /// 通过 API 写入一条无汇总的成本记录, 返回 record_id
    pub fn create_record_without_summary(
        &self,
        product_id: &str,
        record_date: &str,
    ) -> Result<String, Box<dyn Error>> {
        let request = CreateCostRecordRequest {
            product_id: product_id.to_string(),
            record_date: Some(record_date.to_string()),
            raw_material_items: vec![make_unit_draft("主料", 10.0, 1.0, 10.0)],
            ..Default::default()
        };

        let response = self.costs_api.create_cost_record(TEST_ORG, request)?;
        Ok(response.record_id)
    }
}

// ==========================================
// 测试数据生成
// ==========================================

/// 构造单价型明细草稿
pub fn make_unit_draft(name: &str, quantity: f64, unit_cost: f64, total_cost: f64) -> UnitCostItemDraft {
    UnitCostItemDraft {
        item_name: name.to_string(),
        unit_of_measure: Some("千克".to_string()),
        quantity: Some(quantity),
        unit_cost: Some(unit_cost),
        total_cost: Some(total_cost),
    }
}

/// 构造金额型明细草稿
pub fn make_value_draft(name: &str, amount: f64) -> ValueCostItemDraft {
    ValueCostItemDraft {
        item_name: name.to_string(),
        amount: Some(amount),
    }
}

/// 构造汇总草稿 (单位成本/单位利润由调用方指定)
pub fn make_summary_draft(unit_cost: f64, unit_margin: f64) -> CostSummaryDraft {
    CostSummaryDraft {
        total_sales_expense: 50.0,
        total_operating_cost: 80.0,
        total_production_cost: unit_cost * 100.0,
        unit_production_cost: unit_cost,
        unit_sale_price: unit_cost + unit_margin,
        unit_profit_margin: unit_margin,
    }
}
