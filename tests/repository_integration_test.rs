// ==========================================
// Repository 层集成测试
// ==========================================
// 测试目标: 验证组合写入 → 读取 → 范围取数的数据访问路径
// 覆盖: CostRecordRepository / ReferenceRepository / AuditLogRepository
// ==========================================

mod test_helpers;

use chrono::{Local, NaiveDate};
use production_cost_ledger::domain::audit::{AuditActionType, AuditLog};
use production_cost_ledger::domain::cost_record::CostRecord;
use production_cost_ledger::domain::types::{UnitCostCategory, ValueCostCategory};
use production_cost_ledger::repository::{CostRecordRepository, OrganizationEntity};
use test_helpers::*;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").expect("测试日期格式错误")
}

/// 手工盖章一条完整记录 (绕过组合器, 直接验证仓储契约)
fn build_record(record_date: &str) -> CostRecord {
    CostRecord::new(
        TEST_ORG.to_string(),
        TEST_PRODUCT_FLOUR.to_string(),
        date(record_date),
    )
    .with_unit_of_measure(Some("千克".to_string()))
    .with_quantities(Some(100.0), Some(2.0), Some(98.0))
}

#[test]
fn test_create_composed_往返读取() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let record = build_record("2024-03-04");
    let record_id = record.record_id.clone();

    let unit_items = vec![
        make_unit_draft("小麦", 108.0, 2.4, 259.2).into_item(
            &record_id,
            TEST_ORG,
            UnitCostCategory::RawMaterial,
        ),
        make_unit_draft("车间工资", 3.0, 500.0, 1500.0).into_item(
            &record_id,
            TEST_ORG,
            UnitCostCategory::DirectLabor,
        ),
        make_unit_draft("电费", 600.0, 0.65, 390.0).into_item(
            &record_id,
            TEST_ORG,
            UnitCostCategory::IndirectOverhead,
        ),
    ];
    let value_items = vec![
        make_value_draft("厂房折旧", 300.0).into_item(
            &record_id,
            TEST_ORG,
            ValueCostCategory::GeneralOverhead,
        ),
        make_value_draft("运费", 200.0).into_item(
            &record_id,
            TEST_ORG,
            ValueCostCategory::SalesExpense,
        ),
    ];
    let summary = make_summary_draft(5.0, 1.0).into_summary(&record_id, TEST_ORG);

    env.cost_record_repo
        .create_composed(&record, &unit_items, &value_items, Some(&summary))
        .expect("组合写入失败");

    // 往返读取: 七个集合按分类归位
    let aggregate = env
        .cost_record_repo
        .find_by_id(&record_id)
        .expect("查询失败")
        .expect("记录应存在");

    assert_eq!(aggregate.record.record_id, record_id);
    assert_eq!(aggregate.record.record_date, date("2024-03-04"));
    assert_eq!(aggregate.record.produced_quantity, Some(100.0));
    assert_eq!(aggregate.raw_material_items.len(), 1, "原材料明细应为1条");
    assert_eq!(aggregate.direct_labor_items.len(), 1, "直接人工明细应为1条");
    assert_eq!(aggregate.indirect_overhead_items.len(), 1);
    assert_eq!(aggregate.indirect_labor_items.len(), 0);
    assert_eq!(aggregate.general_overhead_items.len(), 1);
    assert_eq!(aggregate.operating_cost_items.len(), 0);
    assert_eq!(aggregate.sales_expense_items.len(), 1);
    assert_eq!(aggregate.child_count(), 6, "含汇总共6个子对象");

    // 明细字段原样透传
    let wheat = &aggregate.raw_material_items[0];
    assert_eq!(wheat.item_name, "小麦");
    assert_eq!(wheat.quantity, Some(108.0));
    assert_eq!(wheat.unit_cost, Some(2.4));
    assert_eq!(wheat.total_cost, Some(259.2));
    assert_eq!(wheat.organization_id, TEST_ORG);

    let summary = aggregate.summary.expect("汇总应存在");
    assert_eq!(summary.unit_production_cost, 5.0);
    assert_eq!(summary.unit_profit_margin, 1.0);
    assert_eq!(summary.organization_id, TEST_ORG);
}

#[test]
fn test_find_by_id_不存在返回None() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let result = env
        .cost_record_repo
        .find_by_id("CR-NOT-EXIST")
        .expect("查询失败");
    assert!(result.is_none(), "不存在的记录应返回None");
}

#[test]
fn test_list_by_organization_最新在前() {
    let env = TestEnv::new().expect("无法创建测试环境");

    // created_at 显式错开, 验证排序而不是依赖插入时序
    let base = date("2024-03-01");
    let mut ids = Vec::new();
    for (i, hour) in [8u32, 12, 16].iter().enumerate() {
        let mut record = build_record("2024-03-04");
        record.created_at = base.and_hms_opt(*hour, 0, 0).unwrap();
        record.product_id = if i % 2 == 0 {
            TEST_PRODUCT_FLOUR.to_string()
        } else {
            TEST_PRODUCT_BREAD.to_string()
        };
        ids.push(record.record_id.clone());
        env.cost_record_repo
            .create_composed(&record, &[], &[], None)
            .expect("写入失败");
    }

    let list = env
        .cost_record_repo
        .list_by_organization(TEST_ORG)
        .expect("查询失败");

    assert_eq!(list.len(), 3, "应返回该组织的全部3条记录");
    assert_eq!(list[0].record.record_id, ids[2], "16点的记录应排第一");
    assert_eq!(list[1].record.record_id, ids[1]);
    assert_eq!(list[2].record.record_id, ids[0], "8点的记录应排最后");

    // 其他组织不可见
    let other = env
        .cost_record_repo
        .list_by_organization(TEST_ORG_B)
        .expect("查询失败");
    assert!(other.is_empty(), "另一组织不应看到任何记录");
}

#[test]
fn test_find_in_range_边界与过滤() {
    let env = TestEnv::new().expect("无法创建测试环境");

    for (d, product, with_summary) in [
        ("2024-03-01", TEST_PRODUCT_FLOUR, true),
        ("2024-03-04", TEST_PRODUCT_FLOUR, true),
        ("2024-03-04", TEST_PRODUCT_BREAD, true),
        ("2024-03-10", TEST_PRODUCT_FLOUR, false),
        ("2024-03-15", TEST_PRODUCT_FLOUR, true),
    ] {
        let mut record = build_record(d);
        record.product_id = product.to_string();
        let summary = make_summary_draft(5.0, 1.0).into_summary(&record.record_id, TEST_ORG);
        env.cost_record_repo
            .create_composed(&record, &[], &[], with_summary.then_some(&summary))
            .expect("写入失败");
    }

    // 两端含端点: 03-01 与 03-10 都在区间内, 03-15 不在
    let rows = env
        .cost_record_repo
        .find_in_range(date("2024-03-01"), date("2024-03-10"), None)
        .expect("查询失败");
    assert_eq!(rows.len(), 4, "区间 [03-01, 03-10] 应命中4条");
    assert_eq!(rows[0].0.record_date, date("2024-03-01"), "应按日期升序");
    assert_eq!(rows[3].0.record_date, date("2024-03-10"));

    // LEFT JOIN: 无汇总记录返回 (record, None)
    let no_summary = rows
        .iter()
        .find(|(r, _)| r.record_date == date("2024-03-10"))
        .expect("03-10记录应在结果中");
    assert!(no_summary.1.is_none(), "03-10记录无汇总, 应为None");

    // 产品过滤
    let flour_only = env
        .cost_record_repo
        .find_in_range(date("2024-03-01"), date("2024-03-10"), Some(TEST_PRODUCT_FLOUR))
        .expect("查询失败");
    assert_eq!(flour_only.len(), 3, "面粉记录应为3条");
    assert!(
        flour_only.iter().all(|(r, _)| r.product_id == TEST_PRODUCT_FLOUR),
        "过滤结果只应包含面粉"
    );
}

#[test]
fn test_audit_log_写入与查询() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let log_a = AuditLog::new(AuditActionType::CreateCostRecord, "cost_record")
        .with_entity_id("CR-001".to_string())
        .with_organization(TEST_ORG.to_string())
        .with_detail("第一条".to_string())
        .with_payload(&serde_json::json!({"item_count": 3}));
    let id_a = env.audit_log_repo.insert(&log_a).expect("写入失败");
    assert!(id_a > 0, "应返回自增主键");

    let log_b = AuditLog::new(AuditActionType::SeedDemoData, "database")
        .with_detail("第二条".to_string());
    let id_b = env.audit_log_repo.insert(&log_b).expect("写入失败");
    assert!(id_b > id_a, "主键应递增");

    let recent = env.audit_log_repo.find_recent(10).expect("查询失败");
    assert_eq!(recent.len(), 2);
    assert_eq!(recent[0].log_id, Some(id_b), "最新的日志应排第一");
    assert_eq!(recent[0].action_type, AuditActionType::SeedDemoData.as_str());
    assert_eq!(recent[1].entity_id, Some("CR-001".to_string()));

    let payload = recent[1].payload_json.as_ref().expect("payload应存在");
    assert_eq!(payload["item_count"], 3);

    assert_eq!(env.audit_log_repo.count_all().expect("计数失败"), 2);
}

#[test]
fn test_reference_repo_存在性与覆盖写() {
    let env = TestEnv::new().expect("无法创建测试环境");

    // 测试环境已预置 TEST_ORG
    assert!(
        env.reference_repo.organization_exists(TEST_ORG).expect("查询失败"),
        "预置组织应存在"
    );
    assert!(
        !env.reference_repo.organization_exists("ORG-GHOST").expect("查询失败"),
        "未注册组织不应存在"
    );

    // INSERT OR REPLACE: 同ID覆盖名称
    env.reference_repo
        .upsert_organization(&OrganizationEntity {
            org_id: TEST_ORG.to_string(),
            org_name: "改名后的组织".to_string(),
            created_at: Local::now().naive_local(),
        })
        .expect("覆盖写失败");

    let org = env
        .reference_repo
        .find_organization(TEST_ORG)
        .expect("查询失败")
        .expect("组织应存在");
    assert_eq!(org.org_name, "改名后的组织");

    assert_eq!(env.reference_repo.count_organizations().expect("计数失败"), 2);
    assert_eq!(env.reference_repo.count_products().expect("计数失败"), 2);
}

#[test]
fn test_create_composed_空子集合也合法() {
    let env = TestEnv::new().expect("无法创建测试环境");

    let record = build_record("2024-03-05");
    let record_id = record.record_id.clone();
    env.cost_record_repo
        .create_composed(&record, &[], &[], None)
        .expect("空子集合写入失败");

    let aggregate = env
        .cost_record_repo
        .find_by_id(&record_id)
        .expect("查询失败")
        .expect("记录应存在");
    assert_eq!(aggregate.child_count(), 0, "无子对象");
    assert!(aggregate.summary.is_none());

    let _ = CostRecordRepository::new(&env.db_path).expect("按路径建仓储失败");
}
