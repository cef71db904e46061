// ==========================================
// 生产成本台账系统 - 成本记录领域模型
// ==========================================
// 一条成本记录 = 一个生产批次的成本快照
// 创建后不可变; 删除在库结构层级联到子表
// ==========================================

use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::cost_summary::CostSummary;
use crate::domain::line_item::{UnitCostItem, ValueCostItem};
use crate::domain::types::{UnitCostCategory, ValueCostCategory};

// ==========================================
// CostRecord - 成本记录
// ==========================================
// 对齐: cost_record 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecord {
    // ===== 主键与归属 =====
    pub record_id: String,       // 记录ID (UUID)
    pub organization_id: String, // 所属组织
    pub product_id: String,      // 产品

    // ===== 批次信息 =====
    pub record_date: NaiveDate,          // 记账日期 (缺省 = 提交当天)
    pub unit_of_measure: Option<String>, // 产出计量单位
    pub produced_quantity: Option<f64>,  // 投产数量
    pub estimated_losses: Option<f64>,   // 预估损耗
    pub final_quantity: Option<f64>,     // 最终产出数量

    // ===== 审计 =====
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// CostRecordWithChildren - 完整聚合
// ==========================================
// 七个逻辑分类集合 + 可选汇总, 读取端的标准返回形态
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecordWithChildren {
    pub record: CostRecord,

    // ===== 计量型分类 (4) =====
    pub raw_material_items: Vec<UnitCostItem>,      // 原材料
    pub direct_labor_items: Vec<UnitCostItem>,      // 直接人工
    pub indirect_overhead_items: Vec<UnitCostItem>, // 间接制造费用
    pub indirect_labor_items: Vec<UnitCostItem>,    // 间接人工

    // ===== 金额型分类 (3) =====
    pub general_overhead_items: Vec<ValueCostItem>, // 一般管理费用
    pub operating_cost_items: Vec<ValueCostItem>,   // 经营费用
    pub sales_expense_items: Vec<ValueCostItem>,    // 销售费用

    // ===== 派生汇总 (0..1) =====
    pub summary: Option<CostSummary>,
}

// ==========================================
// CostRecord 辅助方法
// ==========================================
impl CostRecord {
    /// 创建新的成本记录 (生成 UUID 与创建时间)
    ///
    /// # 参数
    /// - `organization_id`: 所属组织
    /// - `product_id`: 产品
    /// - `record_date`: 记账日期 (调用方已做缺省解析)
    pub fn new(organization_id: String, product_id: String, record_date: NaiveDate) -> Self {
        Self {
            record_id: Uuid::new_v4().to_string(),
            organization_id,
            product_id,
            record_date,
            unit_of_measure: None,
            produced_quantity: None,
            estimated_losses: None,
            final_quantity: None,
            created_at: Local::now().naive_local(),
        }
    }

    /// 设置产出计量单位
    pub fn with_unit_of_measure(mut self, uom: Option<String>) -> Self {
        self.unit_of_measure = uom;
        self
    }

    /// 设置产量字段 (投产/损耗/最终产出)
    pub fn with_quantities(
        mut self,
        produced: Option<f64>,
        losses: Option<f64>,
        final_qty: Option<f64>,
    ) -> Self {
        self.produced_quantity = produced;
        self.estimated_losses = losses;
        self.final_quantity = final_qty;
        self
    }
}

// ==========================================
// CostRecordWithChildren 辅助方法
// ==========================================
impl CostRecordWithChildren {
    /// 从平铺的子表行组装聚合 (按分类拆分到七个集合)
    pub fn from_parts(
        record: CostRecord,
        unit_items: Vec<UnitCostItem>,
        value_items: Vec<ValueCostItem>,
        summary: Option<CostSummary>,
    ) -> Self {
        let mut agg = Self {
            record,
            raw_material_items: vec![],
            direct_labor_items: vec![],
            indirect_overhead_items: vec![],
            indirect_labor_items: vec![],
            general_overhead_items: vec![],
            operating_cost_items: vec![],
            sales_expense_items: vec![],
            summary,
        };
        for item in unit_items {
            match item.category {
                UnitCostCategory::RawMaterial => agg.raw_material_items.push(item),
                UnitCostCategory::DirectLabor => agg.direct_labor_items.push(item),
                UnitCostCategory::IndirectOverhead => agg.indirect_overhead_items.push(item),
                UnitCostCategory::IndirectLabor => agg.indirect_labor_items.push(item),
            }
        }
        for item in value_items {
            match item.category {
                ValueCostCategory::GeneralOverhead => agg.general_overhead_items.push(item),
                ValueCostCategory::OperatingCost => agg.operating_cost_items.push(item),
                ValueCostCategory::SalesExpense => agg.sales_expense_items.push(item),
            }
        }
        agg
    }

    /// 全部计量型明细 (平铺视图, 测试与序列化辅助)
    pub fn unit_items(&self) -> Vec<&UnitCostItem> {
        self.raw_material_items
            .iter()
            .chain(self.direct_labor_items.iter())
            .chain(self.indirect_overhead_items.iter())
            .chain(self.indirect_labor_items.iter())
            .collect()
    }

    /// 全部金额型明细 (平铺视图)
    pub fn value_items(&self) -> Vec<&ValueCostItem> {
        self.general_overhead_items
            .iter()
            .chain(self.operating_cost_items.iter())
            .chain(self.sales_expense_items.iter())
            .collect()
    }

    /// 子实体总数 (明细 + 汇总)
    pub fn child_count(&self) -> usize {
        self.unit_items().len()
            + self.value_items().len()
            + if self.summary.is_some() { 1 } else { 0 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::line_item::{UnitCostItemDraft, ValueCostItemDraft};

    #[test]
    fn test_from_parts_splits_by_category() {
        let record = CostRecord::new(
            "ORG-1".to_string(),
            "PROD-1".to_string(),
            NaiveDate::from_ymd_opt(2024, 3, 4).unwrap(),
        );
        let rid = record.record_id.clone();

        let unit_items = vec![
            UnitCostItemDraft {
                item_name: "面粉".to_string(),
                unit_of_measure: Some("kg".to_string()),
                quantity: Some(10.0),
                unit_cost: Some(2.0),
                total_cost: Some(20.0),
            }
            .into_item(&rid, "ORG-1", UnitCostCategory::RawMaterial),
            UnitCostItemDraft {
                item_name: "操作工".to_string(),
                unit_of_measure: Some("h".to_string()),
                quantity: Some(8.0),
                unit_cost: Some(30.0),
                total_cost: Some(240.0),
            }
            .into_item(&rid, "ORG-1", UnitCostCategory::DirectLabor),
        ];
        let value_items = vec![ValueCostItemDraft {
            item_name: "物流".to_string(),
            amount: Some(50.0),
        }
        .into_item(&rid, "ORG-1", ValueCostCategory::OperatingCost)];

        let agg = CostRecordWithChildren::from_parts(record, unit_items, value_items, None);

        assert_eq!(agg.raw_material_items.len(), 1, "原材料明细应有1条");
        assert_eq!(agg.direct_labor_items.len(), 1, "直接人工明细应有1条");
        assert_eq!(agg.operating_cost_items.len(), 1, "经营费用明细应有1条");
        assert!(agg.general_overhead_items.is_empty());
        assert_eq!(agg.child_count(), 3);
    }

    #[test]
    fn test_draft_stamping_keeps_fields_verbatim() {
        let draft = UnitCostItemDraft {
            item_name: "糖".to_string(),
            unit_of_measure: Some("kg".to_string()),
            quantity: Some(3.5),
            unit_cost: Some(4.0),
            total_cost: Some(999.0), // 与 数量×单价 不一致也原样保留
        };
        let item = draft.into_item("R-1", "ORG-9", UnitCostCategory::RawMaterial);

        assert_eq!(item.record_id, "R-1");
        assert_eq!(item.organization_id, "ORG-9");
        assert_eq!(item.total_cost, Some(999.0), "总额必须原样透传，不做重算");
        assert!(!item.item_id.is_empty());
    }
}
