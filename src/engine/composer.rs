// ==========================================
// 生产成本台账系统 - 成本记录组合器
// ==========================================
// 职责: 把一次组合请求变成 记录 + 七类明细 + 可选汇总
// 流程: 校验必填 -> 解析日期缺省 -> 生成ID并盖章 -> 单事务落库
// ==========================================
// 红线:
// - 必填校验在任何持久化动作之前完成
// - 数值全部透传, 不重算、不对账
// - 原子性显式依赖仓储的组合事务, 不依赖写入顺序
// ==========================================

use chrono::{Local, NaiveDate};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::domain::cost_record::{CostRecord, CostRecordWithChildren};
use crate::domain::cost_summary::CostSummaryDraft;
use crate::domain::line_item::{UnitCostItemDraft, ValueCostItemDraft};
use crate::domain::types::{UnitCostCategory, ValueCostCategory};
use crate::repository::cost_record_repo::CostRecordRepository;
use crate::repository::error::RepositoryError;

// ==========================================
// 组合器错误类型
// ==========================================
#[derive(Error, Debug)]
pub enum CompositionError {
    #[error("缺少必填字段: {0}")]
    MissingField(String),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Result 类型别名
pub type CompositionResult<T> = Result<T, CompositionError>;

// ==========================================
// CompositionRequest - 组合请求
// ==========================================
// 七个明细列表允许为空; 汇总可以缺省
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CompositionRequest {
    // ===== 记录字段 =====
    pub product_id: String,               // 产品 (必填)
    pub record_date: Option<NaiveDate>,   // 记账日期 (缺省 = 当天)
    pub unit_of_measure: Option<String>,  // 产出计量单位
    pub produced_quantity: Option<f64>,   // 投产数量
    pub estimated_losses: Option<f64>,    // 预估损耗
    pub final_quantity: Option<f64>,      // 最终产出数量

    // ===== 计量型明细 (4) =====
    pub raw_material_items: Vec<UnitCostItemDraft>,      // 原材料
    pub direct_labor_items: Vec<UnitCostItemDraft>,      // 直接人工
    pub indirect_overhead_items: Vec<UnitCostItemDraft>, // 间接制造费用
    pub indirect_labor_items: Vec<UnitCostItemDraft>,    // 间接人工

    // ===== 金额型明细 (3) =====
    pub general_overhead_items: Vec<ValueCostItemDraft>, // 一般管理费用
    pub operating_cost_items: Vec<ValueCostItemDraft>,   // 经营费用
    pub sales_expense_items: Vec<ValueCostItemDraft>,    // 销售费用

    // ===== 派生汇总 (0..1) =====
    pub summary: Option<CostSummaryDraft>,
}

impl CompositionRequest {
    /// 明细总条数 (七个列表合计)
    pub fn item_count(&self) -> usize {
        self.raw_material_items.len()
            + self.direct_labor_items.len()
            + self.indirect_overhead_items.len()
            + self.indirect_labor_items.len()
            + self.general_overhead_items.len()
            + self.operating_cost_items.len()
            + self.sales_expense_items.len()
    }
}

// ==========================================
// CostRecordComposer - 成本记录组合器
// ==========================================
pub struct CostRecordComposer {
    cost_record_repo: Arc<CostRecordRepository>,
}

impl CostRecordComposer {
    /// 创建新的组合器
    pub fn new(cost_record_repo: Arc<CostRecordRepository>) -> Self {
        Self { cost_record_repo }
    }

    /// 组合写入一条成本记录
    ///
    /// # 参数
    /// - `organization_id`: 所属组织 (来自调用方上下文, 显式传入)
    /// - `request`: 组合请求
    ///
    /// # 返回
    /// - `Ok(aggregate)`: 已落库的完整聚合 (ID/日期/时间戳已解析, 子实体已盖章)
    /// - `Err(MissingField)`: organization_id 或 product_id 缺失/空白
    /// - `Err(Repository)`: 持久化失败, 事务整体回滚
    pub fn compose(
        &self,
        organization_id: &str,
        request: CompositionRequest,
    ) -> CompositionResult<CostRecordWithChildren> {
        // 1. 必填校验 (在任何持久化动作之前)
        if organization_id.trim().is_empty() {
            return Err(CompositionError::MissingField("organization_id".to_string()));
        }
        if request.product_id.trim().is_empty() {
            return Err(CompositionError::MissingField("product_id".to_string()));
        }

        // 2. 日期缺省 = 提交当天 (本地日期)
        let record_date = request
            .record_date
            .unwrap_or_else(|| Local::now().date_naive());

        // 3. 生成记录 (UUID + 创建时间)
        let record = CostRecord::new(
            organization_id.to_string(),
            request.product_id.clone(),
            record_date,
        )
        .with_unit_of_measure(request.unit_of_measure.clone())
        .with_quantities(
            request.produced_quantity,
            request.estimated_losses,
            request.final_quantity,
        );
        let record_id = record.record_id.clone();

        // 4. 盖章: 组织ID统一取父记录的, 明细自带的归属字段一律不采信
        let mut unit_items = Vec::with_capacity(
            request.raw_material_items.len()
                + request.direct_labor_items.len()
                + request.indirect_overhead_items.len()
                + request.indirect_labor_items.len(),
        );
        for draft in request.raw_material_items {
            unit_items.push(draft.into_item(&record_id, organization_id, UnitCostCategory::RawMaterial));
        }
        for draft in request.direct_labor_items {
            unit_items.push(draft.into_item(&record_id, organization_id, UnitCostCategory::DirectLabor));
        }
        for draft in request.indirect_overhead_items {
            unit_items.push(draft.into_item(
                &record_id,
                organization_id,
                UnitCostCategory::IndirectOverhead,
            ));
        }
        for draft in request.indirect_labor_items {
            unit_items.push(draft.into_item(&record_id, organization_id, UnitCostCategory::IndirectLabor));
        }

        let mut value_items = Vec::with_capacity(
            request.general_overhead_items.len()
                + request.operating_cost_items.len()
                + request.sales_expense_items.len(),
        );
        for draft in request.general_overhead_items {
            value_items.push(draft.into_item(
                &record_id,
                organization_id,
                ValueCostCategory::GeneralOverhead,
            ));
        }
        for draft in request.operating_cost_items {
            value_items.push(draft.into_item(&record_id, organization_id, ValueCostCategory::OperatingCost));
        }
        for draft in request.sales_expense_items {
            value_items.push(draft.into_item(&record_id, organization_id, ValueCostCategory::SalesExpense));
        }

        let summary = request
            .summary
            .map(|draft| draft.into_summary(&record_id, organization_id));

        // 5. 单事务落库 (任一步失败整体回滚)
        self.cost_record_repo
            .create_composed(&record, &unit_items, &value_items, summary.as_ref())?;

        debug!(
            record_id = %record_id,
            unit_items = unit_items.len(),
            value_items = value_items.len(),
            has_summary = summary.is_some(),
            "成本记录组合写入完成"
        );

        // 6. 返回完整聚合
        Ok(CostRecordWithChildren::from_parts(
            record,
            unit_items,
            value_items,
            summary,
        ))
    }
}
