// ==========================================
// 生产成本台账系统 - 成本汇总领域模型
// ==========================================
// 每条成本记录至多一条汇总; 六个数值全部由调用方
// 预先算好, 系统只存取, 不重算、不校验
// ==========================================

use serde::{Deserialize, Serialize};

// ==========================================
// CostSummary - 派生汇总
// ==========================================
// 对齐: cost_summary 表
// 用途: 演化序列的唯一数据来源 (单位成本 + 单位利润)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummary {
    // ===== 归属 =====
    pub record_id: String,       // 所属成本记录
    pub organization_id: String, // 所属组织 (与父记录一致)

    // ===== 汇总数值 (调用方预计算) =====
    pub total_sales_expense: f64,   // 销售费用合计
    pub total_operating_cost: f64,  // 经营费用合计
    pub total_production_cost: f64, // 生产成本合计
    pub unit_production_cost: f64,  // 单位生产成本
    pub unit_sale_price: f64,       // 建议单位售价
    pub unit_profit_margin: f64,    // 单位利润
}

// ==========================================
// CostSummaryDraft - 组合请求中的汇总
// ==========================================
// 归属字段由 Composer 盖章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostSummaryDraft {
    pub total_sales_expense: f64,   // 销售费用合计
    pub total_operating_cost: f64,  // 经营费用合计
    pub total_production_cost: f64, // 生产成本合计
    pub unit_production_cost: f64,  // 单位生产成本
    pub unit_sale_price: f64,       // 建议单位售价
    pub unit_profit_margin: f64,    // 单位利润
}

impl CostSummaryDraft {
    /// 盖章生成完整汇总
    pub fn into_summary(self, record_id: &str, organization_id: &str) -> CostSummary {
        CostSummary {
            record_id: record_id.to_string(),
            organization_id: organization_id.to_string(),
            total_sales_expense: self.total_sales_expense,
            total_operating_cost: self.total_operating_cost,
            total_production_cost: self.total_production_cost,
            unit_production_cost: self.unit_production_cost,
            unit_sale_price: self.unit_sale_price,
            unit_profit_margin: self.unit_profit_margin,
        }
    }
}
