// ==========================================
// 生产成本台账系统 - 成本明细领域模型
// ==========================================
// 两种物理形态承载七个逻辑分类:
// - 计量型 (UnitCostItem): 数量 × 单价 = 总额
// - 金额型 (ValueCostItem): 只有总金额
// ==========================================
// 红线: 明细不能脱离成本记录单独存在
// ==========================================

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::types::{UnitCostCategory, ValueCostCategory};

// ==========================================
// UnitCostItem - 计量型成本明细
// ==========================================
// 对齐: cost_item_unit 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCostItem {
    // ===== 主键与归属 =====
    pub item_id: String,            // 明细ID (UUID)
    pub record_id: String,          // 所属成本记录
    pub organization_id: String,    // 所属组织 (与父记录一致)
    pub category: UnitCostCategory, // 成本分类

    // ===== 明细内容 (调用方原样提供) =====
    pub item_name: String,               // 明细名称
    pub unit_of_measure: Option<String>, // 计量单位
    pub quantity: Option<f64>,           // 数量
    pub unit_cost: Option<f64>,          // 单价
    pub total_cost: Option<f64>,         // 总额
}

// ==========================================
// ValueCostItem - 金额型成本明细
// ==========================================
// 对齐: cost_item_value 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueCostItem {
    // ===== 主键与归属 =====
    pub item_id: String,             // 明细ID (UUID)
    pub record_id: String,           // 所属成本记录
    pub organization_id: String,     // 所属组织 (与父记录一致)
    pub category: ValueCostCategory, // 成本分类

    // ===== 明细内容 (调用方原样提供) =====
    pub item_name: String,   // 明细名称
    pub amount: Option<f64>, // 金额
}

// ==========================================
// 草稿形态 - 组合请求中的明细
// ==========================================
// 调用方不提供 ID/归属字段; 组合时由 Composer 盖章
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UnitCostItemDraft {
    pub item_name: String,               // 明细名称
    pub unit_of_measure: Option<String>, // 计量单位
    pub quantity: Option<f64>,           // 数量
    pub unit_cost: Option<f64>,          // 单价
    pub total_cost: Option<f64>,         // 总额
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValueCostItemDraft {
    pub item_name: String,   // 明细名称
    pub amount: Option<f64>, // 金额
}

// ==========================================
// UnitCostItemDraft 辅助方法
// ==========================================
impl UnitCostItemDraft {
    /// 盖章生成完整明细
    ///
    /// # 参数
    /// - `record_id`: 父成本记录ID
    /// - `organization_id`: 父记录的组织ID (明细不自带组织)
    /// - `category`: 该明细所属分类
    pub fn into_item(
        self,
        record_id: &str,
        organization_id: &str,
        category: UnitCostCategory,
    ) -> UnitCostItem {
        UnitCostItem {
            item_id: Uuid::new_v4().to_string(),
            record_id: record_id.to_string(),
            organization_id: organization_id.to_string(),
            category,
            item_name: self.item_name,
            unit_of_measure: self.unit_of_measure,
            quantity: self.quantity,
            unit_cost: self.unit_cost,
            total_cost: self.total_cost,
        }
    }
}

// ==========================================
// ValueCostItemDraft 辅助方法
// ==========================================
impl ValueCostItemDraft {
    /// 盖章生成完整明细
    pub fn into_item(
        self,
        record_id: &str,
        organization_id: &str,
        category: ValueCostCategory,
    ) -> ValueCostItem {
        ValueCostItem {
            item_id: Uuid::new_v4().to_string(),
            record_id: record_id.to_string(),
            organization_id: organization_id.to_string(),
            category,
            item_name: self.item_name,
            amount: self.amount,
        }
    }
}
