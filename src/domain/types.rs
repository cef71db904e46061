// ==========================================
// 生产成本台账系统 - 领域类型定义
// ==========================================
// 七个成本分类 = 4 个计量型 + 3 个金额型
// 序列化格式: SCREAMING_SNAKE_CASE (与数据库一致)
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// 计量型成本分类 (Unit Cost Category)
// ==========================================
// 每条明细带 数量/计量单位/单价/总额
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UnitCostCategory {
    RawMaterial,      // 原材料
    DirectLabor,      // 直接人工
    IndirectOverhead, // 间接制造费用
    IndirectLabor,    // 间接人工
}

impl fmt::Display for UnitCostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitCostCategory::RawMaterial => write!(f, "RAW_MATERIAL"),
            UnitCostCategory::DirectLabor => write!(f, "DIRECT_LABOR"),
            UnitCostCategory::IndirectOverhead => write!(f, "INDIRECT_OVERHEAD"),
            UnitCostCategory::IndirectLabor => write!(f, "INDIRECT_LABOR"),
        }
    }
}

impl UnitCostCategory {
    /// 从字符串解析分类（数据库读取路径，未知值返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "RAW_MATERIAL" => Some(UnitCostCategory::RawMaterial),
            "DIRECT_LABOR" => Some(UnitCostCategory::DirectLabor),
            "INDIRECT_OVERHEAD" => Some(UnitCostCategory::IndirectOverhead),
            "INDIRECT_LABOR" => Some(UnitCostCategory::IndirectLabor),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            UnitCostCategory::RawMaterial => "RAW_MATERIAL",
            UnitCostCategory::DirectLabor => "DIRECT_LABOR",
            UnitCostCategory::IndirectOverhead => "INDIRECT_OVERHEAD",
            UnitCostCategory::IndirectLabor => "INDIRECT_LABOR",
        }
    }

    /// 全部计量型分类（按固定展示顺序）
    pub fn all() -> [UnitCostCategory; 4] {
        [
            UnitCostCategory::RawMaterial,
            UnitCostCategory::DirectLabor,
            UnitCostCategory::IndirectOverhead,
            UnitCostCategory::IndirectLabor,
        ]
    }
}

// ==========================================
// 金额型成本分类 (Value Cost Category)
// ==========================================
// 每条明细只带总金额，无单价/数量拆分
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ValueCostCategory {
    GeneralOverhead, // 一般管理费用
    OperatingCost,   // 经营费用
    SalesExpense,    // 销售费用
}

impl fmt::Display for ValueCostCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValueCostCategory::GeneralOverhead => write!(f, "GENERAL_OVERHEAD"),
            ValueCostCategory::OperatingCost => write!(f, "OPERATING_COST"),
            ValueCostCategory::SalesExpense => write!(f, "SALES_EXPENSE"),
        }
    }
}

impl ValueCostCategory {
    /// 从字符串解析分类（数据库读取路径，未知值返回 None）
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_uppercase().as_str() {
            "GENERAL_OVERHEAD" => Some(ValueCostCategory::GeneralOverhead),
            "OPERATING_COST" => Some(ValueCostCategory::OperatingCost),
            "SALES_EXPENSE" => Some(ValueCostCategory::SalesExpense),
            _ => None,
        }
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ValueCostCategory::GeneralOverhead => "GENERAL_OVERHEAD",
            ValueCostCategory::OperatingCost => "OPERATING_COST",
            ValueCostCategory::SalesExpense => "SALES_EXPENSE",
        }
    }

    /// 全部金额型分类（按固定展示顺序）
    pub fn all() -> [ValueCostCategory; 3] {
        [
            ValueCostCategory::GeneralOverhead,
            ValueCostCategory::OperatingCost,
            ValueCostCategory::SalesExpense,
        ]
    }
}

// ==========================================
// 演化序列分桶模式 (Evolution Mode)
// ==========================================
// day: 每条记录一个点; week: 按 ISO 周（周一锚点）聚合
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EvolutionMode {
    Day,
    Week,
}

impl fmt::Display for EvolutionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EvolutionMode::Day => write!(f, "day"),
            EvolutionMode::Week => write!(f, "week"),
        }
    }
}

impl EvolutionMode {
    /// 从字符串解析模式（未识别的值回落到 day）
    pub fn from_str(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "week" => EvolutionMode::Week,
            _ => EvolutionMode::Day, // 默认值
        }
    }
}

// TODO: 用标准 FromStr trait 替换手写 from_str，统一各枚举的解析入口
