// ==========================================
// 生产成本台账系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、组合草稿形态
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod audit;
pub mod cost_record;
pub mod cost_summary;
pub mod line_item;
pub mod types;

// 重导出核心类型
pub use audit::{AuditActionType, AuditLog};
pub use cost_record::{CostRecord, CostRecordWithChildren};
pub use cost_summary::{CostSummary, CostSummaryDraft};
pub use line_item::{UnitCostItem, UnitCostItemDraft, ValueCostItem, ValueCostItemDraft};
pub use types::{EvolutionMode, UnitCostCategory, ValueCostCategory};
