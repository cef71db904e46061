// ==========================================
// 生产成本台账系统 - 引擎层
// ==========================================
// 职责: 组合与聚合的业务规则
// 红线: Engine 不拼 SQL; 取数一律走仓储
// ==========================================

pub mod calendar;
pub mod composer;
pub mod evolution;

// 重导出核心引擎
pub use composer::{CompositionError, CompositionRequest, CompositionResult, CostRecordComposer};
pub use evolution::{EvolutionPoint, EvolutionQuery, EvolutionQueryEngine};
