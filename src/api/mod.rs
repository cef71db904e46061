// ==========================================
// 生产成本台账系统 - API 层
// ==========================================
// 职责: 提供业务 API 接口, 供上层入口调用
// ==========================================

pub mod error;
pub mod costs_api;

// 重导出核心类型
pub use costs_api::{
    CostRecordResponse, CostsApi, CreateCostRecordRequest, EvolutionQueryRequest,
};
pub use error::{ApiError, ApiResult};
