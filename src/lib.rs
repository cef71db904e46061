// ==========================================
// 生产成本台账系统 - 核心库
// ==========================================
// 技术栈: Rust + SQLite
// 系统定位: 成本记录台账 + 成本演化分析
// ==========================================

// 初始化国际化系统
rust_i18n::i18n!("locales", fallback = "zh-CN");

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 业务规则
pub mod engine;

// 数据库基础设施（连接初始化/PRAGMA/建表统一）
pub mod db;

// 日志系统
pub mod logging;

// 性能追踪
pub mod perf;

// 国际化
pub mod i18n;

// API 层 - 业务接口
pub mod api;

// 应用层 - 状态组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{EvolutionMode, UnitCostCategory, ValueCostCategory};

// 领域实体
pub use domain::{
    AuditLog, CostRecord, CostRecordWithChildren, CostSummary, CostSummaryDraft, UnitCostItem,
    UnitCostItemDraft, ValueCostItem, ValueCostItemDraft,
};

// 引擎
pub use engine::{
    CompositionRequest, CostRecordComposer, EvolutionPoint, EvolutionQuery, EvolutionQueryEngine,
};

// API
pub use api::{CostRecordResponse, CostsApi, CreateCostRecordRequest, EvolutionQueryRequest};

// 应用层
pub use app::{get_default_db_path, AppState};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产成本台账系统";

// 数据库版本
pub const DB_VERSION: &str = "v0.1";

// ==========================================
// 预编译检查
// ==========================================
