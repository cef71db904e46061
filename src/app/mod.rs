// ==========================================
// 生产成本台账系统 - 应用层
// ==========================================
// 职责: 组装共享状态, 连接入口与后端
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
