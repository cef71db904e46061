// ==========================================
// 生产成本台账系统 - 应用状态
// ==========================================
// 职责: 管理应用级别的共享状态和API实例
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::CostsApi;
use crate::engine::composer::CostRecordComposer;
use crate::engine::evolution::EvolutionQueryEngine;
use crate::repository::{AuditLogRepository, CostRecordRepository, ReferenceRepository};

/// 应用状态
///
/// 包含API实例和共享资源, 所有仓储共用同一个数据库连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 成本API
    pub costs_api: Arc<CostsApi>,

    /// 成本记录仓储
    pub cost_record_repo: Arc<CostRecordRepository>,

    /// 组织/产品参照仓储
    pub reference_repo: Arc<ReferenceRepository>,

    /// 审计日志仓储
    pub audit_log_repo: Arc<AuditLogRepository>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    ///
    /// # 返回
    /// - Ok(AppState): 应用状态实例
    /// - Err(String): 初始化错误
    ///
    /// # 说明
    /// 该方法会：
    /// 1. 打开数据库连接并安装 SQL 追踪
    /// 2. 初始化数据库结构 (幂等)
    /// 3. 初始化所有Repository / Engine / API实例
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        // 创建数据库连接（共享连接）
        let mut conn = crate::db::open_sqlite_connection(&db_path)
            .map_err(|e| format!("无法打开数据库: {}", e))?;
        crate::perf::install_sqlite_tracing(&mut conn);

        crate::db::init_schema(&conn)
            .map_err(|e| format!("初始化数据库结构失败: {}", e))?;
        match crate::db::read_schema_version(&conn) {
            Ok(Some(version)) if version != crate::db::CURRENT_SCHEMA_VERSION => {
                tracing::warn!(
                    "数据库结构版本不一致: 库中={}, 期望={}",
                    version,
                    crate::db::CURRENT_SCHEMA_VERSION
                );
            }
            Ok(_) => {}
            Err(e) => {
                tracing::warn!("读取数据库结构版本失败(将继续启动): {}", e);
            }
        }

        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 初始化Repository层
        // ==========================================

        let cost_record_repo = Arc::new(CostRecordRepository::from_connection(conn.clone()));
        let reference_repo = Arc::new(ReferenceRepository::from_connection(conn.clone()));
        let audit_log_repo = Arc::new(AuditLogRepository::new(conn.clone()));

        // ==========================================
        // 初始化Engine层
        // ==========================================

        // 成本记录组合器
        let composer = Arc::new(CostRecordComposer::new(cost_record_repo.clone()));

        // 演化查询引擎
        let evolution_engine = Arc::new(EvolutionQueryEngine::new(cost_record_repo.clone()));

        // ==========================================
        // 初始化API层
        // ==========================================

        let costs_api = Arc::new(CostsApi::new(
            composer,
            evolution_engine,
            cost_record_repo.clone(),
            audit_log_repo.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            costs_api,
            cost_record_repo,
            reference_repo,
            audit_log_repo,
        })
    }

    /// 获取数据库路径
    pub fn get_db_path(&self) -> &str {
        &self.db_path
    }
}

// ==========================================
// 默认数据库路径辅助函数
// ==========================================

/// 获取默认数据库路径
///
/// # 返回
/// - 开发环境: 用户数据目录/production-cost-ledger-dev/cost_ledger.db
/// - 生产环境: 用户数据目录/production-cost-ledger/cost_ledger.db
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    // 允许通过环境变量显式指定 DB 路径（便于调试/测试/CI）
    if let Ok(path) = std::env::var("COST_LEDGER_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    // 先给一个默认回退值，后续如果能拿到 data_dir 再覆盖。
    let mut path = PathBuf::from("./cost_ledger.db");

    // 尝试获取用户数据目录
    if let Some(data_dir) = dirs::data_dir() {
        // 开发环境使用独立目录，避免污染生产数据
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("production-cost-ledger-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("production-cost-ledger");
        }

        // 确保目录存在
        std::fs::create_dir_all(&path).ok();
        path = path.join("cost_ledger.db");
    }

    path.to_string_lossy().to_string()
}
