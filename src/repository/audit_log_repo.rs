// ==========================================
// 生产成本台账系统 - 审计日志仓储
// ==========================================
// 红线: Repository 不做业务逻辑,只做数据映射
// 说明: 审计写入是尽力而为的旁路, 调用方负责降级处理
// ==========================================

use crate::domain::audit::AuditLog;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use std::sync::{Arc, Mutex};

// ==========================================
// AuditLogRepository - 审计日志仓储
// ==========================================
pub struct AuditLogRepository {
    conn: Arc<Mutex<Connection>>,
}

impl AuditLogRepository {
    /// 创建新的审计日志仓储
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 插入审计日志
    ///
    /// # 参数
    /// - `log`: 审计日志实体 (log_id 留空, 由自增主键生成)
    ///
    /// # 返回
    /// - `Ok(log_id)`: 成功插入, 返回自增ID
    /// - `Err(...)`: 数据库错误
    pub fn insert(&self, log: &AuditLog) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;

        conn.execute(
            r#"
            INSERT INTO audit_log (
                action_type, entity_type, entity_id, organization_id,
                detail, payload_json, action_ts
            ) VALUES (?, ?, ?, ?, ?, ?, ?)
            "#,
            params![
                log.action_type,
                log.entity_type,
                log.entity_id,
                log.organization_id,
                log.detail,
                log.payload_json.as_ref().map(|v| v.to_string()),
                log.action_ts.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        Ok(conn.last_insert_rowid())
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 查询最近的审计日志 (时间降序)
    pub fn find_recent(&self, limit: usize) -> RepositoryResult<Vec<AuditLog>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT log_id, action_type, entity_type, entity_id, organization_id,
                      detail, payload_json, action_ts
               FROM audit_log
               ORDER BY action_ts DESC, log_id DESC
               LIMIT ?"#,
        )?;

        let logs = stmt
            .query_map(params![limit as i64], |row| Self::map_row(row))?
            .collect::<Result<Vec<AuditLog>, _>>()?;

        Ok(logs)
    }

    /// 统计审计日志总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM audit_log", [], |row| row.get(0))?;
        Ok(count)
    }

    /// 映射数据库行到AuditLog对象
    fn map_row(row: &rusqlite::Row) -> rusqlite::Result<AuditLog> {
        Ok(AuditLog {
            log_id: Some(row.get(0)?),
            action_type: row.get(1)?,
            entity_type: row.get(2)?,
            entity_id: row.get(3)?,
            organization_id: row.get(4)?,
            detail: row.get(5)?,
            payload_json: row
                .get::<_, Option<String>>(6)?
                .and_then(|s| serde_json::from_str(&s).ok()),
            action_ts: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(7)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    7,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        })
    }
}
