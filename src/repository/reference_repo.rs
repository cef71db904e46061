// ==========================================
// 生产成本台账系统 - 基础数据仓储 (组织/产品)
// ==========================================
// 职责: 维护 cost_record 外键指向的基础数据
// 说明: 只提供写入/查询/存在性检查, 不是完整的主数据管理面
// 红线: 不含业务逻辑，只负责数据访问
// ==========================================

use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::NaiveDateTime;
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex};

// ==========================================
// OrganizationEntity - 组织
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrganizationEntity {
    pub org_id: String,            // 组织ID
    pub org_name: String,          // 组织名称
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// ProductEntity - 产品
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductEntity {
    pub product_id: String,        // 产品ID
    pub product_name: String,      // 产品名称
    pub created_at: NaiveDateTime, // 创建时间
}

// ==========================================
// ReferenceRepository - 基础数据仓储
// ==========================================
pub struct ReferenceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl ReferenceRepository {
    /// 创建新的 ReferenceRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 组织
    // ==========================================

    /// 写入组织 (INSERT OR REPLACE, upsert 语义)
    pub fn upsert_organization(&self, org: &OrganizationEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO organization (org_id, org_name, created_at) VALUES (?, ?, ?)",
            params![
                &org.org_id,
                &org.org_name,
                &org.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按org_id查询组织
    pub fn find_organization(&self, org_id: &str) -> RepositoryResult<Option<OrganizationEntity>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT org_id, org_name, created_at FROM organization WHERE org_id = ?",
            params![org_id],
            |row| {
                Ok(OrganizationEntity {
                    org_id: row.get(0)?,
                    org_name: row.get(1)?,
                    created_at: Self::parse_ts(row, 2)?,
                })
            },
        ) {
            Ok(org) => Ok(Some(org)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 组织是否存在
    pub fn organization_exists(&self, org_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM organization WHERE org_id = ?",
            params![org_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 统计组织数
    pub fn count_organizations(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 =
            conn.query_row("SELECT COUNT(*) FROM organization", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==========================================
    // 产品
    // ==========================================

    /// 写入产品 (INSERT OR REPLACE, upsert 语义)
    pub fn upsert_product(&self, product: &ProductEntity) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            "INSERT OR REPLACE INTO product (product_id, product_name, created_at) VALUES (?, ?, ?)",
            params![
                &product.product_id,
                &product.product_name,
                &product.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;
        Ok(())
    }

    /// 按product_id查询产品
    pub fn find_product(&self, product_id: &str) -> RepositoryResult<Option<ProductEntity>> {
        let conn = self.get_conn()?;
        match conn.query_row(
            "SELECT product_id, product_name, created_at FROM product WHERE product_id = ?",
            params![product_id],
            |row| {
                Ok(ProductEntity {
                    product_id: row.get(0)?,
                    product_name: row.get(1)?,
                    created_at: Self::parse_ts(row, 2)?,
                })
            },
        ) {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 产品是否存在
    pub fn product_exists(&self, product_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM product WHERE product_id = ?",
            params![product_id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// 统计产品数
    pub fn count_products(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM product", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==========================================
    // 行映射辅助
    // ==========================================

    fn parse_ts(row: &rusqlite::Row, idx: usize) -> rusqlite::Result<NaiveDateTime> {
        NaiveDateTime::parse_from_str(&row.get::<_, String>(idx)?, "%Y-%m-%d %H:%M:%S").map_err(
            |e| {
                rusqlite::Error::FromSqlConversionFailure(
                    idx,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            },
        )
    }
}
