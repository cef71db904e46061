// ==========================================
// 生产成本台账系统 - 成本记录仓储
// ==========================================
// 红线: Repository 不含业务逻辑
// - 组合写入只负责"一个事务全进或全退"
// - 缺汇总的记录原样返回 (Option::None), 取舍由引擎决定
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::cost_record::{CostRecord, CostRecordWithChildren};
use crate::domain::cost_summary::CostSummary;
use crate::domain::line_item::{UnitCostItem, ValueCostItem};
use crate::domain::types::{UnitCostCategory, ValueCostCategory};
use crate::repository::error::{RepositoryError, RepositoryResult};
use chrono::{NaiveDate, NaiveDateTime};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

// ==========================================
// CostRecordRepository - 成本记录仓储
// ==========================================
pub struct CostRecordRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CostRecordRepository {
    /// 创建新的CostRecordRepository实例 (打开数据库文件)
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)
            .map_err(|e| RepositoryError::DatabaseConnectionError(e.to_string()))?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从共享连接创建实例 (与其他仓储共用一个连接)
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 组合写入: 成本记录 + 全部明细 + 可选汇总, 单事务
    ///
    /// # 参数
    /// - `record`: 成本记录 (ID/时间戳已生成)
    /// - `unit_items`: 计量型明细 (四个分类平铺)
    /// - `value_items`: 金额型明细 (三个分类平铺)
    /// - `summary`: 可选汇总
    ///
    /// # 返回
    /// - `Ok(())`: 全部行已提交
    /// - `Err`: 任一步失败, 整个事务回滚, 不留部分状态
    ///
    /// # 红线
    /// - 必须在同一事务中完成, 不依赖写入顺序的偶然性
    pub fn create_composed(
        &self,
        record: &CostRecord,
        unit_items: &[UnitCostItem],
        value_items: &[ValueCostItem],
        summary: Option<&CostSummary>,
    ) -> RepositoryResult<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute(
            r#"INSERT INTO cost_record (
                record_id, organization_id, product_id, record_date,
                unit_of_measure, produced_quantity, estimated_losses, final_quantity,
                created_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &record.record_id,
                &record.organization_id,
                &record.product_id,
                &record.record_date.format("%Y-%m-%d").to_string(),
                &record.unit_of_measure,
                &record.produced_quantity,
                &record.estimated_losses,
                &record.final_quantity,
                &record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            ],
        )?;

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO cost_item_unit (
                        item_id, record_id, organization_id, category,
                        item_name, unit_of_measure, quantity, unit_cost, total_cost
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            )?;

            for item in unit_items {
                stmt.execute(params![
                    &item.item_id,
                    &item.record_id,
                    &item.organization_id,
                    item.category.to_db_str(),
                    &item.item_name,
                    &item.unit_of_measure,
                    &item.quantity,
                    &item.unit_cost,
                    &item.total_cost,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                r#"INSERT INTO cost_item_value (
                        item_id, record_id, organization_id, category,
                        item_name, amount
                    ) VALUES (?, ?, ?, ?, ?, ?)"#,
            )?;

            for item in value_items {
                stmt.execute(params![
                    &item.item_id,
                    &item.record_id,
                    &item.organization_id,
                    item.category.to_db_str(),
                    &item.item_name,
                    &item.amount,
                ])?;
            }
        }

        if let Some(s) = summary {
            tx.execute(
                r#"INSERT INTO cost_summary (
                        record_id, organization_id,
                        total_sales_expense, total_operating_cost, total_production_cost,
                        unit_production_cost, unit_sale_price, unit_profit_margin
                    ) VALUES (?, ?, ?, ?, ?, ?, ?, ?)"#,
                params![
                    &s.record_id,
                    &s.organization_id,
                    &s.total_sales_expense,
                    &s.total_operating_cost,
                    &s.total_production_cost,
                    &s.unit_production_cost,
                    &s.unit_sale_price,
                    &s.unit_profit_margin,
                ],
            )?;
        }

        tx.commit()?;
        Ok(())
    }

    /// 按record_id查询完整聚合 (记录 + 七个分类集合 + 可选汇总)
    pub fn find_by_id(&self, record_id: &str) -> RepositoryResult<Option<CostRecordWithChildren>> {
        let conn = self.get_conn()?;

        let record = match conn.query_row(
            r#"SELECT record_id, organization_id, product_id, record_date,
                      unit_of_measure, produced_quantity, estimated_losses, final_quantity,
                      created_at
               FROM cost_record
               WHERE record_id = ?"#,
            params![record_id],
            |row| Self::map_record_row(row),
        ) {
            Ok(record) => record,
            Err(rusqlite::Error::QueryReturnedNoRows) => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let unit_items = {
            let mut stmt = conn.prepare(
                r#"SELECT item_id, record_id, organization_id, category,
                          item_name, unit_of_measure, quantity, unit_cost, total_cost
                   FROM cost_item_unit
                   WHERE record_id = ?
                   ORDER BY item_id"#,
            )?;
            let items = stmt
                .query_map(params![record_id], |row| Self::map_unit_item_row(row))?
                .collect::<Result<Vec<UnitCostItem>, _>>()?;
            items
        };

        let value_items = {
            let mut stmt = conn.prepare(
                r#"SELECT item_id, record_id, organization_id, category,
                          item_name, amount
                   FROM cost_item_value
                   WHERE record_id = ?
                   ORDER BY item_id"#,
            )?;
            let items = stmt
                .query_map(params![record_id], |row| Self::map_value_item_row(row))?
                .collect::<Result<Vec<ValueCostItem>, _>>()?;
            items
        };

        let summary = match conn.query_row(
            r#"SELECT record_id, organization_id,
                      total_sales_expense, total_operating_cost, total_production_cost,
                      unit_production_cost, unit_sale_price, unit_profit_margin
               FROM cost_summary
               WHERE record_id = ?"#,
            params![record_id],
            |row| Self::map_summary_row(row),
        ) {
            Ok(summary) => Some(summary),
            Err(rusqlite::Error::QueryReturnedNoRows) => None,
            Err(e) => return Err(e.into()),
        };

        Ok(Some(CostRecordWithChildren::from_parts(
            record, unit_items, value_items, summary,
        )))
    }

    /// 查询组织的全部成本记录 (最新在前)
    ///
    /// 排序: created_at 降序, record_id 降序兜底 (同秒创建时保证稳定顺序)
    pub fn list_by_organization(
        &self,
        organization_id: &str,
    ) -> RepositoryResult<Vec<CostRecordWithChildren>> {
        let conn = self.get_conn()?;

        let records = {
            let mut stmt = conn.prepare(
                r#"SELECT record_id, organization_id, product_id, record_date,
                          unit_of_measure, produced_quantity, estimated_losses, final_quantity,
                          created_at
                   FROM cost_record
                   WHERE organization_id = ?
                   ORDER BY created_at DESC, record_id DESC"#,
            )?;
            let rows = stmt
                .query_map(params![organization_id], |row| Self::map_record_row(row))?
                .collect::<Result<Vec<CostRecord>, _>>()?;
            rows
        };

        if records.is_empty() {
            return Ok(vec![]);
        }

        let record_ids: Vec<String> = records.iter().map(|r| r.record_id.clone()).collect();
        let mut unit_map = Self::load_unit_items(&conn, &record_ids)?;
        let mut value_map = Self::load_value_items(&conn, &record_ids)?;
        let mut summary_map = Self::load_summaries(&conn, &record_ids)?;

        let aggregates = records
            .into_iter()
            .map(|record| {
                let rid = record.record_id.clone();
                CostRecordWithChildren::from_parts(
                    record,
                    unit_map.remove(&rid).unwrap_or_default(),
                    value_map.remove(&rid).unwrap_or_default(),
                    summary_map.remove(&rid),
                )
            })
            .collect();

        Ok(aggregates)
    }

    /// 按日期区间查询 (含边界), 可选产品过滤
    ///
    /// # 参数
    /// - `start`/`end`: 闭区间 [start, end]
    /// - `product_id`: 产品过滤, None 表示不过滤
    ///
    /// # 返回
    /// (记录, 可选汇总) 列表, record_date 升序, created_at 升序兜底
    pub fn find_in_range(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        product_id: Option<&str>,
    ) -> RepositoryResult<Vec<(CostRecord, Option<CostSummary>)>> {
        let conn = self.get_conn()?;

        let mut sql = String::from(
            r#"SELECT r.record_id, r.organization_id, r.product_id, r.record_date,
                      r.unit_of_measure, r.produced_quantity, r.estimated_losses, r.final_quantity,
                      r.created_at,
                      s.record_id, s.organization_id,
                      s.total_sales_expense, s.total_operating_cost, s.total_production_cost,
                      s.unit_production_cost, s.unit_sale_price, s.unit_profit_margin
               FROM cost_record r
               LEFT JOIN cost_summary s ON s.record_id = r.record_id
               WHERE r.record_date BETWEEN ? AND ?"#,
        );

        let mut query_params: Vec<Value> = vec![
            Value::Text(start.format("%Y-%m-%d").to_string()),
            Value::Text(end.format("%Y-%m-%d").to_string()),
        ];

        if let Some(pid) = product_id {
            sql.push_str(" AND r.product_id = ?");
            query_params.push(Value::Text(pid.to_string()));
        }

        sql.push_str(" ORDER BY r.record_date ASC, r.created_at ASC");

        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params_from_iter(query_params), |row| {
                let record = Self::map_record_row(row)?;
                // LEFT JOIN 未命中时 s.record_id 为 NULL
                let summary = match row.get::<_, Option<String>>(9)? {
                    Some(record_id) => Some(CostSummary {
                        record_id,
                        organization_id: row.get::<_, Option<String>>(10)?.unwrap_or_default(),
                        total_sales_expense: row.get::<_, Option<f64>>(11)?.unwrap_or(0.0),
                        total_operating_cost: row.get::<_, Option<f64>>(12)?.unwrap_or(0.0),
                        total_production_cost: row.get::<_, Option<f64>>(13)?.unwrap_or(0.0),
                        unit_production_cost: row.get::<_, Option<f64>>(14)?.unwrap_or(0.0),
                        unit_sale_price: row.get::<_, Option<f64>>(15)?.unwrap_or(0.0),
                        unit_profit_margin: row.get::<_, Option<f64>>(16)?.unwrap_or(0.0),
                    }),
                    None => None,
                };
                Ok((record, summary))
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// 统计成本记录总数
    pub fn count_all(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let count: i64 = conn.query_row("SELECT COUNT(*) FROM cost_record", [], |row| row.get(0))?;
        Ok(count)
    }

    // ==========================================
    // 批量子表加载 (IN 动态参数)
    // ==========================================

    fn load_unit_items(
        conn: &Connection,
        record_ids: &[String],
    ) -> RepositoryResult<HashMap<String, Vec<UnitCostItem>>> {
        let placeholders = vec!["?"; record_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT item_id, record_id, organization_id, category,
                      item_name, unit_of_measure, quantity, unit_cost, total_cost
               FROM cost_item_unit
               WHERE record_id IN ({})
               ORDER BY item_id"#,
            placeholders
        );

        let id_params: Vec<Value> = record_ids.iter().map(|s| Value::Text(s.clone())).collect();
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(id_params), |row| {
                Self::map_unit_item_row(row)
            })?
            .collect::<Result<Vec<UnitCostItem>, _>>()?;

        let mut grouped: HashMap<String, Vec<UnitCostItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.record_id.clone()).or_default().push(item);
        }
        Ok(grouped)
    }

    fn load_value_items(
        conn: &Connection,
        record_ids: &[String],
    ) -> RepositoryResult<HashMap<String, Vec<ValueCostItem>>> {
        let placeholders = vec!["?"; record_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT item_id, record_id, organization_id, category,
                      item_name, amount
               FROM cost_item_value
               WHERE record_id IN ({})
               ORDER BY item_id"#,
            placeholders
        );

        let id_params: Vec<Value> = record_ids.iter().map(|s| Value::Text(s.clone())).collect();
        let mut stmt = conn.prepare(&sql)?;
        let items = stmt
            .query_map(params_from_iter(id_params), |row| {
                Self::map_value_item_row(row)
            })?
            .collect::<Result<Vec<ValueCostItem>, _>>()?;

        let mut grouped: HashMap<String, Vec<ValueCostItem>> = HashMap::new();
        for item in items {
            grouped.entry(item.record_id.clone()).or_default().push(item);
        }
        Ok(grouped)
    }

    fn load_summaries(
        conn: &Connection,
        record_ids: &[String],
    ) -> RepositoryResult<HashMap<String, CostSummary>> {
        let placeholders = vec!["?"; record_ids.len()].join(", ");
        let sql = format!(
            r#"SELECT record_id, organization_id,
                      total_sales_expense, total_operating_cost, total_production_cost,
                      unit_production_cost, unit_sale_price, unit_profit_margin
               FROM cost_summary
               WHERE record_id IN ({})"#,
            placeholders
        );

        let id_params: Vec<Value> = record_ids.iter().map(|s| Value::Text(s.clone())).collect();
        let mut stmt = conn.prepare(&sql)?;
        let summaries = stmt
            .query_map(params_from_iter(id_params), |row| Self::map_summary_row(row))?
            .collect::<Result<Vec<CostSummary>, _>>()?;

        Ok(summaries
            .into_iter()
            .map(|s| (s.record_id.clone(), s))
            .collect())
    }

    // ==========================================
    // 行映射
    // ==========================================

    /// 映射数据库行到CostRecord对象
    fn map_record_row(row: &rusqlite::Row) -> rusqlite::Result<CostRecord> {
        Ok(CostRecord {
            record_id: row.get(0)?,
            organization_id: row.get(1)?,
            product_id: row.get(2)?,
            record_date: NaiveDate::parse_from_str(&row.get::<_, String>(3)?, "%Y-%m-%d")
                .map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(
                        3,
                        rusqlite::types::Type::Text,
                        Box::new(e),
                    )
                })?,
            unit_of_measure: row.get(4)?,
            produced_quantity: row.get(5)?,
            estimated_losses: row.get(6)?,
            final_quantity: row.get(7)?,
            created_at: NaiveDateTime::parse_from_str(
                &row.get::<_, String>(8)?,
                "%Y-%m-%d %H:%M:%S",
            )
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    8,
                    rusqlite::types::Type::Text,
                    Box::new(e),
                )
            })?,
        })
    }

    /// 映射数据库行到UnitCostItem对象
    fn map_unit_item_row(row: &rusqlite::Row) -> rusqlite::Result<UnitCostItem> {
        let category_str: String = row.get(3)?;
        let category = UnitCostCategory::from_str(&category_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("未知计量型成本分类: {}", category_str).into(),
            )
        })?;

        Ok(UnitCostItem {
            item_id: row.get(0)?,
            record_id: row.get(1)?,
            organization_id: row.get(2)?,
            category,
            item_name: row.get(4)?,
            unit_of_measure: row.get(5)?,
            quantity: row.get(6)?,
            unit_cost: row.get(7)?,
            total_cost: row.get(8)?,
        })
    }

    /// 映射数据库行到ValueCostItem对象
    fn map_value_item_row(row: &rusqlite::Row) -> rusqlite::Result<ValueCostItem> {
        let category_str: String = row.get(3)?;
        let category = ValueCostCategory::from_str(&category_str).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                rusqlite::types::Type::Text,
                format!("未知金额型成本分类: {}", category_str).into(),
            )
        })?;

        Ok(ValueCostItem {
            item_id: row.get(0)?,
            record_id: row.get(1)?,
            organization_id: row.get(2)?,
            category,
            item_name: row.get(4)?,
            amount: row.get(5)?,
        })
    }

    /// 映射数据库行到CostSummary对象
    fn map_summary_row(row: &rusqlite::Row) -> rusqlite::Result<CostSummary> {
        Ok(CostSummary {
            record_id: row.get(0)?,
            organization_id: row.get(1)?,
            total_sales_expense: row.get(2)?,
            total_operating_cost: row.get(3)?,
            total_production_cost: row.get(4)?,
            unit_production_cost: row.get(5)?,
            unit_sale_price: row.get(6)?,
            unit_profit_margin: row.get(7)?,
        })
    }
}
