// ==========================================
// 生产成本台账系统 - 成本演化查询引擎
// ==========================================
// 职责: 日期区间内的成本记录 -> 有序演化序列
// - day: 一条记录一个点, 数值原样透传, 同日重复保留
// - week: 按 ISO 周聚合, 单位成本取均值, 单位利润取求和
// ==========================================
// 红线:
// - 缺汇总的记录在引擎侧丢弃 (仓储不做取舍)
// - week 模式两个口径刻意不同, 不得统一
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

use crate::domain::cost_record::CostRecord;
use crate::domain::cost_summary::CostSummary;
use crate::domain::types::EvolutionMode;
use crate::engine::calendar;
use crate::repository::cost_record_repo::CostRecordRepository;
use crate::repository::error::RepositoryResult;

// ==========================================
// EvolutionPoint - 演化序列中的一个点
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EvolutionPoint {
    pub bucket_key: String,        // day: 记录日期; week: 所在 ISO 周的周一
    pub unit_production_cost: f64, // day: 原值; week: 组内均值
    pub unit_profit_margin: f64,   // day: 原值; week: 组内求和
}

// ==========================================
// EvolutionQuery - 查询参数
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvolutionQuery {
    pub start: NaiveDate,           // 区间起点 (含)
    pub end: NaiveDate,             // 区间终点 (含)
    pub product_id: Option<String>, // 产品过滤
    pub mode: EvolutionMode,        // 分桶模式
}

// ==========================================
// EvolutionQueryEngine - 演化查询引擎
// ==========================================
pub struct EvolutionQueryEngine {
    cost_record_repo: Arc<CostRecordRepository>,
}

impl EvolutionQueryEngine {
    /// 创建新的演化查询引擎
    pub fn new(cost_record_repo: Arc<CostRecordRepository>) -> Self {
        Self { cost_record_repo }
    }

    /// 生成演化序列
    ///
    /// # 参数
    /// - `query`: 日期区间 + 可选产品过滤 + 分桶模式
    ///
    /// # 返回
    /// 有序序列 (day: 按记录日期升序; week: 按周键升序), 可能为空
    ///
    /// # 说明
    /// - start > end 返回空序列, 不报错
    /// - 没有汇总的记录不参与序列
    pub fn evolution_series(&self, query: &EvolutionQuery) -> RepositoryResult<Vec<EvolutionPoint>> {
        if query.start > query.end {
            return Ok(vec![]);
        }

        let rows = self.cost_record_repo.find_in_range(
            query.start,
            query.end,
            query.product_id.as_deref(),
        )?;

        let total = rows.len();
        // 缺汇总的记录没有单位成本/利润数据, 在这里丢弃
        let with_summary: Vec<(CostRecord, CostSummary)> = rows
            .into_iter()
            .filter_map(|(record, summary)| summary.map(|s| (record, s)))
            .collect();

        debug!(
            start = %query.start,
            end = %query.end,
            mode = %query.mode,
            total_records = total,
            with_summary = with_summary.len(),
            "演化查询取数完成"
        );

        let points = match query.mode {
            EvolutionMode::Day => Self::day_series(&with_summary),
            EvolutionMode::Week => Self::week_series(&with_summary),
        };
        Ok(points)
    }

    /// day 模式: 一条记录一个点, 保持仓储返回的日期升序
    fn day_series(rows: &[(CostRecord, CostSummary)]) -> Vec<EvolutionPoint> {
        rows.iter()
            .map(|(record, summary)| EvolutionPoint {
                bucket_key: calendar::day_key(record.record_date),
                unit_production_cost: summary.unit_production_cost,
                unit_profit_margin: summary.unit_profit_margin,
            })
            .collect()
    }

    /// week 模式: 按 ISO 周分组, 组内成本取均值、利润取求和
    fn week_series(rows: &[(CostRecord, CostSummary)]) -> Vec<EvolutionPoint> {
        // BTreeMap 保证输出按周键升序
        let mut groups: BTreeMap<String, Vec<&CostSummary>> = BTreeMap::new();
        for (record, summary) in rows {
            groups
                .entry(calendar::week_key(record.record_date))
                .or_default()
                .push(summary);
        }

        groups
            .into_iter()
            .map(|(bucket_key, summaries)| {
                let n = summaries.len() as f64;
                let cost_sum: f64 = summaries.iter().map(|s| s.unit_production_cost).sum();
                let margin_sum: f64 = summaries.iter().map(|s| s.unit_profit_margin).sum();
                EvolutionPoint {
                    bucket_key,
                    unit_production_cost: cost_sum / n,
                    unit_profit_margin: margin_sum,
                }
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Local;
    use uuid::Uuid;

    fn make_date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("测试日期非法")
    }

    fn make_row(date: NaiveDate, unit_cost: f64, margin: f64) -> (CostRecord, CostSummary) {
        let record_id = Uuid::new_v4().to_string();
        let record = CostRecord {
            record_id: record_id.clone(),
            organization_id: "ORG-1".to_string(),
            product_id: "PROD-1".to_string(),
            record_date: date,
            unit_of_measure: None,
            produced_quantity: None,
            estimated_losses: None,
            final_quantity: None,
            created_at: Local::now().naive_local(),
        };
        let summary = CostSummary {
            record_id,
            organization_id: "ORG-1".to_string(),
            total_sales_expense: 0.0,
            total_operating_cost: 0.0,
            total_production_cost: 0.0,
            unit_production_cost: unit_cost,
            unit_sale_price: 0.0,
            unit_profit_margin: margin,
        };
        (record, summary)
    }

    #[test]
    fn test_day_series_one_point_per_record() {
        let rows = vec![
            make_row(make_date(2024, 3, 4), 100.0, 10.0),
            make_row(make_date(2024, 3, 5), 200.0, 20.0),
            make_row(make_date(2024, 3, 6), 300.0, 30.0),
        ];

        let points = EvolutionQueryEngine::day_series(&rows);

        assert_eq!(points.len(), 3, "每条记录应产生一个点");
        assert_eq!(points[0].bucket_key, "2024-03-04");
        assert_eq!(points[0].unit_production_cost, 100.0);
        assert_eq!(points[0].unit_profit_margin, 10.0);
        assert_eq!(points[2].bucket_key, "2024-03-06");
    }

    #[test]
    fn test_day_series_preserves_same_date_duplicates() {
        // 同一天两条记录: 不合并, 两个点
        let rows = vec![
            make_row(make_date(2024, 3, 4), 100.0, 10.0),
            make_row(make_date(2024, 3, 4), 120.0, 12.0),
        ];

        let points = EvolutionQueryEngine::day_series(&rows);

        assert_eq!(points.len(), 2, "同日重复记录必须保留为两个点");
        assert_eq!(points[0].bucket_key, points[1].bucket_key);
        assert_eq!(points[0].unit_production_cost, 100.0);
        assert_eq!(points[1].unit_production_cost, 120.0);
    }

    #[test]
    fn test_week_series_mean_cost_sum_margin() {
        // 同一 ISO 周 (2024-03-04 周一 / 03-05 / 03-06)
        let rows = vec![
            make_row(make_date(2024, 3, 4), 100.0, 10.0),
            make_row(make_date(2024, 3, 5), 200.0, 20.0),
            make_row(make_date(2024, 3, 6), 300.0, 30.0),
        ];

        let points = EvolutionQueryEngine::week_series(&rows);

        assert_eq!(points.len(), 1, "同周记录应聚成一个点");
        assert_eq!(points[0].bucket_key, "2024-03-04");
        assert_eq!(points[0].unit_production_cost, 200.0, "单位成本取均值");
        assert_eq!(points[0].unit_profit_margin, 60.0, "单位利润取求和");
    }

    #[test]
    fn test_week_series_emits_weeks_in_ascending_order() {
        // 三个不同 ISO 周, 输入顺序打乱
        let rows = vec![
            make_row(make_date(2024, 3, 18), 30.0, 3.0),
            make_row(make_date(2024, 3, 4), 10.0, 1.0),
            make_row(make_date(2024, 3, 11), 20.0, 2.0),
        ];

        let points = EvolutionQueryEngine::week_series(&rows);

        let keys: Vec<&str> = points.iter().map(|p| p.bucket_key.as_str()).collect();
        assert_eq!(keys, vec!["2024-03-04", "2024-03-11", "2024-03-18"]);
    }

    #[test]
    fn test_week_series_groups_across_year_boundary() {
        // 2024-12-30(周一) 与 2025-01-02(周四) 同周
        let rows = vec![
            make_row(make_date(2024, 12, 30), 100.0, 5.0),
            make_row(make_date(2025, 1, 2), 300.0, 7.0),
        ];

        let points = EvolutionQueryEngine::week_series(&rows);

        assert_eq!(points.len(), 1);
        assert_eq!(points[0].bucket_key, "2024-12-30");
        assert_eq!(points[0].unit_production_cost, 200.0);
        assert_eq!(points[0].unit_profit_margin, 12.0);
    }

    #[test]
    fn test_start_after_end_returns_empty() {
        // 起点晚于终点: 空序列, 不报错, 不触发取数
        let conn = rusqlite::Connection::open_in_memory().expect("打开内存库失败");
        let repo = CostRecordRepository::from_connection(Arc::new(std::sync::Mutex::new(conn)));
        let engine = EvolutionQueryEngine::new(Arc::new(repo));

        let query = EvolutionQuery {
            start: make_date(2024, 3, 10),
            end: make_date(2024, 3, 1),
            product_id: None,
            mode: EvolutionMode::Day,
        };

        let points = engine.evolution_series(&query).expect("应返回 Ok(空)");
        assert!(points.is_empty());
    }
}
