// ==========================================
// 生产成本台账系统 - 成本 API
// ==========================================
// 职责: 成本记录组合写入、读取、演化序列查询
// 口径: 日期以 YYYY-MM-DD 文本跨边界, 在这里解析
// ==========================================

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::domain::audit::{AuditActionType, AuditLog};
use crate::domain::cost_record::CostRecordWithChildren;
use crate::domain::cost_summary::{CostSummary, CostSummaryDraft};
use crate::domain::line_item::{UnitCostItem, UnitCostItemDraft, ValueCostItem, ValueCostItemDraft};
use crate::domain::types::EvolutionMode;
use crate::engine::composer::{CompositionRequest, CostRecordComposer};
use crate::engine::evolution::{EvolutionPoint, EvolutionQuery, EvolutionQueryEngine};
use crate::i18n;
use crate::repository::audit_log_repo::AuditLogRepository;
use crate::repository::cost_record_repo::CostRecordRepository;
use chrono::NaiveDate;

// ==========================================
// CreateCostRecordRequest - 组合写入请求
// ==========================================
// 七个明细列表缺省为空; 日期/汇总可缺省
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CreateCostRecordRequest {
    pub product_id: String,
    pub record_date: Option<String>, // YYYY-MM-DD, 缺省 = 当天
    pub unit_of_measure: Option<String>,
    pub produced_quantity: Option<f64>,
    pub estimated_losses: Option<f64>,
    pub final_quantity: Option<f64>,

    #[serde(default)]
    pub raw_material_items: Vec<UnitCostItemDraft>,
    #[serde(default)]
    pub direct_labor_items: Vec<UnitCostItemDraft>,
    #[serde(default)]
    pub indirect_overhead_items: Vec<UnitCostItemDraft>,
    #[serde(default)]
    pub indirect_labor_items: Vec<UnitCostItemDraft>,
    #[serde(default)]
    pub general_overhead_items: Vec<ValueCostItemDraft>,
    #[serde(default)]
    pub operating_cost_items: Vec<ValueCostItemDraft>,
    #[serde(default)]
    pub sales_expense_items: Vec<ValueCostItemDraft>,

    pub summary: Option<CostSummaryDraft>,
}

// ==========================================
// EvolutionQueryRequest - 演化查询请求
// ==========================================
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EvolutionQueryRequest {
    pub start_date: Option<String>, // YYYY-MM-DD, 必填
    pub end_date: Option<String>,   // YYYY-MM-DD, 必填
    pub product_id: Option<String>, // 产品过滤
    pub mode: Option<String>,       // day | week, 缺省 day
}

// ==========================================
// CostRecordResponse - 成本记录完整返回
// ==========================================
/// 记录字段 + 七个分类集合 + 可选汇总（日期均为 YYYY-MM-DD 文本）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostRecordResponse {
    pub record_id: String,
    pub organization_id: String,
    pub product_id: String,
    pub record_date: String,
    pub unit_of_measure: Option<String>,
    pub produced_quantity: Option<f64>,
    pub estimated_losses: Option<f64>,
    pub final_quantity: Option<f64>,
    pub created_at: String,

    pub raw_material_items: Vec<UnitCostItem>,
    pub direct_labor_items: Vec<UnitCostItem>,
    pub indirect_overhead_items: Vec<UnitCostItem>,
    pub indirect_labor_items: Vec<UnitCostItem>,
    pub general_overhead_items: Vec<ValueCostItem>,
    pub operating_cost_items: Vec<ValueCostItem>,
    pub sales_expense_items: Vec<ValueCostItem>,

    pub summary: Option<CostSummary>,
}

impl From<CostRecordWithChildren> for CostRecordResponse {
    fn from(agg: CostRecordWithChildren) -> Self {
        Self {
            record_id: agg.record.record_id,
            organization_id: agg.record.organization_id,
            product_id: agg.record.product_id,
            record_date: agg.record.record_date.format("%Y-%m-%d").to_string(),
            unit_of_measure: agg.record.unit_of_measure,
            produced_quantity: agg.record.produced_quantity,
            estimated_losses: agg.record.estimated_losses,
            final_quantity: agg.record.final_quantity,
            created_at: agg.record.created_at.format("%Y-%m-%d %H:%M:%S").to_string(),
            raw_material_items: agg.raw_material_items,
            direct_labor_items: agg.direct_labor_items,
            indirect_overhead_items: agg.indirect_overhead_items,
            indirect_labor_items: agg.indirect_labor_items,
            general_overhead_items: agg.general_overhead_items,
            operating_cost_items: agg.operating_cost_items,
            sales_expense_items: agg.sales_expense_items,
            summary: agg.summary,
        }
    }
}

/// 解析边界日期文本 (YYYY-MM-DD)
fn parse_boundary_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidInput(format!(
            "无效的日期格式 (字段 {}): {}, 期望 YYYY-MM-DD",
            field, raw
        ))
    })
}

// ==========================================
// CostsApi - 成本 API
// ==========================================

/// 成本API
///
/// 职责：
/// 1. 成本记录组合写入（记录 + 七类明细 + 可选汇总，单事务）
/// 2. 成本记录读取（单条 / 按组织列表）
/// 3. 成本演化序列查询（day / week 分桶）
/// 4. 审计日志记录（尽力而为）
pub struct CostsApi {
    composer: Arc<CostRecordComposer>,
    evolution_engine: Arc<EvolutionQueryEngine>,
    cost_record_repo: Arc<CostRecordRepository>,
    audit_log_repo: Arc<AuditLogRepository>,
}

impl CostsApi {
    /// 创建新的CostsApi实例
    ///
    /// # 参数
    /// - composer: 成本记录组合器
    /// - evolution_engine: 演化查询引擎
    /// - cost_record_repo: 成本记录仓储
    /// - audit_log_repo: 审计日志仓储
    pub fn new(
        composer: Arc<CostRecordComposer>,
        evolution_engine: Arc<EvolutionQueryEngine>,
        cost_record_repo: Arc<CostRecordRepository>,
        audit_log_repo: Arc<AuditLogRepository>,
    ) -> Self {
        Self {
            composer,
            evolution_engine,
            cost_record_repo,
            audit_log_repo,
        }
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 组合写入一条成本记录
    ///
    /// # 参数
    /// - organization_id: 所属组织 (显式传入, 不从任何隐式上下文读取)
    /// - request: 组合写入请求
    ///
    /// # 返回
    /// - Ok(CostRecordResponse): 已落库的完整聚合
    /// - Err(MissingRequiredField): organization_id / product_id 缺失或空白
    /// - Err(InvalidInput): record_date 无法解析
    /// - Err(CompositionFailure): 持久化失败, 整体回滚, 无部分状态
    pub fn create_cost_record(
        &self,
        organization_id: &str,
        request: CreateCostRecordRequest,
    ) -> ApiResult<CostRecordResponse> {
        let _perf = crate::perf::PerfGuard::new("api.create_cost_record");

        // 日期在边界解析; 缺省留给组合器补当天
        let record_date = match &request.record_date {
            Some(raw) if !raw.trim().is_empty() => Some(parse_boundary_date("record_date", raw)?),
            _ => None,
        };

        let product_id = request.product_id.clone();
        let comp_request = CompositionRequest {
            product_id: request.product_id,
            record_date,
            unit_of_measure: request.unit_of_measure,
            produced_quantity: request.produced_quantity,
            estimated_losses: request.estimated_losses,
            final_quantity: request.final_quantity,
            raw_material_items: request.raw_material_items,
            direct_labor_items: request.direct_labor_items,
            indirect_overhead_items: request.indirect_overhead_items,
            indirect_labor_items: request.indirect_labor_items,
            general_overhead_items: request.general_overhead_items,
            operating_cost_items: request.operating_cost_items,
            sales_expense_items: request.sales_expense_items,
            summary: request.summary,
        };
        let item_count = comp_request.item_count();

        let aggregate = self.composer.compose(organization_id, comp_request)?;
        let record_id = aggregate.record.record_id.clone();

        info!(
            record_id = %record_id,
            organization_id = %organization_id,
            product_id = %product_id,
            item_count,
            has_summary = aggregate.summary.is_some(),
            "成本记录创建成功"
        );

        // 审计日志: 尽力而为, 失败不影响主流程
        let log = AuditLog::new(AuditActionType::CreateCostRecord, "cost_record")
            .with_entity_id(record_id)
            .with_organization(organization_id.to_string())
            .with_detail(format!(
                "{} | product={} | 明细{}条",
                i18n::t("cost_record.created"),
                product_id,
                item_count
            ))
            .with_payload(&serde_json::json!({
                "product_id": product_id,
                "item_count": item_count,
                "has_summary": aggregate.summary.is_some(),
            }));
        if let Err(e) = self.audit_log_repo.insert(&log) {
            warn!(error = %e, "记录审计日志失败");
        }

        Ok(aggregate.into())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按ID读取完整成本记录
    ///
    /// # 返回
    /// - Ok(CostRecordResponse): 记录 + 七个分类集合 + 可选汇总
    /// - Err(NotFound): record_id 不存在
    pub fn get_cost_record(&self, record_id: &str) -> ApiResult<CostRecordResponse> {
        if record_id.trim().is_empty() {
            return Err(ApiError::InvalidInput("记录ID不能为空".to_string()));
        }

        let aggregate = self
            .cost_record_repo
            .find_by_id(record_id)
            .map_err(|e| ApiError::QueryFailure(e.to_string()))?;

        match aggregate {
            Some(agg) => Ok(agg.into()),
            None => Err(ApiError::NotFound(i18n::t_with_args(
                "cost_record.not_found",
                &[("id", record_id)],
            ))),
        }
    }

    /// 查询组织的全部成本记录 (最新在前)
    pub fn list_cost_records(&self, organization_id: &str) -> ApiResult<Vec<CostRecordResponse>> {
        if organization_id.trim().is_empty() {
            return Err(ApiError::MissingRequiredField("organization_id".to_string()));
        }

        let aggregates = self
            .cost_record_repo
            .list_by_organization(organization_id)
            .map_err(|e| ApiError::QueryFailure(e.to_string()))?;

        Ok(aggregates.into_iter().map(Into::into).collect())
    }

    /// 查询成本演化序列
    ///
    /// # 参数
    /// - request: 日期区间 (必填) + 可选产品过滤 + 分桶模式 (缺省 day)
    ///
    /// # 返回
    /// - Ok(Vec<EvolutionPoint>): 有序序列, 可能为空 (start > end 时为空)
    /// - Err(MissingDateRange): 任一边界缺失
    /// - Err(InvalidInput): 日期无法解析
    /// - Err(QueryFailure): 取数失败
    pub fn get_cost_evolution(
        &self,
        request: EvolutionQueryRequest,
    ) -> ApiResult<Vec<EvolutionPoint>> {
        let _perf = crate::perf::PerfGuard::new("api.get_cost_evolution");

        // 两个边界都必须提供 (空白视同缺失), 先于任何取数动作检查
        let (start_raw, end_raw) = match (&request.start_date, &request.end_date) {
            (Some(s), Some(e)) if !s.trim().is_empty() && !e.trim().is_empty() => (s, e),
            _ => return Err(ApiError::MissingDateRange),
        };

        let start = parse_boundary_date("start_date", start_raw)?;
        let end = parse_boundary_date("end_date", end_raw)?;
        let mode = request
            .mode
            .as_deref()
            .map(EvolutionMode::from_str)
            .unwrap_or(EvolutionMode::Day);

        let query = EvolutionQuery {
            start,
            end,
            product_id: request.product_id.clone(),
            mode,
        };

        let points = self
            .evolution_engine
            .evolution_series(&query)
            .map_err(|e| ApiError::QueryFailure(e.to_string()))?;

        info!(
            start = %start,
            end = %end,
            mode = %mode,
            points = points.len(),
            "成本演化查询完成"
        );

        Ok(points)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_boundary_date() {
        let date = parse_boundary_date("start_date", "2024-03-04").expect("合法日期应解析成功");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        // 容忍两端空白
        let date = parse_boundary_date("start_date", " 2024-03-04 ").expect("去空白后应解析成功");
        assert_eq!(date, NaiveDate::from_ymd_opt(2024, 3, 4).unwrap());

        let err = parse_boundary_date("end_date", "04/03/2024").expect_err("非法格式应被拒绝");
        match err {
            ApiError::InvalidInput(msg) => {
                assert!(msg.contains("end_date"));
                assert!(msg.contains("04/03/2024"));
            }
            _ => panic!("Expected InvalidInput"),
        }
    }

    #[test]
    fn test_create_request_defaults_to_empty_lists() {
        // 省略全部明细列表的请求应能反序列化为空列表
        let json = r#"{"product_id": "PROD-1"}"#;
        let request: CreateCostRecordRequest = serde_json::from_str(json).expect("反序列化失败");
        assert!(request.raw_material_items.is_empty());
        assert!(request.sales_expense_items.is_empty());
        assert!(request.summary.is_none());
        assert!(request.record_date.is_none());
    }
}
