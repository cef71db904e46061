// ==========================================
// 生产成本台账系统 - 审计日志领域模型
// ==========================================
// 用途: 组合写入后的审计追踪 (尽力而为, 不阻断主流程)
// 对齐: audit_log 表
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// AuditLog - 审计日志
// ==========================================
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLog {
    // ===== 主键 =====
    pub log_id: Option<i64>, // 自增主键 (插入前为 None)

    // ===== 操作内容 =====
    pub action_type: String,          // 操作类型 (存储为字符串)
    pub entity_type: String,          // 实体类型 (如 "cost_record")
    pub entity_id: Option<String>,    // 实体ID
    pub organization_id: Option<String>, // 所属组织
    pub detail: Option<String>,       // 详细描述
    pub payload_json: Option<JsonValue>, // 操作参数 (JSON)

    // ===== 时间 =====
    pub action_ts: NaiveDateTime, // 操作时间戳
}

// ==========================================
// AuditActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuditActionType {
    CreateCostRecord, // 创建成本记录
    SeedDemoData,     // 生成演示数据
}

impl AuditActionType {
    /// 转换为字符串 (用于数据库存储)
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditActionType::CreateCostRecord => "CreateCostRecord",
            AuditActionType::SeedDemoData => "SeedDemoData",
        }
    }

    /// 从字符串解析
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "CreateCostRecord" => Some(AuditActionType::CreateCostRecord),
            "SeedDemoData" => Some(AuditActionType::SeedDemoData),
            _ => None,
        }
    }
}

// ==========================================
// AuditLog 辅助方法
// ==========================================
impl AuditLog {
    /// 创建新的审计日志
    ///
    /// # 参数
    /// - `action_type`: 操作类型
    /// - `entity_type`: 实体类型 (如 "cost_record")
    pub fn new(action_type: AuditActionType, entity_type: &str) -> Self {
        Self {
            log_id: None,
            action_type: action_type.as_str().to_string(),
            entity_type: entity_type.to_string(),
            entity_id: None,
            organization_id: None,
            detail: None,
            payload_json: None,
            action_ts: chrono::Local::now().naive_local(),
        }
    }

    /// 设置实体ID
    pub fn with_entity_id(mut self, entity_id: String) -> Self {
        self.entity_id = Some(entity_id);
        self
    }

    /// 设置所属组织
    pub fn with_organization(mut self, organization_id: String) -> Self {
        self.organization_id = Some(organization_id);
        self
    }

    /// 设置详细描述
    pub fn with_detail(mut self, detail: String) -> Self {
        self.detail = Some(detail);
        self
    }

    /// 设置操作负载 (转换为JSON)
    pub fn with_payload<T: Serialize>(mut self, payload: &T) -> Self {
        self.payload_json = serde_json::to_value(payload).ok();
        self
    }
}
