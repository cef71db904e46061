// ==========================================
// 生产成本台账系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换下层错误为用户友好的错误消息
// 口径: 到达组合边界的持久化错误一律收敛为 CompositionFailure,
//       到达查询边界的一律收敛为 QueryFailure, 不再细分
// ==========================================

use crate::engine::composer::CompositionError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 输入校验错误
    // ==========================================
    #[error("缺少必填字段: {0}")]
    MissingRequiredField(String),

    #[error("必须同时提供开始日期和结束日期")]
    MissingDateRange,

    #[error("无效输入: {0}")]
    InvalidInput(String),

    // ==========================================
    // 业务操作错误
    // ==========================================
    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("成本记录组合写入失败: {0}")]
    CompositionFailure(String),

    #[error("成本演化查询失败: {0}")]
    QueryFailure(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    // ==========================================
    // 通用错误
    // ==========================================
    #[error("内部错误: {0}")]
    InternalError(String),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为用户友好的业务错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseTransactionError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }
            RepositoryError::ValidationError(msg) => ApiError::InvalidInput(msg),
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

// ==========================================
// 从 CompositionError 转换 (组合边界收敛)
// ==========================================
impl From<CompositionError> for ApiError {
    fn from(err: CompositionError) -> Self {
        match err {
            CompositionError::MissingField(field) => ApiError::MissingRequiredField(field),
            // 持久化失败到达组合边界: 统一收敛, 不细分
            CompositionError::Repository(e) => ApiError::CompositionFailure(e.to_string()),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_repository_error_conversion() {
        // NotFound错误转换
        let repo_err = RepositoryError::NotFound {
            entity: "CostRecord".to_string(),
            id: "R001".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("CostRecord"));
                assert!(msg.contains("R001"));
            }
            _ => panic!("Expected NotFound"),
        }

        // LockError转换为连接错误
        let repo_err = RepositoryError::LockError("poisoned".to_string());
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::DatabaseConnectionError(msg) => {
                assert!(msg.contains("poisoned"));
            }
            _ => panic!("Expected DatabaseConnectionError"),
        }
    }

    #[test]
    fn test_composition_error_conversion() {
        // 必填字段缺失: 保留字段名
        let err = CompositionError::MissingField("product_id".to_string());
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::MissingRequiredField(field) => assert_eq!(field, "product_id"),
            _ => panic!("Expected MissingRequiredField"),
        }

        // 持久化错误: 收敛为 CompositionFailure
        let err = CompositionError::Repository(RepositoryError::ForeignKeyViolation(
            "FOREIGN KEY constraint failed".to_string(),
        ));
        let api_err: ApiError = err.into();
        match api_err {
            ApiError::CompositionFailure(msg) => {
                assert!(msg.contains("FOREIGN KEY"));
            }
            _ => panic!("Expected CompositionFailure"),
        }
    }

    #[test]
    fn test_error_messages_are_explicit() {
        let err = ApiError::MissingDateRange;
        assert!(err.to_string().contains("开始日期"));

        let err = ApiError::MissingRequiredField("organization_id".to_string());
        assert!(err.to_string().contains("organization_id"));
    }
}
