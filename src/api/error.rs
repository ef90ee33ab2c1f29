// ==========================================
// 毕业设计师生互选系统 - API层错误类型
// ==========================================
// 职责: 定义API层错误类型，转换Repository错误为用户友好的错误消息
// 约束: 每个错误都携带足够的上下文（实体ID、上限、当前负载），便于管理员修正后重试
// ==========================================

use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 前置条件 / 容量错误（均保证未发生任何写入）
    // ==========================================
    /// 活动未结束、无团队、无导师、草稿为空等
    #[error("前置条件不满足: {0}")]
    PreconditionFailed(String),

    #[error(
        "导师容量已满: {teacher_name}(id={teacher_id}) 上限={limit}, 当前草稿负载={current_load}"
    )]
    CapacityExceeded {
        teacher_id: i64,
        teacher_name: String,
        limit: i64,
        current_load: i64,
    },

    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    #[error("业务规则违反: {0}")]
    BusinessRuleViolation(String),

    #[error("数据验证失败: {0}")]
    ValidationError(String),

    // ==========================================
    // 数据访问错误
    // ==========================================
    #[error("数据库错误: {0}")]
    DatabaseError(String),

    #[error("数据库连接失败: {0}")]
    DatabaseConnectionError(String),

    #[error("数据库事务失败: {0}")]
    DatabaseTransactionError(String),

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
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound { entity, id } => {
                ApiError::NotFound(format!("{}(id={})不存在", entity, id))
            }
            RepositoryError::DatabaseConnectionError(msg) => ApiError::DatabaseConnectionError(msg),
            RepositoryError::DatabaseTransactionError(msg) => {
                ApiError::DatabaseTransactionError(msg)
            }
            RepositoryError::LockError(msg) => {
                ApiError::DatabaseConnectionError(format!("数据库锁获取失败: {}", msg))
            }
            RepositoryError::DatabaseQueryError(msg) => ApiError::DatabaseError(msg),
            RepositoryError::UniqueConstraintViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::BusinessRuleViolation(format!("外键约束违反: {}", msg))
            }

            // 仓储层不持有导师姓名，由调用方补全
            RepositoryError::CapacityExceeded {
                teacher_id,
                limit,
                current_load,
            } => ApiError::CapacityExceeded {
                teacher_id,
                teacher_name: String::new(),
                limit,
                current_load,
            },
            RepositoryError::BusinessRuleViolation(msg) => ApiError::BusinessRuleViolation(msg),

            RepositoryError::ValidationError(msg) => ApiError::ValidationError(msg),

            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
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
        let repo_err = RepositoryError::NotFound {
            entity: "Team".to_string(),
            id: "42".to_string(),
        };
        let api_err: ApiError = repo_err.into();
        match api_err {
            ApiError::NotFound(msg) => {
                assert!(msg.contains("Team"));
                assert!(msg.contains("42"));
            }
            _ => panic!("Expected NotFound"),
        }

        let repo_err = RepositoryError::CapacityExceeded {
            teacher_id: 3,
            limit: 2,
            current_load: 2,
        };
        match ApiError::from(repo_err) {
            ApiError::CapacityExceeded {
                teacher_id,
                limit,
                current_load,
                ..
            } => {
                assert_eq!((teacher_id, limit, current_load), (3, 2, 2));
            }
            _ => panic!("Expected CapacityExceeded"),
        }
    }

    #[test]
    fn test_capacity_message_carries_context() {
        let err = ApiError::CapacityExceeded {
            teacher_id: 7,
            teacher_name: "王老师".to_string(),
            limit: 3,
            current_load: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("王老师"));
        assert!(msg.contains("id=7"));
        assert!(msg.contains("上限=3"));
    }
}
