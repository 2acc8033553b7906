// ==========================================
// 生产批次核算系统 - API层错误类型
// ==========================================
// 职责: 统一引擎错误与仓储错误，转换为调用方可区分的结构化错误
// 红线: 存储故障不得伪装成业务规则拒绝
// ==========================================

use crate::domain::types::{BatchAction, BatchStatus};
use crate::engine::error::EngineError;
use crate::repository::error::RepositoryError;
use thiserror::Error;

/// API层错误类型
/// 所有错误信息必须包含显式原因
#[derive(Error, Debug)]
pub enum ApiError {
    // ==========================================
    // 业务规则错误
    // ==========================================
    #[error("字段校验失败 (field={field}): {message}")]
    ValidationError { field: String, message: String },

    #[error("无效的状态转换: status={from}, action={action}")]
    InvalidTransition {
        from: BatchStatus,
        action: BatchAction,
    },

    #[error("转化数量超出上限: batch_id={batch_id}, requested={requested}, max_bags={max_bags}")]
    CapacityExceeded {
        batch_id: String,
        requested: u32,
        max_bags: u32,
    },

    #[error("损耗重量无效: weight={weight:?}, available={available}")]
    InvalidDamageWeight { weight: Option<f64>, available: f64 },

    #[error("损耗原因不能为空")]
    MissingReason,

    #[error("无效输入: {0}")]
    InvalidInput(String),

    #[error("资源未找到: {0}")]
    NotFound(String),

    // ==========================================
    // 并发控制错误
    // ==========================================
    #[error("批次状态已过期: batch_id={batch_id}, expected_revision={expected_revision}, actual_revision={actual_revision}")]
    StaleBatchState {
        batch_id: String,
        expected_revision: i32,
        actual_revision: i32,
    },

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

impl ApiError {
    /// 转换引擎错误，并为转化超限补充批次ID
    pub fn from_engine(err: EngineError, batch_id: &str) -> Self {
        match err {
            EngineError::CapacityExceeded {
                requested,
                max_bags,
            } => ApiError::CapacityExceeded {
                batch_id: batch_id.to_string(),
                requested,
                max_bags,
            },
            other => other.into(),
        }
    }

    /// 是否为业务规则拒绝（调用方可修正输入后重试）
    pub fn is_rule_violation(&self) -> bool {
        matches!(
            self,
            ApiError::ValidationError { .. }
                | ApiError::InvalidTransition { .. }
                | ApiError::CapacityExceeded { .. }
                | ApiError::InvalidDamageWeight { .. }
                | ApiError::MissingReason
        )
    }
}

// ==========================================
// 从 EngineError 转换
// ==========================================
impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation { field, message } => ApiError::ValidationError { field, message },
            EngineError::InvalidTransition { from, action } => {
                ApiError::InvalidTransition { from, action }
            }
            EngineError::CapacityExceeded {
                requested,
                max_bags,
            } => ApiError::CapacityExceeded {
                batch_id: String::new(),
                requested,
                max_bags,
            },
            EngineError::InvalidDamageWeight { weight, available } => {
                ApiError::InvalidDamageWeight { weight, available }
            }
            EngineError::MissingReason => ApiError::MissingReason,
        }
    }
}

// ==========================================
// 从 RepositoryError 转换
// 目的: 将Repository层的技术错误转换为调用方可区分的错误
// ==========================================
impl From<RepositoryError> for ApiError {
    fn from(err: RepositoryError) -> Self {
        match err {
            // 并发控制错误
            RepositoryError::OptimisticLockFailure {
                batch_id,
                expected,
                actual,
            } => ApiError::StaleBatchState {
                batch_id,
                expected_revision: expected,
                actual_revision: actual,
            },

            // 数据库错误
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
                ApiError::DatabaseError(format!("唯一约束违反: {}", msg))
            }
            RepositoryError::ForeignKeyViolation(msg) => {
                ApiError::DatabaseError(format!("外键约束违反: {}", msg))
            }

            // 存储数据损坏
            RepositoryError::FieldValueError { field, message } => {
                ApiError::DatabaseError(format!("存储字段{}无法解析: {}", field, message))
            }

            // 通用错误
            RepositoryError::InternalError(msg) => ApiError::InternalError(msg),
            RepositoryError::Other(err) => ApiError::Other(err),
        }
    }
}

/// Result 类型别名
pub type ApiResult<T> = Result<T, ApiError>;
