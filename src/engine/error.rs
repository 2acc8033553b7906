// ==========================================
// 生产批次核算系统 - 引擎层错误类型
// ==========================================
// 工具: thiserror 派生宏
// 红线: 所有拒绝必须带结构化原因（字段/数值），不吞错误
// ==========================================

use crate::domain::types::{BatchAction, BatchStatus};
use thiserror::Error;

/// 引擎层错误类型
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// 输入格式错误，调用方修正字段后可重试
    #[error("字段校验失败 (field={field}): {message}")]
    Validation { field: String, message: String },

    /// 在终态或不合格状态上尝试变更
    #[error("无效的状态转换: status={from}, action={action}")]
    InvalidTransition {
        from: BatchStatus,
        action: BatchAction,
    },

    /// 转化袋数超过出成上限
    #[error("转化数量超出上限: requested={requested}, max_bags={max_bags}")]
    CapacityExceeded { requested: u32, max_bags: u32 },

    /// 部分损耗重量不在 (0, 当前重量] 区间
    #[error("损耗重量无效: weight={weight:?}, available={available}")]
    InvalidDamageWeight { weight: Option<f64>, available: f64 },

    /// 损耗原因缺失
    #[error("损耗原因不能为空")]
    MissingReason,
}

impl EngineError {
    /// 构造字段校验错误
    pub fn validation(field: impl Into<String>, message: impl Into<String>) -> Self {
        EngineError::Validation {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result 类型别名
pub type EngineResult<T> = Result<T, EngineError>;
