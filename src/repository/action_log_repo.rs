// ==========================================
// 生产批次核算系统 - 操作日志数据仓储
// ==========================================
// 对齐: action_log 表
// 红线: 所有已提交的批次写入都必须记录
// ==========================================

mod core;
mod queries;


pub use self::core::ActionLogRepository;

/// action_ts 存储格式（微秒精度，同一秒内多次操作仍可排序）
pub(crate) const ACTION_TS_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.6f";
