// ==========================================
// 生产批次核算系统 - API 层
// ==========================================
// 职责: 边界操作，串联引擎校验、仓储提交与审计日志
// ==========================================

pub mod batch_api;
pub mod dashboard_api;
pub mod error;

// 重导出核心类型
pub use batch_api::{normalize_status, BatchApi, ConvertBatchRequest, CreateBatchRequest};
pub use dashboard_api::{DashboardApi, MtdSummary};
pub use error::{ApiError, ApiResult};
