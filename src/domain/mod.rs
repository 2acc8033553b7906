// ==========================================
// 生产批次核算系统 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod action_log;
pub mod batch;
pub mod supplier;
pub mod types;

// 重导出核心类型
pub use action_log::{ActionLog, ActionType};
pub use batch::{total_cost, Batch, BatchEdit, BatchFilter, NewBatch, MAX_YIELD_RATE};
pub use supplier::{NewSupplier, Supplier, SupplierSelection};
pub use types::{BatchAction, BatchStatus, DamageType, UnknownStatus, YieldRisk};
