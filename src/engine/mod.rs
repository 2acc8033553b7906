// ==========================================
// 生产批次核算系统 - 引擎层
// ==========================================
// 职责: 实现批次生命周期与出成核算规则
// 红线: Engine 不拼 SQL，不读时钟，不做 I/O
//       输入显式批次值，输出新批次值或结构化错误
// ==========================================

pub mod conversion;
pub mod damage;
pub mod error;
pub mod intake;
pub mod lifecycle;
pub mod throughput;

// 重导出核心引擎
pub use conversion::{classify_yield, classify_yield_with, max_bags, YieldCalculator, YieldThresholds};
pub use damage::{DamageProcessor, DamageRequest};
pub use error::{EngineError, EngineResult};
pub use intake::BatchIntake;
pub use lifecycle::BatchLifecycle;
pub use throughput::{ThroughputAggregator, ThroughputSummary, YieldRiskCounts};
