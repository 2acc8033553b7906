// ==========================================
// 生产批次核算系统 - 核心库
// ==========================================
// 职责: 原料批次生命周期、损耗、成品转化与出成率核算
// 技术栈: Rust + SQLite
// 红线: 业务规则集中在 engine，仓储提交成功前不改变批次状态
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 引擎层 - 业务规则
pub mod engine;

// 数据仓储层 - 数据访问
pub mod repository;

// 配置层 - 系统配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA 统一/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 装配
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{BatchAction, BatchStatus, DamageType, YieldRisk};

// 领域实体
pub use domain::{ActionLog, ActionType, Batch, BatchEdit, BatchFilter, NewSupplier, Supplier, SupplierSelection};

// 引擎
pub use engine::{
    BatchIntake, BatchLifecycle, DamageProcessor, DamageRequest, EngineError, ThroughputAggregator,
    ThroughputSummary, YieldCalculator,
};

// API
pub use api::{ApiError, ApiResult, BatchApi, ConvertBatchRequest, CreateBatchRequest, DashboardApi};

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "生产批次核算系统";
