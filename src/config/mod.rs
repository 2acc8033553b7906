// ==========================================
// 生产批次核算系统 - 配置层
// ==========================================
// 职责: 标准单价与出成率阈值等系统配置
// 存储: config_kv 表
// ==========================================

pub mod config_manager;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager, ProductionConfig, DEFAULT_COST_PER_LB};
