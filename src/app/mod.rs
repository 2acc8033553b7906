// ==========================================
// 生产批次核算系统 - 应用层
// ==========================================
// 职责: 装配仓储、配置与API，确定数据库位置
// ==========================================

pub mod state;

// 重导出
pub use state::{get_default_db_path, AppState};
