// ==========================================
// 生产批次核算系统 - 命令行入口
// ==========================================
// 用法:
//   food-production-ops [db_path] [today(YYYY-MM-DD, UTC)]
//
// 打开数据库（必要时建表），输出月累计汇总 JSON
// ==========================================

use chrono::{NaiveDate, Utc};
use std::error::Error;

use food_production_ops::app::{get_default_db_path, AppState};
use food_production_ops::logging;

fn main() -> Result<(), Box<dyn Error>> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let db_path = args
        .next()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(get_default_db_path);

    let today = match args.next() {
        Some(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
            .map_err(|e| format!("日期格式错误（应为 YYYY-MM-DD）: {}: {}", raw, e))?,
        None => Utc::now().date_naive(),
    };

    tracing::info!("{} v{}", food_production_ops::APP_NAME, food_production_ops::VERSION);
    tracing::info!("使用数据库: {}", db_path);

    let state = AppState::new(db_path)?;
    let summary = state.dashboard_api.get_mtd_summary(today)?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}
