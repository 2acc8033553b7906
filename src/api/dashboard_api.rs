// ==========================================
// 生产批次核算系统 - 经营看板 API
// ==========================================
// 职责: 月累计（MTD）产量、成本、出成率汇总
// 口径: 由 ThroughputAggregator 按需重算，不缓存
// ==========================================

use std::sync::Arc;

use chrono::{NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::batch::BatchFilter;
use crate::engine::throughput::{ThroughputAggregator, ThroughputSummary};
use crate::repository::batch_repo::BatchRepository;

// ==========================================
// MtdSummary - 月累计汇总响应
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MtdSummary {
    pub month_start: NaiveDate,
    pub as_of: NaiveDate,
    #[serde(flatten)]
    pub summary: ThroughputSummary,
}

// ==========================================
// DashboardApi - 经营看板 API
// ==========================================
pub struct DashboardApi {
    batch_repo: Arc<BatchRepository>,
    config_manager: Arc<ConfigManager>,
}

impl DashboardApi {
    /// 创建新的DashboardApi实例
    pub fn new(batch_repo: Arc<BatchRepository>, config_manager: Arc<ConfigManager>) -> Self {
        Self {
            batch_repo,
            config_manager,
        }
    }

    /// 月累计汇总
    ///
    /// # 参数
    /// - today: 统计截止日（含，UTC 日期），窗口为当月1日 00:00 UTC 至 today
    ///
    /// # 返回
    /// - Ok(MtdSummary): 窗口内全部批次（含已损耗批次）的汇总与风险分档
    pub fn get_mtd_summary(&self, today: NaiveDate) -> ApiResult<MtdSummary> {
        let thresholds = self
            .config_manager
            .get_yield_thresholds()
            .map_err(|e| ApiError::InternalError(format!("读取出成率阈值失败: {}", e)))?;

        let month_start = ThroughputAggregator::month_start(today);
        // 与 in_month_to_date 一致，按 UTC 划分月份
        let created_from = month_start
            .and_hms_opt(0, 0, 0)
            .map(|dt| Utc.from_utc_datetime(&dt));

        let candidates = self.batch_repo.list(&BatchFilter {
            created_from,
            ..Default::default()
        })?;

        let in_window: Vec<_> = candidates
            .into_iter()
            .filter(|b| ThroughputAggregator::in_month_to_date(b, today))
            .collect();

        debug!(
            month_start = %month_start,
            as_of = %today,
            batch_count = in_window.len(),
            "月累计汇总"
        );

        Ok(MtdSummary {
            month_start,
            as_of: today,
            summary: ThroughputAggregator::summarize_with(&in_window, thresholds),
        })
    }
}
