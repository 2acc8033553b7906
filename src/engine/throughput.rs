// ==========================================
// 生产批次核算系统 - 成本与产量汇总
// ==========================================
// 口径:
// - mtd_throughput_lbs = Σ raw_weight_lbs
// - avg_yield_pct      = mean(yield_pct)，仅统计已转化批次；无则为 0
// - mtd_cost           = Σ Batch::total_cost()（按当前重量）
// - cost_per_lb_blended = mtd_cost / mtd_throughput_lbs；产量为 0 时为 None
// 整批损耗的批次当前重量为 0，只计入批次数
// 统计窗口按 UTC 日期划分，today 与 created_at 均为 UTC
// 红线: 每次按需重算，不缓存
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::types::YieldRisk;
use crate::engine::conversion::{classify_yield_with, YieldThresholds};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

// ==========================================
// YieldRiskCounts - 各风险档批次数
// ==========================================
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldRiskCounts {
    pub good: usize,
    pub warning: usize,
    pub critical: usize,
    pub unknown: usize,
}

impl YieldRiskCounts {
    fn record(&mut self, risk: YieldRisk) {
        match risk {
            YieldRisk::Good => self.good += 1,
            YieldRisk::Warning => self.warning += 1,
            YieldRisk::Critical => self.critical += 1,
            YieldRisk::Unknown => self.unknown += 1,
        }
    }
}

// ==========================================
// ThroughputSummary - 月累计汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThroughputSummary {
    pub batch_count: usize,
    pub mtd_throughput_lbs: f64,
    pub mtd_cost: f64,
    pub avg_yield_pct: f64,
    pub cost_per_lb_blended: Option<f64>,
    pub yield_risk_counts: YieldRiskCounts,
}

// ==========================================
// ThroughputAggregator - 汇总器
// ==========================================
pub struct ThroughputAggregator;

impl ThroughputAggregator {
    /// 汇总（默认风险阈值）
    pub fn summarize(batches: &[Batch]) -> ThroughputSummary {
        Self::summarize_with(batches, YieldThresholds::default())
    }

    /// 汇总（指定风险阈值）
    pub fn summarize_with(batches: &[Batch], thresholds: YieldThresholds) -> ThroughputSummary {
        let mut throughput = 0.0;
        let mut cost = 0.0;
        let mut yield_sum: i64 = 0;
        let mut yield_count: usize = 0;
        let mut risk_counts = YieldRiskCounts::default();

        for batch in batches {
            throughput += batch.raw_weight_lbs;
            cost += batch.total_cost();
            if let Some(y) = batch.yield_pct {
                yield_sum += i64::from(y);
                yield_count += 1;
            }
            risk_counts.record(classify_yield_with(batch.yield_pct, thresholds));
        }

        let avg_yield_pct = if yield_count == 0 {
            0.0
        } else {
            yield_sum as f64 / yield_count as f64
        };

        ThroughputSummary {
            batch_count: batches.len(),
            mtd_throughput_lbs: throughput,
            mtd_cost: cost,
            avg_yield_pct,
            cost_per_lb_blended: blended_cost_per_lb(cost, throughput),
            yield_risk_counts: risk_counts,
        }
    }

    /// 批次是否落在 today 所在月的月初至 today（含）窗口内
    ///
    /// # 参数
    /// - today: UTC 日期
    pub fn in_month_to_date(batch: &Batch, today: NaiveDate) -> bool {
        let created = batch.created_at.date_naive();
        created.year() == today.year() && created.month() == today.month() && created <= today
    }

    /// 月初日期
    pub fn month_start(today: NaiveDate) -> NaiveDate {
        today.with_day(1).unwrap_or(today)
    }
}

/// 综合每磅成本；产量为 0 时无定义
pub fn blended_cost_per_lb(total_cost: f64, total_weight_lbs: f64) -> Option<f64> {
    if total_weight_lbs > 0.0 {
        Some(total_cost / total_weight_lbs)
    } else {
        None
    }
}
