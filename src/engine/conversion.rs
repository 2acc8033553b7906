// ==========================================
// 生产批次核算系统 - 出成率与转化计算
// ==========================================
// 规则:
// - max_bags = floor(raw_weight_lbs × 0.6)
// - 请求袋数 > max_bags → CapacityExceeded（携带 max_bags），绝不静默截断
// - yield_pct = round(bags / raw_weight_lbs × 100)，转化时写入一次，此后不再重算
// - 风险分级: >=40 good / 30~40 warning / <30 critical / 空 unknown
// ==========================================

use crate::domain::batch::{Batch, MAX_YIELD_RATE};
use crate::domain::types::{BatchAction, YieldRisk};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::lifecycle::BatchLifecycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 浮点误差容差（避免 x.999999 被向下取整）
const FLOOR_EPSILON: f64 = 1e-9;

/// 默认 good 阈值（%）
pub const DEFAULT_GOOD_THRESHOLD_PCT: i32 = 40;
/// 默认 warning 阈值（%）
pub const DEFAULT_WARNING_THRESHOLD_PCT: i32 = 30;

// ==========================================
// YieldThresholds - 风险分级阈值
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct YieldThresholds {
    pub good_pct: i32,
    pub warning_pct: i32,
}

impl Default for YieldThresholds {
    fn default() -> Self {
        Self {
            good_pct: DEFAULT_GOOD_THRESHOLD_PCT,
            warning_pct: DEFAULT_WARNING_THRESHOLD_PCT,
        }
    }
}

/// 可转化成品袋数上限
pub fn max_bags(raw_weight_lbs: f64) -> u32 {
    if !raw_weight_lbs.is_finite() || raw_weight_lbs <= 0.0 {
        return 0;
    }
    (raw_weight_lbs * MAX_YIELD_RATE + FLOOR_EPSILON).floor() as u32
}

/// 出成率（整数百分比，四舍五入）
pub fn yield_percent(bags: u32, raw_weight_lbs: f64) -> i32 {
    (bags as f64 / raw_weight_lbs * 100.0).round() as i32
}

/// 风险分级（默认阈值）
pub fn classify_yield(yield_pct: Option<i32>) -> YieldRisk {
    classify_yield_with(yield_pct, YieldThresholds::default())
}

/// 风险分级（指定阈值）
pub fn classify_yield_with(yield_pct: Option<i32>, thresholds: YieldThresholds) -> YieldRisk {
    match yield_pct {
        None => YieldRisk::Unknown,
        Some(p) if p >= thresholds.good_pct => YieldRisk::Good,
        Some(p) if p >= thresholds.warning_pct => YieldRisk::Warning,
        Some(_) => YieldRisk::Critical,
    }
}

// ==========================================
// YieldCalculator - 转化计算
// ==========================================
pub struct YieldCalculator;

impl YieldCalculator {
    /// 执行转化，返回新的批次值（状态 Finished，写入出成率/袋数/成品）
    ///
    /// # 错误
    /// - InvalidTransition: 批次已是终态
    /// - Validation: 袋数为 0 或成品为空
    /// - CapacityExceeded: 袋数超出上限
    pub fn convert(
        batch: &Batch,
        bag_count: u32,
        product_ref: &str,
        now: DateTime<Utc>,
    ) -> EngineResult<Batch> {
        let status = BatchLifecycle::transition(batch.status, BatchAction::Convert)?;

        if bag_count == 0 {
            return Err(EngineError::validation("bag_count", "成品袋数必须为正整数"));
        }
        let product_ref = product_ref.trim();
        if product_ref.is_empty() {
            return Err(EngineError::validation("product_ref", "必须指定目标成品"));
        }

        let max_bags = max_bags(batch.raw_weight_lbs);
        if bag_count > max_bags {
            return Err(EngineError::CapacityExceeded {
                requested: bag_count,
                max_bags,
            });
        }

        let mut next = batch.clone();
        next.status = status;
        next.yield_pct = Some(yield_percent(bag_count, batch.raw_weight_lbs));
        next.finished_bags = Some(bag_count);
        next.product_ref = Some(product_ref.to_string());
        next.updated_at = now;
        Ok(next)
    }
}
