// ==========================================
// 生产批次核算系统 - 损耗处理
// ==========================================
// 规则:
// - 原因必填（空白视为缺失 → MissingReason）
// - Full: 当前 raw_weight 全部转入损耗，raw_weight 归零，状态 → Damaged
// - Partial: 0 < weight <= raw_weight，否则 InvalidDamageWeight
//   raw_weight -= weight，损耗累计，状态 → PartialDamaged
//   weight == raw_weight 时按整批损耗处理（保证未损毁批次 raw_weight > 0）
// 红线: 返回完整的新批次值，重量与状态同时生效，不存在半应用
// ==========================================

use crate::domain::batch::Batch;
use crate::domain::types::{BatchAction, DamageType};
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::lifecycle::BatchLifecycle;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 重量比较容差
const WEIGHT_EPSILON: f64 = 1e-9;

// ==========================================
// DamageRequest - 损耗登记请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DamageRequest {
    pub damage_type: DamageType,
    pub weight_lbs: Option<f64>, // 仅 Partial 需要
    pub reason: String,
}

// ==========================================
// DamageProcessor - 损耗处理器
// ==========================================
pub struct DamageProcessor;

impl DamageProcessor {
    /// 应用损耗，返回新的批次值
    ///
    /// # 校验顺序
    /// 1. 状态转换合法性
    /// 2. 原因非空
    /// 3. 部分损耗重量范围
    pub fn apply(batch: &Batch, request: &DamageRequest, now: DateTime<Utc>) -> EngineResult<Batch> {
        let action = match request.damage_type {
            DamageType::Full => BatchAction::FullDamage,
            DamageType::Partial => BatchAction::PartialDamage,
        };
        BatchLifecycle::ensure_allowed(batch.status, action)?;

        let reason = request.reason.trim();
        if reason.is_empty() {
            return Err(EngineError::MissingReason);
        }

        match request.damage_type {
            DamageType::Full => Self::full(batch, reason, now),
            DamageType::Partial => {
                let weight = Self::validate_partial_weight(batch.raw_weight_lbs, request.weight_lbs)?;
                if (batch.raw_weight_lbs - weight).abs() <= WEIGHT_EPSILON {
                    return Self::full(batch, reason, now);
                }

                let status = BatchLifecycle::transition(batch.status, BatchAction::PartialDamage)?;
                let mut next = batch.clone();
                next.raw_weight_lbs = batch.raw_weight_lbs - weight;
                next.damaged_weight_lbs = batch.damaged_weight_lbs + weight;
                next.damage_reason = Some(reason.to_string());
                next.status = status;
                next.updated_at = now;
                Ok(next)
            }
        }
    }

    /// 部分损耗重量校验: 0 < weight <= available
    pub fn validate_partial_weight(available: f64, weight: Option<f64>) -> EngineResult<f64> {
        match weight {
            Some(w) if w.is_finite() && w > 0.0 && w <= available + WEIGHT_EPSILON => Ok(w),
            other => Err(EngineError::InvalidDamageWeight {
                weight: other,
                available,
            }),
        }
    }

    /// 整批损耗: 剩余 raw_weight 全部转入损耗，当前重量归零
    fn full(batch: &Batch, reason: &str, now: DateTime<Utc>) -> EngineResult<Batch> {
        let status = BatchLifecycle::transition(batch.status, BatchAction::FullDamage)?;
        let mut next = batch.clone();
        next.raw_weight_lbs = 0.0;
        next.damaged_weight_lbs = batch.damaged_weight_lbs + batch.raw_weight_lbs;
        next.damage_reason = Some(reason.to_string());
        next.status = status;
        next.updated_at = now;
        Ok(next)
    }
}
