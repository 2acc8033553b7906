// ==========================================
// 生产批次核算系统 - 批次领域模型
// ==========================================
// 职责: 原料批次实体及其派生字段
// 红线: total_cost 不存储，任何时刻都由 raw_weight_lbs × cost_per_lb 重新计算
// ==========================================

use crate::domain::types::{BatchStatus, YieldRisk};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// 最大出成系数：成品袋数上限 = floor(原料重量 × 0.6)
pub const MAX_YIELD_RATE: f64 = 0.6;

// ==========================================
// Batch - 原料批次
// ==========================================
// 用途: 引擎输入/输出，仓储持久化
// 对齐: batch 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Batch {
    // ===== 主键与标识 =====
    pub batch_id: String,     // 批次ID（仓储分配，UUID）
    pub batch_number: String, // 批次号（人类可读，唯一，不可变）
    pub supplier_id: String,  // 供应商引用（创建后不可变）

    // ===== 重量与单价 =====
    pub raw_weight_lbs: f64, // 当前归属本批次的原料重量（磅）
    pub cost_per_lb: f64,    // 每磅成本

    // ===== 生命周期 =====
    pub status: BatchStatus,

    // ===== 转化结果（仅转化时写入一次）=====
    pub yield_pct: Option<i32>,      // 出成率（0-100）
    pub finished_bags: Option<u32>,  // 成品袋数
    pub product_ref: Option<String>, // 目标成品

    // ===== 损耗记录 =====
    pub damaged_weight_lbs: f64,       // 累计损耗重量
    pub damage_reason: Option<String>, // 最近一次损耗原因

    // ===== 并发控制 =====
    pub revision: i32, // 乐观锁版本号

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Batch {
    /// 批次总成本（唯一口径）
    pub fn total_cost(&self) -> f64 {
        total_cost(self.raw_weight_lbs, self.cost_per_lb)
    }

    /// 出成率风险分级（默认阈值）
    pub fn yield_risk(&self) -> YieldRisk {
        crate::engine::conversion::classify_yield(self.yield_pct)
    }

    pub fn is_active(&self) -> bool {
        self.status.is_active()
    }
}

// ==========================================
// NewBatch - 待持久化的新批次
// ==========================================
// 批次号由仓储在创建事务内分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewBatch {
    pub batch_id: String,
    pub supplier_id: String,
    pub raw_weight_lbs: f64,
    pub cost_per_lb: f64,
    pub status: BatchStatus,
    pub created_at: DateTime<Utc>,
}

impl NewBatch {
    /// 补齐批次号，生成完整批次（revision 从 1 开始）
    pub fn into_batch(self, batch_number: String) -> Batch {
        Batch {
            batch_id: self.batch_id,
            batch_number,
            supplier_id: self.supplier_id,
            raw_weight_lbs: self.raw_weight_lbs,
            cost_per_lb: self.cost_per_lb,
            status: self.status,
            yield_pct: None,
            finished_bags: None,
            product_ref: None,
            damaged_weight_lbs: 0.0,
            damage_reason: None,
            revision: 1,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

// ==========================================
// BatchEdit - 加工前修正
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchEdit {
    pub raw_weight_lbs: Option<f64>,
    pub cost_per_lb: Option<f64>,
}

/// 总成本 = 重量 × 每磅成本
pub fn total_cost(raw_weight_lbs: f64, cost_per_lb: f64) -> f64 {
    raw_weight_lbs * cost_per_lb
}

// ==========================================
// BatchFilter - 批次查询条件
// ==========================================
// 用途: ListBatches 只读查询
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchFilter {
    pub status: Option<BatchStatus>,
    pub supplier_id: Option<String>,
    pub created_from: Option<DateTime<Utc>>, // 含
    pub created_to: Option<DateTime<Utc>>,   // 含
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_cost_is_weight_times_rate() {
        assert!((total_cost(45.5, 8.50) - 386.75).abs() < 1e-9);
        assert_eq!(total_cost(0.0, 8.50), 0.0);
    }
}
