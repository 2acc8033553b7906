// ==========================================
// 生产批次核算系统 - 领域类型定义
// ==========================================
// 职责: 批次状态、损耗类型、出成率风险分级等封闭枚举
// 红线: 每个状态只有一个规范名称，同义词只在边界处归一化
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

// ==========================================
// 批次状态 (Batch Status)
// ==========================================
// 初始: Pending；终态: Finished / Damaged
// PartialDamaged 仍为活动状态，可继续修改、损耗、转化
// 序列化格式: snake_case (与数据库一致)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    Pending,        // 加工中（processing 同义）
    PartialDamaged, // 部分损耗
    Damaged,        // 全部损耗（full_damaged 同义）
    Finished,       // 已转化为成品（completed 同义）
}

impl BatchStatus {
    /// 是否为活动状态（允许修改/损耗/转化）
    pub fn is_active(&self) -> bool {
        matches!(self, BatchStatus::Pending | BatchStatus::PartialDamaged)
    }

    /// 是否为终态
    pub fn is_terminal(&self) -> bool {
        !self.is_active()
    }

    /// 转换为数据库存储的字符串
    pub fn to_db_str(&self) -> &'static str {
        match self {
            BatchStatus::Pending => "pending",
            BatchStatus::PartialDamaged => "partial_damaged",
            BatchStatus::Damaged => "damaged",
            BatchStatus::Finished => "finished",
        }
    }
}

impl fmt::Display for BatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_db_str())
    }
}

/// 无法识别的状态字符串
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownStatus(pub String);

impl fmt::Display for UnknownStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "未知的批次状态: {}", self.0)
    }
}

impl std::error::Error for UnknownStatus {}

impl FromStr for BatchStatus {
    type Err = UnknownStatus;

    /// 边界归一化：大小写不敏感，接受历史同义词
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" | "processing" => Ok(BatchStatus::Pending),
            "partial_damaged" => Ok(BatchStatus::PartialDamaged),
            "damaged" | "full_damaged" => Ok(BatchStatus::Damaged),
            "finished" | "completed" => Ok(BatchStatus::Finished),
            _ => Err(UnknownStatus(s.to_string())),
        }
    }
}

// ==========================================
// 损耗类型 (Damage Type)
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DamageType {
    Full,    // 整批损耗
    Partial, // 部分损耗（需提供重量）
}

impl fmt::Display for DamageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DamageType::Full => write!(f, "full"),
            DamageType::Partial => write!(f, "partial"),
        }
    }
}

// ==========================================
// 批次操作 (Batch Action)
// ==========================================
// 状态机的输入事件
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchAction {
    Edit,          // 重量/单价修正
    PartialDamage, // 部分损耗
    FullDamage,    // 整批损耗
    Convert,       // 转化为成品
}

impl fmt::Display for BatchAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchAction::Edit => write!(f, "EDIT"),
            BatchAction::PartialDamage => write!(f, "PARTIAL_DAMAGE"),
            BatchAction::FullDamage => write!(f, "FULL_DAMAGE"),
            BatchAction::Convert => write!(f, "CONVERT"),
        }
    }
}

// ==========================================
// 出成率风险分级 (Yield Risk)
// ==========================================
// 仅用于展示/报表，不参与校验
// 顺序: Critical < Warning < Good
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum YieldRisk {
    Unknown,  // 尚未转化
    Critical, // < 30%
    Warning,  // 30% ~ 40%
    Good,     // >= 40%
}

impl fmt::Display for YieldRisk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            YieldRisk::Unknown => write!(f, "unknown"),
            YieldRisk::Critical => write!(f, "critical"),
            YieldRisk::Warning => write!(f, "warning"),
            YieldRisk::Good => write!(f, "good"),
        }
    }
}
