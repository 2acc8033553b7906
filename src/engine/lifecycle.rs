// ==========================================
// 生产批次核算系统 - 批次状态机
// ==========================================
// 职责: 判定批次状态转换是否合法，给出目标状态
// 红线: Finished / Damaged 为终态，不定义任何出边
// ==========================================
// 转换表:
//   active          --Edit-->          (保持原状态)
//   active          --PartialDamage--> PartialDamaged
//   active          --FullDamage-->    Damaged
//   active          --Convert-->       Finished
// active = Pending | PartialDamaged
// ==========================================

use crate::domain::types::{BatchAction, BatchStatus};
use crate::engine::error::{EngineError, EngineResult};

/// 批次状态机（无状态，纯函数）
pub struct BatchLifecycle;

impl BatchLifecycle {
    /// 批次创建时的初始状态
    pub const INITIAL: BatchStatus = BatchStatus::Pending;

    /// 计算动作执行后的目标状态
    ///
    /// # 返回
    /// - Ok(BatchStatus): 合法转换的目标状态
    /// - Err(EngineError::InvalidTransition): 当前状态不允许该动作
    pub fn transition(from: BatchStatus, action: BatchAction) -> EngineResult<BatchStatus> {
        if from.is_terminal() {
            return Err(EngineError::InvalidTransition { from, action });
        }

        let to = match action {
            BatchAction::Edit => from,
            BatchAction::PartialDamage => BatchStatus::PartialDamaged,
            BatchAction::FullDamage => BatchStatus::Damaged,
            BatchAction::Convert => BatchStatus::Finished,
        };

        Ok(to)
    }

    /// 仅校验动作是否允许
    pub fn ensure_allowed(from: BatchStatus, action: BatchAction) -> EngineResult<()> {
        Self::transition(from, action).map(|_| ())
    }

    /// 是否允许该动作
    pub fn can(from: BatchStatus, action: BatchAction) -> bool {
        Self::transition(from, action).is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_ACTIONS: [BatchAction; 4] = [
        BatchAction::Edit,
        BatchAction::PartialDamage,
        BatchAction::FullDamage,
        BatchAction::Convert,
    ];

    #[test]
    fn test_pending_transitions() {
        let from = BatchStatus::Pending;
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::Edit),
            Ok(BatchStatus::Pending)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::PartialDamage),
            Ok(BatchStatus::PartialDamaged)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::FullDamage),
            Ok(BatchStatus::Damaged)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::Convert),
            Ok(BatchStatus::Finished)
        );
    }

    #[test]
    fn test_partial_damaged_stays_active() {
        let from = BatchStatus::PartialDamaged;
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::Edit),
            Ok(BatchStatus::PartialDamaged)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::PartialDamage),
            Ok(BatchStatus::PartialDamaged)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::FullDamage),
            Ok(BatchStatus::Damaged)
        );
        assert_eq!(
            BatchLifecycle::transition(from, BatchAction::Convert),
            Ok(BatchStatus::Finished)
        );
    }

    #[test]
    fn test_terminal_states_reject_everything() {
        for from in [BatchStatus::Finished, BatchStatus::Damaged] {
            for action in ALL_ACTIONS {
                assert_eq!(
                    BatchLifecycle::transition(from, action),
                    Err(EngineError::InvalidTransition { from, action })
                );
                assert!(!BatchLifecycle::can(from, action));
            }
        }
    }

    #[test]
    fn test_initial_state_is_pending() {
        assert_eq!(BatchLifecycle::INITIAL, BatchStatus::Pending);
    }
}
