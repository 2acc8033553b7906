// ==========================================
// 生产批次核算系统 - 批次录入与修正校验
// ==========================================
// 职责:
// 1. 创建批次: 原料重量 > 0，每磅成本 >= 0（缺省或为负时取标准单价）
// 2. 内联供应商: 名称不含数字，电话不含字母，邮箱格式合法
// 3. 修正批次: 仅活动状态可改，新值必须合法，出成率不受影响
// 红线: 任何字段违规都整体拒绝，不产生部分记录
// ==========================================

use crate::domain::batch::{Batch, BatchEdit, NewBatch};
use crate::domain::supplier::NewSupplier;
use crate::domain::types::BatchAction;
use crate::engine::error::{EngineError, EngineResult};
use crate::engine::lifecycle::BatchLifecycle;
use chrono::{DateTime, Utc};

pub mod fields {
    pub const RAW_WEIGHT: &str = "raw_weight_lbs";
    pub const COST_PER_LB: &str = "cost_per_lb";
    pub const SUPPLIER: &str = "supplier";
    pub const SUPPLIER_NAME: &str = "supplier.name";
    pub const SUPPLIER_PHONE: &str = "supplier.phone";
    pub const SUPPLIER_EMAIL: &str = "supplier.email";
    pub const BATCH: &str = "batch";
}

/// 批次录入校验器（无状态）
pub struct BatchIntake;

impl BatchIntake {
    /// 校验原料重量
    pub fn validate_raw_weight(raw_weight_lbs: f64) -> EngineResult<f64> {
        if !raw_weight_lbs.is_finite() {
            return Err(EngineError::validation(fields::RAW_WEIGHT, "重量必须为有效数字"));
        }
        if raw_weight_lbs <= 0.0 {
            return Err(EngineError::validation(
                fields::RAW_WEIGHT,
                format!("重量必须大于0，实际为 {}", raw_weight_lbs),
            ));
        }
        Ok(raw_weight_lbs)
    }

    /// 创建时的单价：缺省或为负时回退为标准单价
    pub fn resolve_cost_per_lb(cost_per_lb: Option<f64>, standard_rate: f64) -> EngineResult<f64> {
        match cost_per_lb {
            Some(cost) if !cost.is_finite() => Err(EngineError::validation(
                fields::COST_PER_LB,
                "单价必须为有效数字",
            )),
            Some(cost) if cost >= 0.0 => Ok(cost),
            _ => Ok(standard_rate),
        }
    }

    /// 校验内联录入的供应商，返回规整后的字段（去空白，空串视为未填写）
    pub fn validate_new_supplier(supplier: &NewSupplier) -> EngineResult<NewSupplier> {
        let name = supplier.name.trim();
        if name.is_empty() {
            return Err(EngineError::validation(fields::SUPPLIER_NAME, "供应商名称不能为空"));
        }
        if name.chars().any(|c| c.is_numeric()) {
            return Err(EngineError::validation(
                fields::SUPPLIER_NAME,
                "供应商名称不能包含数字",
            ));
        }

        let phone = normalize_optional(supplier.phone.as_deref());
        if let Some(ref p) = phone {
            if p.chars().any(|c| c.is_alphabetic()) {
                return Err(EngineError::validation(
                    fields::SUPPLIER_PHONE,
                    "电话号码不能包含字母",
                ));
            }
        }

        let email = normalize_optional(supplier.email.as_deref());
        if let Some(ref e) = email {
            if !is_valid_email(e) {
                return Err(EngineError::validation(
                    fields::SUPPLIER_EMAIL,
                    format!("邮箱格式不正确: {}", e),
                ));
            }
        }

        Ok(NewSupplier {
            name: name.to_string(),
            phone,
            email,
            address: normalize_optional(supplier.address.as_deref()),
        })
    }

    /// 生成待持久化的新批次（初始状态 Pending，出成率为空）
    pub fn draft(
        batch_id: String,
        supplier_id: String,
        raw_weight_lbs: f64,
        cost_per_lb: Option<f64>,
        standard_rate: f64,
        now: DateTime<Utc>,
    ) -> EngineResult<NewBatch> {
        let raw_weight_lbs = Self::validate_raw_weight(raw_weight_lbs)?;
        let cost_per_lb = Self::resolve_cost_per_lb(cost_per_lb, standard_rate)?;

        if supplier_id.trim().is_empty() {
            return Err(EngineError::validation(fields::SUPPLIER, "必须选择供应商"));
        }

        Ok(NewBatch {
            batch_id,
            supplier_id,
            raw_weight_lbs,
            cost_per_lb,
            status: BatchLifecycle::INITIAL,
            created_at: now,
        })
    }

    /// 应用加工前修正，返回新的批次值（不修改入参）
    ///
    /// # 规则
    /// - 至少修改一个字段
    /// - 仅活动状态允许（终态 → InvalidTransition）
    /// - 重量 > 0，单价 >= 0（修正时不做标准单价回退）
    /// - yield_pct / 损耗记录 / 供应商 不变
    pub fn apply_edit(batch: &Batch, edit: &BatchEdit, now: DateTime<Utc>) -> EngineResult<Batch> {
        if edit.raw_weight_lbs.is_none() && edit.cost_per_lb.is_none() {
            return Err(EngineError::validation(fields::BATCH, "至少需要修改重量或单价之一"));
        }

        let status = BatchLifecycle::transition(batch.status, BatchAction::Edit)?;

        let raw_weight_lbs = match edit.raw_weight_lbs {
            Some(w) => Self::validate_raw_weight(w)?,
            None => batch.raw_weight_lbs,
        };

        let cost_per_lb = match edit.cost_per_lb {
            Some(c) if !c.is_finite() => {
                return Err(EngineError::validation(fields::COST_PER_LB, "单价必须为有效数字"))
            }
            Some(c) if c < 0.0 => {
                return Err(EngineError::validation(
                    fields::COST_PER_LB,
                    format!("单价不能为负数，实际为 {}", c),
                ))
            }
            Some(c) => c,
            None => batch.cost_per_lb,
        };

        let mut next = batch.clone();
        next.raw_weight_lbs = raw_weight_lbs;
        next.cost_per_lb = cost_per_lb;
        next.status = status;
        next.updated_at = now;
        Ok(next)
    }
}

fn normalize_optional(value: Option<&str>) -> Option<String> {
    value
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

/// 邮箱格式检查: local@domain.tld
///
/// - 恰好一个 '@'，两侧非空
/// - 不含空白
/// - 域名包含 '.'，且各段非空
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }

    let mut parts = email.split('@');
    let (local, domain) = match (parts.next(), parts.next(), parts.next()) {
        (Some(l), Some(d), None) => (l, d),
        _ => return false,
    };

    if local.is_empty() || local.starts_with('.') || local.ends_with('.') {
        return false;
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return false;
    }

    labels.iter().all(|label| {
        !label.is_empty()
            && !label.starts_with('-')
            && !label.ends_with('-')
            && label.chars().all(|c| c.is_alphanumeric() || c == '-')
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::types::BatchStatus;

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    fn supplier(name: &str) -> NewSupplier {
        NewSupplier {
            name: name.to_string(),
            ..Default::default()
        }
    }

    fn pending_batch(raw_weight_lbs: f64, cost_per_lb: f64) -> Batch {
        BatchIntake::draft(
            "b-1".to_string(),
            "s-1".to_string(),
            raw_weight_lbs,
            Some(cost_per_lb),
            8.50,
            now(),
        )
        .unwrap()
        .into_batch("B-00001".to_string())
    }

    #[test]
    fn test_draft_starts_pending_without_yield() {
        let batch = pending_batch(45.5, 8.50);
        assert_eq!(batch.status, BatchStatus::Pending);
        assert_eq!(batch.yield_pct, None);
        assert_eq!(batch.damaged_weight_lbs, 0.0);
        assert!((batch.total_cost() - 386.75).abs() < 1e-9);
    }

    #[test]
    fn test_raw_weight_must_be_positive() {
        for bad in [0.0, -1.0, f64::NAN, f64::INFINITY] {
            let err = BatchIntake::draft(
                "b".to_string(),
                "s".to_string(),
                bad,
                Some(1.0),
                8.50,
                now(),
            )
            .unwrap_err();
            assert!(matches!(err, EngineError::Validation { ref field, .. } if field == fields::RAW_WEIGHT));
        }
    }

    #[test]
    fn test_cost_falls_back_to_standard_rate() {
        assert_eq!(BatchIntake::resolve_cost_per_lb(None, 8.5), Ok(8.5));
        assert_eq!(BatchIntake::resolve_cost_per_lb(Some(-2.0), 8.5), Ok(8.5));
        assert_eq!(BatchIntake::resolve_cost_per_lb(Some(0.0), 8.5), Ok(0.0));
        assert_eq!(BatchIntake::resolve_cost_per_lb(Some(3.25), 8.5), Ok(3.25));
        assert!(BatchIntake::resolve_cost_per_lb(Some(f64::NAN), 8.5).is_err());
    }

    #[test]
    fn test_supplier_name_rejects_digits() {
        let err = BatchIntake::validate_new_supplier(&supplier("Farm 42")).unwrap_err();
        assert_eq!(
            err,
            EngineError::validation(fields::SUPPLIER_NAME, "供应商名称不能包含数字")
        );
        assert!(BatchIntake::validate_new_supplier(&supplier("   ")).is_err());
    }

    #[test]
    fn test_supplier_phone_rejects_letters() {
        let mut s = supplier("Green Valley");
        s.phone = Some("555-CALL".to_string());
        let err = BatchIntake::validate_new_supplier(&s).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == fields::SUPPLIER_PHONE));

        s.phone = Some("+1 (555) 010-2000".to_string());
        assert!(BatchIntake::validate_new_supplier(&s).is_ok());
    }

    #[test]
    fn test_supplier_email_shape() {
        let mut s = supplier("Green Valley");
        s.email = Some("not-an-email".to_string());
        let err = BatchIntake::validate_new_supplier(&s).unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == fields::SUPPLIER_EMAIL));

        s.email = Some("orders@green-valley.farm".to_string());
        let ok = BatchIntake::validate_new_supplier(&s).unwrap();
        assert_eq!(ok.email.as_deref(), Some("orders@green-valley.farm"));
    }

    #[test]
    fn test_supplier_blank_optionals_become_none() {
        let s = NewSupplier {
            name: "  Green Valley ".to_string(),
            phone: Some("  ".to_string()),
            email: Some(String::new()),
            address: None,
        };
        let ok = BatchIntake::validate_new_supplier(&s).unwrap();
        assert_eq!(ok.name, "Green Valley");
        assert_eq!(ok.phone, None);
        assert_eq!(ok.email, None);
    }

    #[test]
    fn test_email_checks() {
        assert!(is_valid_email("a@b.co"));
        assert!(is_valid_email("first.last@sub.example.org"));
        assert!(!is_valid_email("a@b"));
        assert!(!is_valid_email("@b.co"));
        assert!(!is_valid_email("a@@b.co"));
        assert!(!is_valid_email("a b@c.co"));
        assert!(!is_valid_email("a@b..co"));
        assert!(!is_valid_email("a@-b.co"));
    }

    #[test]
    fn test_edit_updates_weight_and_cost() {
        let batch = pending_batch(45.5, 8.50);
        let edited = BatchIntake::apply_edit(
            &batch,
            &BatchEdit {
                raw_weight_lbs: Some(50.0),
                cost_per_lb: None,
            },
            now(),
        )
        .unwrap();
        assert_eq!(edited.raw_weight_lbs, 50.0);
        assert_eq!(edited.cost_per_lb, 8.50);
        assert_eq!(edited.status, BatchStatus::Pending);
        assert_eq!(edited.batch_number, batch.batch_number);
        assert_eq!(edited.supplier_id, batch.supplier_id);
        // 入参不被修改
        assert_eq!(batch.raw_weight_lbs, 45.5);
    }

    #[test]
    fn test_edit_keeps_partial_damaged_status() {
        let mut batch = pending_batch(45.5, 8.50);
        batch.status = BatchStatus::PartialDamaged;
        let edited = BatchIntake::apply_edit(
            &batch,
            &BatchEdit {
                raw_weight_lbs: None,
                cost_per_lb: Some(9.0),
            },
            now(),
        )
        .unwrap();
        assert_eq!(edited.status, BatchStatus::PartialDamaged);
    }

    #[test]
    fn test_edit_rejects_empty_and_invalid_values() {
        let batch = pending_batch(45.5, 8.50);
        assert!(BatchIntake::apply_edit(&batch, &BatchEdit::default(), now()).is_err());

        let err = BatchIntake::apply_edit(
            &batch,
            &BatchEdit {
                raw_weight_lbs: None,
                cost_per_lb: Some(-1.0),
            },
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == fields::COST_PER_LB));

        let err = BatchIntake::apply_edit(
            &batch,
            &BatchEdit {
                raw_weight_lbs: Some(0.0),
                cost_per_lb: None,
            },
            now(),
        )
        .unwrap_err();
        assert!(matches!(err, EngineError::Validation { ref field, .. } if field == fields::RAW_WEIGHT));
    }

    #[test]
    fn test_edit_on_terminal_batch_is_invalid_transition() {
        let mut batch = pending_batch(45.5, 8.50);
        batch.status = BatchStatus::Finished;
        batch.yield_pct = Some(59);
        let err = BatchIntake::apply_edit(
            &batch,
            &BatchEdit {
                raw_weight_lbs: Some(100.0),
                cost_per_lb: None,
            },
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            EngineError::InvalidTransition {
                from: BatchStatus::Finished,
                action: BatchAction::Edit,
            }
        );
    }
}
