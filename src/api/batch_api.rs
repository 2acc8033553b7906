// ==========================================
// 生产批次核算系统 - 批次 API
// ==========================================
// 职责: 批次创建、修正、损耗、转化、删除与查询
// 流程: 读取 → 引擎校验/计算 → 仓储提交（revision 乐观锁）→ 记录 ActionLog
// 红线: 提交成功前不改动任何已持久化的批次状态
// ==========================================

use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{debug, info, instrument, warn};

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::ConfigManager;
use crate::domain::action_log::{ActionLog, ActionType};
use crate::domain::batch::{Batch, BatchEdit, BatchFilter};
use crate::domain::supplier::{Supplier, SupplierSelection};
use crate::domain::types::BatchStatus;
use crate::engine::conversion::YieldCalculator;
use crate::engine::damage::{DamageProcessor, DamageRequest};
use crate::engine::intake::{fields, BatchIntake};
use crate::repository::action_log_repo::ActionLogRepository;
use crate::repository::batch_repo::BatchRepository;
use crate::repository::supplier_repo::SupplierRepository;

// ==========================================
// CreateBatchRequest - 创建批次请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateBatchRequest {
    pub supplier: SupplierSelection,
    pub raw_weight_lbs: f64,
    pub cost_per_lb: Option<f64>, // 缺省或为负时取标准单价
}

// ==========================================
// ConvertBatchRequest - 转化请求
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConvertBatchRequest {
    pub bag_count: u32,
    pub product_ref: String,
}

/// 当前时间，截断到存储精度（微秒）
fn now_micros() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(6)
}

/// 边界状态归一化：接受历史同义词，未知值按字段校验错误返回
pub fn normalize_status(raw: &str) -> ApiResult<BatchStatus> {
    BatchStatus::from_str(raw).map_err(|e| ApiError::ValidationError {
        field: "status".to_string(),
        message: e.to_string(),
    })
}

// ==========================================
// BatchApi - 批次 API
// ==========================================

/// 批次API
///
/// 职责：
/// 1. 边界操作（Create/Edit/Damage/Convert/Delete）
/// 2. 乐观锁冲突 → StaleBatchState
/// 3. ActionLog记录
pub struct BatchApi {
    batch_repo: Arc<BatchRepository>,
    supplier_repo: Arc<SupplierRepository>,
    action_log_repo: Arc<ActionLogRepository>,
    config_manager: Arc<ConfigManager>,
}

impl BatchApi {
    /// 创建新的BatchApi实例
    pub fn new(
        batch_repo: Arc<BatchRepository>,
        supplier_repo: Arc<SupplierRepository>,
        action_log_repo: Arc<ActionLogRepository>,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            batch_repo,
            supplier_repo,
            action_log_repo,
            config_manager,
        }
    }

    // ==========================================
    // 写入接口
    // ==========================================

    /// 创建批次
    ///
    /// # 参数
    /// - request: 供应商（已有或内联新建）、原料重量、每磅成本
    /// - actor: 操作人
    ///
    /// # 返回
    /// - Ok(Batch): 新批次（status=pending, revision=1）
    /// - Err(ApiError::ValidationError): 字段校验失败，不产生任何记录
    #[instrument(skip(self, request), fields(actor = %actor))]
    pub fn create_batch(&self, request: CreateBatchRequest, actor: &str) -> ApiResult<Batch> {
        let now = now_micros();
        let standard_rate = self
            .config_manager
            .get_default_cost_per_lb()
            .map_err(|e| ApiError::InternalError(format!("读取标准单价失败: {}", e)))?;

        let (supplier_id, new_supplier) = match &request.supplier {
            SupplierSelection::Existing { supplier_id } => {
                let supplier_id = supplier_id.trim();
                if supplier_id.is_empty() {
                    return Err(ApiError::ValidationError {
                        field: fields::SUPPLIER.to_string(),
                        message: "必须选择供应商".to_string(),
                    });
                }
                if self.supplier_repo.find_by_id(supplier_id)?.is_none() {
                    warn!(supplier_id = %supplier_id, "创建批次被拒绝: 供应商不存在");
                    return Err(ApiError::ValidationError {
                        field: fields::SUPPLIER.to_string(),
                        message: format!("供应商不存在: {}", supplier_id),
                    });
                }
                (supplier_id.to_string(), None)
            }
            SupplierSelection::New(fields_in) => {
                let validated = BatchIntake::validate_new_supplier(fields_in).map_err(|e| {
                    warn!(error = %e, "创建批次被拒绝: 供应商字段非法");
                    ApiError::from(e)
                })?;
                let supplier = Supplier {
                    supplier_id: uuid::Uuid::new_v4().to_string(),
                    name: validated.name,
                    phone: validated.phone,
                    email: validated.email,
                    address: validated.address,
                    created_at: now,
                };
                (supplier.supplier_id.clone(), Some(supplier))
            }
        };

        let draft = BatchIntake::draft(
            uuid::Uuid::new_v4().to_string(),
            supplier_id,
            request.raw_weight_lbs,
            request.cost_per_lb,
            standard_rate,
            now,
        )
        .map_err(|e| {
            warn!(error = %e, "创建批次被拒绝");
            ApiError::from(e)
        })?;

        let batch = self.batch_repo.create(draft, new_supplier.as_ref())?;

        info!(
            batch_id = %batch.batch_id,
            batch_number = %batch.batch_number,
            raw_weight_lbs = batch.raw_weight_lbs,
            cost_per_lb = batch.cost_per_lb,
            "批次已创建"
        );

        self.record_action(
            ActionType::CreateBatch,
            &batch.batch_id,
            actor,
            json!({
                "batch_number": batch.batch_number,
                "supplier_id": batch.supplier_id,
                "new_supplier": new_supplier.is_some(),
                "raw_weight_lbs": batch.raw_weight_lbs,
                "cost_per_lb": batch.cost_per_lb,
                "cost_defaulted": request.cost_per_lb.map_or(true, |c| c < 0.0),
            }),
            format!("创建批次 {}", batch.batch_number),
        );

        Ok(batch)
    }

    /// 修正批次重量/单价（仅活动状态）
    ///
    /// # 返回
    /// - Err(ApiError::InvalidTransition): 批次已终结
    /// - Err(ApiError::StaleBatchState): 期间已被其他写入修改
    #[instrument(skip(self, edit), fields(batch_id = %batch_id, actor = %actor))]
    pub fn edit_batch(
        &self,
        batch_id: &str,
        edit: BatchEdit,
        expected_revision: Option<i32>,
        actor: &str,
    ) -> ApiResult<Batch> {
        let current = self.load_for_update(batch_id, expected_revision)?;

        let next = BatchIntake::apply_edit(&current, &edit, now_micros()).map_err(|e| {
            warn!(error = %e, "修正批次被拒绝");
            ApiError::from(e)
        })?;

        let saved = self.batch_repo.update(&next)?;

        info!(
            revision = saved.revision,
            raw_weight_lbs = saved.raw_weight_lbs,
            cost_per_lb = saved.cost_per_lb,
            "批次已修正"
        );

        self.record_action(
            ActionType::EditBatch,
            batch_id,
            actor,
            json!({
                "before": {
                    "raw_weight_lbs": current.raw_weight_lbs,
                    "cost_per_lb": current.cost_per_lb,
                },
                "after": {
                    "raw_weight_lbs": saved.raw_weight_lbs,
                    "cost_per_lb": saved.cost_per_lb,
                },
                "revision": saved.revision,
            }),
            format!("修正批次 {}", saved.batch_number),
        );

        Ok(saved)
    }

    /// 登记损耗
    ///
    /// # 返回
    /// - Err(ApiError::MissingReason): 原因为空
    /// - Err(ApiError::InvalidDamageWeight): 部分损耗重量不在 (0, 当前重量]
    /// - Err(ApiError::InvalidTransition): 批次已终结
    #[instrument(skip(self, request), fields(batch_id = %batch_id, actor = %actor, damage_type = %request.damage_type))]
    pub fn record_damage(
        &self,
        batch_id: &str,
        request: DamageRequest,
        expected_revision: Option<i32>,
        actor: &str,
    ) -> ApiResult<Batch> {
        let current = self.load_for_update(batch_id, expected_revision)?;

        let next = DamageProcessor::apply(&current, &request, now_micros()).map_err(|e| {
            warn!(error = %e, "登记损耗被拒绝");
            ApiError::from(e)
        })?;

        let saved = self.batch_repo.update(&next)?;

        info!(
            status = %saved.status,
            raw_weight_lbs = saved.raw_weight_lbs,
            damaged_weight_lbs = saved.damaged_weight_lbs,
            "损耗已登记"
        );

        self.record_action(
            ActionType::RecordDamage,
            batch_id,
            actor,
            json!({
                "damage_type": request.damage_type,
                "weight_lbs": request.weight_lbs,
                "reason": saved.damage_reason,
                "status_before": current.status,
                "status_after": saved.status,
                "raw_weight_lbs_before": current.raw_weight_lbs,
                "raw_weight_lbs_after": saved.raw_weight_lbs,
            }),
            request.reason.trim().to_string(),
        );

        Ok(saved)
    }

    /// 转化为成品
    ///
    /// # 返回
    /// - Err(ApiError::CapacityExceeded): 袋数超过 floor(重量 × 0.6)，附带上限
    /// - Err(ApiError::InvalidTransition): 批次已终结
    #[instrument(skip(self, request), fields(batch_id = %batch_id, actor = %actor, bag_count = request.bag_count))]
    pub fn convert_batch(
        &self,
        batch_id: &str,
        request: ConvertBatchRequest,
        expected_revision: Option<i32>,
        actor: &str,
    ) -> ApiResult<Batch> {
        let current = self.load_for_update(batch_id, expected_revision)?;

        let next = YieldCalculator::convert(&current, request.bag_count, &request.product_ref, now_micros())
            .map_err(|e| {
                warn!(error = %e, "转化被拒绝");
                ApiError::from_engine(e, batch_id)
            })?;

        let saved = self.batch_repo.update(&next)?;

        info!(
            yield_pct = ?saved.yield_pct,
            finished_bags = ?saved.finished_bags,
            "批次已转化"
        );

        self.record_action(
            ActionType::ConvertBatch,
            batch_id,
            actor,
            json!({
                "bag_count": request.bag_count,
                "product_ref": saved.product_ref,
                "raw_weight_lbs": saved.raw_weight_lbs,
                "yield_pct": saved.yield_pct,
            }),
            format!("转化批次 {}", saved.batch_number),
        );

        Ok(saved)
    }

    /// 删除批次（任意状态均可删除）
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 批次不存在
    #[instrument(skip(self), fields(batch_id = %batch_id, actor = %actor))]
    pub fn delete_batch(&self, batch_id: &str, expected_revision: Option<i32>, actor: &str) -> ApiResult<()> {
        let existing = self.load_for_update(batch_id, expected_revision)?;

        self.batch_repo.delete(batch_id, Some(existing.revision))?;

        info!(batch_number = %existing.batch_number, "批次已删除");

        self.record_action(
            ActionType::DeleteBatch,
            batch_id,
            actor,
            json!({
                "batch_number": existing.batch_number,
                "status": existing.status,
                "raw_weight_lbs": existing.raw_weight_lbs,
                "cost_per_lb": existing.cost_per_lb,
            }),
            format!("删除批次 {}", existing.batch_number),
        );

        Ok(())
    }

    // ==========================================
    // 查询接口
    // ==========================================

    /// 按ID查询批次
    pub fn get_batch(&self, batch_id: &str) -> ApiResult<Batch> {
        self.batch_repo
            .find_by_id(batch_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Batch(id={})不存在", batch_id)))
    }

    /// 按条件查询批次（最新在前）
    pub fn list_batches(&self, filter: &BatchFilter) -> ApiResult<Vec<Batch>> {
        let batches = self.batch_repo.list(filter)?;
        debug!(count = batches.len(), "批次查询完成");
        Ok(batches)
    }

    /// 查询所有供应商
    pub fn list_suppliers(&self) -> ApiResult<Vec<Supplier>> {
        Ok(self.supplier_repo.list_all()?)
    }

    /// 查询批次操作历史（最新在前）
    pub fn list_batch_actions(&self, batch_id: &str) -> ApiResult<Vec<ActionLog>> {
        Ok(self.action_log_repo.find_by_batch_id(batch_id)?)
    }

    // ==========================================
    // 内部辅助
    // ==========================================

    /// 读取待修改批次，并在任何规则校验前比对调用方持有的 revision
    fn load_for_update(&self, batch_id: &str, expected_revision: Option<i32>) -> ApiResult<Batch> {
        let batch = self.get_batch(batch_id)?;

        if let Some(expected) = expected_revision {
            if expected != batch.revision {
                warn!(
                    batch_id = %batch_id,
                    expected_revision = expected,
                    actual_revision = batch.revision,
                    "批次状态已过期"
                );
                return Err(ApiError::StaleBatchState {
                    batch_id: batch_id.to_string(),
                    expected_revision: expected,
                    actual_revision: batch.revision,
                });
            }
        }

        Ok(batch)
    }

    /// 记录ActionLog，失败时只记录警告（业务变更已提交）
    fn record_action(
        &self,
        action_type: ActionType,
        batch_id: &str,
        actor: &str,
        payload: serde_json::Value,
        detail: String,
    ) {
        let action_log = ActionLog {
            action_id: uuid::Uuid::new_v4().to_string(),
            batch_id: Some(batch_id.to_string()),
            action_type: action_type.to_db_str().to_string(),
            action_ts: now_micros().naive_utc(),
            actor: actor.to_string(),
            payload_json: Some(payload),
            detail: Some(detail),
        };

        if let Err(e) = self.action_log_repo.insert(&action_log) {
            warn!(error = %e, action_type = action_type.to_db_str(), "记录操作日志失败");
        }
    }
}
