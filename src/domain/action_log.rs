// ==========================================
// 生产批次核算系统 - 操作日志领域模型
// ==========================================
// 红线: 所有已提交的批次写入都必须记录
// ==========================================

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

// ==========================================
// ActionLog - 操作日志
// ==========================================
// 用途: 审计追踪
// 对齐: action_log 表
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionLog {
    pub action_id: String,          // 日志ID
    pub batch_id: Option<String>,   // 关联批次（批次删除后仍保留日志）
    pub action_type: String,        // 操作类型（ActionType::to_db_str）
    pub action_ts: NaiveDateTime,   // 操作时间戳
    pub actor: String,              // 操作人

    pub payload_json: Option<JsonValue>, // 操作参数与结果 (JSON)
    pub detail: Option<String>,          // 详细描述
}

// ==========================================
// ActionType - 操作类型
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionType {
    CreateBatch,
    EditBatch,
    RecordDamage,
    ConvertBatch,
    DeleteBatch,
}

impl ActionType {
    pub fn to_db_str(&self) -> &'static str {
        match self {
            ActionType::CreateBatch => "CREATE_BATCH",
            ActionType::EditBatch => "EDIT_BATCH",
            ActionType::RecordDamage => "RECORD_DAMAGE",
            ActionType::ConvertBatch => "CONVERT_BATCH",
            ActionType::DeleteBatch => "DELETE_BATCH",
        }
    }
}
