// ==========================================
// 生产批次核算系统 - 供应商领域模型
// ==========================================
// 说明: 供应商是外部协作实体，批次只持有引用
// ==========================================

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Supplier - 供应商
// ==========================================
// 对齐: supplier 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Supplier {
    pub supplier_id: String,
    pub name: String,            // 不含数字
    pub phone: Option<String>,   // 不含字母
    pub email: Option<String>,   // 邮箱格式
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
}

// ==========================================
// NewSupplier - 创建批次时内联录入的供应商字段
// ==========================================
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewSupplier {
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub address: Option<String>,
}

// ==========================================
// SupplierSelection - 创建批次时的供应商来源
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SupplierSelection {
    Existing { supplier_id: String },
    New(NewSupplier),
}
