// ==========================================
// 生产批次核算系统 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::db::open_sqlite_connection;
use crate::engine::conversion::{
    YieldThresholds, DEFAULT_GOOD_THRESHOLD_PCT, DEFAULT_WARNING_THRESHOLD_PCT,
};
use rusqlite::{params, Connection};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::error::Error;
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::warn;

/// 标准单价（未提供或为负时使用）
pub const DEFAULT_COST_PER_LB: f64 = 8.50;

// ==========================================
// ProductionConfig - 生产核算配置
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ProductionConfig {
    pub default_cost_per_lb: f64,
    pub yield_thresholds: YieldThresholds,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            default_cost_per_lb: DEFAULT_COST_PER_LB,
            yield_thresholds: YieldThresholds::default(),
        }
    }
}

// ==========================================
// ConfigManager - 配置管理器
// ==========================================
pub struct ConfigManager {
    conn: Arc<Mutex<Connection>>,
}

impl ConfigManager {
    /// 创建新的 ConfigManager 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> Result<Self, Box<dyn Error>> {
        let conn = open_sqlite_connection(db_path)?;

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Result<Self, Box<dyn Error>> {
        {
            let conn_guard = conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;
            crate::db::configure_sqlite_connection(&conn_guard)?;
        }

        Ok(Self { conn })
    }

    /// 从 config_kv 表读取配置值（scope_id='global'）
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> Result<Option<String>, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let result = conn.query_row(
            "SELECT value FROM config_kv WHERE scope_id = 'global' AND key = ?1",
            params![key],
            |row| row.get::<_, String>(0),
        );

        match result {
            Ok(value) => Ok(Some(value)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Box::new(e)),
        }
    }

    /// 写入 global scope 的配置值（存在则覆盖）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> Result<(), Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        conn.execute(
            "INSERT INTO config_kv (scope_id, key, value, updated_at) VALUES ('global', ?1, ?2, datetime('now'))
             ON CONFLICT(scope_id, key) DO UPDATE SET value = ?2, updated_at = datetime('now')",
            params![key, value],
        )?;

        Ok(())
    }

    /// 读取并解析配置值；缺失或无法解析时使用默认值
    fn get_parsed_or_default<T>(&self, key: &str, default: T) -> Result<T, Box<dyn Error>>
    where
        T: FromStr + Copy,
    {
        match self.get_global_config_value(key)? {
            Some(raw) => match raw.trim().parse::<T>() {
                Ok(v) => Ok(v),
                Err(_) => {
                    warn!(key = key, value = %raw, "配置值无法解析，使用默认值");
                    Ok(default)
                }
            },
            None => Ok(default),
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 返回
    /// - Ok(String): 配置快照的JSON字符串（按 key 排序）
    pub fn get_config_snapshot(&self) -> Result<String, Box<dyn Error>> {
        let conn = self.conn.lock().map_err(|e| format!("锁获取失败: {}", e))?;

        let mut stmt = conn.prepare(
            "SELECT key, value FROM config_kv WHERE scope_id = 'global' ORDER BY key"
        )?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map([], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
            ))
        })?;

        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        let json_value = json!(config_map);
        Ok(serde_json::to_string(&json_value)?)
    }

    // ===== 生产核算配置 =====

    /// 标准单价
    pub fn get_default_cost_per_lb(&self) -> Result<f64, Box<dyn Error>> {
        let v = self.get_parsed_or_default(config_keys::DEFAULT_COST_PER_LB, DEFAULT_COST_PER_LB)?;
        if v.is_finite() && v >= 0.0 {
            Ok(v)
        } else {
            warn!(value = v, "标准单价配置非法，使用默认值");
            Ok(DEFAULT_COST_PER_LB)
        }
    }

    /// 出成率风险阈值
    ///
    /// warning 高于 good 时视为配置错误，回退到默认阈值
    pub fn get_yield_thresholds(&self) -> Result<YieldThresholds, Box<dyn Error>> {
        let good_pct = self.get_parsed_or_default(
            config_keys::YIELD_GOOD_THRESHOLD_PCT,
            DEFAULT_GOOD_THRESHOLD_PCT,
        )?;
        let warning_pct = self.get_parsed_or_default(
            config_keys::YIELD_WARNING_THRESHOLD_PCT,
            DEFAULT_WARNING_THRESHOLD_PCT,
        )?;

        if warning_pct > good_pct {
            warn!(good_pct, warning_pct, "出成率阈值配置颠倒，使用默认阈值");
            return Ok(YieldThresholds::default());
        }

        Ok(YieldThresholds {
            good_pct,
            warning_pct,
        })
    }

    /// 一次性加载生产核算配置
    pub fn load_production_config(&self) -> Result<ProductionConfig, Box<dyn Error>> {
        Ok(ProductionConfig {
            default_cost_per_lb: self.get_default_cost_per_lb()?,
            yield_thresholds: self.get_yield_thresholds()?,
        })
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 成本
    pub const DEFAULT_COST_PER_LB: &str = "default_cost_per_lb";

    // 出成率风险分级
    pub const YIELD_GOOD_THRESHOLD_PCT: &str = "yield_good_threshold_pct";
    pub const YIELD_WARNING_THRESHOLD_PCT: &str = "yield_warning_threshold_pct";
}
