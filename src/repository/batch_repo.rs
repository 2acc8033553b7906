// ==========================================
// 生产批次核算系统 - 批次数据仓储
// ==========================================
// 对齐: batch 表
// 并发: revision 乐观锁（UPDATE ... WHERE revision = ?）
// 红线: Repository 不做业务逻辑，只做数据映射
// ==========================================

use crate::domain::batch::{Batch, BatchFilter, NewBatch};
use crate::domain::supplier::Supplier;
use crate::domain::types::BatchStatus;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::supplier_repo::insert_supplier;
use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, Row, Transaction};
use std::str::FromStr;
use std::sync::{Arc, Mutex};
use tracing::debug;

const BATCH_COLUMNS: &str = r#"batch_id, batch_number, supplier_id, raw_weight_lbs, cost_per_lb,
       status, yield_pct, finished_bags, product_ref,
       damaged_weight_lbs, damage_reason, revision, created_at, updated_at"#;

/// 批次号格式: B-00001
pub fn format_batch_number(seq: i64) -> String {
    format!("B-{:05}", seq)
}

/// 推进批次号序列，返回本次分配的序号
///
/// 序列值取 max(last_value, MAX(batch_seq)) + 1，兼容序列表创建前已有的批次
fn next_batch_seq(tx: &Transaction<'_>) -> RepositoryResult<i64> {
    tx.execute(
        "INSERT OR IGNORE INTO batch_number_seq (name, last_value) VALUES ('batch', 0)",
        [],
    )?;
    tx.execute(
        r#"UPDATE batch_number_seq
           SET last_value = MAX(last_value, COALESCE((SELECT MAX(batch_seq) FROM batch), 0)) + 1
           WHERE name = 'batch'"#,
        [],
    )?;
    let seq = tx.query_row(
        "SELECT last_value FROM batch_number_seq WHERE name = 'batch'",
        [],
        |row| row.get(0),
    )?;
    Ok(seq)
}

/// 时间戳统一存储格式（RFC3339，微秒，Z 结尾，可按字符串排序）
pub(crate) fn format_ts(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Micros, true)
}

pub(crate) fn parse_ts(idx: usize, s: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e)))
}

// ==========================================
// BatchRepository - 批次仓储
// ==========================================
pub struct BatchRepository {
    conn: Arc<Mutex<Connection>>,
}

impl BatchRepository {
    /// 创建新的 BatchRepository 实例
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    /// 获取数据库连接
    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    // ==========================================
    // 写入操作
    // ==========================================

    /// 创建批次（自动分配批次号）
    ///
    /// # 参数
    /// - `new_batch`: 已通过引擎校验的新批次
    /// - `new_supplier`: 内联录入的供应商；存在时与批次在同一事务内写入
    ///
    /// # 说明
    /// - 在同一事务内推进批次号序列并写入，保证批次号分配原子性
    /// - 序列只增不减，删除批次后其批次号不会被复用
    /// - 任一写入失败则整体回滚，不会留下孤立的供应商记录
    pub fn create(&self, new_batch: NewBatch, new_supplier: Option<&Supplier>) -> RepositoryResult<Batch> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        if let Some(supplier) = new_supplier {
            insert_supplier(&tx, supplier)?;
        }

        let seq = next_batch_seq(&tx)?;
        let batch = new_batch.into_batch(format_batch_number(seq));

        tx.execute(
            r#"INSERT INTO batch (
                batch_id, batch_seq, batch_number, supplier_id, raw_weight_lbs, cost_per_lb,
                status, yield_pct, finished_bags, product_ref,
                damaged_weight_lbs, damage_reason, revision, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)"#,
            params![
                &batch.batch_id,
                seq,
                &batch.batch_number,
                &batch.supplier_id,
                batch.raw_weight_lbs,
                batch.cost_per_lb,
                batch.status.to_db_str(),
                batch.yield_pct,
                batch.finished_bags,
                &batch.product_ref,
                batch.damaged_weight_lbs,
                &batch.damage_reason,
                batch.revision,
                format_ts(&batch.created_at),
                format_ts(&batch.updated_at),
            ],
        )?;

        tx.commit()?;
        debug!(batch_id = %batch.batch_id, batch_number = %batch.batch_number, "批次已写入");
        Ok(batch)
    }

    /// 更新批次 (带乐观锁检查)
    ///
    /// `batch.revision` 为读取时的版本号；成功后返回 revision + 1 的新批次值
    ///
    /// # 错误
    /// - `RepositoryError::OptimisticLockFailure`: revision 不匹配（期间已被其他写入修改）
    /// - `RepositoryError::NotFound`: batch_id 不存在
    pub fn update(&self, batch: &Batch) -> RepositoryResult<Batch> {
        let conn = self.get_conn()?;

        let rows_affected = conn.execute(
            r#"UPDATE batch
               SET raw_weight_lbs = ?, cost_per_lb = ?, status = ?,
                   yield_pct = ?, finished_bags = ?, product_ref = ?,
                   damaged_weight_lbs = ?, damage_reason = ?,
                   updated_at = ?, revision = revision + 1
               WHERE batch_id = ? AND revision = ?"#,
            params![
                batch.raw_weight_lbs,
                batch.cost_per_lb,
                batch.status.to_db_str(),
                batch.yield_pct,
                batch.finished_bags,
                &batch.product_ref,
                batch.damaged_weight_lbs,
                &batch.damage_reason,
                format_ts(&batch.updated_at),
                &batch.batch_id,
                batch.revision,
            ],
        )?;

        if rows_affected == 0 {
            // 判断是记录不存在还是 revision 冲突
            let actual = Self::current_revision(&conn, &batch.batch_id)?;
            return match actual {
                Some(actual) => Err(RepositoryError::OptimisticLockFailure {
                    batch_id: batch.batch_id.clone(),
                    expected: batch.revision,
                    actual,
                }),
                None => Err(RepositoryError::NotFound {
                    entity: "Batch".to_string(),
                    id: batch.batch_id.clone(),
                }),
            };
        }

        let mut saved = batch.clone();
        saved.revision = batch.revision + 1;
        Ok(saved)
    }

    /// 删除批次
    ///
    /// `expected_revision` 存在时同样做乐观锁检查
    pub fn delete(&self, batch_id: &str, expected_revision: Option<i32>) -> RepositoryResult<()> {
        let conn = self.get_conn()?;

        let rows_affected = match expected_revision {
            Some(rev) => conn.execute(
                "DELETE FROM batch WHERE batch_id = ? AND revision = ?",
                params![batch_id, rev],
            )?,
            None => conn.execute("DELETE FROM batch WHERE batch_id = ?", params![batch_id])?,
        };

        if rows_affected == 0 {
            let actual = Self::current_revision(&conn, batch_id)?;
            return match (actual, expected_revision) {
                (Some(actual), Some(expected)) => Err(RepositoryError::OptimisticLockFailure {
                    batch_id: batch_id.to_string(),
                    expected,
                    actual,
                }),
                _ => Err(RepositoryError::NotFound {
                    entity: "Batch".to_string(),
                    id: batch_id.to_string(),
                }),
            };
        }

        Ok(())
    }

    fn current_revision(conn: &Connection, batch_id: &str) -> RepositoryResult<Option<i32>> {
        match conn.query_row(
            "SELECT revision FROM batch WHERE batch_id = ?",
            params![batch_id],
            |row| row.get(0),
        ) {
            Ok(rev) => Ok(Some(rev)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    // ==========================================
    // 查询操作
    // ==========================================

    /// 按 batch_id 查询批次
    pub fn find_by_id(&self, batch_id: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM batch WHERE batch_id = ?", BATCH_COLUMNS);
        match conn.query_row(&sql, params![batch_id], |row| self.map_row(row)) {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Self::map_row_error(e)),
        }
    }

    /// 按批次号查询
    pub fn find_by_number(&self, batch_number: &str) -> RepositoryResult<Option<Batch>> {
        let conn = self.get_conn()?;

        let sql = format!("SELECT {} FROM batch WHERE batch_number = ?", BATCH_COLUMNS);
        match conn.query_row(&sql, params![batch_number], |row| self.map_row(row)) {
            Ok(batch) => Ok(Some(batch)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(Self::map_row_error(e)),
        }
    }

    /// 按条件查询批次（按创建时间倒序）
    pub fn list(&self, filter: &BatchFilter) -> RepositoryResult<Vec<Batch>> {
        let conn = self.get_conn()?;

        let mut clauses: Vec<&str> = Vec::new();
        let mut args: Vec<Value> = Vec::new();

        if let Some(status) = filter.status {
            clauses.push("status = ?");
            args.push(Value::Text(status.to_db_str().to_string()));
        }
        if let Some(supplier_id) = &filter.supplier_id {
            clauses.push("supplier_id = ?");
            args.push(Value::Text(supplier_id.clone()));
        }
        if let Some(from) = &filter.created_from {
            clauses.push("created_at >= ?");
            args.push(Value::Text(format_ts(from)));
        }
        if let Some(to) = &filter.created_to {
            clauses.push("created_at <= ?");
            args.push(Value::Text(format_ts(to)));
        }

        let mut sql = format!("SELECT {} FROM batch", BATCH_COLUMNS);
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY created_at DESC, batch_seq DESC");

        // SQLite 要求 OFFSET 前必须有 LIMIT，-1 表示不限
        if filter.limit.is_some() || filter.offset.is_some() {
            sql.push_str(" LIMIT ? OFFSET ?");
            args.push(Value::Integer(filter.limit.unwrap_or(-1)));
            args.push(Value::Integer(filter.offset.unwrap_or(0)));
        }

        let mut stmt = conn.prepare(&sql)?;
        let batches = stmt
            .query_map(params_from_iter(args), |row| self.map_row(row))?
            .collect::<Result<Vec<Batch>, _>>()
            .map_err(Self::map_row_error)?;

        Ok(batches)
    }

    /// 统计批次数量
    pub fn count(&self) -> RepositoryResult<i64> {
        let conn = self.get_conn()?;
        let n: i64 = conn.query_row("SELECT COUNT(*) FROM batch", [], |row| row.get(0))?;
        Ok(n)
    }

    // ==========================================
    // 行映射
    // ==========================================

    fn map_row(&self, row: &Row) -> rusqlite::Result<Batch> {
        let status_str: String = row.get(5)?;
        let status = BatchStatus::from_str(&status_str)
            .map_err(|e| rusqlite::Error::FromSqlConversionFailure(5, rusqlite::types::Type::Text, Box::new(e)))?;

        Ok(Batch {
            batch_id: row.get(0)?,
            batch_number: row.get(1)?,
            supplier_id: row.get(2)?,
            raw_weight_lbs: row.get(3)?,
            cost_per_lb: row.get(4)?,
            status,
            yield_pct: row.get(6)?,
            finished_bags: row.get(7)?,
            product_ref: row.get(8)?,
            damaged_weight_lbs: row.get(9)?,
            damage_reason: row.get(10)?,
            revision: row.get(11)?,
            created_at: parse_ts(12, &row.get::<_, String>(12)?)?,
            updated_at: parse_ts(13, &row.get::<_, String>(13)?)?,
        })
    }

    fn map_row_error(err: rusqlite::Error) -> RepositoryError {
        match err {
            rusqlite::Error::FromSqlConversionFailure(idx, _, e) => RepositoryError::FieldValueError {
                field: format!("batch[{}]", idx),
                message: e.to_string(),
            },
            other => other.into(),
        }
    }
}
