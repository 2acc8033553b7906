// ==========================================
// 生产批次核算系统 - 供应商数据仓储
// ==========================================
// 对齐: supplier 表
// ==========================================

use crate::domain::supplier::Supplier;
use crate::repository::batch_repo::{format_ts, parse_ts};
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, Row};
use std::sync::{Arc, Mutex};

/// 在给定连接（或事务）上插入供应商
///
/// 供 BatchRepository::create 在批次事务内复用
pub(crate) fn insert_supplier(conn: &Connection, supplier: &Supplier) -> RepositoryResult<()> {
    conn.execute(
        r#"INSERT INTO supplier (supplier_id, name, phone, email, address, created_at)
           VALUES (?, ?, ?, ?, ?, ?)"#,
        params![
            &supplier.supplier_id,
            &supplier.name,
            &supplier.phone,
            &supplier.email,
            &supplier.address,
            format_ts(&supplier.created_at),
        ],
    )?;
    Ok(())
}

// ==========================================
// SupplierRepository - 供应商仓储
// ==========================================
pub struct SupplierRepository {
    conn: Arc<Mutex<Connection>>,
}

impl SupplierRepository {
    pub fn new(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 插入供应商
    pub fn insert(&self, supplier: &Supplier) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        insert_supplier(&conn, supplier)?;
        Ok(supplier.supplier_id.clone())
    }

    /// 按 supplier_id 查询
    pub fn find_by_id(&self, supplier_id: &str) -> RepositoryResult<Option<Supplier>> {
        let conn = self.get_conn()?;

        match conn.query_row(
            r#"SELECT supplier_id, name, phone, email, address, created_at
               FROM supplier WHERE supplier_id = ?"#,
            params![supplier_id],
            |row| self.map_row(row),
        ) {
            Ok(s) => Ok(Some(s)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// 查询全部供应商（按名称排序）
    pub fn list_all(&self) -> RepositoryResult<Vec<Supplier>> {
        let conn = self.get_conn()?;

        let mut stmt = conn.prepare(
            r#"SELECT supplier_id, name, phone, email, address, created_at
               FROM supplier ORDER BY name ASC"#,
        )?;
        let suppliers = stmt
            .query_map([], |row| self.map_row(row))?
            .collect::<Result<Vec<Supplier>, _>>()?;

        Ok(suppliers)
    }

    fn map_row(&self, row: &Row) -> rusqlite::Result<Supplier> {
        Ok(Supplier {
            supplier_id: row.get(0)?,
            name: row.get(1)?,
            phone: row.get(2)?,
            email: row.get(3)?,
            address: row.get(4)?,
            created_at: parse_ts(5, &row.get::<_, String>(5)?)?,
        })
    }
}
