// ==========================================
// 建材价格解析引擎 - 客户覆盖价仓储
// ==========================================
// 职责: 管理 customer_override 表（唯一键 customer_id + material_id）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::CustomerOverride;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::CustomerOverrideStore;
use chrono::Utc;
use rusqlite::{params, Connection, OptionalExtension, Result as SqliteResult};
use std::sync::{Arc, Mutex};

pub struct CustomerOverrideRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CustomerOverrideRepository {
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 客户全部覆盖价（含已清除的行）
    pub fn list_for_customer(&self, customer_id: &str) -> RepositoryResult<Vec<CustomerOverride>> {
        let conn = self.get_conn()?;
        let mut stmt = conn.prepare(
            r#"
            SELECT customer_id, material_id, override_price, updated_at
            FROM customer_override
            WHERE customer_id = ?1
            ORDER BY material_id ASC
            "#,
        )?;
        let rows = stmt
            .query_map(params![customer_id], |row| {
                Ok(CustomerOverride {
                    customer_id: row.get(0)?,
                    material_id: row.get(1)?,
                    override_price: row.get(2)?,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }
}

impl CustomerOverrideStore for CustomerOverrideRepository {
    fn find_price(&self, customer_id: &str, material_id: &str) -> RepositoryResult<Option<f64>> {
        let conn = self.get_conn()?;
        let price: Option<Option<f64>> = conn
            .query_row(
                r#"
                SELECT override_price
                FROM customer_override
                WHERE customer_id = ?1 AND material_id = ?2
                "#,
                params![customer_id, material_id],
                |row| row.get(0),
            )
            .optional()?;
        Ok(price.flatten())
    }

    fn set_override(&self, customer_id: &str, material_id: &str, price: f64) -> RepositoryResult<()> {
        if !price.is_finite() || price < 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: "override_price".to_string(),
                message: format!("覆盖价非法: {}", price),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO customer_override (customer_id, material_id, override_price, updated_at)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(customer_id, material_id) DO UPDATE SET
                override_price = excluded.override_price,
                updated_at = excluded.updated_at
            "#,
            params![customer_id, material_id, price, Utc::now()],
        )?;
        Ok(())
    }

    fn clear_override(&self, customer_id: &str, material_id: &str) -> RepositoryResult<bool> {
        let conn = self.get_conn()?;
        let affected = conn.execute(
            r#"
            UPDATE customer_override
            SET override_price = NULL, updated_at = ?3
            WHERE customer_id = ?1 AND material_id = ?2
            "#,
            params![customer_id, material_id, Utc::now()],
        )?;
        Ok(affected > 0)
    }
}
