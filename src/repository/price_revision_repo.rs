// ==========================================
// 建材价格解析引擎 - 价格修订仓储
// ==========================================
// 职责: 管理 price_revision 表（只追加 + 关闭过期日）
// 红线: revision_number 在写事务内分配，保证按材料单调递增
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::price_revision::{NewPriceRevision, PriceRevision};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::PriceRevisionStore;
use crate::repository::row_utils::tier_prices_column;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, material_id, revision_number, revision_type, tier_prices,
           vendor_cost, freight, base_margin, commodity_factor,
           effective_from, expires_at, created_at
    FROM price_revision
"#;

// ==========================================
// PriceRevisionRepository - 价格修订仓储
// ==========================================
pub struct PriceRevisionRepository {
    conn: Arc<Mutex<Connection>>,
}

impl PriceRevisionRepository {
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

    fn map_row(row: &Row<'_>) -> SqliteResult<PriceRevision> {
        Ok(PriceRevision {
            id: row.get(0)?,
            material_id: row.get(1)?,
            revision_number: row.get(2)?,
            revision_type: row.get(3)?,
            tier_prices: tier_prices_column(row, 4)?,
            vendor_cost: row.get(5)?,
            freight: row.get(6)?,
            base_margin: row.get(7)?,
            commodity_factor: row.get(8)?,
            effective_from: row.get(9)?,
            expires_at: row.get(10)?,
            created_at: row.get(11)?,
        })
    }
}

impl PriceRevisionStore for PriceRevisionRepository {
    fn find_effective(
        &self,
        material_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<PriceRevision>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE material_id = ?1
              AND effective_from <= ?2
              AND (expires_at IS NULL OR expires_at >= ?2)
            ORDER BY effective_from DESC, revision_number DESC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![material_id, as_of], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn list_for_material(&self, material_id: &str) -> RepositoryResult<Vec<PriceRevision>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE material_id = ?1
            ORDER BY revision_number ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![material_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn append_revision(
        &self,
        revision: &NewPriceRevision,
        close_open_prior: bool,
    ) -> RepositoryResult<PriceRevision> {
        let tier_prices_json = revision.tier_prices.to_json()?;

        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1) 分配修订号
        let max_revision: Option<i32> = tx.query_row(
            "SELECT MAX(revision_number) FROM price_revision WHERE material_id = ?1",
            params![revision.material_id],
            |row| row.get(0),
        )?;
        let revision_number = max_revision.unwrap_or(0) + 1;

        // 2) 截断与新修订重叠的既有修订；新修订截止于下一条更晚修订的生效日
        let mut expires_at = revision.expires_at;
        if close_open_prior {
            tx.execute(
                r#"
                UPDATE price_revision
                SET expires_at = ?2
                WHERE material_id = ?1
                  AND effective_from <= ?2
                  AND (expires_at IS NULL OR expires_at > ?2)
                "#,
                params![revision.material_id, revision.effective_from],
            )?;

            let next_start: Option<NaiveDate> = tx.query_row(
                r#"
                SELECT MIN(effective_from) FROM price_revision
                WHERE material_id = ?1 AND effective_from > ?2
                "#,
                params![revision.material_id, revision.effective_from],
                |row| row.get(0),
            )?;
            if let Some(next_start) = next_start {
                expires_at = Some(expires_at.map_or(next_start, |end| end.min(next_start)));
            }
        }

        // 3) 插入新修订
        let created_at = Utc::now();
        tx.execute(
            r#"
            INSERT INTO price_revision (
                material_id, revision_number, revision_type, tier_prices,
                vendor_cost, freight, base_margin, commodity_factor,
                effective_from, expires_at, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)
            "#,
            params![
                revision.material_id,
                revision_number,
                revision.revision_type,
                tier_prices_json,
                revision.vendor_cost,
                revision.freight,
                revision.base_margin,
                revision.commodity_factor,
                revision.effective_from,
                expires_at,
                created_at,
            ],
        )?;
        let id = tx.last_insert_rowid();

        tx.commit()?;

        Ok(PriceRevision {
            id,
            material_id: revision.material_id.clone(),
            revision_number,
            revision_type: revision.revision_type.clone(),
            tier_prices: revision.tier_prices.clone(),
            vendor_cost: revision.vendor_cost,
            freight: revision.freight,
            base_margin: revision.base_margin,
            commodity_factor: revision.commodity_factor,
            effective_from: revision.effective_from,
            expires_at,
            created_at,
        })
    }
}
