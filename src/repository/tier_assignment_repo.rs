// ==========================================
// 建材价格解析引擎 - 等级分配仓储
// ==========================================
// 职责: 管理 tier_assignment 表（只追加 + 关闭，不原地修改等级）
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::tier_assignment::{TierAssignment, TierSetting};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::TierAssignmentStore;
use crate::repository::row_utils::tier_column;
use chrono::{NaiveDate, Utc};
use rusqlite::{params, Connection, Result as SqliteResult, Row};
use std::sync::{Arc, Mutex};

const SELECT_COLUMNS: &str = r#"
    SELECT id, customer_id, category_code, tier, effective_from, effective_until, created_at
    FROM tier_assignment
"#;

// ==========================================
// TierAssignmentRepository - 等级分配仓储
// ==========================================
pub struct TierAssignmentRepository {
    conn: Arc<Mutex<Connection>>,
}

impl TierAssignmentRepository {
    /// 创建新的 TierAssignmentRepository 实例
    ///
    /// # 参数
    /// - db_path: 数据库文件路径
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建仓储实例
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self { conn }
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    fn map_row(row: &Row<'_>) -> SqliteResult<TierAssignment> {
        Ok(TierAssignment {
            id: row.get(0)?,
            customer_id: row.get(1)?,
            category_code: row.get(2)?,
            tier: tier_column(row, 3)?,
            effective_from: row.get(4)?,
            effective_until: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

impl TierAssignmentStore for TierAssignmentRepository {
    fn find_effective(
        &self,
        customer_id: &str,
        category_code: i32,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE customer_id = ?1
              AND category_code = ?2
              AND effective_from <= ?3
              AND (effective_until IS NULL OR effective_until >= ?3)
            ORDER BY effective_from DESC, id DESC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![customer_id, category_code, as_of], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn find_effective_for_customer(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE customer_id = ?1
              AND effective_from <= ?2
              AND (effective_until IS NULL OR effective_until >= ?2)
            ORDER BY category_code ASC, effective_from DESC, id DESC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![customer_id, as_of], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn list_for_customer(&self, customer_id: &str) -> RepositoryResult<Vec<TierAssignment>> {
        let conn = self.get_conn()?;
        let sql = format!(
            r#"{}
            WHERE customer_id = ?1
            ORDER BY category_code ASC, effective_from ASC, id ASC
            "#,
            SELECT_COLUMNS
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt
            .query_map(params![customer_id], Self::map_row)?
            .collect::<SqliteResult<Vec<_>>>()?;
        Ok(rows)
    }

    fn replace_customer_tiers(
        &self,
        customer_id: &str,
        settings: &[TierSetting],
        effective_from: NaiveDate,
    ) -> RepositoryResult<(usize, usize)> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;

        // 1) 关闭全部未关闭分配
        let closed = tx.execute(
            r#"
            UPDATE tier_assignment
            SET effective_until = ?2
            WHERE customer_id = ?1 AND effective_until IS NULL
            "#,
            params![customer_id, effective_from],
        )?;

        // 2) 插入新分配（无限期）
        let now = Utc::now();
        let mut inserted = 0;
        for setting in settings {
            tx.execute(
                r#"
                INSERT INTO tier_assignment (
                    customer_id, category_code, tier, effective_from, effective_until, created_at
                ) VALUES (?1, ?2, ?3, ?4, NULL, ?5)
                "#,
                params![
                    customer_id,
                    setting.category_code,
                    setting.tier.label(),
                    effective_from,
                    now,
                ],
            )?;
            inserted += 1;
        }

        // 任一步出错时 tx 在 drop 时回滚
        tx.commit()?;
        Ok((closed, inserted))
    }
}
