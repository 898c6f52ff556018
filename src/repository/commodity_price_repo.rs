// ==========================================
// 建材价格解析引擎 - 大宗商品指数价仓储
// ==========================================
// 职责: 管理 commodity_price 表（按 tag 的时间序列，只追加）
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::CommodityPrice;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::CommodityPriceStore;
use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

pub struct CommodityPriceRepository {
    conn: Arc<Mutex<Connection>>,
}

impl CommodityPriceRepository {
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
}

impl CommodityPriceStore for CommodityPriceRepository {
    fn find_latest(&self, tag: &str, as_of: NaiveDate) -> RepositoryResult<Option<CommodityPrice>> {
        let conn = self.get_conn()?;
        let price = conn
            .query_row(
                r#"
                SELECT id, tag, price, effective_from
                FROM commodity_price
                WHERE tag = ?1 AND effective_from <= ?2
                ORDER BY effective_from DESC, id DESC
                LIMIT 1
                "#,
                params![tag, as_of],
                |row| {
                    Ok(CommodityPrice {
                        id: row.get(0)?,
                        tag: row.get(1)?,
                        price: row.get(2)?,
                        effective_from: row.get(3)?,
                    })
                },
            )
            .optional()?;
        Ok(price)
    }

    fn record(&self, tag: &str, price: f64, effective_from: NaiveDate) -> RepositoryResult<CommodityPrice> {
        if !price.is_finite() || price < 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: "price".to_string(),
                message: format!("指数价非法: {}", price),
            });
        }

        let conn = self.get_conn()?;
        conn.execute(
            "INSERT INTO commodity_price (tag, price, effective_from) VALUES (?1, ?2, ?3)",
            params![tag, price, effective_from],
        )?;
        Ok(CommodityPrice {
            id: conn.last_insert_rowid(),
            tag: tag.to_string(),
            price,
            effective_from,
        })
    }
}
