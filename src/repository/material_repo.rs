// ==========================================
// 建材价格解析引擎 - 材料主数据仓储
// ==========================================
// 职责: 管理 material 表的读取与 upsert
// 红线: Repository 不含业务逻辑
// ==========================================

use crate::db::open_sqlite_connection;
use crate::domain::material::Material;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::MaterialStore;
use rusqlite::{params, Connection, OptionalExtension};
use std::sync::{Arc, Mutex};

// ==========================================
// MaterialRepository - 材料主数据仓储
// ==========================================
/// 材料主数据仓储
/// 职责: 管理 material 表
pub struct MaterialRepository {
    conn: Arc<Mutex<Connection>>,
}

impl MaterialRepository {
    /// 创建新的 MaterialRepository 实例
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

    /// 批量 upsert（事务化）
    ///
    /// # 返回
    /// - Ok(usize): 写入条数
    /// - Err: 数据库错误（整个事务回滚）
    pub fn batch_upsert(&self, materials: &[Material]) -> RepositoryResult<usize> {
        let conn = self.get_conn()?;
        let tx = conn.unchecked_transaction()?;
        let mut count = 0;
        for material in materials {
            Self::upsert_with(&tx, material)?;
            count += 1;
        }
        tx.commit()?;
        Ok(count)
    }

    fn upsert_with(conn: &Connection, material: &Material) -> RepositoryResult<()> {
        conn.execute(
            r#"
            INSERT INTO material (
                material_id, sku, description, category_code, vendor_cost,
                is_commodity_linked, commodity_tag, commodity_base_price,
                created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
            ON CONFLICT(material_id) DO UPDATE SET
                sku = excluded.sku,
                description = excluded.description,
                category_code = excluded.category_code,
                vendor_cost = excluded.vendor_cost,
                is_commodity_linked = excluded.is_commodity_linked,
                commodity_tag = excluded.commodity_tag,
                commodity_base_price = excluded.commodity_base_price,
                updated_at = excluded.updated_at
            "#,
            params![
                material.material_id,
                material.sku,
                material.description,
                material.category_code,
                material.vendor_cost,
                material.is_commodity_linked,
                material.commodity_tag,
                material.commodity_base_price,
                material.created_at,
                material.updated_at,
            ],
        )?;
        Ok(())
    }
}

impl MaterialStore for MaterialRepository {
    /// 按 material_id 查询材料主数据
    ///
    /// # 返回
    /// - Ok(Some(Material)): 找到记录
    /// - Ok(None): 未找到记录
    /// - Err: 数据库错误
    fn find_by_id(&self, material_id: &str) -> RepositoryResult<Option<Material>> {
        let conn = self.get_conn()?;
        let material = conn
            .query_row(
                r#"
                SELECT
                    material_id, sku, description, category_code, vendor_cost,
                    is_commodity_linked, commodity_tag, commodity_base_price,
                    created_at, updated_at
                FROM material
                WHERE material_id = ?1
                "#,
                params![material_id],
                |row| {
                    Ok(Material {
                        material_id: row.get(0)?,
                        sku: row.get(1)?,
                        description: row.get(2)?,
                        category_code: row.get(3)?,
                        vendor_cost: row.get(4)?,
                        is_commodity_linked: row.get(5)?,
                        commodity_tag: row.get(6)?,
                        commodity_base_price: row.get(7)?,
                        created_at: row.get(8)?,
                        updated_at: row.get(9)?,
                    })
                },
            )
            .optional()?;
        Ok(material)
    }

    fn upsert(&self, material: &Material) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        Self::upsert_with(&conn, material)
    }
}
