// ==========================================
// 建材价格解析引擎 - 配置管理器
// ==========================================
// 职责: 配置加载、查询、覆写管理
// 存储: config_kv 表 (key-value + scope)
// ==========================================

use crate::config::pricing_config_trait::{
    PricingConfig, PricingConfigReader, DEFAULT_MAX_BATCH_ITEMS, DEFAULT_REVISION_AUTO_CLOSE,
    DEFAULT_WASTE_FACTOR_PCT,
};
use crate::db::open_sqlite_connection;
use crate::repository::error::{RepositoryError, RepositoryResult};
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::json;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

const GLOBAL_SCOPE: &str = "global";

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
    pub fn new(db_path: &str) -> RepositoryResult<Self> {
        let conn = open_sqlite_connection(db_path)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    /// 从已有连接创建 ConfigManager
    ///
    /// 说明：为保证连接行为一致，会对传入连接再次应用统一 PRAGMA（幂等）。
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> RepositoryResult<Self> {
        {
            let guard = conn
                .lock()
                .map_err(|e| RepositoryError::LockError(e.to_string()))?;
            crate::db::configure_sqlite_connection(&guard)?;
        }
        Ok(Self { conn })
    }

    fn get_conn(&self) -> RepositoryResult<std::sync::MutexGuard<Connection>> {
        self.conn
            .lock()
            .map_err(|e| RepositoryError::LockError(e.to_string()))
    }

    /// 读取 global scope 的配置值
    ///
    /// # 返回
    /// - Some(String): 配置值
    /// - None: 配置不存在
    pub fn get_global_config_value(&self, key: &str) -> RepositoryResult<Option<String>> {
        let conn = self.get_conn()?;
        let value = conn
            .query_row(
                "SELECT value FROM config_kv WHERE scope_id = ?1 AND key = ?2",
                params![GLOBAL_SCOPE, key],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(value)
    }

    /// 写入 global scope 的配置值（upsert）
    pub fn set_global_config_value(&self, key: &str, value: &str) -> RepositoryResult<()> {
        let conn = self.get_conn()?;
        conn.execute(
            r#"
            INSERT INTO config_kv (scope_id, key, value, updated_at)
            VALUES (?1, ?2, ?3, datetime('now'))
            ON CONFLICT(scope_id, key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
            params![GLOBAL_SCOPE, key, value],
        )?;
        tracing::info!(key = key, value = value, "配置已更新");
        Ok(())
    }

    /// 读取并解析配置值，缺失时返回默认值
    fn get_parsed_or_default<T: std::str::FromStr>(&self, key: &str, default: T) -> RepositoryResult<T>
    where
        T::Err: std::fmt::Display,
    {
        match self.get_global_config_value(key)? {
            Some(raw) => raw.trim().parse::<T>().map_err(|e| RepositoryError::FieldValueError {
                field: key.to_string(),
                message: format!("配置值无法解析 ({}): {}", raw, e),
            }),
            None => Ok(default),
        }
    }

    /// 获取所有配置的快照（JSON格式）
    ///
    /// # 用途
    /// - 排查计价差异时记录当时的配置
    pub fn get_config_snapshot(&self) -> RepositoryResult<String> {
        let conn = self.get_conn()?;
        let mut stmt =
            conn.prepare("SELECT key, value FROM config_kv WHERE scope_id = ?1 ORDER BY key")?;

        let mut config_map: BTreeMap<String, String> = BTreeMap::new();
        let rows = stmt.query_map(params![GLOBAL_SCOPE], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;
        for row in rows {
            let (key, value) = row?;
            config_map.insert(key, value);
        }

        Ok(serde_json::to_string(&json!(config_map))?)
    }

    /// 一次性读取全部计价配置
    pub fn load_pricing_config(&self) -> RepositoryResult<PricingConfig> {
        Ok(PricingConfig {
            revision_auto_close: self.get_revision_auto_close()?,
            default_waste_factor_pct: self.get_default_waste_factor_pct()?,
            max_batch_items: self.get_max_batch_items()?,
        })
    }
}

impl PricingConfigReader for ConfigManager {
    fn get_revision_auto_close(&self) -> RepositoryResult<bool> {
        self.get_parsed_or_default(config_keys::REVISION_AUTO_CLOSE, DEFAULT_REVISION_AUTO_CLOSE)
    }

    fn get_default_waste_factor_pct(&self) -> RepositoryResult<f64> {
        let pct = self.get_parsed_or_default(
            config_keys::DEFAULT_WASTE_FACTOR_PCT,
            DEFAULT_WASTE_FACTOR_PCT,
        )?;
        if !pct.is_finite() || pct < 0.0 {
            return Err(RepositoryError::FieldValueError {
                field: config_keys::DEFAULT_WASTE_FACTOR_PCT.to_string(),
                message: format!("损耗率必须为非负数: {}", pct),
            });
        }
        Ok(pct)
    }

    fn get_max_batch_items(&self) -> RepositoryResult<usize> {
        self.get_parsed_or_default(config_keys::MAX_BATCH_ITEMS, DEFAULT_MAX_BATCH_ITEMS)
    }
}

// ==========================================
// 配置键常量
// ==========================================
pub mod config_keys {
    // 修订
    pub const REVISION_AUTO_CLOSE: &str = "pricing/revision_auto_close";

    // 合计
    pub const DEFAULT_WASTE_FACTOR_PCT: &str = "pricing/default_waste_factor_pct";

    // 批量
    pub const MAX_BATCH_ITEMS: &str = "pricing/max_batch_items";
}
