// ==========================================
// 建材价格解析引擎 - 应用状态
// ==========================================
// 职责: 打开数据库、建表、组装仓储/引擎/API，供宿主进程持有
// ==========================================

use std::sync::{Arc, Mutex};

use crate::api::PricingApi;
use crate::config::config_manager::ConfigManager;
use crate::config::pricing_config_trait::PricingConfigReader;
use crate::db::{ensure_schema, open_sqlite_connection};
use crate::engine::{PricingOrchestrator, PricingRepositories};

/// 应用状态
///
/// 所有仓储共享同一个 SQLite 连接
pub struct AppState {
    /// 数据库路径
    pub db_path: String,

    /// 计价API
    pub pricing_api: Arc<PricingApi>,

    /// 计价编排器（宿主需要直接取 PriceOutcome 时使用）
    pub orchestrator: Arc<PricingOrchestrator>,

    /// 配置管理器
    pub config_manager: Arc<ConfigManager>,
}

impl AppState {
    /// 创建新的AppState实例
    ///
    /// # 说明
    /// 1. 打开连接并统一 PRAGMA
    /// 2. 建表（幂等）
    /// 3. 初始化仓储、引擎、API
    pub fn new(db_path: String) -> Result<Self, String> {
        tracing::info!("初始化AppState，数据库路径: {}", db_path);

        let conn =
            open_sqlite_connection(&db_path).map_err(|e| format!("无法打开数据库: {}", e))?;
        ensure_schema(&conn).map_err(|e| format!("数据库建表失败: {}", e))?;
        let conn = Arc::new(Mutex::new(conn));

        // ==========================================
        // 配置与仓储
        // ==========================================
        let config_manager = Arc::new(
            ConfigManager::from_connection(conn.clone())
                .map_err(|e| format!("无法创建ConfigManager: {}", e))?,
        );
        let repos = PricingRepositories::from_connection(conn);

        // ==========================================
        // 引擎与API
        // ==========================================
        let config_reader: Arc<dyn PricingConfigReader> = config_manager.clone();
        let orchestrator = Arc::new(PricingOrchestrator::from_repositories(
            &repos,
            config_reader,
        ));
        let pricing_api = Arc::new(PricingApi::new(
            orchestrator.clone(),
            repos,
            config_manager.clone(),
        ));

        tracing::info!("AppState初始化完成");

        Ok(Self {
            db_path,
            pricing_api,
            orchestrator,
            config_manager,
        })
    }
}

/// 获取默认数据库路径
///
/// 优先级: 环境变量 MATERIALS_PRICING_DB_PATH → 用户数据目录 → 当前目录
pub fn get_default_db_path() -> String {
    use std::path::PathBuf;

    if let Ok(path) = std::env::var("MATERIALS_PRICING_DB_PATH") {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }

    let mut path = PathBuf::from("./materials_pricing.db");

    if let Some(data_dir) = dirs::data_dir() {
        #[cfg(debug_assertions)]
        {
            path = data_dir.join("materials-pricing-dev");
        }

        #[cfg(not(debug_assertions))]
        {
            path = data_dir.join("materials-pricing");
        }

        // 目录创建失败时 SQLite 打开会给出明确错误
        std::fs::create_dir_all(&path).ok();
        path = path.join("materials_pricing.db");
    }

    path.to_string_lossy().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_default_db_path() {
        let path = get_default_db_path();
        assert!(!path.is_empty());
        assert!(path.ends_with(".db"));
    }

    #[test]
    fn test_app_state_bootstraps_schema() {
        let temp = tempfile::NamedTempFile::new().unwrap();
        let db_path = temp.path().to_str().unwrap().to_string();

        let state = AppState::new(db_path.clone()).unwrap();
        assert_eq!(state.db_path, db_path);

        let config = state.pricing_api.get_pricing_config().unwrap();
        assert!(config.revision_auto_close);
        assert_eq!(config.max_batch_items, 500);
        assert_eq!(state.pricing_api.list_categories().len(), 15);
    }
}
