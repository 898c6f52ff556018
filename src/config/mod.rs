// ==========================================
// 建材价格解析引擎 - 配置层
// ==========================================
// 职责: 计价相关配置的读取与覆写
// 存储: config_kv 表（scope_id = 'global'）
// ==========================================

pub mod config_manager;
pub mod pricing_config_trait;

// 重导出核心配置管理器
pub use config_manager::{config_keys, ConfigManager};
pub use pricing_config_trait::{PricingConfig, PricingConfigReader};
