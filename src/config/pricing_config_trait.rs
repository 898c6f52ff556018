// ==========================================
// 建材价格解析引擎 - 计价配置读取 Trait
// ==========================================
// 职责: 定义引擎所需的配置读取接口（不包含实现）
// 红线: 不包含配置写入、不包含业务逻辑
// ==========================================

use crate::repository::error::RepositoryResult;
use serde::{Deserialize, Serialize};

/// 默认: 创建修订时自动关闭此前有效的修订
pub const DEFAULT_REVISION_AUTO_CLOSE: bool = true;

/// 默认损耗率（百分比）
pub const DEFAULT_WASTE_FACTOR_PCT: f64 = 0.0;

/// 默认单批最大条目数
pub const DEFAULT_MAX_BATCH_ITEMS: usize = 500;

// ==========================================
// PricingConfigReader Trait
// ==========================================
// 实现者: ConfigManager（从 config_kv 表读取）、PricingConfig（静态值）
pub trait PricingConfigReader: Send + Sync {
    /// 创建修订时是否在同一事务内关闭此前有效的修订
    ///
    /// # 默认值
    /// - true
    fn get_revision_auto_close(&self) -> RepositoryResult<bool>;

    /// 未指定损耗率时的默认值（百分比）
    ///
    /// # 默认值
    /// - 0.0
    fn get_default_waste_factor_pct(&self) -> RepositoryResult<f64>;

    /// 单批最大条目数
    ///
    /// # 默认值
    /// - 500
    fn get_max_batch_items(&self) -> RepositoryResult<usize>;
}

// ==========================================
// PricingConfig - 静态配置值
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PricingConfig {
    pub revision_auto_close: bool,
    pub default_waste_factor_pct: f64,
    pub max_batch_items: usize,
}

impl Default for PricingConfig {
    fn default() -> Self {
        Self {
            revision_auto_close: DEFAULT_REVISION_AUTO_CLOSE,
            default_waste_factor_pct: DEFAULT_WASTE_FACTOR_PCT,
            max_batch_items: DEFAULT_MAX_BATCH_ITEMS,
        }
    }
}

impl PricingConfigReader for PricingConfig {
    fn get_revision_auto_close(&self) -> RepositoryResult<bool> {
        Ok(self.revision_auto_close)
    }

    fn get_default_waste_factor_pct(&self) -> RepositoryResult<f64> {
        Ok(self.default_waste_factor_pct)
    }

    fn get_max_batch_items(&self) -> RepositoryResult<usize> {
        Ok(self.max_batch_items)
    }
}
