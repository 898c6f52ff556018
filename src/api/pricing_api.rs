// ==========================================
// 建材价格解析引擎 - 计价 API
// ==========================================
// 职责: 解析调用方输入（ISO 日期 / 等级标签 / 数量），调用计价引擎，
//       将 "无法定价" 映射为 ApiError::NotFound
// ==========================================

use std::sync::Arc;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::api::error::{ApiError, ApiResult};
use crate::config::config_manager::{config_keys, ConfigManager};
use crate::config::pricing_config_trait::PricingConfig;
use crate::domain::calculation::{BatchItemRequest, BatchResult, PriceBreakdown, PriceCalculation};
use crate::domain::category::Category;
use crate::domain::integrity::{DataIntegrityWarning, Effective};
use crate::domain::material::{CommodityPrice, Material};
use crate::domain::price_revision::{NewPriceRevision, PriceRevision};
use crate::domain::tier_assignment::{TierAssignment, TierSetting};
use crate::domain::types::Tier;
use crate::engine::category_registry::all_categories;
use crate::engine::pricing_orchestrator::PricingOrchestrator;
use crate::engine::repositories::PricingRepositories;
use crate::engine::tier_resolver::SetTiersSummary;

// ==========================================
// TierSettingInput - 等级设置请求项
// ==========================================
/// 调用方提交的等级设置（等级为标签字符串 "01".."12" / "L5"）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierSettingInput {
    pub category_code: i32,
    pub tier: String,
}

impl TierSettingInput {
    pub fn new(category_code: i32, tier: impl Into<String>) -> Self {
        Self {
            category_code,
            tier: tier.into(),
        }
    }
}

// ==========================================
// PricingApi - 计价 API
// ==========================================

/// 计价API
///
/// 职责：
/// 1. 单价/含损耗合计/批量计价
/// 2. 客户等级查询与替换
/// 3. 价格修订、覆盖价、大宗商品指数价、材料主数据的录入
/// 4. 数据完整性审计与配置管理
pub struct PricingApi {
    orchestrator: Arc<PricingOrchestrator>,
    repos: PricingRepositories,
    config_manager: Arc<ConfigManager>,
}

impl PricingApi {
    /// 创建新的PricingApi实例
    pub fn new(
        orchestrator: Arc<PricingOrchestrator>,
        repos: PricingRepositories,
        config_manager: Arc<ConfigManager>,
    ) -> Self {
        Self {
            orchestrator,
            repos,
            config_manager,
        }
    }

    // ==========================================
    // 计价
    // ==========================================

    /// 计算客户单价
    ///
    /// # 参数
    /// - as_of: ISO 日期（YYYY-MM-DD），None 或空串表示当天
    ///
    /// # 返回
    /// - Err(ApiError::NotFound): 该组合无法定价
    pub fn calculate_price(
        &self,
        customer_id: &str,
        material_id: &str,
        quantity: f64,
        as_of: Option<&str>,
    ) -> ApiResult<PriceCalculation> {
        require_non_empty("customer_id", customer_id)?;
        require_non_empty("material_id", material_id)?;
        let as_of = parse_optional_date(as_of)?;

        let outcome = self
            .orchestrator
            .calculate_customer_price(customer_id, material_id, quantity, as_of)?;
        Ok(outcome.into_result()?)
    }

    /// 计算含损耗合计
    pub fn calculate_breakdown(
        &self,
        customer_id: &str,
        material_id: &str,
        quantity: f64,
        waste_factor_pct: Option<f64>,
        as_of: Option<&str>,
    ) -> ApiResult<PriceBreakdown> {
        require_non_empty("customer_id", customer_id)?;
        require_non_empty("material_id", material_id)?;
        let as_of = parse_optional_date(as_of)?;

        let outcome = self.orchestrator.calculate_breakdown(
            customer_id,
            material_id,
            quantity,
            waste_factor_pct,
            as_of,
        )?;
        Ok(outcome.into_result()?)
    }

    /// 批量计价（单项失败不影响其他项）
    pub fn calculate_batch(
        &self,
        customer_id: &str,
        items: &[BatchItemRequest],
        as_of: Option<&str>,
    ) -> ApiResult<BatchResult> {
        require_non_empty("customer_id", customer_id)?;
        let as_of = parse_optional_date(as_of)?;
        Ok(self.orchestrator.calculate_batch(customer_id, items, as_of)?)
    }

    // ==========================================
    // 客户等级
    // ==========================================

    /// 查询客户在 as_of 当天的全部有效等级
    pub fn get_customer_tiers(
        &self,
        customer_id: &str,
        as_of: Option<&str>,
    ) -> ApiResult<Vec<Effective<TierAssignment>>> {
        require_non_empty("customer_id", customer_id)?;
        let as_of = parse_optional_date(as_of)?.unwrap_or_else(today);
        Ok(self.orchestrator.tier_resolver().resolve_all(customer_id, as_of)?)
    }

    /// 替换客户等级（关闭全部旧分配 + 插入新分配，原子执行）
    pub fn set_customer_tiers(
        &self,
        customer_id: &str,
        tiers: &[TierSettingInput],
        effective_from: &str,
    ) -> ApiResult<SetTiersSummary> {
        let effective_from = parse_date("effective_from", effective_from)?;

        let settings = tiers
            .iter()
            .map(|input| {
                Tier::from_str(&input.tier)
                    .map(|tier| TierSetting::new(input.category_code, tier))
                    .ok_or_else(|| {
                        ApiError::InvalidInput(format!(
                            "非法等级标签: {}（类别 {}）",
                            input.tier, input.category_code
                        ))
                    })
            })
            .collect::<ApiResult<Vec<_>>>()?;

        Ok(self
            .orchestrator
            .tier_resolver()
            .set_tiers(customer_id, &settings, effective_from)?)
    }

    /// 客户全部等级分配历史
    pub fn get_tier_history(&self, customer_id: &str) -> ApiResult<Vec<TierAssignment>> {
        require_non_empty("customer_id", customer_id)?;
        Ok(self.orchestrator.tier_resolver().history(customer_id)?)
    }

    // ==========================================
    // 价格修订
    // ==========================================

    pub fn create_price_revision(&self, revision: &NewPriceRevision) -> ApiResult<PriceRevision> {
        Ok(self.orchestrator.revision_resolver().create_revision(revision)?)
    }

    pub fn get_revision_history(&self, material_id: &str) -> ApiResult<Vec<PriceRevision>> {
        require_non_empty("material_id", material_id)?;
        Ok(self.orchestrator.revision_resolver().history(material_id)?)
    }

    // ==========================================
    // 客户覆盖价
    // ==========================================

    pub fn get_customer_override(
        &self,
        customer_id: &str,
        material_id: &str,
    ) -> ApiResult<Option<f64>> {
        Ok(self
            .orchestrator
            .override_resolver()
            .resolve(customer_id, material_id)?)
    }

    pub fn set_customer_override(
        &self,
        customer_id: &str,
        material_id: &str,
        price: f64,
    ) -> ApiResult<()> {
        require_non_empty("customer_id", customer_id)?;
        require_non_empty("material_id", material_id)?;
        self.repos
            .override_store
            .set_override(customer_id, material_id, price)?;
        info!(
            customer_id = customer_id,
            material_id = material_id,
            price = price,
            "客户覆盖价已设置"
        );
        Ok(())
    }

    /// 清除覆盖价；返回是否存在过该覆盖记录
    pub fn clear_customer_override(&self, customer_id: &str, material_id: &str) -> ApiResult<bool> {
        let cleared = self
            .repos
            .override_store
            .clear_override(customer_id, material_id)?;
        info!(
            customer_id = customer_id,
            material_id = material_id,
            cleared = cleared,
            "客户覆盖价已清除"
        );
        Ok(cleared)
    }

    // ==========================================
    // 大宗商品指数价 / 材料主数据
    // ==========================================

    pub fn record_commodity_price(
        &self,
        tag: &str,
        price: f64,
        effective_from: &str,
    ) -> ApiResult<CommodityPrice> {
        require_non_empty("tag", tag)?;
        let effective_from = parse_date("effective_from", effective_from)?;
        Ok(self.repos.commodity_store.record(tag, price, effective_from)?)
    }

    pub fn upsert_material(&self, material: &Material) -> ApiResult<()> {
        require_non_empty("material_id", &material.material_id)?;
        Ok(self.repos.material_store.upsert(material)?)
    }

    pub fn get_material(&self, material_id: &str) -> ApiResult<Material> {
        self.repos
            .material_store
            .find_by_id(material_id)?
            .ok_or_else(|| ApiError::NotFound(format!("Material(id={})不存在", material_id)))
    }

    pub fn list_categories(&self) -> Vec<Category> {
        all_categories().to_vec()
    }

    // ==========================================
    // 数据完整性审计
    // ==========================================

    pub fn audit_customer_tiers(&self, customer_id: &str) -> ApiResult<Vec<DataIntegrityWarning>> {
        Ok(self.orchestrator.tier_resolver().audit_overlaps(customer_id)?)
    }

    pub fn audit_material_revisions(
        &self,
        material_id: &str,
    ) -> ApiResult<Vec<DataIntegrityWarning>> {
        Ok(self
            .orchestrator
            .revision_resolver()
            .audit_overlaps(material_id)?)
    }

    // ==========================================
    // 配置
    // ==========================================

    pub fn get_pricing_config(&self) -> ApiResult<PricingConfig> {
        Ok(self.config_manager.load_pricing_config()?)
    }

    pub fn get_config_snapshot(&self) -> ApiResult<String> {
        Ok(self.config_manager.get_config_snapshot()?)
    }

    /// 更新计价配置（只接受已知键，写入前校验值）
    pub fn update_config(&self, key: &str, value: &str) -> ApiResult<()> {
        let value = value.trim();
        let valid = match key {
            config_keys::REVISION_AUTO_CLOSE => value.parse::<bool>().is_ok(),
            config_keys::DEFAULT_WASTE_FACTOR_PCT => value
                .parse::<f64>()
                .map(|v| v.is_finite() && v >= 0.0)
                .unwrap_or(false),
            config_keys::MAX_BATCH_ITEMS => value.parse::<usize>().map(|v| v > 0).unwrap_or(false),
            _ => return Err(ApiError::InvalidInput(format!("未知配置键: {}", key))),
        };
        if !valid {
            return Err(ApiError::InvalidInput(format!(
                "配置值非法: {}={}",
                key, value
            )));
        }

        Ok(self.config_manager.set_global_config_value(key, value)?)
    }
}

// ==========================================
// 输入解析
// ==========================================

fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn require_non_empty(field: &str, value: &str) -> ApiResult<()> {
    if value.trim().is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    Ok(())
}

fn parse_date(field: &str, raw: &str) -> ApiResult<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ApiError::InvalidInput(format!("{}不能为空", field)));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|_| {
        ApiError::InvalidInput(format!("{}日期格式错误（应为 YYYY-MM-DD）: {}", field, raw))
    })
}

/// None 或空串表示 "当天"
fn parse_optional_date(raw: Option<&str>) -> ApiResult<Option<NaiveDate>> {
    match raw.map(str::trim) {
        None | Some("") => Ok(None),
        Some(raw) => parse_date("as_of", raw).map(Some),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_optional_date() {
        assert_eq!(parse_optional_date(None).unwrap(), None);
        assert_eq!(parse_optional_date(Some("  ")).unwrap(), None);
        assert_eq!(
            parse_optional_date(Some("2024-06-01")).unwrap(),
            NaiveDate::from_ymd_opt(2024, 6, 1)
        );
        assert!(matches!(
            parse_optional_date(Some("06/01/2024")),
            Err(ApiError::InvalidInput(_))
        ));
        assert!(matches!(
            parse_optional_date(Some("2024-02-30")),
            Err(ApiError::InvalidInput(_))
        ));
    }

    #[test]
    fn test_require_non_empty() {
        assert!(require_non_empty("customer_id", "C1").is_ok());
        assert!(require_non_empty("customer_id", " ").is_err());
    }
}
