// ==========================================
// 建材价格解析引擎 - 计价编排器
// ==========================================
// 严格优先级:
// 1) 材料与类别   → 无: NO_CATEGORY
// 2) 客户等级     → 无: NO_TIER
// 3) 客户覆盖价   → 有: OVERRIDE（跳过 4-5）
// 4) L5          → 大宗商品价格，无: NO_COMMODITY_PRICE
// 5) 序数等级     → 等级价目表，无: NO_TIER_PRICE
// 6) 输出计价结果 + 追溯步骤
// ==========================================
// 红线: 无法定价是正常结果（PriceOutcome::Unpriceable），系统错误走 Err
// 说明: 各步骤分别读取，已提交的写入可能在步骤之间可见（读已提交）；
//       历史正确性由 as_of 保证
// ==========================================

use crate::config::pricing_config_trait::PricingConfigReader;
use crate::domain::calculation::{
    BatchFailure, BatchItemFailure, BatchItemRequest, BatchItemSuccess, BatchResult,
    CalculationStep, PriceBreakdown, PriceCalculation, PriceOutcome, Unpriceable,
};
use crate::domain::integrity::DataIntegrityWarning;
use crate::domain::types::{CalculationMethod, CommoditySource};
use crate::engine::category_registry::{
    category_by_code, price_schedule_column, price_schedule_formula,
};
use crate::engine::commodity_resolver::CommodityPriceResolver;
use crate::engine::override_resolver::OverrideResolver;
use crate::engine::repositories::PricingRepositories;
use crate::engine::revision_resolver::PriceRevisionResolver;
use crate::engine::tier_resolver::TierAssignmentResolver;
use crate::engine::totals::calculate_total;
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::MaterialStore;
use chrono::{NaiveDate, Utc};
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

// ==========================================
// StepTrace - 追溯步骤收集器
// ==========================================
#[derive(Debug, Default)]
struct StepTrace {
    steps: Vec<CalculationStep>,
}

impl StepTrace {
    fn push(&mut self, description: String, value: Option<f64>, formula: Option<String>) {
        self.steps.push(CalculationStep {
            step: self.steps.len() as u32 + 1,
            description,
            value,
            formula,
        });
    }
}

/// 第 4/5 步的定价结果
struct ResolvedPrice {
    final_price: f64,
    method: CalculationMethod,
    price_column: Option<i32>,
    commodity_factor: Option<f64>,
    revision_number: Option<i32>,
}

// ==========================================
// PricingOrchestrator - 计价编排器
// ==========================================
pub struct PricingOrchestrator {
    material_store: Arc<dyn MaterialStore>,
    tier_resolver: Arc<TierAssignmentResolver>,
    revision_resolver: Arc<PriceRevisionResolver>,
    commodity_resolver: Arc<CommodityPriceResolver>,
    override_resolver: Arc<OverrideResolver>,
    config: Arc<dyn PricingConfigReader>,
}

impl PricingOrchestrator {
    pub fn new(
        material_store: Arc<dyn MaterialStore>,
        tier_resolver: Arc<TierAssignmentResolver>,
        revision_resolver: Arc<PriceRevisionResolver>,
        commodity_resolver: Arc<CommodityPriceResolver>,
        override_resolver: Arc<OverrideResolver>,
        config: Arc<dyn PricingConfigReader>,
    ) -> Self {
        Self {
            material_store,
            tier_resolver,
            revision_resolver,
            commodity_resolver,
            override_resolver,
            config,
        }
    }

    /// 从仓储集合构造全部解析器
    pub fn from_repositories(
        repos: &PricingRepositories,
        config: Arc<dyn PricingConfigReader>,
    ) -> Self {
        let tier_resolver = Arc::new(TierAssignmentResolver::new(repos.tier_store.clone()));
        let revision_resolver = Arc::new(PriceRevisionResolver::new(
            repos.revision_store.clone(),
            config.clone(),
        ));
        let commodity_resolver = Arc::new(CommodityPriceResolver::new(
            repos.commodity_store.clone(),
            revision_resolver.clone(),
        ));
        let override_resolver = Arc::new(OverrideResolver::new(repos.override_store.clone()));

        Self::new(
            repos.material_store.clone(),
            tier_resolver,
            revision_resolver,
            commodity_resolver,
            override_resolver,
            config,
        )
    }

    pub fn tier_resolver(&self) -> &Arc<TierAssignmentResolver> {
        &self.tier_resolver
    }

    pub fn revision_resolver(&self) -> &Arc<PriceRevisionResolver> {
        &self.revision_resolver
    }

    pub fn commodity_resolver(&self) -> &Arc<CommodityPriceResolver> {
        &self.commodity_resolver
    }

    pub fn override_resolver(&self) -> &Arc<OverrideResolver> {
        &self.override_resolver
    }

    /// 计算客户单价
    ///
    /// # 参数
    /// - quantity: 数量（有限正数），仅记录在结果中
    /// - as_of: 计价日期，None 时取当天（UTC）
    ///
    /// # 返回
    /// - Ok(PriceOutcome::Priced): 计价成功
    /// - Ok(PriceOutcome::Unpriceable): 该组合无法定价（正常业务结果）
    /// - Err: 存储故障或输入非法
    pub fn calculate_customer_price(
        &self,
        customer_id: &str,
        material_id: &str,
        quantity: f64,
        as_of: Option<NaiveDate>,
    ) -> RepositoryResult<PriceOutcome> {
        validate_quantity(quantity)?;
        let as_of = as_of.unwrap_or_else(today);

        let mut trace = StepTrace::default();
        let mut warnings: Vec<DataIntegrityWarning> = Vec::new();

        // ===== 1) 材料与类别 =====
        let material = match self.material_store.find_by_id(material_id)? {
            Some(material) => material,
            None => {
                return Ok(unpriceable(customer_id, material_id, Unpriceable::NoCategory));
            }
        };
        let category_code = match material.category_code {
            Some(code) => code,
            None => {
                return Ok(unpriceable(customer_id, material_id, Unpriceable::NoCategory));
            }
        };
        let category_name = category_by_code(category_code)
            .map(|c| c.name)
            .unwrap_or("未登记类别");
        trace.push(
            format!(
                "加载材料 {} (SKU {})，类别 {} {}",
                material.material_id, material.sku, category_code, category_name
            ),
            Some(f64::from(category_code)),
            None,
        );

        // ===== 2) 客户等级 =====
        let assignment = match self.tier_resolver.resolve(customer_id, category_code, as_of)? {
            Some(effective) => effective,
            None => {
                return Ok(unpriceable(customer_id, material_id, Unpriceable::NoTier));
            }
        };
        warnings.extend(assignment.integrity_warning.clone());
        let tier = assignment.record.tier;
        trace.push(
            format!(
                "客户等级: 类别 {} → 等级 {}（分配 #{}，自 {} 起）",
                category_code, tier, assignment.record.id, assignment.record.effective_from
            ),
            tier.ordinal_number().map(f64::from),
            None,
        );

        // ===== 3) 客户覆盖价 =====
        let resolved = if let Some(override_price) =
            self.override_resolver.resolve(customer_id, material_id)?
        {
            trace.push(
                "客户覆盖价生效，跳过等级与大宗商品计价".to_string(),
                Some(override_price),
                Some("final_price = override_price".to_string()),
            );
            ResolvedPrice {
                final_price: override_price,
                method: CalculationMethod::Override,
                price_column: None,
                commodity_factor: None,
                revision_number: None,
            }
        } else {
            trace.push("无客户覆盖价".to_string(), None, None);

            if tier.is_commodity() {
                // ===== 4) L5 大宗商品 =====
                let quote = match self.commodity_resolver.quote(&material, as_of)? {
                    Some(quote) => quote,
                    None => {
                        return Ok(unpriceable(
                            customer_id,
                            material_id,
                            Unpriceable::NoCommodityPrice,
                        ));
                    }
                };
                warnings.extend(quote.integrity_warning.clone());

                let (description, formula, factor) = match quote.source {
                    CommoditySource::Indexed => (
                        format!(
                            "大宗商品定价: 指数 {} 价格 {}（自 {} 起）× 调整系数",
                            quote.tag.as_deref().unwrap_or("-"),
                            quote.index_price.unwrap_or_default(),
                            quote
                                .index_effective_from
                                .map(|d| d.to_string())
                                .unwrap_or_default()
                        ),
                        format!(
                            "final_price = {} × {} = {}",
                            quote.index_price.unwrap_or_default(),
                            quote.factor,
                            quote.price
                        ),
                        Some(quote.factor),
                    ),
                    CommoditySource::BasePriceFallback => (
                        "大宗商品定价: 无指数价，回退到材料基准价".to_string(),
                        "final_price = commodity_base_price".to_string(),
                        None,
                    ),
                };
                trace.push(description, Some(quote.price), Some(formula));

                ResolvedPrice {
                    final_price: quote.price,
                    method: CalculationMethod::RandomLengths,
                    price_column: None,
                    commodity_factor: factor,
                    revision_number: quote.revision_number,
                }
            } else {
                // ===== 5) 序数等级价目表 =====
                let revision = match self.revision_resolver.resolve(material_id, as_of)? {
                    Some(effective) => effective,
                    None => {
                        return Ok(unpriceable(customer_id, material_id, Unpriceable::NoTierPrice));
                    }
                };
                warnings.extend(revision.integrity_warning.clone());

                let tier_price = match revision.record.price_for(tier) {
                    Some(price) => price,
                    None => {
                        return Ok(unpriceable(customer_id, material_id, Unpriceable::NoTierPrice));
                    }
                };
                trace.push(
                    format!(
                        "等级价目表: 修订 #{}（自 {} 起）等级 {} 单价",
                        revision.record.revision_number, revision.record.effective_from, tier
                    ),
                    Some(tier_price),
                    price_schedule_formula(tier),
                );

                ResolvedPrice {
                    final_price: tier_price,
                    method: CalculationMethod::TierBased,
                    price_column: price_schedule_column(tier),
                    commodity_factor: None,
                    revision_number: Some(revision.record.revision_number),
                }
            }
        };

        // ===== 6) 输出 =====
        trace.push(
            format!("最终单价（{}）", resolved.method),
            Some(resolved.final_price),
            None,
        );

        debug!(
            customer_id = customer_id,
            material_id = material_id,
            tier = %tier,
            method = %resolved.method,
            final_price = resolved.final_price,
            warnings = warnings.len(),
            "计价完成"
        );

        Ok(PriceOutcome::Priced(PriceCalculation {
            material_id: material.material_id,
            customer_id: customer_id.to_string(),
            category_code,
            tier,
            as_of,
            quantity,
            base_price: material.vendor_cost,
            final_price: resolved.final_price,
            calculation_method: resolved.method,
            price_column: resolved.price_column,
            commodity_factor: resolved.commodity_factor,
            revision_number: resolved.revision_number,
            steps: trace.steps,
            warnings,
        }))
    }

    /// 计算含损耗合计
    ///
    /// # 参数
    /// - waste_factor_pct: 损耗率（百分比），None 时取配置默认值
    pub fn calculate_breakdown(
        &self,
        customer_id: &str,
        material_id: &str,
        quantity: f64,
        waste_factor_pct: Option<f64>,
        as_of: Option<NaiveDate>,
    ) -> RepositoryResult<PriceOutcome<PriceBreakdown>> {
        let waste_factor_pct = match waste_factor_pct {
            Some(pct) => pct,
            None => self.config.get_default_waste_factor_pct()?,
        };
        validate_waste_factor(waste_factor_pct)?;

        let outcome = self.calculate_customer_price(customer_id, material_id, quantity, as_of)?;
        Ok(outcome.map(|calculation| {
            let totals = calculate_total(calculation.final_price, quantity, waste_factor_pct);
            PriceBreakdown {
                calculation,
                waste_factor_pct,
                totals,
            }
        }))
    }

    /// 批量计价
    ///
    /// # 说明
    /// - 每项独立计算（不共享事务、互不依赖）
    /// - 单项失败（无法定价 / 输入非法 / 存储故障）只记录在 failed 中，不中断批次
    /// - total_amount 只累计成功项
    pub fn calculate_batch(
        &self,
        customer_id: &str,
        items: &[BatchItemRequest],
        as_of: Option<NaiveDate>,
    ) -> RepositoryResult<BatchResult> {
        let max_items = self.config.get_max_batch_items()?;
        if items.len() > max_items {
            return Err(RepositoryError::ValidationError(format!(
                "批量条目数 {} 超过上限 {}",
                items.len(),
                max_items
            )));
        }

        let as_of = as_of.unwrap_or_else(today);
        let batch_id = Uuid::new_v4().to_string();

        let mut succeeded = Vec::new();
        let mut failed = Vec::new();

        for (index, item) in items.iter().enumerate() {
            let result = self.calculate_breakdown(
                customer_id,
                &item.material_id,
                item.quantity,
                item.waste_factor,
                Some(as_of),
            );

            let failure = match result {
                Ok(PriceOutcome::Priced(breakdown)) => {
                    succeeded.push(BatchItemSuccess { index, breakdown });
                    continue;
                }
                Ok(PriceOutcome::Unpriceable { reason }) => BatchFailure::Unpriceable { reason },
                Err(e @ RepositoryError::ValidationError(_))
                | Err(e @ RepositoryError::FieldValueError { .. }) => BatchFailure::InvalidInput {
                    message: e.to_string(),
                },
                Err(e) => {
                    warn!(
                        batch_id = %batch_id,
                        index = index,
                        material_id = %item.material_id,
                        error = %e,
                        "批量计价单项存储故障"
                    );
                    BatchFailure::SystemError {
                        message: e.to_string(),
                    }
                }
            };

            failed.push(BatchItemFailure {
                index,
                material_id: item.material_id.clone(),
                quantity: item.quantity,
                failure,
            });
        }

        let total_amount: f64 = succeeded.iter().map(|s| s.breakdown.totals.total).sum();
        let success_count = succeeded.len();
        let failed_count = failed.len();

        info!(
            batch_id = %batch_id,
            customer_id = customer_id,
            as_of = %as_of,
            success_count = success_count,
            failed_count = failed_count,
            total_amount = total_amount,
            "批量计价完成"
        );

        Ok(BatchResult {
            batch_id,
            customer_id: customer_id.to_string(),
            as_of,
            succeeded,
            failed,
            success_count,
            failed_count,
            total_amount,
        })
    }
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

fn unpriceable(customer_id: &str, material_id: &str, reason: Unpriceable) -> PriceOutcome {
    debug!(
        customer_id = customer_id,
        material_id = material_id,
        reason = %reason,
        "无法定价"
    );
    PriceOutcome::unpriceable(reason)
}

/// 最小计价数量
pub const MIN_QUANTITY: f64 = 1.0;

fn validate_quantity(quantity: f64) -> RepositoryResult<()> {
    if !quantity.is_finite() || quantity < MIN_QUANTITY {
        return Err(RepositoryError::FieldValueError {
            field: "quantity".to_string(),
            message: format!("数量必须不小于 {}: {}", MIN_QUANTITY, quantity),
        });
    }
    Ok(())
}

fn validate_waste_factor(waste_factor_pct: f64) -> RepositoryResult<()> {
    if !waste_factor_pct.is_finite() || waste_factor_pct < 0.0 {
        return Err(RepositoryError::FieldValueError {
            field: "waste_factor".to_string(),
            message: format!("损耗率必须为非负数: {}", waste_factor_pct),
        });
    }
    Ok(())
}
