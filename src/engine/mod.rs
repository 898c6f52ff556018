// ==========================================
// 建材价格解析引擎 - 引擎层
// ==========================================
// 职责: 实现计价规则，不拼 SQL
// 红线: Engine 不拼 SQL，每个计价结果必须输出可追溯步骤
// ==========================================

pub mod category_registry;
pub mod commodity_resolver;
pub mod effective_window;
pub mod override_resolver;
pub mod pricing_orchestrator;
pub mod repositories;
pub mod revision_resolver;
pub mod tier_resolver;
pub mod totals;

// 重导出核心引擎
pub use category_registry::{
    all_categories, category_by_code, is_commodity_eligible, price_schedule_column,
    price_schedule_formula,
};
pub use commodity_resolver::{CommodityPriceResolver, CommodityQuote, DEFAULT_COMMODITY_FACTOR};
pub use effective_window::{find_overlapping_pairs, select_effective, Windowed};
pub use override_resolver::OverrideResolver;
pub use pricing_orchestrator::{PricingOrchestrator, MIN_QUANTITY};
pub use repositories::PricingRepositories;
pub use revision_resolver::PriceRevisionResolver;
pub use tier_resolver::{SetTiersSummary, TierAssignmentResolver};
pub use totals::calculate_total;
