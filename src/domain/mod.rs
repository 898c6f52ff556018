// ==========================================
// 建材价格解析引擎 - 领域模型层
// ==========================================
// 职责: 定义领域实体、类型、计价结果
// 红线: 不含数据访问逻辑,不含引擎逻辑
// ==========================================

pub mod calculation;
pub mod category;
pub mod integrity;
pub mod material;
pub mod price_revision;
pub mod tier_assignment;
pub mod types;

// 重导出核心类型
pub use calculation::{
    BatchFailure, BatchItemFailure, BatchItemRequest, BatchItemSuccess, BatchResult,
    CalculationStep, PriceBreakdown, PriceCalculation, PriceOutcome, TotalCalculation,
    Unpriceable,
};
pub use category::Category;
pub use integrity::{DataIntegrityWarning, Effective, IntegrityViolationKind};
pub use material::{CommodityPrice, CustomerOverride, Material};
pub use price_revision::{NewPriceRevision, PriceRevision, TierPrices};
pub use tier_assignment::{TierAssignment, TierSetting};
pub use types::{CalculationMethod, CommoditySource, Tier};
