// ==========================================
// 建材价格解析引擎 - 数据仓储层
// ==========================================
// 红线: Repository 不含业务逻辑
// 职责: 提供数据访问接口,屏蔽数据库细节
// 约束: 所有查询使用参数化,防止 SQL 注入
// ==========================================

pub mod commodity_price_repo;
pub mod customer_override_repo;
pub mod error;
pub mod material_repo;
pub mod price_revision_repo;
pub mod pricing_store;
pub mod row_utils;
pub mod tier_assignment_repo;

// 重导出核心仓储
pub use commodity_price_repo::CommodityPriceRepository;
pub use customer_override_repo::CustomerOverrideRepository;
pub use error::{RepositoryError, RepositoryResult};
pub use material_repo::MaterialRepository;
pub use price_revision_repo::PriceRevisionRepository;
pub use pricing_store::{
    CommodityPriceStore, CustomerOverrideStore, MaterialStore, PriceRevisionStore,
    TierAssignmentStore,
};
pub use tier_assignment_repo::TierAssignmentRepository;
