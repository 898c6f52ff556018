// ==========================================
// 建材价格解析引擎 - 核心库
// ==========================================
// 职责: 按 客户等级 / 价格修订 / 大宗商品指数 / 客户覆盖价
//       解析出某日某客户某材料的单价，并给出可追溯的计算步骤
// 技术栈: Rust + SQLite
// ==========================================

// ==========================================
// 模块声明
// ==========================================

// 领域层 - 实体与类型
pub mod domain;

// 数据仓储层 - 数据访问
pub mod repository;

// 引擎层 - 计价规则
pub mod engine;

// 配置层 - 计价配置
pub mod config;

// 数据库基础设施（连接初始化/PRAGMA/建表）
pub mod db;

// 日志系统
pub mod logging;

// API 层 - 业务接口
pub mod api;

// 应用层 - 服务组装
pub mod app;

// ==========================================
// 重导出核心类型
// ==========================================

// 领域类型
pub use domain::types::{CalculationMethod, CommoditySource, Tier};

// 领域实体
pub use domain::{
    BatchItemRequest, BatchResult, Category, CommodityPrice, CustomerOverride,
    DataIntegrityWarning, Material, NewPriceRevision, PriceBreakdown, PriceCalculation,
    PriceOutcome, PriceRevision, TierAssignment, TierPrices, TierSetting, TotalCalculation,
    Unpriceable,
};

// 引擎
pub use engine::{
    calculate_total, price_schedule_column, CommodityPriceResolver, OverrideResolver,
    PriceRevisionResolver, PricingOrchestrator, PricingRepositories, TierAssignmentResolver,
};

// API
pub use api::{ApiError, ApiResult, PricingApi};

// 应用
pub use app::AppState;

// ==========================================
// 常量定义
// ==========================================

// 系统版本
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// 系统名称
pub const APP_NAME: &str = "建材价格解析引擎";
