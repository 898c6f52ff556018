// ==========================================
// 建材价格解析引擎 - API 层
// ==========================================
// 职责: 提供业务 API 接口，供采购/估价平台调用
// ==========================================

pub mod error;
pub mod pricing_api;

// 重导出核心类型
pub use error::{ApiError, ApiResult};
pub use pricing_api::{PricingApi, TierSettingInput};
