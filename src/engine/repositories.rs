// ==========================================
// 建材价格解析引擎 - 引擎层仓储聚合
// ==========================================
// 职责: 聚合计价引擎所需的全部数据访问接口
// 目标: 显式注入依赖，不使用进程级全局客户端；测试可整体替换为替身
// ==========================================

use std::sync::{Arc, Mutex};

use rusqlite::Connection;

use crate::repository::{
    CommodityPriceRepository, CommodityPriceStore, CustomerOverrideRepository,
    CustomerOverrideStore, MaterialRepository, MaterialStore, PriceRevisionRepository,
    PriceRevisionStore, TierAssignmentRepository, TierAssignmentStore,
};

/// 计价引擎仓储集合
///
/// # 包含的仓储
/// - `material_store`: 材料主数据
/// - `tier_store`: 等级分配
/// - `revision_store`: 价格修订
/// - `commodity_store`: 大宗商品指数价
/// - `override_store`: 客户覆盖价
#[derive(Clone)]
pub struct PricingRepositories {
    pub material_store: Arc<dyn MaterialStore>,
    pub tier_store: Arc<dyn TierAssignmentStore>,
    pub revision_store: Arc<dyn PriceRevisionStore>,
    pub commodity_store: Arc<dyn CommodityPriceStore>,
    pub override_store: Arc<dyn CustomerOverrideStore>,
}

impl PricingRepositories {
    /// 创建新的仓储集合
    pub fn new(
        material_store: Arc<dyn MaterialStore>,
        tier_store: Arc<dyn TierAssignmentStore>,
        revision_store: Arc<dyn PriceRevisionStore>,
        commodity_store: Arc<dyn CommodityPriceStore>,
        override_store: Arc<dyn CustomerOverrideStore>,
    ) -> Self {
        Self {
            material_store,
            tier_store,
            revision_store,
            commodity_store,
            override_store,
        }
    }

    /// 基于同一 SQLite 连接构造全部 rusqlite 仓储
    pub fn from_connection(conn: Arc<Mutex<Connection>>) -> Self {
        Self {
            material_store: Arc::new(MaterialRepository::from_connection(conn.clone())),
            tier_store: Arc::new(TierAssignmentRepository::from_connection(conn.clone())),
            revision_store: Arc::new(PriceRevisionRepository::from_connection(conn.clone())),
            commodity_store: Arc::new(CommodityPriceRepository::from_connection(conn.clone())),
            override_store: Arc::new(CustomerOverrideRepository::from_connection(conn)),
        }
    }
}
