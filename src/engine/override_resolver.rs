// ==========================================
// 建材价格解析引擎 - 客户覆盖价解析器
// ==========================================
// 唯一键直查，无时间维度；非空覆盖价压过等级/大宗商品计价
// ==========================================

use crate::repository::error::RepositoryResult;
use crate::repository::pricing_store::CustomerOverrideStore;
use std::sync::Arc;

pub struct OverrideResolver {
    store: Arc<dyn CustomerOverrideStore>,
}

impl OverrideResolver {
    pub fn new(store: Arc<dyn CustomerOverrideStore>) -> Self {
        Self { store }
    }

    pub fn resolve(&self, customer_id: &str, material_id: &str) -> RepositoryResult<Option<f64>> {
        self.store.find_price(customer_id, material_id)
    }
}
