// ==========================================
// 建材价格解析引擎 - 大宗商品价格解析器
// ==========================================
// 规则:
// 1) 材料未关联大宗商品 → 无价格
// 2) 取 tag 下 effective_from ≤ as_of 的最新指数价 × 有效修订的 commodity_factor（缺省 1.0）
// 3) 无指数价 → 回退 commodity_base_price（不乘系数）
// 4) 都没有 → 无价格
// ==========================================

use crate::domain::integrity::DataIntegrityWarning;
use crate::domain::material::Material;
use crate::domain::types::CommoditySource;
use crate::engine::revision_resolver::PriceRevisionResolver;
use crate::repository::error::RepositoryResult;
use crate::repository::pricing_store::CommodityPriceStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// 未配置调整系数时的默认值
pub const DEFAULT_COMMODITY_FACTOR: f64 = 1.0;

/// CommodityQuote - 大宗商品报价（含追溯信息）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityQuote {
    pub tag: Option<String>,
    pub source: CommoditySource,
    pub index_price: Option<f64>,
    pub index_effective_from: Option<NaiveDate>,
    pub factor: f64,                   // 实际使用的系数（回退价时为 1.0）
    pub revision_number: Option<i32>,  // 提供系数的修订
    pub price: f64,
    pub integrity_warning: Option<DataIntegrityWarning>,
}

/// CommodityPriceResolver - 大宗商品价格解析器
pub struct CommodityPriceResolver {
    store: Arc<dyn CommodityPriceStore>,
    revision_resolver: Arc<PriceRevisionResolver>,
}

impl CommodityPriceResolver {
    pub fn new(
        store: Arc<dyn CommodityPriceStore>,
        revision_resolver: Arc<PriceRevisionResolver>,
    ) -> Self {
        Self {
            store,
            revision_resolver,
        }
    }

    /// 解析大宗商品价格（仅返回数值）
    pub fn resolve(&self, material: &Material, as_of: NaiveDate) -> RepositoryResult<Option<f64>> {
        Ok(self.quote(material, as_of)?.map(|q| q.price))
    }

    /// 解析大宗商品报价（含指数价、系数与来源）
    pub fn quote(
        &self,
        material: &Material,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<CommodityQuote>> {
        if !material.is_commodity_linked {
            debug!(material_id = %material.material_id, "材料未关联大宗商品");
            return Ok(None);
        }

        let indexed = match material.commodity_tag.as_deref() {
            Some(tag) => self.store.find_latest(tag, as_of)?,
            None => None,
        };

        if let Some(index) = indexed {
            let effective = self.revision_resolver.resolve(&material.material_id, as_of)?;
            let (factor, revision_number, integrity_warning) = match effective {
                Some(e) => (
                    e.record.commodity_factor.unwrap_or(DEFAULT_COMMODITY_FACTOR),
                    Some(e.record.revision_number),
                    e.integrity_warning,
                ),
                None => (DEFAULT_COMMODITY_FACTOR, None, None),
            };

            return Ok(Some(CommodityQuote {
                tag: Some(index.tag),
                source: CommoditySource::Indexed,
                index_price: Some(index.price),
                index_effective_from: Some(index.effective_from),
                factor,
                revision_number,
                price: index.price * factor,
                integrity_warning,
            }));
        }

        Ok(material.commodity_base_price.map(|base| {
            debug!(
                material_id = %material.material_id,
                base_price = base,
                "无指数价，回退到材料基准价"
            );
            CommodityQuote {
                tag: material.commodity_tag.clone(),
                source: CommoditySource::BasePriceFallback,
                index_price: None,
                index_effective_from: None,
                factor: DEFAULT_COMMODITY_FACTOR,
                revision_number: None,
                price: base,
                integrity_warning: None,
            }
        }))
    }
}
