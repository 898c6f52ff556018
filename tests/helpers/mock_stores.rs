// ==========================================
// 内存存储替身 - 用于集成测试
// ==========================================
// 不依赖 SQLite，验证解析器只通过注入的 Store trait 访问数据
// ==========================================

use chrono::{NaiveDate, Utc};
use materials_pricing::domain::{
    CommodityPrice, Material, NewPriceRevision, PriceRevision, TierAssignment, TierSetting,
};
use materials_pricing::repository::{
    CommodityPriceStore, CustomerOverrideStore, MaterialStore, PriceRevisionStore,
    RepositoryError, RepositoryResult, TierAssignmentStore,
};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

// ==========================================
// 材料
// ==========================================

/// 内存材料库；`failing_ids` 中的材料查询时返回存储故障
#[derive(Default)]
pub struct InMemoryMaterialStore {
    materials: Mutex<HashMap<String, Material>>,
    failing_ids: Mutex<HashSet<String>>,
}

impl InMemoryMaterialStore {
    pub fn fail_on(&self, material_id: &str) {
        self.failing_ids.lock().unwrap().insert(material_id.to_string());
    }
}

impl MaterialStore for InMemoryMaterialStore {
    fn find_by_id(&self, material_id: &str) -> RepositoryResult<Option<Material>> {
        if self.failing_ids.lock().unwrap().contains(material_id) {
            return Err(RepositoryError::DatabaseQueryError(format!(
                "simulated outage for {}",
                material_id
            )));
        }
        Ok(self.materials.lock().unwrap().get(material_id).cloned())
    }

    fn upsert(&self, material: &Material) -> RepositoryResult<()> {
        self.materials
            .lock()
            .unwrap()
            .insert(material.material_id.clone(), material.clone());
        Ok(())
    }
}

// ==========================================
// 等级分配
// ==========================================

#[derive(Default)]
pub struct InMemoryTierStore {
    rows: Mutex<Vec<TierAssignment>>,
}

impl InMemoryTierStore {
    pub fn push(
        &self,
        customer_id: &str,
        category_code: i32,
        tier: materials_pricing::Tier,
        effective_from: NaiveDate,
        effective_until: Option<NaiveDate>,
    ) -> i64 {
        let mut rows = self.rows.lock().unwrap();
        let id = rows.len() as i64 + 1;
        rows.push(TierAssignment {
            id,
            customer_id: customer_id.to_string(),
            category_code,
            tier,
            effective_from,
            effective_until,
            created_at: Utc::now(),
        });
        id
    }

    fn effective(&self, customer_id: &str, as_of: NaiveDate) -> Vec<TierAssignment> {
        let mut rows: Vec<TierAssignment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.customer_id == customer_id && r.is_effective_on(as_of))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.category_code
                .cmp(&b.category_code)
                .then(b.effective_from.cmp(&a.effective_from))
                .then(b.id.cmp(&a.id))
        });
        rows
    }
}

impl TierAssignmentStore for InMemoryTierStore {
    fn find_effective(
        &self,
        customer_id: &str,
        category_code: i32,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>> {
        Ok(self
            .effective(customer_id, as_of)
            .into_iter()
            .filter(|r| r.category_code == category_code)
            .collect())
    }

    fn find_effective_for_customer(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<TierAssignment>> {
        Ok(self.effective(customer_id, as_of))
    }

    fn list_for_customer(&self, customer_id: &str) -> RepositoryResult<Vec<TierAssignment>> {
        let mut rows: Vec<TierAssignment> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.customer_id == customer_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            a.category_code
                .cmp(&b.category_code)
                .then(a.effective_from.cmp(&b.effective_from))
                .then(a.id.cmp(&b.id))
        });
        Ok(rows)
    }

    fn replace_customer_tiers(
        &self,
        customer_id: &str,
        settings: &[TierSetting],
        effective_from: NaiveDate,
    ) -> RepositoryResult<(usize, usize)> {
        let mut closed = 0;
        {
            let mut rows = self.rows.lock().unwrap();
            for row in rows
                .iter_mut()
                .filter(|r| r.customer_id == customer_id && r.effective_until.is_none())
            {
                row.effective_until = Some(effective_from);
                closed += 1;
            }
        }
        for setting in settings {
            self.push(
                customer_id,
                setting.category_code,
                setting.tier,
                effective_from,
                None,
            );
        }
        Ok((closed, settings.len()))
    }
}

// ==========================================
// 价格修订（统计查询次数）
// ==========================================

#[derive(Default)]
pub struct CountingRevisionStore {
    rows: Mutex<Vec<PriceRevision>>,
    lookups: AtomicUsize,
}

impl CountingRevisionStore {
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl PriceRevisionStore for CountingRevisionStore {
    fn find_effective(
        &self,
        material_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<PriceRevision>> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let mut rows: Vec<PriceRevision> = self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.material_id == material_id && r.is_effective_on(as_of))
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.effective_from
                .cmp(&a.effective_from)
                .then(b.revision_number.cmp(&a.revision_number))
        });
        Ok(rows)
    }

    fn list_for_material(&self, material_id: &str) -> RepositoryResult<Vec<PriceRevision>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.material_id == material_id)
            .cloned()
            .collect())
    }

    fn append_revision(
        &self,
        revision: &NewPriceRevision,
        close_open_prior: bool,
    ) -> RepositoryResult<PriceRevision> {
        let mut rows = self.rows.lock().unwrap();
        let revision_number = rows
            .iter()
            .filter(|r| r.material_id == revision.material_id)
            .map(|r| r.revision_number)
            .max()
            .unwrap_or(0)
            + 1;
        let mut expires_at = revision.expires_at;
        if close_open_prior {
            for row in rows.iter_mut().filter(|r| {
                r.material_id == revision.material_id
                    && r.effective_from <= revision.effective_from
                    && r.expires_at.map_or(true, |end| end > revision.effective_from)
            }) {
                row.expires_at = Some(revision.effective_from);
            }
            let next_start = rows
                .iter()
                .filter(|r| {
                    r.material_id == revision.material_id
                        && r.effective_from > revision.effective_from
                })
                .map(|r| r.effective_from)
                .min();
            if let Some(next_start) = next_start {
                expires_at = Some(expires_at.map_or(next_start, |end| end.min(next_start)));
            }
        }
        let created = PriceRevision {
            id: rows.len() as i64 + 1,
            material_id: revision.material_id.clone(),
            revision_number,
            revision_type: revision.revision_type.clone(),
            tier_prices: revision.tier_prices.clone(),
            vendor_cost: revision.vendor_cost,
            freight: revision.freight,
            base_margin: revision.base_margin,
            commodity_factor: revision.commodity_factor,
            effective_from: revision.effective_from,
            expires_at,
            created_at: Utc::now(),
        };
        rows.push(created.clone());
        Ok(created)
    }
}

// ==========================================
// 大宗商品指数价
// ==========================================

#[derive(Default)]
pub struct InMemoryCommodityStore {
    rows: Mutex<Vec<CommodityPrice>>,
}

impl CommodityPriceStore for InMemoryCommodityStore {
    fn find_latest(&self, tag: &str, as_of: NaiveDate) -> RepositoryResult<Option<CommodityPrice>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.tag == tag && p.effective_from <= as_of)
            .max_by(|a, b| a.effective_from.cmp(&b.effective_from).then(a.id.cmp(&b.id)))
            .cloned())
    }

    fn record(&self, tag: &str, price: f64, effective_from: NaiveDate) -> RepositoryResult<CommodityPrice> {
        let mut rows = self.rows.lock().unwrap();
        let created = CommodityPrice {
            id: rows.len() as i64 + 1,
            tag: tag.to_string(),
            price,
            effective_from,
        };
        rows.push(created.clone());
        Ok(created)
    }
}

// ==========================================
// 客户覆盖价
// ==========================================

#[derive(Default)]
pub struct InMemoryOverrideStore {
    rows: Mutex<HashMap<(String, String), Option<f64>>>,
}

impl CustomerOverrideStore for InMemoryOverrideStore {
    fn find_price(&self, customer_id: &str, material_id: &str) -> RepositoryResult<Option<f64>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .get(&(customer_id.to_string(), material_id.to_string()))
            .copied()
            .flatten())
    }

    fn set_override(&self, customer_id: &str, material_id: &str, price: f64) -> RepositoryResult<()> {
        self.rows
            .lock()
            .unwrap()
            .insert((customer_id.to_string(), material_id.to_string()), Some(price));
        Ok(())
    }

    fn clear_override(&self, customer_id: &str, material_id: &str) -> RepositoryResult<bool> {
        let mut rows = self.rows.lock().unwrap();
        match rows.get_mut(&(customer_id.to_string(), material_id.to_string())) {
            Some(price) => {
                *price = None;
                Ok(true)
            }
            None => Ok(false),
        }
    }
}
