// ==========================================
// 建材价格解析引擎 - 价格修订解析器
// ==========================================
// 查询: 按 effective_from/expires_at 窗口，最新 effective_from 胜出
// 写入: 修订号 = MAX + 1；可配置在同一事务内关闭此前有效的修订
// 红线: L5 永远取不到等级价格
// ==========================================

use crate::config::pricing_config_trait::PricingConfigReader;
use crate::domain::integrity::{DataIntegrityWarning, Effective, IntegrityViolationKind};
use crate::domain::price_revision::{NewPriceRevision, PriceRevision};
use crate::domain::types::Tier;
use crate::engine::effective_window::{find_overlapping_pairs, select_effective};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::PriceRevisionStore;
use chrono::NaiveDate;
use std::sync::Arc;
use tracing::{debug, info};

/// PriceRevisionResolver - 价格修订解析器
pub struct PriceRevisionResolver {
    store: Arc<dyn PriceRevisionStore>,
    config: Arc<dyn PricingConfigReader>,
}

impl PriceRevisionResolver {
    pub fn new(store: Arc<dyn PriceRevisionStore>, config: Arc<dyn PricingConfigReader>) -> Self {
        Self { store, config }
    }

    /// 解析材料在 as_of 当天的有效修订
    pub fn resolve(
        &self,
        material_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<Effective<PriceRevision>>> {
        let candidates = self.store.find_effective(material_id, as_of)?;
        debug!(
            material_id = material_id,
            as_of = %as_of,
            candidates = candidates.len(),
            "解析价格修订"
        );

        Ok(select_effective(
            candidates,
            IntegrityViolationKind::OverlappingPriceRevisions,
            format!("material={}", material_id),
            as_of,
        ))
    }

    /// 查询某等级在 as_of 当天的价格
    ///
    /// # 返回
    /// - Ok(None): 无有效修订 / 修订中无该等级 / 等级为 L5
    pub fn price_for_tier(
        &self,
        material_id: &str,
        tier: Tier,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<f64>> {
        if tier.is_commodity() {
            return Ok(None);
        }
        Ok(self
            .resolve(material_id, as_of)?
            .and_then(|effective| effective.record.price_for(tier)))
    }

    /// 创建修订
    ///
    /// # 说明
    /// - 写入前校验等级价格映射与有效区间
    /// - pricing/revision_auto_close=true 时在同一事务内关闭此前有效的修订
    pub fn create_revision(&self, revision: &NewPriceRevision) -> RepositoryResult<PriceRevision> {
        if let Err(violations) = revision.validate() {
            return Err(RepositoryError::ValidationError(violations.join("; ")));
        }

        let auto_close = self.config.get_revision_auto_close()?;
        let created = self.store.append_revision(revision, auto_close)?;

        info!(
            material_id = %created.material_id,
            revision_number = created.revision_number,
            revision_type = %created.revision_type,
            effective_from = %created.effective_from,
            auto_close = auto_close,
            "价格修订已创建"
        );
        Ok(created)
    }

    /// 材料全部修订（按修订号升序）
    pub fn history(&self, material_id: &str) -> RepositoryResult<Vec<PriceRevision>> {
        self.store.list_for_material(material_id)
    }

    /// 审计材料修订中的重叠（排除交接日）
    pub fn audit_overlaps(&self, material_id: &str) -> RepositoryResult<Vec<DataIntegrityWarning>> {
        let history = self.store.list_for_material(material_id)?;
        Ok(find_overlapping_pairs(&history)
            .into_iter()
            .map(|(earlier, later)| DataIntegrityWarning {
                kind: IntegrityViolationKind::OverlappingPriceRevisions,
                subject: format!("material={}", material_id),
                as_of: None,
                selected_id: later,
                conflicting_ids: vec![earlier],
            })
            .collect())
    }
}
