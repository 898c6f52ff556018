// ==========================================
// 建材价格解析引擎 - 等级分配解析器
// ==========================================
// 输入: 客户 + 类别 + as_of
// 输出: 唯一有效等级（重叠时最新 effective_from 胜出并告警）
// 写入: set_tiers 原子地 "关闭旧分配 + 插入新分配"
// ==========================================

use crate::domain::integrity::{DataIntegrityWarning, Effective, IntegrityViolationKind};
use crate::domain::tier_assignment::{TierAssignment, TierSetting};
use crate::engine::category_registry::category_by_code;
use crate::engine::effective_window::{find_overlapping_pairs, select_effective};
use crate::repository::error::{RepositoryError, RepositoryResult};
use crate::repository::pricing_store::TierAssignmentStore;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info};

/// set_tiers 的执行摘要
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SetTiersSummary {
    pub closed: usize,
    pub inserted: usize,
    pub effective_from: NaiveDate,
}

/// TierAssignmentResolver - 等级分配解析器
pub struct TierAssignmentResolver {
    store: Arc<dyn TierAssignmentStore>,
}

impl TierAssignmentResolver {
    pub fn new(store: Arc<dyn TierAssignmentStore>) -> Self {
        Self { store }
    }

    /// 解析 (客户, 类别) 在 as_of 当天的有效等级
    ///
    /// # 返回
    /// - Ok(Some(Effective)): 命中；多条候选时 integrity_warning 非空
    /// - Ok(None): 无有效分配
    pub fn resolve(
        &self,
        customer_id: &str,
        category_code: i32,
        as_of: NaiveDate,
    ) -> RepositoryResult<Option<Effective<TierAssignment>>> {
        let candidates = self.store.find_effective(customer_id, category_code, as_of)?;
        debug!(
            customer_id = customer_id,
            category_code = category_code,
            as_of = %as_of,
            candidates = candidates.len(),
            "解析客户等级"
        );

        Ok(select_effective(
            candidates,
            IntegrityViolationKind::OverlappingTierAssignments,
            format!("customer={} category={}", customer_id, category_code),
            as_of,
        ))
    }

    /// 解析客户在 as_of 当天的全部有效等级（按类别升序，每类别一条）
    pub fn resolve_all(
        &self,
        customer_id: &str,
        as_of: NaiveDate,
    ) -> RepositoryResult<Vec<Effective<TierAssignment>>> {
        let rows = self.store.find_effective_for_customer(customer_id, as_of)?;

        let mut by_category: BTreeMap<i32, Vec<TierAssignment>> = BTreeMap::new();
        for row in rows {
            by_category.entry(row.category_code).or_default().push(row);
        }

        let resolved = by_category
            .into_iter()
            .filter_map(|(category_code, candidates)| {
                select_effective(
                    candidates,
                    IntegrityViolationKind::OverlappingTierAssignments,
                    format!("customer={} category={}", customer_id, category_code),
                    as_of,
                )
            })
            .collect();
        Ok(resolved)
    }

    /// 批量替换客户等级
    ///
    /// # 说明
    /// - 先校验: 类别必须存在于注册表，同一请求内类别不得重复
    /// - 再原子执行: 关闭全部未关闭分配 → 插入新分配
    /// - 空列表表示 "自该日起客户不再有任何等级"
    pub fn set_tiers(
        &self,
        customer_id: &str,
        settings: &[TierSetting],
        effective_from: NaiveDate,
    ) -> RepositoryResult<SetTiersSummary> {
        if customer_id.trim().is_empty() {
            return Err(RepositoryError::ValidationError(
                "customer_id 不能为空".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for setting in settings {
            if category_by_code(setting.category_code).is_none() {
                return Err(RepositoryError::FieldValueError {
                    field: "category_code".to_string(),
                    message: format!("未知类别: {}", setting.category_code),
                });
            }
            if !seen.insert(setting.category_code) {
                return Err(RepositoryError::ValidationError(format!(
                    "类别 {} 在同一请求中重复",
                    setting.category_code
                )));
            }
        }

        let (closed, inserted) =
            self.store
                .replace_customer_tiers(customer_id, settings, effective_from)?;

        info!(
            customer_id = customer_id,
            effective_from = %effective_from,
            closed = closed,
            inserted = inserted,
            "客户等级已替换"
        );

        Ok(SetTiersSummary {
            closed,
            inserted,
            effective_from,
        })
    }

    /// 客户全部分配历史
    pub fn history(&self, customer_id: &str) -> RepositoryResult<Vec<TierAssignment>> {
        self.store.list_for_customer(customer_id)
    }

    /// 审计客户全部分配中的重叠（按类别分组，排除交接日）
    pub fn audit_overlaps(&self, customer_id: &str) -> RepositoryResult<Vec<DataIntegrityWarning>> {
        let history = self.store.list_for_customer(customer_id)?;

        let mut by_category: BTreeMap<i32, Vec<TierAssignment>> = BTreeMap::new();
        for row in history {
            by_category.entry(row.category_code).or_default().push(row);
        }

        let mut warnings = Vec::new();
        for (category_code, rows) in by_category {
            for (earlier, later) in find_overlapping_pairs(&rows) {
                warnings.push(DataIntegrityWarning {
                    kind: IntegrityViolationKind::OverlappingTierAssignments,
                    subject: format!("customer={} category={}", customer_id, category_code),
                    as_of: None,
                    selected_id: later,
                    conflicting_ids: vec![earlier],
                });
            }
        }
        Ok(warnings)
    }
}
