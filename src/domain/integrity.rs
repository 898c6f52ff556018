// ==========================================
// 建材价格解析引擎 - 数据完整性告警
// ==========================================
// 同一时点出现多条有效记录属于数据缺陷
// 解析器仍按 "最新 effective_from" 选出一条，但必须携带告警，不得静默
// ==========================================

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntegrityViolationKind {
    OverlappingTierAssignments,
    OverlappingPriceRevisions,
}

impl fmt::Display for IntegrityViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityViolationKind::OverlappingTierAssignments => {
                write!(f, "OVERLAPPING_TIER_ASSIGNMENTS")
            }
            IntegrityViolationKind::OverlappingPriceRevisions => {
                write!(f, "OVERLAPPING_PRICE_REVISIONS")
            }
        }
    }
}

// ==========================================
// DataIntegrityWarning - 重叠记录告警
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataIntegrityWarning {
    pub kind: IntegrityViolationKind,
    pub subject: String,           // 例如 "customer=C1 category=2" / "material=M1"
    pub as_of: Option<NaiveDate>,  // 审计全量区间时为 None
    pub selected_id: i64,          // 最终选中的记录
    pub conflicting_ids: Vec<i64>, // 同时命中的其他记录
}

impl fmt::Display for DataIntegrityWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}: 选中 id={}，冲突 id={:?}",
            self.kind, self.subject, self.selected_id, self.conflicting_ids
        )?;
        if let Some(as_of) = self.as_of {
            write!(f, " (as_of={})", as_of)?;
        }
        Ok(())
    }
}

// ==========================================
// Effective<T> - 按时点解析出的有效记录
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Effective<T> {
    pub record: T,
    pub integrity_warning: Option<DataIntegrityWarning>,
}

impl<T> Effective<T> {
    pub fn clean(record: T) -> Self {
        Self {
            record,
            integrity_warning: None,
        }
    }

    pub fn has_integrity_warning(&self) -> bool {
        self.integrity_warning.is_some()
    }
}
