// ==========================================
// 建材价格解析引擎 - 有效区间选择
// ==========================================
// 规则:
// - 候选按 "最新 effective_from 优先" 排序后取首条
// - 多于一条候选视为数据缺陷，必须携带告警
// - 交接日例外: 落选记录的截止日恰好等于胜出记录的生效日
//   （set_tiers / 修订自动关闭在生效当日产生的形态）不算重叠
// ==========================================

use crate::domain::integrity::{DataIntegrityWarning, Effective, IntegrityViolationKind};
use crate::domain::price_revision::PriceRevision;
use crate::domain::tier_assignment::TierAssignment;
use chrono::NaiveDate;

/// 带有效区间的记录（区间两端均含）
pub trait Windowed {
    fn record_id(&self) -> i64;
    fn window_start(&self) -> NaiveDate;
    fn window_end(&self) -> Option<NaiveDate>;
}

impl Windowed for TierAssignment {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn window_start(&self) -> NaiveDate {
        self.effective_from
    }

    fn window_end(&self) -> Option<NaiveDate> {
        self.effective_until
    }
}

impl Windowed for PriceRevision {
    fn record_id(&self) -> i64 {
        self.id
    }

    fn window_start(&self) -> NaiveDate {
        self.effective_from
    }

    fn window_end(&self) -> Option<NaiveDate> {
        self.expires_at
    }
}

/// 截止日早于生效日的区间永远不会命中
fn is_empty_window<T: Windowed>(record: &T) -> bool {
    record.window_end().map_or(false, |end| end < record.window_start())
}

/// a 在 b 生效当日交接给 b
fn is_handoff<T: Windowed>(earlier: &T, later: &T) -> bool {
    earlier.window_end() == Some(later.window_start())
}

/// 两条记录互相交接（任一方向）
fn is_handoff_either<T: Windowed>(a: &T, b: &T) -> bool {
    is_handoff(a, b) || is_handoff(b, a)
}

/// 从已排序（胜出者在前）的候选中选出有效记录
///
/// # 参数
/// - candidates: 仓储返回的候选，首条即胜出者
/// - kind / subject / as_of: 用于构造告警
pub fn select_effective<T: Windowed>(
    candidates: Vec<T>,
    kind: IntegrityViolationKind,
    subject: String,
    as_of: NaiveDate,
) -> Option<Effective<T>> {
    let mut iter = candidates.into_iter();
    let winner = iter.next()?;
    let losers: Vec<T> = iter.collect();

    // 候选均覆盖 as_of，落选者之间同样两两重叠（互为交接者除外）
    let conflicting_ids: Vec<i64> = losers
        .iter()
        .enumerate()
        .filter(|(i, loser)| {
            !is_handoff(*loser, &winner)
                || losers
                    .iter()
                    .enumerate()
                    .any(|(j, other)| j != *i && !is_handoff_either(*loser, other))
        })
        .map(|(_, loser)| loser.record_id())
        .collect();

    if conflicting_ids.is_empty() {
        return Some(Effective::clean(winner));
    }

    let warning = DataIntegrityWarning {
        kind,
        subject,
        as_of: Some(as_of),
        selected_id: winner.record_id(),
        conflicting_ids,
    };
    tracing::warn!(
        kind = %warning.kind,
        subject = %warning.subject,
        selected_id = warning.selected_id,
        conflicting_ids = ?warning.conflicting_ids,
        as_of = %as_of,
        "数据完整性告警: 同一时点存在多条有效记录，按最新 effective_from 选取"
    );

    Some(Effective {
        record: winner,
        integrity_warning: Some(warning),
    })
}

/// 全量审计: 找出互相重叠的记录对（排除交接日）
///
/// # 返回
/// - 每个元素为 (较早生效记录 id, 较晚生效记录 id)
pub fn find_overlapping_pairs<T: Windowed>(records: &[T]) -> Vec<(i64, i64)> {
    let mut ordered: Vec<&T> = records.iter().filter(|r| !is_empty_window(*r)).collect();
    ordered.sort_by(|a, b| {
        a.window_start()
            .cmp(&b.window_start())
            .then(a.record_id().cmp(&b.record_id()))
    });

    let mut pairs = Vec::new();
    for (i, earlier) in ordered.iter().enumerate() {
        for later in ordered.iter().skip(i + 1) {
            let overlaps = earlier
                .window_end()
                .map_or(true, |end| end >= later.window_start());
            if overlaps && !is_handoff(*earlier, *later) {
                pairs.push((earlier.record_id(), later.record_id()));
            }
        }
    }
    pairs
}
