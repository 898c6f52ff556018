// ==========================================
// 建材价格解析引擎 - 行映射工具
// ==========================================
// 职责: TEXT 列与领域类型之间的转换（等级标签、等级价格 JSON）
// ==========================================

use crate::domain::price_revision::TierPrices;
use crate::domain::types::Tier;
use rusqlite::types::Type;
use rusqlite::Row;

/// 读取等级标签列
pub fn tier_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Tier> {
    let raw: String = row.get(idx)?;
    Tier::from_str(&raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            idx,
            Type::Text,
            format!("非法等级标签: {}", raw).into(),
        )
    })
}

/// 读取等级价格 JSON 列
pub fn tier_prices_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<TierPrices> {
    let raw: String = row.get(idx)?;
    TierPrices::from_json(&raw)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}
