// ==========================================
// 建材价格解析引擎 - 领域类型定义
// ==========================================
// 等级体系: 01..12 序数折扣等级 + L5 大宗商品指数哨兵
// 计价方式: OVERRIDE / RANDOM_LENGTHS / TIER_BASED
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 序数等级上限（01..12）
pub const MAX_ORDINAL_TIER: u8 = 12;

// ==========================================
// 折扣等级 (Tier)
// ==========================================
// 红线: L5 只能走大宗商品路径，不参与价目表列号计算
// 序列化格式: "01".."12" / "L5"（与数据库一致）
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    Ordinal(u8), // 01 折扣最少 .. 12 折扣最多
    L5,          // 大宗商品指数定价
}

impl Tier {
    /// 构造序数等级，超出 1..=12 返回 None
    pub fn ordinal(n: u8) -> Option<Self> {
        if (1..=MAX_ORDINAL_TIER).contains(&n) {
            Some(Tier::Ordinal(n))
        } else {
            None
        }
    }

    /// 从等级标签解析（"09" / "L5"）
    ///
    /// 序数等级必须是两位数字，"9" 与 "009" 都视为非法
    pub fn from_str(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("L5") {
            return Some(Tier::L5);
        }
        if s.len() != 2 || !s.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }
        s.parse::<u8>().ok().and_then(Tier::ordinal)
    }

    /// 等级标签（也是 tier_prices JSON 的键）
    pub fn label(&self) -> String {
        match self {
            Tier::Ordinal(n) => format!("{:02}", n),
            Tier::L5 => "L5".to_string(),
        }
    }

    /// 序数值（L5 返回 None）
    pub fn ordinal_number(&self) -> Option<u8> {
        match self {
            Tier::Ordinal(n) => Some(*n),
            Tier::L5 => None,
        }
    }

    pub fn is_commodity(&self) -> bool {
        matches!(self, Tier::L5)
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

impl TryFrom<String> for Tier {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Tier::from_str(&value).ok_or_else(|| format!("非法等级标签: {}", value))
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.label()
    }
}

// ==========================================
// 计价方式 (Calculation Method)
// ==========================================
// 序列化格式: SCREAMING_SNAKE_CASE
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CalculationMethod {
    Override,      // 客户专属覆盖价
    RandomLengths, // 大宗商品指数（L5）
    TierBased,     // 等级价目表
}

impl fmt::Display for CalculationMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CalculationMethod::Override => write!(f, "OVERRIDE"),
            CalculationMethod::RandomLengths => write!(f, "RANDOM_LENGTHS"),
            CalculationMethod::TierBased => write!(f, "TIER_BASED"),
        }
    }
}

// ==========================================
// 大宗商品价格来源
// ==========================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CommoditySource {
    Indexed,           // 指数价 × 调整系数
    BasePriceFallback, // 无指数价时回退到材料基准价
}

impl fmt::Display for CommoditySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CommoditySource::Indexed => write!(f, "INDEXED"),
            CommoditySource::BasePriceFallback => write!(f, "BASE_PRICE_FALLBACK"),
        }
    }
}
