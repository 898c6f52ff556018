// ==========================================
// 建材价格解析引擎 - 价格修订
// ==========================================
// 语义: 自 D 起材料 M 的各等级价格如下，直到被取代或过期
// 红线: revision_number 按材料单调递增，与 effective_from 顺序无关
// 红线: 查询永远按 effective_from/expires_at 窗口，不按 revision_number
// 存储: 12 个等级价格以 JSON 映射存于单列 tier_prices
// ==========================================

use crate::domain::types::Tier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// ==========================================
// TierPrices - 等级 → 价格映射
// ==========================================
// 键: "01".."12"；缺失的键表示该等级有意不定价
// L5 永远不出现（只走大宗商品路径）
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TierPrices(BTreeMap<String, f64>);

impl TierPrices {
    pub fn new() -> Self {
        Self::default()
    }

    /// 设置某等级价格（链式）
    pub fn with(mut self, tier: Tier, price: f64) -> Self {
        self.0.insert(tier.label(), price);
        self
    }

    /// 按标签插入（不做校验，写入前统一调用 validate）
    pub fn insert_label(&mut self, label: impl Into<String>, price: f64) {
        self.0.insert(label.into(), price);
    }

    /// 查询某等级价格；L5 永远返回 None
    pub fn get(&self, tier: Tier) -> Option<f64> {
        if tier.is_commodity() {
            return None;
        }
        self.0.get(&tier.label()).copied()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// 写入前校验
    ///
    /// # 规则
    /// - 键只能是 "01".."12"
    /// - "L5" 不允许出现数值价格
    /// - 价格必须是有限的非负数
    ///
    /// # 返回
    /// - Ok(()): 校验通过
    /// - Err(Vec<String>): 全部违规原因
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = Vec::new();

        for (label, price) in &self.0 {
            match Tier::from_str(label) {
                Some(Tier::L5) => {
                    violations.push(format!("等级 {} 只能走大宗商品定价，不允许写入价格", label));
                    continue;
                }
                Some(Tier::Ordinal(_)) if label.len() == 2 => {}
                _ => {
                    violations.push(format!("非法等级标签: {}", label));
                    continue;
                }
            }

            if !price.is_finite() || *price < 0.0 {
                violations.push(format!("等级 {} 价格非法: {}", label, price));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(&self.0)
    }

    pub fn from_json(raw: &str) -> serde_json::Result<Self> {
        serde_json::from_str::<BTreeMap<String, f64>>(raw).map(TierPrices)
    }
}

// ==========================================
// PriceRevision - 价格修订记录
// ==========================================
// 对齐: price_revision 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceRevision {
    pub id: i64,
    pub material_id: String,
    pub revision_number: i32,
    pub revision_type: String, // 自由格式的修订原因
    pub tier_prices: TierPrices,
    pub vendor_cost: f64,
    pub freight: f64,
    pub base_margin: f64,
    pub commodity_factor: Option<f64>, // 乘以大宗商品指数价
    pub effective_from: NaiveDate,
    pub expires_at: Option<NaiveDate>, // 过期日（含），NULL=长期有效
    pub created_at: DateTime<Utc>,
}

impl PriceRevision {
    pub fn is_effective_on(&self, as_of: NaiveDate) -> bool {
        self.effective_from <= as_of && self.expires_at.map_or(true, |exp| exp >= as_of)
    }

    pub fn price_for(&self, tier: Tier) -> Option<f64> {
        self.tier_prices.get(tier)
    }
}

// ==========================================
// NewPriceRevision - 创建修订的输入
// ==========================================
// revision_number 由仓储在事务内分配
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPriceRevision {
    pub material_id: String,
    pub tier_prices: TierPrices,
    pub vendor_cost: f64,
    pub freight: f64,
    pub base_margin: f64,
    pub commodity_factor: Option<f64>,
    pub revision_type: String,
    pub effective_from: NaiveDate,
    pub expires_at: Option<NaiveDate>,
}

impl NewPriceRevision {
    /// 校验修订输入，返回全部违规原因
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut violations = match self.tier_prices.validate() {
            Ok(()) => Vec::new(),
            Err(v) => v,
        };

        if self.material_id.trim().is_empty() {
            violations.push("material_id 不能为空".to_string());
        }
        if let Some(exp) = self.expires_at {
            if exp < self.effective_from {
                violations.push(format!(
                    "过期日 {} 早于生效日 {}",
                    exp, self.effective_from
                ));
            }
        }
        for (name, value) in [
            ("vendor_cost", self.vendor_cost),
            ("freight", self.freight),
            ("base_margin", self.base_margin),
        ] {
            if !value.is_finite() {
                violations.push(format!("{} 必须是有限数值", name));
            }
        }
        if let Some(factor) = self.commodity_factor {
            if !factor.is_finite() || factor <= 0.0 {
                violations.push(format!("commodity_factor 必须为正数: {}", factor));
            }
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(violations)
        }
    }
}
