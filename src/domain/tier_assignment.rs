// ==========================================
// 建材价格解析引擎 - 客户等级分配
// ==========================================
// 语义: 客户 X 在类别 C 上自 D 起（至 E 止，或无限期）按等级 T 计价
// 红线: 同一 (客户, 类别) 的有效区间不得重叠
// 生命周期: 只关闭、不原地修改，保证历史可追溯
// ==========================================

use crate::domain::types::Tier;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// TierAssignment - 等级分配记录
// ==========================================
// 对齐: tier_assignment 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TierAssignment {
    pub id: i64,
    pub customer_id: String,
    pub category_code: i32,
    pub tier: Tier,
    pub effective_from: NaiveDate,          // 生效日（含）
    pub effective_until: Option<NaiveDate>, // 截止日（含），NULL=无限期
    pub created_at: DateTime<Utc>,
}

impl TierAssignment {
    /// 判断在 as_of 当天是否有效
    pub fn is_effective_on(&self, as_of: NaiveDate) -> bool {
        self.effective_from <= as_of && self.effective_until.map_or(true, |until| until >= as_of)
    }

    pub fn is_open(&self) -> bool {
        self.effective_until.is_none()
    }
}

/// 批量设置等级时的单条输入
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierSetting {
    pub category_code: i32,
    pub tier: Tier,
}

impl TierSetting {
    pub fn new(category_code: i32, tier: Tier) -> Self {
        Self { category_code, tier }
    }
}
