// ==========================================
// 建材价格解析引擎 - 计价结果模型
// ==========================================
// 红线: 每一步都输出可追溯的步骤记录（序号/说明/数值/公式）
// 红线: "无法定价" 是正常业务结果，与系统错误分属两种返回形态
// ==========================================

use crate::domain::integrity::DataIntegrityWarning;
use crate::domain::types::{CalculationMethod, Tier};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;

// ==========================================
// CalculationStep - 计价追溯步骤
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationStep {
    pub step: u32,
    pub description: String,
    pub value: Option<f64>,
    pub formula: Option<String>,
}

// ==========================================
// PriceCalculation - 单个材料的计价结果
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceCalculation {
    pub material_id: String,
    pub customer_id: String,
    pub category_code: i32,
    pub tier: Tier,
    pub as_of: NaiveDate,
    pub quantity: f64,

    // ===== 价格 =====
    pub base_price: Option<f64>, // 调用时材料的 vendor_cost（不是修订中的 vendor_cost）
    pub final_price: f64,
    pub calculation_method: CalculationMethod,

    // ===== 审计字段 =====
    pub price_column: Option<i32>,     // 历史价目表列号（仅 TIER_BASED）
    pub commodity_factor: Option<f64>, // 实际使用的调整系数（仅 RANDOM_LENGTHS）
    pub revision_number: Option<i32>,  // 参与计算的修订号
    pub steps: Vec<CalculationStep>,
    pub warnings: Vec<DataIntegrityWarning>,
}

// ==========================================
// Unpriceable - 无法定价原因
// ==========================================
// 调用方应呈现为 "未找到/无法计算"，不自动重试
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Unpriceable {
    NoCategory,       // 材料不存在或未分类
    NoTier,           // 客户在该类别上无有效等级
    NoTierPrice,      // 有效修订中没有该等级价格
    NoCommodityPrice, // L5 但取不到指数价也无回退价
}

impl fmt::Display for Unpriceable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unpriceable::NoCategory => write!(f, "无法定价: 材料无类别"),
            Unpriceable::NoTier => write!(f, "无法定价: 客户无有效等级"),
            Unpriceable::NoTierPrice => write!(f, "无法定价: 无该等级价格"),
            Unpriceable::NoCommodityPrice => write!(f, "无法定价: 无大宗商品价格"),
        }
    }
}

// ==========================================
// PriceOutcome - 计价结果（成功/无法定价）
// ==========================================
// T 默认为单价计算；含损耗合计时为 PriceBreakdown
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PriceOutcome<T = PriceCalculation> {
    Priced(T),
    Unpriceable { reason: Unpriceable },
}

impl<T> PriceOutcome<T> {
    pub fn unpriceable(reason: Unpriceable) -> Self {
        PriceOutcome::Unpriceable { reason }
    }

    pub fn is_priced(&self) -> bool {
        matches!(self, PriceOutcome::Priced(_))
    }

    pub fn priced(&self) -> Option<&T> {
        match self {
            PriceOutcome::Priced(value) => Some(value),
            PriceOutcome::Unpriceable { .. } => None,
        }
    }

    pub fn into_priced(self) -> Option<T> {
        match self {
            PriceOutcome::Priced(value) => Some(value),
            PriceOutcome::Unpriceable { .. } => None,
        }
    }

    pub fn unpriceable_reason(&self) -> Option<Unpriceable> {
        match self {
            PriceOutcome::Priced(_) => None,
            PriceOutcome::Unpriceable { reason } => Some(*reason),
        }
    }

    pub fn into_result(self) -> Result<T, Unpriceable> {
        match self {
            PriceOutcome::Priced(value) => Ok(value),
            PriceOutcome::Unpriceable { reason } => Err(reason),
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> PriceOutcome<U> {
        match self {
            PriceOutcome::Priced(value) => PriceOutcome::Priced(f(value)),
            PriceOutcome::Unpriceable { reason } => PriceOutcome::Unpriceable { reason },
        }
    }
}

// ==========================================
// TotalCalculation - 含损耗的金额合计
// ==========================================
// 不做任何舍入，展示格式化属于表现层
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TotalCalculation {
    pub subtotal: f64,
    pub waste: f64,
    pub total: f64,
}

// ==========================================
// PriceBreakdown - 计价 + 合计
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceBreakdown {
    pub calculation: PriceCalculation,
    pub waste_factor_pct: f64,
    pub totals: TotalCalculation,
}

// ==========================================
// 批量计价
// ==========================================
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemRequest {
    pub material_id: String,
    pub quantity: f64,
    #[serde(default)]
    pub waste_factor: Option<f64>,
}

impl BatchItemRequest {
    pub fn new(material_id: impl Into<String>, quantity: f64, waste_factor: Option<f64>) -> Self {
        Self {
            material_id: material_id.into(),
            quantity,
            waste_factor,
        }
    }
}

/// 批量中单项失败的原因
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BatchFailure {
    Unpriceable { reason: Unpriceable },
    InvalidInput { message: String },
    SystemError { message: String },
}

impl fmt::Display for BatchFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BatchFailure::Unpriceable { reason } => write!(f, "{}", reason),
            BatchFailure::InvalidInput { message } => write!(f, "输入非法: {}", message),
            BatchFailure::SystemError { message } => write!(f, "系统错误: {}", message),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemFailure {
    pub index: usize,
    pub material_id: String,
    pub quantity: f64,
    pub failure: BatchFailure,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchItemSuccess {
    pub index: usize,
    pub breakdown: PriceBreakdown,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchResult {
    pub batch_id: String,
    pub customer_id: String,
    pub as_of: NaiveDate,
    pub succeeded: Vec<BatchItemSuccess>,
    pub failed: Vec<BatchItemFailure>,
    pub success_count: usize,
    pub failed_count: usize,
    pub total_amount: f64, // 只累计成功项的 total
}
