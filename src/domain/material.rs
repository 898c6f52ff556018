// ==========================================
// 建材价格解析引擎 - 材料领域模型
// ==========================================
// 包含: 材料主数据 / 大宗商品指数价 / 客户覆盖价
// 用途: 持久层拥有，引擎只读
// ==========================================

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

// ==========================================
// Material - 材料主数据
// ==========================================
// 红线: category_code 为空的材料不可定价
// 对齐: material 表
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Material {
    // ===== 主键 =====
    pub material_id: String,

    // ===== 基础信息 =====
    pub sku: String,
    pub description: Option<String>,
    pub category_code: Option<i32>, // 材料类别（NULL=不可定价）

    // ===== 成本 =====
    pub vendor_cost: Option<f64>, // 最新已知供应商成本（计算结果中的 base_price）

    // ===== 大宗商品关联 =====
    pub is_commodity_linked: bool,
    pub commodity_tag: Option<String>,       // 指数标签（如 SPF_2X4）
    pub commodity_base_price: Option<f64>,   // 无指数价时的回退价

    // ===== 审计字段 =====
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Material {
    /// 创建一个最小材料（测试与录入工具使用）
    pub fn new(material_id: impl Into<String>, sku: impl Into<String>, category_code: Option<i32>) -> Self {
        let now = Utc::now();
        Self {
            material_id: material_id.into(),
            sku: sku.into(),
            description: None,
            category_code,
            vendor_cost: None,
            is_commodity_linked: false,
            commodity_tag: None,
            commodity_base_price: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_vendor_cost(mut self, vendor_cost: f64) -> Self {
        self.vendor_cost = Some(vendor_cost);
        self
    }

    /// 关联大宗商品指数
    pub fn with_commodity(mut self, tag: impl Into<String>, base_price: Option<f64>) -> Self {
        self.is_commodity_linked = true;
        self.commodity_tag = Some(tag.into());
        self.commodity_base_price = base_price;
        self
    }
}

// ==========================================
// CommodityPrice - 大宗商品指数价时间序列
// ==========================================
// 查询: tag 下 effective_from ≤ as_of 的最新一条
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommodityPrice {
    pub id: i64,
    pub tag: String,
    pub price: f64,
    pub effective_from: NaiveDate,
}

// ==========================================
// CustomerOverride - 客户专属覆盖价
// ==========================================
// 唯一键: (customer_id, material_id)；无时间维度
// override_price 非空时压过一切等级/大宗商品逻辑
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CustomerOverride {
    pub customer_id: String,
    pub material_id: String,
    pub override_price: Option<f64>,
    pub updated_at: DateTime<Utc>,
}
