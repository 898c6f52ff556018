// ==========================================
// 建材价格解析引擎 - 类别注册表
// ==========================================
// 静态数据，无依赖
// 价目表列号: 14 + tier × 3（仅用于审计核对历史纸质价目表，不参与取价）
// ==========================================

use crate::domain::category::{Category, SPECIAL_ORDER_CATEGORY_CODE};
use crate::domain::types::Tier;

static CATEGORIES: [Category; 15] = [
    Category { code: 1, name: "Lumber", description: "Dimensional lumber and studs" },
    Category { code: 2, name: "Sheet Goods", description: "Plywood, OSB and panel products" },
    Category { code: 3, name: "Engineered Wood", description: "LVL, I-joists and glulam beams" },
    Category { code: 4, name: "Roofing", description: "Shingles, underlayment and flashing" },
    Category { code: 5, name: "Siding", description: "Lap siding, panels and trim boards" },
    Category { code: 6, name: "Insulation", description: "Batts, rigid foam and house wrap" },
    Category { code: 7, name: "Drywall", description: "Gypsum board and finishing supplies" },
    Category { code: 8, name: "Doors", description: "Interior and exterior door units" },
    Category { code: 9, name: "Windows", description: "Window units and skylights" },
    Category { code: 10, name: "Millwork & Trim", description: "Moulding, casing and stair parts" },
    Category { code: 11, name: "Hardware & Fasteners", description: "Nails, screws, connectors and anchors" },
    Category { code: 12, name: "Concrete & Masonry", description: "Cement, block and rebar" },
    Category { code: 13, name: "Decking", description: "Composite and treated decking" },
    Category { code: 14, name: "Tools & Equipment", description: "Hand tools, power tools and rentals" },
    Category { code: 15, name: "Special Order", description: "Non-stock and commodity-indexed items" },
];

/// 按编码查询类别
pub fn category_by_code(code: i32) -> Option<&'static Category> {
    CATEGORIES.iter().find(|c| c.code == code)
}

/// 全部类别（按编码升序）
pub fn all_categories() -> &'static [Category] {
    &CATEGORIES
}

/// 按惯例可走大宗商品定价的类别
pub fn is_commodity_eligible(code: i32) -> bool {
    code == SPECIAL_ORDER_CATEGORY_CODE
}

/// 历史价目表列号
///
/// # 返回
/// - Some(14 + n × 3): 序数等级 01..12
/// - None: L5（走大宗商品路径，无列号）
pub fn price_schedule_column(tier: Tier) -> Option<i32> {
    tier.ordinal_number().map(|n| 14 + i32::from(n) * 3)
}

/// 价目表列号公式（用于计价追溯）
pub fn price_schedule_formula(tier: Tier) -> Option<String> {
    let n = tier.ordinal_number()?;
    let column = price_schedule_column(tier)?;
    Some(format!("price_column = 14 + {} × 3 = {}", n, column))
}
