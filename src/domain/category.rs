// ==========================================
// 建材价格解析引擎 - 材料类别
// ==========================================
// 类别编码 1..15，互斥且覆盖全部材料分类
// 15 (Special Order) 按惯例可走大宗商品定价，注册表中不单独设标志
// ==========================================

use serde::Serialize;

/// 类别编码下限
pub const MIN_CATEGORY_CODE: i32 = 1;

/// 类别编码上限
pub const MAX_CATEGORY_CODE: i32 = 15;

/// 特殊订货类别（按惯例可走大宗商品定价）
pub const SPECIAL_ORDER_CATEGORY_CODE: i32 = 15;

// ==========================================
// Category - 材料类别（不可变参考数据）
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Category {
    pub code: i32,
    pub name: &'static str,
    pub description: &'static str,
}
