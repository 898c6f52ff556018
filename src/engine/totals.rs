// ==========================================
// 建材价格解析引擎 - 损耗合计
// ==========================================
// 纯函数，无 I/O，不做舍入
// subtotal = unit_price × quantity
// waste    = subtotal × waste_pct / 100
// total    = subtotal + waste
// ==========================================

use crate::domain::calculation::TotalCalculation;

pub fn calculate_total(unit_price: f64, quantity: f64, waste_factor_pct: f64) -> TotalCalculation {
    let subtotal = unit_price * quantity;
    let waste = subtotal * (waste_factor_pct / 100.0);
    TotalCalculation {
        subtotal,
        waste,
        total: subtotal + waste,
    }
}
