// Line pricing
//
// Runs on every keystroke of the quote form, so out-of-range input is
// clamped rather than rejected. Products beyond the `Decimal` range
// saturate.

use rust_decimal::Decimal;

use crate::core::money::{apply_discount, mul_saturating, non_negative, round_money};

/// Undiscounted amount of a line: `quantity × rate`, negatives treated as 0
pub fn raw_line_amount(quantity: Decimal, rate: Decimal) -> Decimal {
    round_money(mul_saturating(non_negative(quantity), non_negative(rate)))
}

/// Line total net of the line's own discount
///
/// Formula: `applyDiscount(quantity × rate, discount_percent)`, with
/// negative quantity/rate treated as 0 and the discount clamped to [0, 100].
pub fn calculate_line_total(quantity: Decimal, rate: Decimal, discount_percent: Decimal) -> Decimal {
    let gross = mul_saturating(non_negative(quantity), non_negative(rate));
    round_money(apply_discount(gross, discount_percent))
}
