use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Anything that can be priced as a quote line
pub trait PricedLine {
    fn product_id(&self) -> &str;
    fn quantity(&self) -> Decimal;
    fn rate(&self) -> Decimal;
    fn discount_percent(&self) -> Decimal;
}

/// Canonical totals of a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuoteTotals {
    /// Sum of mode-dependent line amounts
    pub subtotal: Decimal,

    /// LINE_ITEM: value removed by line discounts (informational).
    /// OVERALL/BOTH: the overall discount taken off the subtotal.
    pub discount_amount: Decimal,

    /// Tax base
    pub net_amount: Decimal,

    pub tax_amount: Decimal,

    /// `net_amount + tax_amount`, never negative
    pub grand_total: Decimal,
}

/// Per-line result, in item order
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineBreakdown {
    pub index: usize,
    pub product_id: String,
    /// quantity × rate
    pub raw_amount: Decimal,
    /// Amount that counts toward the subtotal under the active mode
    pub line_total: Decimal,
    pub discount_amount: Decimal,
}

/// Subtotal of the lines belonging to one catalog category
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategorySubtotal {
    pub category: String,
    pub item_count: usize,
    pub subtotal: Decimal,
}
