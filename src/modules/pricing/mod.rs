// Pricing module
//
// Pure, synchronous quote pricing: line totals, discount modes, tax and
// category subtotals. Nothing in here touches storage.

pub mod models;
pub mod services;

pub use models::{CategorySubtotal, DiscountMode, LineBreakdown, PricedLine, QuoteTotals};
pub use services::{
    calculate_category_subtotals, calculate_line_total, calculate_line_totals,
    calculate_quote_totals, DEFAULT_TAX_RATE_PERCENT,
};
