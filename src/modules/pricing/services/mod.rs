pub mod category_breakdown;
pub mod line_pricing;
pub mod totals_calculator;

pub use category_breakdown::{calculate_category_subtotals, UNCATEGORIZED};
pub use line_pricing::{calculate_line_total, raw_line_amount};
pub use totals_calculator::{
    calculate_line_totals, calculate_quote_totals, effective_tax_rate, DEFAULT_TAX_RATE_PERCENT,
};
