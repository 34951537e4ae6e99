mod discount_mode;
mod totals;

pub use discount_mode::DiscountMode;
pub use totals::{CategorySubtotal, LineBreakdown, PricedLine, QuoteTotals};
