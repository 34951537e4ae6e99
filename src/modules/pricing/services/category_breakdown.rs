use std::collections::BTreeMap;

use rust_decimal::Decimal;

use super::totals_calculator::calculate_line_totals;
use crate::core::money::add_saturating;
use crate::modules::pricing::models::{CategorySubtotal, DiscountMode, PricedLine};

/// Group name for lines whose product has no known category
pub const UNCATEGORIZED: &str = "Uncategorized";

/// Group line totals by the category of each line's product
///
/// Reporting view only; line amounts follow the same mode rule as the
/// canonical totals, so the group subtotals add up to the quote subtotal.
/// Output is sorted by category name.
pub fn calculate_category_subtotals<L, F>(
    items: &[L],
    mode: DiscountMode,
    category_of: F,
) -> Vec<CategorySubtotal>
where
    L: PricedLine,
    F: Fn(&str) -> Option<String>,
{
    let mut groups: BTreeMap<String, (usize, Decimal)> = BTreeMap::new();

    for line in calculate_line_totals(items, mode) {
        let category = category_of(&line.product_id).unwrap_or_else(|| UNCATEGORIZED.to_string());
        let entry = groups.entry(category).or_insert((0, Decimal::ZERO));
        entry.0 += 1;
        entry.1 = add_saturating(entry.1, line.line_total);
    }

    groups
        .into_iter()
        .map(|(category, (item_count, subtotal))| CategorySubtotal {
            category,
            item_count,
            subtotal,
        })
        .collect()
}
