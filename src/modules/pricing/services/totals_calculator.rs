use rust_decimal::Decimal;
use tracing::trace;

use super::line_pricing::{calculate_line_total, raw_line_amount};
use crate::core::money::{add_saturating, clamp_percent, non_negative, percent_of, round_money, sum_saturating};
use crate::modules::pricing::models::{DiscountMode, LineBreakdown, PricedLine, QuoteTotals};

/// Tax rate used when the quote does not specify one
pub const DEFAULT_TAX_RATE_PERCENT: Decimal = Decimal::from_parts(18, 0, 0, false, 0);

/// Resolve the tax rate: missing means the default, negative means zero
pub fn effective_tax_rate(tax_rate_percent: Option<Decimal>) -> Decimal {
    tax_rate_percent
        .map(non_negative)
        .unwrap_or(DEFAULT_TAX_RATE_PERCENT)
}

/// Price every line under the given discount mode
///
/// In OVERALL mode the item's own discount is ignored and the line counts
/// at its raw amount.
pub fn calculate_line_totals<L: PricedLine>(items: &[L], mode: DiscountMode) -> Vec<LineBreakdown> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let raw_amount = raw_line_amount(item.quantity(), item.rate());
            let line_total = if mode.applies_line_discounts() {
                calculate_line_total(item.quantity(), item.rate(), item.discount_percent())
            } else {
                raw_amount
            };

            LineBreakdown {
                index,
                product_id: item.product_id().to_string(),
                raw_amount,
                line_total,
                discount_amount: raw_amount - line_total,
            }
        })
        .collect()
}

/// Fold a quote's lines into its canonical totals
///
/// 1. subtotal = sum of mode-dependent line totals
/// 2. discount: LINE_ITEM reports the sum of line discounts (already netted
///    into the subtotal); OVERALL and BOTH take `overall%` of the subtotal
/// 3. net = subtotal (LINE_ITEM) or subtotal − discount (OVERALL/BOTH)
/// 4. tax = `tax%` of net, grand total = net + tax floored at 0
pub fn calculate_quote_totals<L: PricedLine>(
    items: &[L],
    mode: DiscountMode,
    overall_discount_percent: Decimal,
    tax_rate_percent: Option<Decimal>,
) -> QuoteTotals {
    let lines = calculate_line_totals(items, mode);

    let subtotal = sum_saturating(lines.iter().map(|line| line.line_total));

    let (discount_amount, net_amount) = if mode.applies_overall_discount() {
        let overall = round_money(percent_of(subtotal, clamp_percent(overall_discount_percent)));
        (overall, subtotal - overall)
    } else {
        let line_discounts = sum_saturating(lines.iter().map(|line| line.discount_amount));
        (line_discounts, subtotal)
    };

    let tax_rate = effective_tax_rate(tax_rate_percent);
    let tax_amount = round_money(percent_of(net_amount, tax_rate));
    let grand_total = non_negative(add_saturating(net_amount, tax_amount));

    trace!(
        mode = %mode,
        lines = lines.len(),
        %subtotal,
        %discount_amount,
        %tax_amount,
        %grand_total,
        "Quote totals calculated"
    );

    QuoteTotals {
        subtotal,
        discount_amount,
        net_amount,
        tax_amount,
        grand_total,
    }
}
