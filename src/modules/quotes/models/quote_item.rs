// A single product line within a quote.
//
// The item's own `rate` is what gets priced; the catalog base rate is only a
// default used when the item is first added.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::core::money::{
    clamp_percent, lenient_option, mul_saturating, non_negative, round_percent, round_quantity,
};
use crate::modules::pricing::{calculate_line_total, PricedLine};

/// Length × width for area-priced units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub length: Option<Decimal>,
    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub width: Option<Decimal>,
}

impl Dimensions {
    /// Area, available only when both sides are present
    pub fn area(&self) -> Option<Decimal> {
        match (self.length, self.width) {
            (Some(length), Some(width)) => {
                Some(mul_saturating(non_negative(length), non_negative(width)))
            }
            _ => None,
        }
    }

    /// Both sides rounded to the precision they are stored with
    pub fn at_storage_scale(self) -> Self {
        Self {
            length: self.length.map(round_quantity),
            width: self.width.map(round_quantity),
        }
    }
}

/// Stored quote line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteItem {
    pub id: String,
    pub product_id: String,
    pub description: Option<String>,
    pub quantity: Decimal,
    pub rate: Decimal,
    pub discount_percent: Decimal,
    pub dimensions: Option<Dimensions>,
    pub order: i32,
}

impl QuoteItem {
    /// Build a normalised item
    ///
    /// Negative quantity/rate become 0, the discount is clamped to
    /// [0, 100], and complete dimensions override the quantity. Every
    /// figure is rounded to its stored precision before it is priced, so a
    /// reloaded item totals exactly like the one that was saved.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: String,
        product_id: String,
        description: Option<String>,
        quantity: Decimal,
        rate: Decimal,
        discount_percent: Decimal,
        dimensions: Option<Dimensions>,
        order: i32,
    ) -> Self {
        let dimensions = dimensions.map(Dimensions::at_storage_scale);
        let quantity = dimensions
            .and_then(|d| d.area())
            .unwrap_or_else(|| non_negative(quantity));

        Self {
            id,
            product_id,
            description: description.filter(|d| !d.trim().is_empty()),
            quantity: round_quantity(quantity),
            rate: round_quantity(non_negative(rate)),
            discount_percent: round_percent(clamp_percent(discount_percent)),
            dimensions,
            order,
        }
    }

    /// Line total with the item's own discount applied
    pub fn line_total(&self) -> Decimal {
        calculate_line_total(self.quantity, self.rate, self.discount_percent)
    }
}

impl PricedLine for QuoteItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> Decimal {
        self.quantity
    }

    fn rate(&self) -> Decimal {
        self.rate
    }

    fn discount_percent(&self) -> Decimal {
        self.discount_percent
    }
}
