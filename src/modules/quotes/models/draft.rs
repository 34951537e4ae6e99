// Working copy of a quote while it is being composed.
//
// The draft is a plain value owned by whoever is editing it (a browser
// session, a test, a request handler). It is priced with the same pure
// functions as stored quotes and becomes a `Quote` only when submitted.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::quote::QuotePreview;
use super::quote_item::Dimensions;
use crate::core::money::{
    lenient, lenient_option, non_negative, round_percent, round_quantity, round_tax_rate,
};
use crate::core::{AppError, Result};
use crate::modules::pricing::{
    calculate_line_totals, calculate_quote_totals, DiscountMode, PricedLine, QuoteTotals,
};

/// Line being edited; `rate` stays empty until chosen or filled from the catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftItem {
    pub product_id: String,

    #[serde(default)]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub quantity: Decimal,

    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub rate: Option<Decimal>,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub discount_percent: Decimal,

    #[serde(default)]
    pub dimensions: Option<Dimensions>,
}

impl DraftItem {
    pub fn new(product_id: impl Into<String>, quantity: Decimal, rate: Option<Decimal>) -> Self {
        Self {
            product_id: product_id.into(),
            description: None,
            quantity,
            rate,
            discount_percent: Decimal::ZERO,
            dimensions: None,
        }
    }

    pub fn with_discount(mut self, discount_percent: Decimal) -> Self {
        self.discount_percent = discount_percent;
        self
    }

    /// Set dimensions; when both sides are known the area replaces the
    /// manually entered quantity
    pub fn set_dimensions(&mut self, dimensions: Dimensions) {
        if let Some(area) = dimensions.area() {
            self.quantity = area;
        }
        self.dimensions = Some(dimensions);
    }

    /// Quantity as it will be priced and stored
    pub fn effective_quantity(&self) -> Decimal {
        let quantity = self
            .dimensions
            .and_then(|d| d.at_storage_scale().area())
            .unwrap_or_else(|| non_negative(self.quantity));
        round_quantity(quantity)
    }
}

impl PricedLine for DraftItem {
    fn product_id(&self) -> &str {
        &self.product_id
    }

    fn quantity(&self) -> Decimal {
        self.effective_quantity()
    }

    fn rate(&self) -> Decimal {
        self.rate.map(round_quantity).unwrap_or(Decimal::ZERO)
    }

    fn discount_percent(&self) -> Decimal {
        round_percent(self.discount_percent)
    }
}

/// Policy clause as submitted with a draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DraftPolicy {
    #[serde(default)]
    pub clause_type: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Unsaved quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct QuoteDraft {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub client_id: Option<String>,

    #[serde(default)]
    pub template_id: Option<String>,

    #[serde(default)]
    pub discount_mode: DiscountMode,

    #[serde(default, deserialize_with = "lenient::deserialize")]
    pub overall_discount_percent: Decimal,

    /// Empty means the default tax rate
    #[serde(default, deserialize_with = "lenient_option::deserialize")]
    pub tax_rate_percent: Option<Decimal>,

    #[serde(default)]
    pub items: Vec<DraftItem>,

    #[serde(default)]
    pub policies: Vec<DraftPolicy>,
}

impl QuoteDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Default::default()
        }
    }

    /// Append an item; returns its index
    pub fn add_item(&mut self, mut item: DraftItem) -> usize {
        if let Some(dimensions) = item.dimensions {
            item.set_dimensions(dimensions);
        }
        self.items.push(item);
        self.items.len() - 1
    }

    pub fn update_item(&mut self, index: usize, mut item: DraftItem) -> Result<()> {
        if let Some(dimensions) = item.dimensions {
            item.set_dimensions(dimensions);
        }
        let slot = self.item_mut(index)?;
        *slot = item;
        Ok(())
    }

    pub fn remove_item(&mut self, index: usize) -> Result<DraftItem> {
        self.check_index(index)?;
        Ok(self.items.remove(index))
    }

    pub fn set_dimensions(&mut self, index: usize, dimensions: Dimensions) -> Result<()> {
        self.item_mut(index)?.set_dimensions(dimensions);
        Ok(())
    }

    /// Move an item to a new display position
    pub fn move_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from)?;
        self.check_index(to)?;
        let item = self.items.remove(from);
        self.items.insert(to, item);
        Ok(())
    }

    pub fn totals(&self) -> QuoteTotals {
        calculate_quote_totals(
            &self.items,
            self.discount_mode,
            round_percent(self.overall_discount_percent),
            self.tax_rate_percent.map(round_tax_rate),
        )
    }

    /// Price the draft as it stands, line by line
    pub fn preview(&self) -> QuotePreview {
        QuotePreview {
            lines: calculate_line_totals(&self.items, self.discount_mode),
            totals: self.totals(),
        }
    }

    fn item_mut(&mut self, index: usize) -> Result<&mut DraftItem> {
        let len = self.items.len();
        self.items
            .get_mut(index)
            .ok_or_else(|| AppError::validation(format!("No item at position {} (draft has {} items)", index, len)))
    }

    fn check_index(&self, index: usize) -> Result<()> {
        if index >= self.items.len() {
            return Err(AppError::validation(format!(
                "No item at position {} (draft has {} items)",
                index,
                self.items.len()
            )));
        }
        Ok(())
    }
}
