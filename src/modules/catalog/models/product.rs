use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Catalog product as quotes see it (read-only)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub name: String,

    /// Default rate copied onto a new quote item when none is given
    pub base_rate: Decimal,

    /// Unit of measure, e.g. "sqm", "hour", "piece"
    pub unit: String,

    /// None when the product has no category
    pub category_name: Option<String>,
}
