use serde::{Deserialize, Serialize};

/// Selects where discounts apply when pricing a quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiscountMode {
    /// Each item's own discount percentage, nothing overall
    #[default]
    LineItem,

    /// One discount on the subtotal; per-item discounts are ignored
    Overall,

    /// Item discounts first, then the overall discount on the net subtotal
    Both,
}

impl DiscountMode {
    /// Whether per-item discount percentages take effect in this mode
    pub fn applies_line_discounts(&self) -> bool {
        matches!(self, DiscountMode::LineItem | DiscountMode::Both)
    }

    /// Whether the overall discount percentage takes effect in this mode
    pub fn applies_overall_discount(&self) -> bool {
        matches!(self, DiscountMode::Overall | DiscountMode::Both)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            DiscountMode::LineItem => "LINE_ITEM",
            DiscountMode::Overall => "OVERALL",
            DiscountMode::Both => "BOTH",
        }
    }
}

impl std::fmt::Display for DiscountMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for DiscountMode {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "LINE_ITEM" => Ok(DiscountMode::LineItem),
            "OVERALL" => Ok(DiscountMode::Overall),
            "BOTH" => Ok(DiscountMode::Both),
            _ => Err(format!("Invalid discount mode: {}", s)),
        }
    }
}
