use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::quote::Quote;
use super::quote_item::QuoteItem;
use super::quote_status::QuoteStatus;
use crate::modules::pricing::{DiscountMode, QuoteTotals};

/// Frozen copy of a quote's priced content at one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteSnapshot {
    pub title: String,
    pub status: QuoteStatus,
    pub discount_mode: DiscountMode,
    pub overall_discount_percent: Decimal,
    pub tax_rate_percent: Decimal,
    pub totals: QuoteTotals,
    pub items: Vec<QuoteItem>,
}

impl QuoteSnapshot {
    pub fn of(quote: &Quote) -> Self {
        Self {
            title: quote.title.clone(),
            status: quote.status,
            discount_mode: quote.discount_mode,
            overall_discount_percent: quote.overall_discount_percent,
            tax_rate_percent: quote.tax_rate_percent,
            totals: quote.totals(),
            items: quote.items.clone(),
        }
    }
}

/// Append-only ledger entry; `version` is the version that was replaced
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuoteRevision {
    pub id: String,
    pub quote_id: String,
    pub version: i64,
    pub snapshot: QuoteSnapshot,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
}

impl QuoteRevision {
    /// Snapshot `quote` as it is now, before it gets overwritten
    pub fn capture(quote: &Quote, created_by: &str, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            quote_id: quote.id.clone(),
            version: quote.version,
            snapshot: QuoteSnapshot::of(quote),
            created_by: created_by.to_string(),
            created_at: now,
        }
    }
}
