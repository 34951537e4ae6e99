// Quote aggregate: header, computed totals, items and policy clauses.
//
// Totals are always derived from the items via the pricing functions; they
// are stored so documents and listings can read them without re-pricing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::policy_clause::PolicyClause;
use super::quote_item::QuoteItem;
use super::quote_status::QuoteStatus;
use crate::modules::pricing::{calculate_quote_totals, DiscountMode, LineBreakdown, QuoteTotals};

/// Editable part of a quote, already validated and normalised
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuoteContent {
    pub title: String,
    pub client_id: Option<String>,
    pub template_id: Option<String>,
    pub discount_mode: DiscountMode,
    pub overall_discount_percent: Decimal,
    pub tax_rate_percent: Decimal,
    pub items: Vec<QuoteItem>,
    pub policies: Vec<PolicyClause>,
}

/// Persisted quote
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quote {
    pub id: String,

    /// Human-readable number, assigned once at creation
    pub quote_number: String,

    pub title: String,
    pub client_id: Option<String>,
    pub template_id: Option<String>,

    pub discount_mode: DiscountMode,
    pub overall_discount_percent: Decimal,
    pub tax_rate_percent: Decimal,

    pub status: QuoteStatus,
    pub is_approved: bool,
    pub approved_by: Option<String>,
    pub approved_at: Option<DateTime<Utc>>,
    pub approval_notes: Option<String>,

    pub subtotal: Decimal,
    pub discount_amount: Decimal,
    pub net_amount: Decimal,
    pub tax_amount: Decimal,
    pub grand_total: Decimal,

    /// Bumped on every content change, never by status transitions
    pub version: i64,

    pub items: Vec<QuoteItem>,
    pub policies: Vec<PolicyClause>,

    pub created_by: String,
    pub sent_at: Option<DateTime<Utc>>,
    pub accepted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Quote {
    /// New DRAFT quote at version 1 with totals computed from `content`
    pub fn new(
        id: String,
        quote_number: String,
        content: QuoteContent,
        created_by: String,
        now: DateTime<Utc>,
    ) -> Self {
        let mut quote = Self {
            id,
            quote_number,
            title: String::new(),
            client_id: None,
            template_id: None,
            discount_mode: DiscountMode::default(),
            overall_discount_percent: Decimal::ZERO,
            tax_rate_percent: Decimal::ZERO,
            status: QuoteStatus::Draft,
            is_approved: false,
            approved_by: None,
            approved_at: None,
            approval_notes: None,
            subtotal: Decimal::ZERO,
            discount_amount: Decimal::ZERO,
            net_amount: Decimal::ZERO,
            tax_amount: Decimal::ZERO,
            grand_total: Decimal::ZERO,
            version: 1,
            items: Vec::new(),
            policies: Vec::new(),
            created_by,
            sent_at: None,
            accepted_at: None,
            created_at: now,
            updated_at: now,
        };
        quote.apply_content(content, now);
        quote
    }

    /// Replace the editable fields and re-price
    ///
    /// Does not touch `version` or `status`; the lifecycle decides those.
    pub fn apply_content(&mut self, content: QuoteContent, now: DateTime<Utc>) {
        self.title = content.title;
        self.client_id = content.client_id;
        self.template_id = content.template_id;
        self.discount_mode = content.discount_mode;
        self.overall_discount_percent = content.overall_discount_percent;
        self.tax_rate_percent = content.tax_rate_percent;
        self.items = content.items;
        self.policies = content.policies;
        self.updated_at = now;
        self.recalculate_totals();
    }

    /// Recompute the stored totals from the current items
    pub fn recalculate_totals(&mut self) {
        let totals = calculate_quote_totals(
            &self.items,
            self.discount_mode,
            self.overall_discount_percent,
            Some(self.tax_rate_percent),
        );
        self.set_totals(totals);
    }

    pub fn totals(&self) -> QuoteTotals {
        QuoteTotals {
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            net_amount: self.net_amount,
            tax_amount: self.tax_amount,
            grand_total: self.grand_total,
        }
    }

    fn set_totals(&mut self, totals: QuoteTotals) {
        self.subtotal = totals.subtotal;
        self.discount_amount = totals.discount_amount;
        self.net_amount = totals.net_amount;
        self.tax_amount = totals.tax_amount;
        self.grand_total = totals.grand_total;
    }
}

/// Filter for listing quotes
#[derive(Debug, Clone, Default, Deserialize)]
pub struct QuoteFilter {
    pub status: Option<QuoteStatus>,
    pub client_id: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl QuoteFilter {
    pub const DEFAULT_LIMIT: i64 = 20;
    pub const MAX_LIMIT: i64 = 100;

    /// Limit clamped to [1, MAX_LIMIT]
    pub fn effective_limit(&self) -> i64 {
        self.limit
            .unwrap_or(Self::DEFAULT_LIMIT)
            .clamp(1, Self::MAX_LIMIT)
    }

    pub fn effective_offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

/// Live pricing of an unsaved draft
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuotePreview {
    pub lines: Vec<LineBreakdown>,
    pub totals: QuoteTotals,
}
