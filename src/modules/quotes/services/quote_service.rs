use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use chrono::Utc;
use rust_decimal::Decimal;
use uuid::Uuid;

use super::lifecycle::{QuoteEvent, QuoteLifecycle};
use super::quote_number::QuoteNumberGenerator;
use crate::core::money::{clamp_percent, round_percent, round_tax_rate};
use crate::core::{AppError, Result};
use crate::middleware::auth::Principal;
use crate::modules::catalog::{ClientDirectory, Product, ProductCatalog};
use crate::modules::pricing::services::effective_tax_rate;
use crate::modules::pricing::{calculate_category_subtotals, calculate_quote_totals, CategorySubtotal};
use crate::modules::quotes::models::{
    PolicyClause, Quote, QuoteContent, QuoteDraft, QuoteFilter, QuoteItem, QuotePreview,
    QuoteRevision,
};
use crate::modules::quotes::repositories::{QuoteRepository, RevisionRepository};

const MAX_TITLE_LENGTH: usize = 255;

/// Quantities, rates and dimensions are DECIMAL(19,4): below 10^15
const STORED_QUANTITY_LIMIT: Decimal = Decimal::from_parts(0xA4C6_8000, 0x0003_8D7E, 0, false, 0);

/// Money columns are DECIMAL(19,2): below 10^17
const STORED_AMOUNT_LIMIT: Decimal = Decimal::from_parts(0x5D8A_0000, 0x0163_4578, 0, false, 0);

/// Tax rate column is DECIMAL(7,4)
const STORED_TAX_RATE_LIMIT: Decimal = Decimal::from_parts(1000, 0, 0, false, 0);

/// Quote business logic: validation, catalog lookups, pricing and lifecycle
pub struct QuoteService {
    quotes: Arc<dyn QuoteRepository>,
    revisions: Arc<dyn RevisionRepository>,
    products: Arc<dyn ProductCatalog>,
    clients: Arc<dyn ClientDirectory>,
    numbers: QuoteNumberGenerator,
}

impl QuoteService {
    pub fn new(
        quotes: Arc<dyn QuoteRepository>,
        revisions: Arc<dyn RevisionRepository>,
        products: Arc<dyn ProductCatalog>,
        clients: Arc<dyn ClientDirectory>,
        numbers: QuoteNumberGenerator,
    ) -> Self {
        Self {
            quotes,
            revisions,
            products,
            clients,
            numbers,
        }
    }

    /// Price a draft without storing anything
    pub fn preview(&self, draft: &QuoteDraft) -> QuotePreview {
        draft.preview()
    }

    /// Validate, price and store a new DRAFT quote at version 1
    ///
    /// A quote-number collision is retried with a fresh number up to
    /// `QuoteNumberGenerator::MAX_ATTEMPTS` times.
    pub async fn create_quote(&self, draft: QuoteDraft, actor: &Principal) -> Result<Quote> {
        let content = self.build_content(draft).await?;
        let now = Utc::now();

        let mut quote = Quote::new(
            Uuid::new_v4().to_string(),
            self.numbers.next(now),
            content,
            actor.user_id.clone(),
            now,
        );

        let mut attempt = 1;
        let created = loop {
            match self.quotes.create(&quote).await {
                Err(AppError::Conflict(reason)) if attempt < QuoteNumberGenerator::MAX_ATTEMPTS => {
                    tracing::warn!(
                        quote_number = %quote.quote_number,
                        attempt,
                        reason = %reason,
                        "Quote number taken, drawing another"
                    );
                    quote.quote_number = self.numbers.next(now);
                    attempt += 1;
                }
                other => break other?,
            }
        };

        tracing::info!(
            quote_id = %created.id,
            quote_number = %created.quote_number,
            actor = %actor.user_id,
            grand_total = %created.grand_total,
            "Quote created"
        );

        Ok(created)
    }

    pub async fn get_quote(&self, id: &str) -> Result<Quote> {
        self.quotes
            .find_by_id(id)
            .await?
            .ok_or_else(|| AppError::not_found(format!("Quote '{}' not found", id)))
    }

    pub async fn list_quotes(&self, filter: &QuoteFilter) -> Result<Vec<Quote>> {
        self.quotes.list(filter).await
    }

    /// Replace a quote's content
    ///
    /// The replaced version is written to the revision ledger in the same
    /// store operation. SENT and REJECTED quotes fall back to DRAFT and need
    /// approval again; every other status is kept.
    pub async fn update_quote(
        &self,
        id: &str,
        draft: QuoteDraft,
        actor: &Principal,
        expected_version: Option<i64>,
    ) -> Result<Quote> {
        let current = self.get_quote(id).await?;

        if let Some(expected) = expected_version {
            if expected != current.version {
                return Err(AppError::conflict(format!(
                    "Quote '{}' is at version {}, not {}",
                    id, current.version, expected
                )));
            }
        }

        let now = Utc::now();
        let transition = QuoteLifecycle::apply(&current, &QuoteEvent::Edit, actor, now)?;
        let content = self.build_content(draft).await?;

        let mut next = transition.quote;
        next.apply_content(content, now);

        let revision = QuoteRevision::capture(&current, &actor.user_id, now);
        let saved = self
            .quotes
            .update_content(&next, &revision, current.version, current.status)
            .await?;

        tracing::info!(
            quote_id = %saved.id,
            from = %transition.from,
            to = %saved.status,
            version = saved.version,
            actor = %actor.user_id,
            "Quote updated"
        );

        Ok(saved)
    }

    pub async fn request_approval(&self, id: &str, actor: &Principal) -> Result<Quote> {
        self.transition(id, QuoteEvent::RequestApproval, actor).await
    }

    pub async fn approve(&self, id: &str, notes: Option<String>, actor: &Principal) -> Result<Quote> {
        self.transition(id, QuoteEvent::Approve { notes }, actor).await
    }

    pub async fn reject(&self, id: &str, notes: Option<String>, actor: &Principal) -> Result<Quote> {
        self.transition(id, QuoteEvent::Reject { notes }, actor).await
    }

    pub async fn send_to_client(&self, id: &str, actor: &Principal) -> Result<Quote> {
        self.transition(id, QuoteEvent::SendToClient, actor).await
    }

    pub async fn accept(&self, id: &str, actor: &Principal) -> Result<Quote> {
        self.transition(id, QuoteEvent::Accept, actor).await
    }

    /// Revision ledger for a quote, newest first
    pub async fn list_revisions(&self, id: &str) -> Result<Vec<QuoteRevision>> {
        self.get_quote(id).await?;
        self.revisions.list_for_quote(id).await
    }

    /// Subtotals per product category for a stored quote
    pub async fn category_breakdown(&self, id: &str) -> Result<Vec<CategorySubtotal>> {
        let quote = self.get_quote(id).await?;
        let product_ids: Vec<String> = quote.items.iter().map(|i| i.product_id.clone()).collect();
        let products = self.products_by_id(&product_ids).await?;

        Ok(calculate_category_subtotals(
            &quote.items,
            quote.discount_mode,
            |product_id| products.get(product_id).and_then(|p| p.category_name.clone()),
        ))
    }

    async fn transition(&self, id: &str, event: QuoteEvent, actor: &Principal) -> Result<Quote> {
        let current = self.get_quote(id).await?;
        let transition = QuoteLifecycle::apply(&current, &event, actor, Utc::now())?;

        if !transition.changed {
            tracing::debug!(
                quote_id = %current.id,
                event = event.name(),
                status = %current.status,
                "Event left quote unchanged"
            );
            return Ok(transition.quote);
        }

        let saved = self
            .quotes
            .update_status(&transition.quote, transition.from)
            .await?;

        tracing::info!(
            quote_id = %saved.id,
            event = event.name(),
            from = %transition.from,
            to = %saved.status,
            actor = %actor.user_id,
            "Quote status changed"
        );

        Ok(saved)
    }

    /// Validate a draft and resolve it against the catalog
    async fn build_content(&self, draft: QuoteDraft) -> Result<QuoteContent> {
        let title = draft.title.trim().to_string();
        if title.is_empty() {
            return Err(AppError::validation("Quote title is required"));
        }
        if title.chars().count() > MAX_TITLE_LENGTH {
            return Err(AppError::validation(format!(
                "Quote title must be at most {} characters",
                MAX_TITLE_LENGTH
            )));
        }
        if draft.items.is_empty() {
            return Err(AppError::validation("Quote must have at least one item"));
        }
        if let Some(index) = draft.items.iter().position(|i| i.product_id.trim().is_empty()) {
            return Err(AppError::validation(format!("Item {} has no product", index + 1)));
        }

        let client_id = draft.client_id.filter(|c| !c.trim().is_empty());
        if let Some(client_id) = &client_id {
            if !self.clients.exists(client_id).await? {
                return Err(AppError::not_found(format!("Client '{}' not found", client_id)));
            }
        }

        let product_ids: Vec<String> = draft.items.iter().map(|i| i.product_id.clone()).collect();
        let products = self.products_by_id(&product_ids).await?;

        let mut items = Vec::with_capacity(draft.items.len());
        for (index, item) in draft.items.into_iter().enumerate() {
            let product = products
                .get(&item.product_id)
                .ok_or_else(|| AppError::not_found(format!("Product '{}' not found", item.product_id)))?;

            let item = QuoteItem::new(
                Uuid::new_v4().to_string(),
                item.product_id,
                item.description,
                item.quantity,
                item.rate.unwrap_or(product.base_rate),
                item.discount_percent,
                item.dimensions,
                index as i32,
            );
            if !fits_stored_quantity(&item) {
                return Err(AppError::validation(format!(
                    "Item {} quantity, rate or dimensions are too large",
                    index + 1
                )));
            }
            items.push(item);
        }

        let overall_discount_percent = round_percent(clamp_percent(draft.overall_discount_percent));
        let tax_rate_percent = round_tax_rate(effective_tax_rate(draft.tax_rate_percent));
        if tax_rate_percent >= STORED_TAX_RATE_LIMIT {
            return Err(AppError::validation(format!(
                "Tax rate must be below {}%",
                STORED_TAX_RATE_LIMIT
            )));
        }

        let totals = calculate_quote_totals(
            &items,
            draft.discount_mode,
            overall_discount_percent,
            Some(tax_rate_percent),
        );
        if totals.subtotal.max(totals.grand_total) >= STORED_AMOUNT_LIMIT {
            return Err(AppError::validation("Quote total is too large"));
        }

        let mut policies = Vec::with_capacity(draft.policies.len());
        for (index, policy) in draft.policies.into_iter().enumerate() {
            if policy.title.trim().is_empty() {
                return Err(AppError::validation(format!("Policy {} has no title", index + 1)));
            }
            policies.push(PolicyClause {
                id: Uuid::new_v4().to_string(),
                clause_type: policy.clause_type,
                title: policy.title.trim().to_string(),
                description: policy.description,
                is_active: policy.is_active,
                order: index as i32,
            });
        }

        Ok(QuoteContent {
            title,
            client_id,
            template_id: draft.template_id.filter(|t| !t.trim().is_empty()),
            discount_mode: draft.discount_mode,
            overall_discount_percent,
            tax_rate_percent,
            items,
            policies,
        })
    }

    async fn products_by_id(&self, ids: &[String]) -> Result<HashMap<String, Product>> {
        let unique: Vec<String> = ids
            .iter()
            .cloned()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();

        Ok(self
            .products
            .find_by_ids(&unique)
            .await?
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect())
    }
}

fn fits_stored_quantity(item: &QuoteItem) -> bool {
    let sides = item
        .dimensions
        .iter()
        .flat_map(|d| [d.length, d.width])
        .flatten();
    [item.quantity, item.rate]
        .into_iter()
        .chain(sides)
        .all(|value| value.abs() < STORED_QUANTITY_LIMIT)
}
