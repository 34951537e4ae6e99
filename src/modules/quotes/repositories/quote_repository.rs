// Quote storage
//
// Quotes, their items and policy clauses live in three tables. Writes that
// change an existing quote are conditioned on the expected prior status
// (and version, for content edits); zero affected rows means another writer
// got there first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{MySql, MySqlPool, Transaction};
use std::str::FromStr;

use crate::core::{AppError, Result};
use crate::modules::pricing::DiscountMode;
use super::revision_repository::insert_revision;
use crate::modules::quotes::models::{
    Dimensions, PolicyClause, Quote, QuoteFilter, QuoteItem, QuoteRevision, QuoteStatus,
};

#[async_trait]
pub trait QuoteRepository: Send + Sync {
    /// Insert a new quote with its items and policies
    async fn create(&self, quote: &Quote) -> Result<Quote>;

    async fn find_by_id(&self, id: &str) -> Result<Option<Quote>>;

    /// Newest first
    async fn list(&self, filter: &QuoteFilter) -> Result<Vec<Quote>>;

    /// Replace header, totals, items and policies, provided the stored quote
    /// is still at `expected_version` and `expected_status`
    ///
    /// `revision` (the replaced version) is recorded atomically with the
    /// write; a revision already present for that version is a conflict.
    async fn update_content(
        &self,
        quote: &Quote,
        revision: &QuoteRevision,
        expected_version: i64,
        expected_status: QuoteStatus,
    ) -> Result<Quote>;

    /// Write status and approval fields, provided the stored status is still
    /// `expected_status`
    async fn update_status(&self, quote: &Quote, expected_status: QuoteStatus) -> Result<Quote>;
}

/// MySQL-backed quote repository
#[derive(Clone)]
pub struct MySqlQuoteRepository {
    pool: MySqlPool,
}

impl MySqlQuoteRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }

    async fn load_children(&self, row: QuoteRow) -> Result<Quote> {
        let items = sqlx::query_as::<_, QuoteItemRow>(
            r#"
            SELECT id, quote_id, product_id, description, quantity, rate,
                   discount_percent, dim_length, dim_width, sort_order
            FROM quote_items
            WHERE quote_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch quote items: {}", e)))?;

        let policies = sqlx::query_as::<_, PolicyClauseRow>(
            r#"
            SELECT id, quote_id, clause_type, title, description, is_active, sort_order
            FROM quote_policies
            WHERE quote_id = ?
            ORDER BY sort_order, id
            "#,
        )
        .bind(&row.id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch quote policies: {}", e)))?;

        row.into_quote(items, policies)
    }

    async fn replace_children(tx: &mut Transaction<'_, MySql>, quote: &Quote) -> Result<()> {
        sqlx::query("DELETE FROM quote_items WHERE quote_id = ?")
            .bind(&quote.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear quote items: {}", e)))?;

        sqlx::query("DELETE FROM quote_policies WHERE quote_id = ?")
            .bind(&quote.id)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to clear quote policies: {}", e)))?;

        Self::insert_children(tx, quote).await
    }

    async fn insert_children(tx: &mut Transaction<'_, MySql>, quote: &Quote) -> Result<()> {
        for item in &quote.items {
            let (length, width) = item
                .dimensions
                .map(|d| (d.length, d.width))
                .unwrap_or((None, None));

            sqlx::query(
                r#"
                INSERT INTO quote_items (
                    id, quote_id, product_id, description, quantity, rate,
                    discount_percent, dim_length, dim_width, sort_order
                ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&item.id)
            .bind(&quote.id)
            .bind(&item.product_id)
            .bind(&item.description)
            .bind(item.quantity)
            .bind(item.rate)
            .bind(item.discount_percent)
            .bind(length)
            .bind(width)
            .bind(item.order)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to insert quote item: {}", e)))?;
        }

        for policy in &quote.policies {
            sqlx::query(
                r#"
                INSERT INTO quote_policies (
                    id, quote_id, clause_type, title, description, is_active, sort_order
                ) VALUES (?, ?, ?, ?, ?, ?, ?)
                "#,
            )
            .bind(&policy.id)
            .bind(&quote.id)
            .bind(&policy.clause_type)
            .bind(&policy.title)
            .bind(&policy.description)
            .bind(policy.is_active)
            .bind(policy.order)
            .execute(&mut **tx)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to insert quote policy: {}", e)))?;
        }

        Ok(())
    }

    /// Explain why a conditioned write matched no rows
    async fn write_conflict(
        &self,
        id: &str,
        expected_version: Option<i64>,
        expected_status: QuoteStatus,
    ) -> AppError {
        let current = sqlx::query_as::<_, (i64, String)>("SELECT version, status FROM quotes WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await;

        match current {
            Ok(None) => AppError::not_found(format!("Quote '{}' not found", id)),
            Ok(Some((version, status))) => match expected_version {
                Some(expected) => AppError::conflict(format!(
                    "Quote '{}' changed concurrently: expected version {} in {} status, found version {} in {} status",
                    id, expected, expected_status, version, status
                )),
                None => AppError::conflict(format!(
                    "Quote '{}' changed concurrently: expected {} status, found {}",
                    id, expected_status, status
                )),
            },
            Err(e) => AppError::Database(e),
        }
    }
}

#[async_trait]
impl QuoteRepository for MySqlQuoteRepository {
    async fn create(&self, quote: &Quote) -> Result<Quote> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        sqlx::query(
            r#"
            INSERT INTO quotes (
                id, quote_number, title, client_id, template_id, discount_mode,
                overall_discount_percent, tax_rate_percent, status, is_approved,
                approved_by, approved_at, approval_notes, subtotal, discount_amount,
                net_amount, tax_amount, grand_total, version, created_by, sent_at,
                accepted_at, created_at, updated_at
            ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(&quote.id)
        .bind(&quote.quote_number)
        .bind(&quote.title)
        .bind(&quote.client_id)
        .bind(&quote.template_id)
        .bind(quote.discount_mode.as_str())
        .bind(quote.overall_discount_percent)
        .bind(quote.tax_rate_percent)
        .bind(quote.status.as_str())
        .bind(quote.is_approved)
        .bind(&quote.approved_by)
        .bind(quote.approved_at)
        .bind(&quote.approval_notes)
        .bind(quote.subtotal)
        .bind(quote.discount_amount)
        .bind(quote.net_amount)
        .bind(quote.tax_amount)
        .bind(quote.grand_total)
        .bind(quote.version)
        .bind(&quote.created_by)
        .bind(quote.sent_at)
        .bind(quote.accepted_at)
        .bind(quote.created_at)
        .bind(quote.updated_at)
        .execute(&mut *tx)
        .await
        .map_err(|e| {
            if let Some(db_err) = e.as_database_error() {
                if db_err.is_unique_violation() {
                    return AppError::conflict(format!(
                        "Quote number '{}' already exists",
                        quote.quote_number
                    ));
                }
            }
            AppError::Internal(format!("Failed to create quote: {}", e))
        })?;

        Self::insert_children(&mut tx, quote).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(quote.clone())
    }

    async fn find_by_id(&self, id: &str) -> Result<Option<Quote>> {
        let row = sqlx::query_as::<_, QuoteRow>(&format!("{} WHERE id = ?", SELECT_QUOTE))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch quote: {}", e)))?;

        match row {
            Some(row) => Ok(Some(self.load_children(row).await?)),
            None => Ok(None),
        }
    }

    async fn list(&self, filter: &QuoteFilter) -> Result<Vec<Quote>> {
        let rows = sqlx::query_as::<_, QuoteRow>(&format!(
            r#"{}
            WHERE (? IS NULL OR status = ?)
              AND (? IS NULL OR client_id = ?)
            ORDER BY created_at DESC
            LIMIT ? OFFSET ?"#,
            SELECT_QUOTE
        ))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(filter.status.map(|s| s.as_str()))
        .bind(&filter.client_id)
        .bind(&filter.client_id)
        .bind(filter.effective_limit())
        .bind(filter.effective_offset())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to list quotes: {}", e)))?;

        let mut quotes = Vec::with_capacity(rows.len());
        for row in rows {
            quotes.push(self.load_children(row).await?);
        }
        Ok(quotes)
    }

    async fn update_content(
        &self,
        quote: &Quote,
        revision: &QuoteRevision,
        expected_version: i64,
        expected_status: QuoteStatus,
    ) -> Result<Quote> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to start transaction: {}", e)))?;

        insert_revision(&mut *tx, revision).await?;

        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET title = ?, client_id = ?, template_id = ?, discount_mode = ?,
                overall_discount_percent = ?, tax_rate_percent = ?, status = ?,
                is_approved = ?, approved_by = ?, approved_at = ?, approval_notes = ?,
                subtotal = ?, discount_amount = ?, net_amount = ?, tax_amount = ?,
                grand_total = ?, version = ?, sent_at = ?, updated_at = ?
            WHERE id = ? AND version = ? AND status = ?
            "#,
        )
        .bind(&quote.title)
        .bind(&quote.client_id)
        .bind(&quote.template_id)
        .bind(quote.discount_mode.as_str())
        .bind(quote.overall_discount_percent)
        .bind(quote.tax_rate_percent)
        .bind(quote.status.as_str())
        .bind(quote.is_approved)
        .bind(&quote.approved_by)
        .bind(quote.approved_at)
        .bind(&quote.approval_notes)
        .bind(quote.subtotal)
        .bind(quote.discount_amount)
        .bind(quote.net_amount)
        .bind(quote.tax_amount)
        .bind(quote.grand_total)
        .bind(quote.version)
        .bind(quote.sent_at)
        .bind(quote.updated_at)
        .bind(&quote.id)
        .bind(expected_version)
        .bind(expected_status.as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update quote: {}", e)))?;

        if result.rows_affected() == 0 {
            tx.rollback().await.ok();
            return Err(self
                .write_conflict(&quote.id, Some(expected_version), expected_status)
                .await);
        }

        Self::replace_children(&mut tx, quote).await?;

        tx.commit()
            .await
            .map_err(|e| AppError::Internal(format!("Failed to commit transaction: {}", e)))?;

        Ok(quote.clone())
    }

    async fn update_status(&self, quote: &Quote, expected_status: QuoteStatus) -> Result<Quote> {
        let result = sqlx::query(
            r#"
            UPDATE quotes
            SET status = ?, is_approved = ?, approved_by = ?, approved_at = ?,
                approval_notes = ?, sent_at = ?, accepted_at = ?, updated_at = ?
            WHERE id = ? AND status = ?
            "#,
        )
        .bind(quote.status.as_str())
        .bind(quote.is_approved)
        .bind(&quote.approved_by)
        .bind(quote.approved_at)
        .bind(&quote.approval_notes)
        .bind(quote.sent_at)
        .bind(quote.accepted_at)
        .bind(quote.updated_at)
        .bind(&quote.id)
        .bind(expected_status.as_str())
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to update quote status: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(self.write_conflict(&quote.id, None, expected_status).await);
        }

        Ok(quote.clone())
    }
}

const SELECT_QUOTE: &str = r#"
    SELECT id, quote_number, title, client_id, template_id, discount_mode,
           overall_discount_percent, tax_rate_percent, status, is_approved,
           approved_by, approved_at, approval_notes, subtotal, discount_amount,
           net_amount, tax_amount, grand_total, version, created_by, sent_at,
           accepted_at, created_at, updated_at
    FROM quotes"#;

// Row structs: the storage shape, converted explicitly at this boundary

#[derive(Debug, sqlx::FromRow)]
struct QuoteRow {
    id: String,
    quote_number: String,
    title: String,
    client_id: Option<String>,
    template_id: Option<String>,
    discount_mode: String,
    overall_discount_percent: Decimal,
    tax_rate_percent: Decimal,
    status: String,
    is_approved: bool,
    approved_by: Option<String>,
    approved_at: Option<DateTime<Utc>>,
    approval_notes: Option<String>,
    subtotal: Decimal,
    discount_amount: Decimal,
    net_amount: Decimal,
    tax_amount: Decimal,
    grand_total: Decimal,
    version: i64,
    created_by: String,
    sent_at: Option<DateTime<Utc>>,
    accepted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl QuoteRow {
    fn into_quote(self, items: Vec<QuoteItemRow>, policies: Vec<PolicyClauseRow>) -> Result<Quote> {
        let status = QuoteStatus::from_str(&self.status)
            .map_err(|e| AppError::Internal(format!("Invalid status in database: {}", e)))?;
        let discount_mode = DiscountMode::from_str(&self.discount_mode)
            .map_err(|e| AppError::Internal(format!("Invalid discount mode in database: {}", e)))?;

        Ok(Quote {
            id: self.id,
            quote_number: self.quote_number,
            title: self.title,
            client_id: self.client_id,
            template_id: self.template_id,
            discount_mode,
            overall_discount_percent: self.overall_discount_percent,
            tax_rate_percent: self.tax_rate_percent,
            status,
            is_approved: self.is_approved,
            approved_by: self.approved_by,
            approved_at: self.approved_at,
            approval_notes: self.approval_notes,
            subtotal: self.subtotal,
            discount_amount: self.discount_amount,
            net_amount: self.net_amount,
            tax_amount: self.tax_amount,
            grand_total: self.grand_total,
            version: self.version,
            items: items.into_iter().map(QuoteItemRow::into_item).collect(),
            policies: policies.into_iter().map(PolicyClauseRow::into_policy).collect(),
            created_by: self.created_by,
            sent_at: self.sent_at,
            accepted_at: self.accepted_at,
            created_at: self.created_at,
            updated_at: self.updated_at,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct QuoteItemRow {
    id: String,
    #[allow(dead_code)]
    quote_id: String,
    product_id: String,
    description: Option<String>,
    quantity: Decimal,
    rate: Decimal,
    discount_percent: Decimal,
    dim_length: Option<Decimal>,
    dim_width: Option<Decimal>,
    sort_order: i32,
}

impl QuoteItemRow {
    fn into_item(self) -> QuoteItem {
        let dimensions = if self.dim_length.is_some() || self.dim_width.is_some() {
            Some(Dimensions {
                length: self.dim_length,
                width: self.dim_width,
            })
        } else {
            None
        };

        QuoteItem {
            id: self.id,
            product_id: self.product_id,
            description: self.description,
            quantity: self.quantity,
            rate: self.rate,
            discount_percent: self.discount_percent,
            dimensions,
            order: self.sort_order,
        }
    }
}

#[derive(Debug, sqlx::FromRow)]
struct PolicyClauseRow {
    id: String,
    #[allow(dead_code)]
    quote_id: String,
    clause_type: String,
    title: String,
    description: String,
    is_active: bool,
    sort_order: i32,
}

impl PolicyClauseRow {
    fn into_policy(self) -> PolicyClause {
        PolicyClause {
            id: self.id,
            clause_type: self.clause_type,
            title: self.title,
            description: self.description,
            is_active: self.is_active,
            order: self.sort_order,
        }
    }
}
