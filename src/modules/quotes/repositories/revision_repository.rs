use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{Executor, MySql, MySqlPool};

use crate::core::{AppError, Result};
use crate::modules::quotes::models::{QuoteRevision, QuoteSnapshot};

/// Append-only store of replaced quote versions
#[async_trait]
pub trait RevisionRepository: Send + Sync {
    /// Record a revision; a second entry for the same (quote, version) is a
    /// conflict
    async fn append(&self, revision: &QuoteRevision) -> Result<QuoteRevision>;

    /// All revisions of a quote, newest version first
    async fn list_for_quote(&self, quote_id: &str) -> Result<Vec<QuoteRevision>>;
}

pub struct MySqlRevisionRepository {
    pool: MySqlPool,
}

impl MySqlRevisionRepository {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl RevisionRepository for MySqlRevisionRepository {
    async fn append(&self, revision: &QuoteRevision) -> Result<QuoteRevision> {
        insert_revision(&self.pool, revision).await?;
        Ok(revision.clone())
    }

    async fn list_for_quote(&self, quote_id: &str) -> Result<Vec<QuoteRevision>> {
        let rows = sqlx::query_as::<_, RevisionRow>(
            r#"
            SELECT id, quote_id, version, snapshot, created_by, created_at
            FROM quote_revisions
            WHERE quote_id = ?
            ORDER BY version DESC
            "#,
        )
        .bind(quote_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to fetch revisions: {}", e)))?;

        rows.into_iter().map(RevisionRow::into_revision).collect()
    }
}

/// Insert a ledger row on any executor, so content updates can record the
/// revision inside their own transaction
pub(crate) async fn insert_revision<'e, E>(executor: E, revision: &QuoteRevision) -> Result<()>
where
    E: Executor<'e, Database = MySql>,
{
    let snapshot = serde_json::to_string(&revision.snapshot)?;

    sqlx::query(
        r#"
        INSERT INTO quote_revisions (id, quote_id, version, snapshot, created_by, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&revision.id)
    .bind(&revision.quote_id)
    .bind(revision.version)
    .bind(snapshot)
    .bind(&revision.created_by)
    .bind(revision.created_at)
    .execute(executor)
    .await
    .map_err(|e| {
        if let Some(db_err) = e.as_database_error() {
            if db_err.is_unique_violation() {
                return AppError::conflict(format!(
                    "Version {} of quote '{}' was already revised",
                    revision.version, revision.quote_id
                ));
            }
        }
        AppError::Internal(format!("Failed to record revision: {}", e))
    })?;

    Ok(())
}

#[derive(Debug, sqlx::FromRow)]
struct RevisionRow {
    id: String,
    quote_id: String,
    version: i64,
    snapshot: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl RevisionRow {
    fn into_revision(self) -> Result<QuoteRevision> {
        let snapshot: QuoteSnapshot = serde_json::from_str(&self.snapshot).map_err(|e| {
            AppError::Internal(format!(
                "Corrupt snapshot for quote '{}' version {}: {}",
                self.quote_id, self.version, e
            ))
        })?;

        Ok(QuoteRevision {
            id: self.id,
            quote_id: self.quote_id,
            version: self.version,
            snapshot,
            created_by: self.created_by,
            created_at: self.created_at,
        })
    }
}
