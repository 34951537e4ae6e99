use async_trait::async_trait;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};

/// Existence checks against the client list
#[async_trait]
pub trait ClientDirectory: Send + Sync {
    async fn exists(&self, client_id: &str) -> Result<bool>;
}

pub struct MySqlClientDirectory {
    pool: MySqlPool,
}

impl MySqlClientDirectory {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ClientDirectory for MySqlClientDirectory {
    async fn exists(&self, client_id: &str) -> Result<bool> {
        let found = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM clients WHERE id = ?")
            .bind(client_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to look up client: {}", e)))?;

        Ok(found > 0)
    }
}
