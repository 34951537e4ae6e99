use async_trait::async_trait;
use rust_decimal::Decimal;
use sqlx::MySqlPool;

use crate::core::{AppError, Result};
use crate::modules::catalog::models::Product;

/// Read access to the product catalog
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>>;

    /// Products for the given ids; unknown ids are simply absent
    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>>;
}

pub struct MySqlProductCatalog {
    pool: MySqlPool,
}

impl MySqlProductCatalog {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

const SELECT_PRODUCT: &str = r#"
    SELECT p.id, p.name, p.base_rate, p.unit, c.name AS category_name
    FROM products p
    LEFT JOIN categories c ON c.id = p.category_id"#;

#[async_trait]
impl ProductCatalog for MySqlProductCatalog {
    async fn find_by_id(&self, id: &str) -> Result<Option<Product>> {
        let row = sqlx::query_as::<_, ProductRow>(&format!("{} WHERE p.id = ?", SELECT_PRODUCT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch product: {}", e)))?;

        Ok(row.map(ProductRow::into_product))
    }

    async fn find_by_ids(&self, ids: &[String]) -> Result<Vec<Product>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let placeholders = vec!["?"; ids.len()].join(", ");
        let sql = format!("{} WHERE p.id IN ({})", SELECT_PRODUCT, placeholders);

        let mut query = sqlx::query_as::<_, ProductRow>(&sql);
        for id in ids {
            query = query.bind(id);
        }

        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to fetch products: {}", e)))?;

        Ok(rows.into_iter().map(ProductRow::into_product).collect())
    }
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: String,
    name: String,
    base_rate: Decimal,
    unit: String,
    category_name: Option<String>,
}

impl ProductRow {
    fn into_product(self) -> Product {
        Product {
            id: self.id,
            name: self.name,
            base_rate: self.base_rate,
            unit: self.unit,
            category_name: self.category_name,
        }
    }
}
