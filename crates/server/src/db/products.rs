//! Product repository.
//!
//! Products are written in batches by the catalog pull and only ever read
//! back in bulk; there is no per-product mutation path.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sellerdesk_core::{ProductId, StoreId};

use super::RepositoryError;
use crate::models::Product;

/// Repository for product database operations.
pub struct ProductRepository<'a> {
    pool: &'a PgPool,
}

#[derive(Debug, sqlx::FromRow)]
struct ProductRow {
    id: i32,
    store_id: i32,
    payload: serde_json::Value,
    created_at: DateTime<Utc>,
}

impl From<ProductRow> for Product {
    fn from(row: ProductRow) -> Self {
        Self {
            id: ProductId::new(row.id),
            store_id: StoreId::new(row.store_id),
            payload: row.payload,
            created_at: row.created_at,
        }
    }
}

impl<'a> ProductRepository<'a> {
    /// Create a new product repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Insert one page of product payloads for a store.
    ///
    /// Returns the number of rows written.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn insert_batch(
        &self,
        store_id: StoreId,
        payloads: &[serde_json::Value],
    ) -> Result<u64, RepositoryError> {
        if payloads.is_empty() {
            return Ok(0);
        }

        let result = sqlx::query(
            "INSERT INTO products (store_id, payload)
             SELECT $1, payload FROM UNNEST($2::jsonb[]) AS t(payload)",
        )
        .bind(store_id.as_i32())
        .bind(payloads)
        .execute(self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    /// List all products for a store, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list_for_store(&self, store_id: StoreId) -> Result<Vec<Product>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, store_id, payload, created_at
             FROM products WHERE store_id = $1 ORDER BY id",
        )
        .bind(store_id.as_i32())
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Product::from).collect())
    }
}
