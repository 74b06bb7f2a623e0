//! Store repository: linked marketplace shops and their OAuth token pairs.
//!
//! Token values are TEXT in the database and wrapped in `SecretString` the
//! moment they are read back.

use chrono::{DateTime, Utc};
use sqlx::PgPool;

use sellerdesk_core::StoreId;

use super::RepositoryError;
use crate::models::{OAuthToken, Store};

/// Repository for store database operations.
pub struct StoreRepository<'a> {
    pool: &'a PgPool,
}

const STORE_COLUMNS: &str = "id, shop_type, region, store_name, seller_profile, \
     access_token, access_expires_at, refresh_token, refresh_expires_at, \
     created_at, updated_at";

#[derive(Debug, sqlx::FromRow)]
struct StoreRow {
    id: i32,
    shop_type: String,
    region: String,
    store_name: String,
    seller_profile: serde_json::Value,
    access_token: String,
    access_expires_at: DateTime<Utc>,
    refresh_token: String,
    refresh_expires_at: DateTime<Utc>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<StoreRow> for Store {
    fn from(row: StoreRow) -> Self {
        Self {
            id: StoreId::new(row.id),
            shop_type: row.shop_type,
            region: row.region,
            store_name: row.store_name,
            seller_profile: row.seller_profile,
            access: OAuthToken::new(row.access_token, row.access_expires_at),
            refresh: OAuthToken::new(row.refresh_token, row.refresh_expires_at),
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

/// Input for creating a store after a successful OAuth exchange.
#[derive(Debug)]
pub struct NewStore<'a> {
    pub shop_type: &'a str,
    pub region: &'a str,
    pub store_name: &'a str,
    pub seller_profile: &'a serde_json::Value,
    pub access_token: &'a str,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: &'a str,
    pub refresh_expires_at: DateTime<Utc>,
}

impl<'a> StoreRepository<'a> {
    /// Create a new store repository.
    #[must_use]
    pub const fn new(pool: &'a PgPool) -> Self {
        Self { pool }
    }

    /// Get a store by its ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn get_by_id(&self, id: StoreId) -> Result<Option<Store>, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores WHERE id = $1"
        ))
        .bind(id.as_i32())
        .fetch_optional(self.pool)
        .await?;

        Ok(row.map(Store::from))
    }

    /// Persist a newly authorized store.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the insert fails.
    pub async fn create(&self, new: NewStore<'_>) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "INSERT INTO stores
                 (shop_type, region, store_name, seller_profile,
                  access_token, access_expires_at, refresh_token, refresh_expires_at)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(new.shop_type)
        .bind(new.region)
        .bind(new.store_name)
        .bind(new.seller_profile)
        .bind(new.access_token)
        .bind(new.access_expires_at)
        .bind(new.refresh_token)
        .bind(new.refresh_expires_at)
        .fetch_one(self.pool)
        .await?;

        Ok(Store::from(row))
    }

    /// Replace the store's token pair after a refresh.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the store does not exist.
    pub async fn update_tokens(
        &self,
        id: StoreId,
        access_token: &str,
        access_expires_at: DateTime<Utc>,
        refresh_token: &str,
        refresh_expires_at: DateTime<Utc>,
    ) -> Result<Store, RepositoryError> {
        let row = sqlx::query_as::<_, StoreRow>(&format!(
            "UPDATE stores
             SET access_token = $2,
                 access_expires_at = $3,
                 refresh_token = $4,
                 refresh_expires_at = $5,
                 updated_at = now()
             WHERE id = $1
             RETURNING {STORE_COLUMNS}"
        ))
        .bind(id.as_i32())
        .bind(access_token)
        .bind(access_expires_at)
        .bind(refresh_token)
        .bind(refresh_expires_at)
        .fetch_optional(self.pool)
        .await?
        .ok_or(RepositoryError::NotFound)?;

        Ok(Store::from(row))
    }

    /// List every linked store, newest first.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn list(&self) -> Result<Vec<Store>, RepositoryError> {
        let rows = sqlx::query_as::<_, StoreRow>(&format!(
            "SELECT {STORE_COLUMNS} FROM stores ORDER BY created_at DESC"
        ))
        .fetch_all(self.pool)
        .await?;

        Ok(rows.into_iter().map(Store::from).collect())
    }

    /// Delete a store. Products cascade.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Database` if the query fails.
    pub async fn delete(&self, id: StoreId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM stores WHERE id = $1")
            .bind(id.as_i32())
            .execute(self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
