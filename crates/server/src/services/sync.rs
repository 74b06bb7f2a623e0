//! Store linking, token refresh, and the paginated catalog pull.
//!
//! The refresh guard runs before every authenticated marketplace call.
//! Refreshes for the same store are serialized through a per-store async
//! mutex; concurrent callers wait, then observe the already-refreshed token
//! instead of refreshing again.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use sqlx::PgPool;
use thiserror::Error;
use tokio::sync::Mutex;
use tracing::instrument;

use sellerdesk_core::StoreId;

use crate::config::LazadaConfig;
use crate::db::stores::NewStore;
use crate::db::{ProductRepository, RepositoryError, StoreRepository};
use crate::lazada::client::PAGE_SIZE;
use crate::lazada::{self, LazadaClient, LazadaError, Region};
use crate::models::Store;

/// Errors from the sync service.
#[derive(Debug, Error)]
pub enum SyncError {
    /// No store with the given id.
    #[error("no store found with this ID")]
    StoreNotFound,

    /// Authorization code missing from the callback.
    #[error("no auth code provided")]
    MissingAuthCode,

    /// Marketplace call failed.
    #[error(transparent)]
    Lazada(#[from] LazadaError),

    /// Database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Per-store locks serializing token refreshes.
#[derive(Debug, Default)]
pub struct RefreshLocks {
    locks: Mutex<HashMap<StoreId, Arc<Mutex<()>>>>,
}

impl RefreshLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get (or create) the lock for one store.
    async fn for_store(&self, id: StoreId) -> Arc<Mutex<()>> {
        let mut locks = self.locks.lock().await;
        Arc::clone(locks.entry(id).or_default())
    }
}

/// One page of product payloads, fetched at an offset.
///
/// Implemented by the region-bound [`LazadaClient`]; tests substitute a
/// scripted source.
pub trait ProductSource {
    /// Fetch the page starting at `offset`. An exhausted catalog returns an
    /// empty page.
    fn fetch_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> impl Future<Output = Result<Vec<serde_json::Value>, LazadaError>> + Send;
}

impl ProductSource for LazadaClient {
    async fn fetch_page(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, LazadaError> {
        self.get_products(offset, limit).await
    }
}

/// Destination for pulled pages. Pages are persisted as they arrive so an
/// upstream failure late in the pull loses at most the in-flight page.
pub trait ProductSink {
    /// Persist one page. Returns the number of items written.
    fn persist(
        &mut self,
        batch: Vec<serde_json::Value>,
    ) -> impl Future<Output = Result<u64, SyncError>> + Send;
}

/// Sink writing batches into the products table for one store.
struct StoreCatalogSink<'a> {
    products: ProductRepository<'a>,
    store_id: StoreId,
}

impl ProductSink for StoreCatalogSink<'_> {
    async fn persist(&mut self, batch: Vec<serde_json::Value>) -> Result<u64, SyncError> {
        let written = self.products.insert_batch(self.store_id, &batch).await?;
        tracing::debug!(store_id = %self.store_id, written, "catalog page persisted");
        Ok(written)
    }
}

/// Fetch pages at increasing offsets until one comes back empty, persisting
/// each page before requesting the next.
pub(crate) async fn pull_pages<S, K>(
    source: &S,
    sink: &mut K,
    page_size: u32,
) -> Result<u64, SyncError>
where
    S: ProductSource + Sync,
    K: ProductSink + Send,
{
    let mut offset = 0;
    let mut total = 0;

    loop {
        let page = source.fetch_page(offset, page_size).await?;
        if page.is_empty() {
            break;
        }

        total += sink.persist(page).await?;
        offset += page_size;
    }

    Ok(total)
}

/// Marketplace sync service: links stores, keeps their tokens fresh, and
/// pulls catalogs.
pub struct SyncService<'a> {
    pool: &'a PgPool,
    http: &'a reqwest::Client,
    config: &'a LazadaConfig,
    locks: &'a RefreshLocks,
}

impl<'a> SyncService<'a> {
    /// Create a new sync service.
    #[must_use]
    pub const fn new(
        pool: &'a PgPool,
        http: &'a reqwest::Client,
        config: &'a LazadaConfig,
        locks: &'a RefreshLocks,
    ) -> Self {
        Self {
            pool,
            http,
            config,
            locks,
        }
    }

    /// Exchange an OAuth callback code for tokens and persist the new store.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::MissingAuthCode` for an empty code and
    /// `SyncError::Lazada` if the exchange or profile fetch fails.
    #[instrument(skip_all)]
    pub async fn link_store(&self, code: &str) -> Result<Store, SyncError> {
        if code.is_empty() {
            return Err(SyncError::MissingAuthCode);
        }

        let response = lazada::auth::exchange_code(self.http, self.config, code).await?;
        let pair = response.into_pair(Utc::now());

        let country = pair
            .country
            .as_deref()
            .ok_or_else(|| LazadaError::OAuth("no country in token response".to_owned()))?;
        let region = Region::from_code(country)?;

        let profile =
            lazada::auth::get_seller(self.http, self.config, region, &pair.access_token).await?;
        let seller_profile = serde_json::to_value(&profile).map_err(LazadaError::Parse)?;

        let store = StoreRepository::new(self.pool)
            .create(NewStore {
                shop_type: "lazada",
                region: region.code(),
                store_name: &profile.name,
                seller_profile: &seller_profile,
                access_token: &pair.access_token,
                access_expires_at: pair.access_expires_at,
                refresh_token: &pair.refresh_token,
                refresh_expires_at: pair.refresh_expires_at,
            })
            .await?;

        tracing::info!(store_id = %store.id, region = %region, "store linked");
        Ok(store)
    }

    /// Return the store with a usable access token, refreshing first if the
    /// stored one has expired.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::StoreNotFound` if the store does not exist and
    /// `SyncError::Lazada` if the refresh call fails.
    #[instrument(skip(self))]
    pub async fn ensure_fresh(&self, store_id: StoreId) -> Result<Store, SyncError> {
        let stores = StoreRepository::new(self.pool);

        let store = stores
            .get_by_id(store_id)
            .await?
            .ok_or(SyncError::StoreNotFound)?;
        if !store.needs_refresh(Utc::now()) {
            return Ok(store);
        }

        let lock = self.locks.for_store(store_id).await;
        let _guard = lock.lock().await;

        // Re-read under the lock: a concurrent caller may have refreshed
        // while we waited.
        let store = stores
            .get_by_id(store_id)
            .await?
            .ok_or(SyncError::StoreNotFound)?;
        if !store.needs_refresh(Utc::now()) {
            return Ok(store);
        }

        let response =
            lazada::auth::refresh_access_token(self.http, self.config, store.refresh.expose())
                .await?;
        let pair = response.into_pair(Utc::now());

        let updated = stores
            .update_tokens(
                store_id,
                &pair.access_token,
                pair.access_expires_at,
                &pair.refresh_token,
                pair.refresh_expires_at,
            )
            .await?;

        tracing::info!(store_id = %store_id, "access token refreshed");
        Ok(updated)
    }

    /// Pull the store's full catalog into the products table.
    ///
    /// Returns the number of products written.
    ///
    /// # Errors
    ///
    /// Returns `SyncError::Lazada` on marketplace failures; pages persisted
    /// before the failure are kept.
    #[instrument(skip(self))]
    pub async fn pull_products(&self, store_id: StoreId) -> Result<u64, SyncError> {
        let store = self.ensure_fresh(store_id).await?;
        let region = Region::from_code(&store.region)?;

        let client = LazadaClient::new(
            self.config,
            region,
            Some(store.access.expose().to_owned()),
        );
        let mut sink = StoreCatalogSink {
            products: ProductRepository::new(self.pool),
            store_id,
        };

        let total = pull_pages(&client, &mut sink, PAGE_SIZE).await?;
        tracing::info!(store_id = %store_id, total, "catalog pull finished");
        Ok(total)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    /// Scripted source: returns the configured page sizes in order, empty
    /// pages after that, and counts requests.
    struct ScriptedSource {
        pages: Vec<usize>,
        requests: AtomicUsize,
    }

    impl ScriptedSource {
        fn new(pages: &[usize]) -> Self {
            Self {
                pages: pages.to_vec(),
                requests: AtomicUsize::new(0),
            }
        }

        fn request_count(&self) -> usize {
            self.requests.load(Ordering::SeqCst)
        }
    }

    impl ProductSource for ScriptedSource {
        async fn fetch_page(
            &self,
            offset: u32,
            limit: u32,
        ) -> Result<Vec<serde_json::Value>, LazadaError> {
            let index = (offset / limit) as usize;
            self.requests.fetch_add(1, Ordering::SeqCst);

            let size = self.pages.get(index).copied().unwrap_or(0);
            Ok((0..size)
                .map(|i| serde_json::json!({"item_id": offset as usize + i}))
                .collect())
        }
    }

    /// In-memory sink recording each batch.
    #[derive(Default)]
    struct MemorySink {
        batches: Vec<usize>,
        items: Vec<serde_json::Value>,
    }

    impl ProductSink for MemorySink {
        async fn persist(&mut self, batch: Vec<serde_json::Value>) -> Result<u64, SyncError> {
            self.batches.push(batch.len());
            let len = batch.len() as u64;
            self.items.extend(batch);
            Ok(len)
        }
    }

    #[tokio::test]
    async fn test_pull_accumulates_until_empty_page() {
        let source = ScriptedSource::new(&[50, 50, 3]);
        let mut sink = MemorySink::default();

        let total = pull_pages(&source, &mut sink, 50).await.unwrap();

        assert_eq!(total, 103);
        assert_eq!(sink.items.len(), 103);
        // Three full-or-partial pages plus the terminating empty page.
        assert_eq!(source.request_count(), 4);
    }

    #[tokio::test]
    async fn test_pages_are_persisted_individually() {
        let source = ScriptedSource::new(&[50, 50, 3]);
        let mut sink = MemorySink::default();

        pull_pages(&source, &mut sink, 50).await.unwrap();

        assert_eq!(sink.batches, vec![50, 50, 3]);
    }

    #[tokio::test]
    async fn test_empty_catalog_terminates_immediately() {
        let source = ScriptedSource::new(&[]);
        let mut sink = MemorySink::default();

        let total = pull_pages(&source, &mut sink, 50).await.unwrap();

        assert_eq!(total, 0);
        assert_eq!(source.request_count(), 1);
        assert!(sink.batches.is_empty());
    }

    #[tokio::test]
    async fn test_refresh_locks_hand_out_one_lock_per_store() {
        let locks = RefreshLocks::new();
        let a1 = locks.for_store(StoreId::new(1)).await;
        let a2 = locks.for_store(StoreId::new(1)).await;
        let b = locks.for_store(StoreId::new(2)).await;

        assert!(Arc::ptr_eq(&a1, &a2));
        assert!(!Arc::ptr_eq(&a1, &b));
    }
}
