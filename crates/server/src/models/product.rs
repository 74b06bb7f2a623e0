//! Product model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sellerdesk_core::{ProductId, StoreId};

/// A product snapshot pulled from a marketplace.
///
/// The payload is stored opaquely; the marketplace is the source of truth
/// and nothing here normalizes or mutates individual products.
#[derive(Debug, Clone, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub store_id: StoreId,
    pub payload: serde_json::Value,
    pub created_at: DateTime<Utc>,
}
