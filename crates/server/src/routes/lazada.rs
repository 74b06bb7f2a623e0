//! Lazada integration route handlers.
//!
//! Links seller stores via the OAuth callback code and triggers catalog
//! pulls. Token material never appears in responses; stores are returned as
//! summaries.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use rand::Rng;
use rand::distr::Alphanumeric;
use serde::Deserialize;

use sellerdesk_core::StoreId;

use crate::db::{ProductRepository, StoreRepository};
use crate::error::{AppError, Result};
use crate::lazada;
use crate::middleware::RequireUser;
use crate::models::StoreSummary;
use crate::routes::success;
use crate::services::sync::SyncService;
use crate::state::AppState;

/// Length of the CSRF state parameter.
const OAUTH_STATE_LENGTH: usize = 32;

/// OAuth callback body.
#[derive(Debug, Deserialize)]
pub struct AuthorizeBody {
    /// Authorization code from the seller consent redirect.
    pub code: Option<String>,
    /// Echoed CSRF state; the caller compares it against the one it was
    /// handed by `GET /api/lazada/auth-url`.
    pub state: Option<String>,
}

/// Generate a random alphanumeric state string.
fn generate_random_string(length: usize) -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect()
}

/// Build the seller authorization URL with a fresh CSRF state.
///
/// # Route
///
/// `GET /api/lazada/auth-url`
pub async fn auth_url(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Json<serde_json::Value> {
    let oauth_state = generate_random_string(OAUTH_STATE_LENGTH);
    let url = lazada::auth::authorization_url(&state.config().lazada, &oauth_state);

    success(serde_json::json!({ "url": url, "state": oauth_state }))
}

/// Exchange the OAuth callback code and link the store.
///
/// # Route
///
/// `POST /api/lazada/authorize`
pub async fn authorize(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Json(body): Json<AuthorizeBody>,
) -> Result<Response> {
    let code = body
        .code
        .filter(|code| !code.is_empty())
        .ok_or_else(|| AppError::Validation("No auth code provided in the body!".to_owned()))?;

    let service = SyncService::new(
        state.pool(),
        state.http(),
        &state.config().lazada,
        state.refresh_locks(),
    );
    let store = service.link_store(&code).await?;

    Ok((StatusCode::CREATED, success(StoreSummary::from(store))).into_response())
}

/// List linked stores.
///
/// # Route
///
/// `GET /api/lazada/stores`
pub async fn list_stores(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
) -> Result<Json<serde_json::Value>> {
    let stores = StoreRepository::new(state.pool()).list().await?;
    let stores: Vec<StoreSummary> = stores.into_iter().map(StoreSummary::from).collect();

    Ok(success(stores))
}

/// Unlink a store. Its pulled products cascade away with it.
///
/// # Route
///
/// `DELETE /api/lazada/stores/{id}`
pub async fn unlink_store(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
) -> Result<StatusCode> {
    let deleted = StoreRepository::new(state.pool())
        .delete(StoreId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("No store found with ID {id}")));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// List the products pulled for a store.
///
/// # Route
///
/// `GET /api/lazada/stores/{id}/products`
pub async fn list_products(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let store_id = StoreId::new(id);

    // Distinguish an unknown store from one with an empty catalog.
    StoreRepository::new(state.pool())
        .get_by_id(store_id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No store found with ID {id}")))?;

    let products = ProductRepository::new(state.pool())
        .list_for_store(store_id)
        .await?;

    Ok(success(products))
}

/// Pull the store's product catalog.
///
/// # Route
///
/// `POST /api/lazada/stores/{id}/pull`
pub async fn pull(
    State(state): State<AppState>,
    RequireUser(_user): RequireUser,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let service = SyncService::new(
        state.pool(),
        state.http(),
        &state.config().lazada,
        state.refresh_locks(),
    );

    let pulled = service.pull_products(StoreId::new(id)).await?;

    Ok(success(serde_json::json!({ "productsPulled": pulled })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_random_state_shape() {
        let state = generate_random_string(OAUTH_STATE_LENGTH);
        assert_eq!(state.len(), OAUTH_STATE_LENGTH);
        assert!(state.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_random_states_differ() {
        assert_ne!(
            generate_random_string(OAUTH_STATE_LENGTH),
            generate_random_string(OAUTH_STATE_LENGTH)
        );
    }
}
