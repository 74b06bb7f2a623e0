//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                         - Liveness check
//! GET    /health/ready                   - Readiness check (DB ping)
//!
//! # Auth
//! POST   /api/users/signup               - Create account, sets auth cookie
//! POST   /api/users/login                - Login, sets auth cookie
//! DELETE /api/users/logout               - Clear auth cookie
//! POST   /api/users/forgotPassword       - Issue a password-reset token
//! PATCH  /api/users/resetPassword/{token} - Redeem a password-reset token
//!
//! # Account (requires auth)
//! GET    /api/users/me                   - Current user
//! PATCH  /api/users/updateMe             - Update name/phone
//! PATCH  /api/users/updatePassword       - Change password, reissues cookie
//! DELETE /api/users/deleteMe             - Delete own account
//!
//! # User administration (requires auth + admin role)
//! GET    /api/users                      - List all users
//! GET    /api/users/new                  - Recent signups
//! GET    /api/users/{id}                 - Get one user
//! PATCH  /api/users/{id}                 - Update name/phone/role
//! DELETE /api/users/{id}                 - Delete a user
//!
//! # Lazada (requires auth)
//! GET    /api/lazada/auth-url            - Seller authorization URL
//! POST   /api/lazada/authorize           - Exchange callback code, link store
//! GET    /api/lazada/stores              - List linked stores
//! DELETE /api/lazada/stores/{id}         - Unlink a store (products cascade)
//! GET    /api/lazada/stores/{id}/products - List pulled products
//! POST   /api/lazada/stores/{id}/pull    - Pull the store's catalog
//! ```

pub mod auth;
pub mod lazada;
pub mod users;

use axum::{
    Json, Router,
    routing::{delete, get, patch, post},
};
use serde::Serialize;

use crate::state::AppState;

/// Create the full API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/users", user_routes())
        .nest("/api/lazada", lazada_routes())
}

/// User and auth routes.
fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/logout", delete(auth::logout))
        .route("/forgotPassword", post(auth::forgot_password))
        .route("/resetPassword/{token}", patch(auth::reset_password))
        .route("/me", get(users::me))
        .route("/updateMe", patch(users::update_me))
        .route("/updatePassword", patch(auth::update_password))
        .route("/deleteMe", delete(users::delete_me))
        .route("/", get(users::list_users))
        .route("/new", get(users::new_users))
        .route(
            "/{id}",
            get(users::get_user)
                .patch(users::update_user)
                .delete(users::delete_user),
        )
}

/// Lazada integration routes.
fn lazada_routes() -> Router<AppState> {
    Router::new()
        .route("/auth-url", get(lazada::auth_url))
        .route("/authorize", post(lazada::authorize))
        .route("/stores", get(lazada::list_stores))
        .route("/stores/{id}", delete(lazada::unlink_store))
        .route("/stores/{id}/products", get(lazada::list_products))
        .route("/stores/{id}/pull", post(lazada::pull))
}

/// Success envelope: `{"status": "success", "data": ...}`.
pub(crate) fn success<T: Serialize>(data: T) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "success", "data": data }))
}

/// Success envelope carrying only a message.
pub(crate) fn success_message(message: &str) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "success", "message": message }))
}
