//! User account and administration route handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use chrono::{Duration, Utc};
use serde::Deserialize;

use sellerdesk_core::{UserId, UserRole};

use crate::db::users::UserRepository;
use crate::error::{AppError, Result};
use crate::middleware::{RequireAdmin, RequireUser};
use crate::models::PublicUser;
use crate::routes::success;
use crate::state::AppState;

/// Window for the "recent signups" listing.
const NEW_USER_WINDOW_DAYS: i64 = 7;

// =============================================================================
// Request Bodies
// =============================================================================

/// Self-service profile update. Credential fields are deliberately absent;
/// passwords only change through the password routes.
#[derive(Debug, Deserialize)]
pub struct UpdateMeBody {
    pub name: Option<String>,
    pub phone: Option<String>,
}

/// Admin profile update.
#[derive(Debug, Deserialize)]
pub struct AdminUpdateBody {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub role: Option<UserRole>,
}

// =============================================================================
// Account Handlers
// =============================================================================

/// Current user.
///
/// # Route
///
/// `GET /api/users/me`
pub async fn me(RequireUser(user): RequireUser) -> Json<serde_json::Value> {
    success(PublicUser::from(user))
}

/// Update the current user's name/phone.
///
/// # Route
///
/// `PATCH /api/users/updateMe`
pub async fn update_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdateMeBody>,
) -> Result<Json<serde_json::Value>> {
    let updated = UserRepository::new(state.pool())
        .update_profile(user.id, body.name.as_deref(), body.phone.as_deref(), None)
        .await?;

    Ok(success(PublicUser::from(updated)))
}

/// Delete the current user's account.
///
/// # Route
///
/// `DELETE /api/users/deleteMe`
pub async fn delete_me(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
) -> Result<StatusCode> {
    UserRepository::new(state.pool()).delete(user.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
// Admin Handlers
// =============================================================================

/// List every user.
///
/// # Route
///
/// `GET /api/users`
pub async fn list_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<serde_json::Value>> {
    let users = UserRepository::new(state.pool()).list().await?;
    let users: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();

    Ok(success(users))
}

/// List recent signups.
///
/// # Route
///
/// `GET /api/users/new`
pub async fn new_users(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
) -> Result<Json<serde_json::Value>> {
    let since = Utc::now() - Duration::days(NEW_USER_WINDOW_DAYS);
    let users = UserRepository::new(state.pool())
        .list_created_since(since)
        .await?;
    let users: Vec<PublicUser> = users.into_iter().map(PublicUser::from).collect();

    Ok(success(users))
}

/// Get one user.
///
/// # Route
///
/// `GET /api/users/{id}`
pub async fn get_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>> {
    let user = UserRepository::new(state.pool())
        .get_by_id(UserId::new(id))
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No user found with ID {id}")))?;

    Ok(success(PublicUser::from(user)))
}

/// Update one user.
///
/// # Route
///
/// `PATCH /api/users/{id}`
pub async fn update_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
    Json(body): Json<AdminUpdateBody>,
) -> Result<Json<serde_json::Value>> {
    let updated = UserRepository::new(state.pool())
        .update_profile(
            UserId::new(id),
            body.name.as_deref(),
            body.phone.as_deref(),
            body.role,
        )
        .await
        .map_err(|e| match e {
            crate::db::RepositoryError::NotFound => {
                AppError::NotFound(format!("No user found with ID {id}"))
            }
            other => AppError::Database(other),
        })?;

    Ok(success(PublicUser::from(updated)))
}

/// Delete one user.
///
/// # Route
///
/// `DELETE /api/users/{id}`
pub async fn delete_user(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    Path(id): Path<i32>,
) -> Result<Response> {
    let deleted = UserRepository::new(state.pool())
        .delete(UserId::new(id))
        .await?;

    if !deleted {
        return Err(AppError::NotFound(format!("No user found with ID {id}")));
    }

    Ok(StatusCode::NO_CONTENT.into_response())
}
