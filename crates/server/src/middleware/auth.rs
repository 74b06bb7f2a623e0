//! Authentication extractors.
//!
//! Provides extractors for requiring a logged-in user (and optionally the
//! admin role) in route handlers. An extractor rejection IS the response;
//! nothing downstream of a failed guard ever runs.

use axum::{RequestPartsExt, extract::FromRequestParts, http::request::Parts};
use axum_extra::{TypedHeader, headers};

use crate::db::users::UserRepository;
use crate::error::AppError;
use crate::models::User;
use crate::state::AppState;

/// Cookie carrying the session token.
pub const AUTH_COOKIE_NAME: &str = "authToken";

/// Extractor that requires a valid session.
///
/// Verifies the session token from the auth cookie, reloads the user, and
/// rejects sessions issued before the user's last password change.
///
/// # Example
///
/// ```rust,ignore
/// async fn protected_handler(
///     RequireUser(user): RequireUser,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", user.email)
/// }
/// ```
pub struct RequireUser(pub User);

impl FromRequestParts<AppState> for RequireUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let cookies: TypedHeader<headers::Cookie> = parts.extract().await.map_err(|_| {
            AppError::Unauthorized(
                "You are not logged in! Please log in to get access.".to_owned(),
            )
        })?;

        let token = cookies.get(AUTH_COOKIE_NAME).ok_or_else(|| {
            AppError::Unauthorized(
                "You are not logged in! Please log in to get access.".to_owned(),
            )
        })?;

        let claims = state.tokens().verify(token)?;

        let user = UserRepository::new(state.pool())
            .get_by_id(claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Unauthorized(
                    "The user belonging to this token no longer exists.".to_owned(),
                )
            })?;

        // Revocation-by-password-change: tokens issued before the most
        // recent change are dead, no blocklist involved.
        if user.password_changed_after(claims.iat) {
            return Err(AppError::Unauthorized(
                "The password was changed recently. Please log in again to get access."
                    .to_owned(),
            ));
        }

        Ok(Self(user))
    }
}

/// Extractor that requires a valid session AND the admin role.
///
/// # Example
///
/// ```rust,ignore
/// async fn admin_handler(
///     RequireAdmin(admin): RequireAdmin,
/// ) -> impl IntoResponse {
///     format!("Hello, {}!", admin.name)
/// }
/// ```
pub struct RequireAdmin(pub User);

impl FromRequestParts<AppState> for RequireAdmin {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let RequireUser(user) = RequireUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            return Err(AppError::Forbidden(
                "You don't have the permission to perform this action!".to_owned(),
            ));
        }

        Ok(Self(user))
    }
}
