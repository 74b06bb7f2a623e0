//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server-class errors to
//! Sentry before responding. All route handlers return `Result<T, AppError>`.
//!
//! Responses use the JSON envelope `{"status": "fail"|"error", "message"}`;
//! 4xx failures are `"fail"`, 5xx errors are `"error"`, and internal detail
//! never reaches the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::lazada::LazadaError;
use crate::services::auth::AuthError;
use crate::services::sync::SyncError;
use crate::services::token::TokenError;

/// Application-level error type for the server.
#[derive(Debug, Error)]
pub enum AppError {
    /// Database operation failed.
    #[error("Database error: {0}")]
    Database(#[from] RepositoryError),

    /// Authentication operation failed.
    #[error("Auth error: {0}")]
    Auth(#[from] AuthError),

    /// Marketplace sync operation failed.
    #[error("Sync error: {0}")]
    Sync(#[from] SyncError),

    /// Malformed or missing input.
    #[error("Validation error: {0}")]
    Validation(String),

    /// User is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Authenticated but not permitted.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<TokenError> for AppError {
    fn from(e: TokenError) -> Self {
        Self::Auth(AuthError::Token(e))
    }
}

impl AppError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Database(_) | Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Auth(err) => auth_status(err),
            Self::Sync(err) => sync_status(err),
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
        }
    }

    /// Client-facing message. Internal detail is replaced with a generic
    /// line.
    fn client_message(&self) -> String {
        match self {
            Self::Database(_) | Self::Internal(_) => "Internal server error".to_owned(),
            Self::Auth(err) => auth_message(err),
            Self::Sync(err) => sync_message(err),
            Self::Validation(msg)
            | Self::Unauthorized(msg)
            | Self::Forbidden(msg)
            | Self::NotFound(msg) => msg.clone(),
        }
    }
}

fn auth_status(err: &AuthError) -> StatusCode {
    match err {
        AuthError::InvalidCredentials
        | AuthError::WrongCurrentPassword
        | AuthError::Token(_) => StatusCode::UNAUTHORIZED,
        AuthError::UserAlreadyExists
        | AuthError::WeakPassword(_)
        | AuthError::PasswordMismatch
        | AuthError::InvalidEmail(_)
        | AuthError::InvalidResetToken => StatusCode::BAD_REQUEST,
        AuthError::UserNotFound => StatusCode::NOT_FOUND,
        AuthError::PasswordHash | AuthError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn auth_message(err: &AuthError) -> String {
    match err {
        AuthError::InvalidCredentials => "Email or Password incorrect!".to_owned(),
        AuthError::UserAlreadyExists => "An account with this email already exists".to_owned(),
        AuthError::WeakPassword(msg) => msg.clone(),
        AuthError::PasswordMismatch => "Passwords do not match".to_owned(),
        AuthError::WrongCurrentPassword => "Your current password is wrong!".to_owned(),
        AuthError::InvalidEmail(_) => "Invalid email address".to_owned(),
        AuthError::InvalidResetToken => "Invalid password reset token!".to_owned(),
        AuthError::UserNotFound => {
            "No user found with this email! Try signing up instead.".to_owned()
        }
        AuthError::Token(TokenError::Expired) => {
            "Your session has expired. Please log in again.".to_owned()
        }
        AuthError::Token(TokenError::Invalid) => {
            "You are not logged in! Please log in to get access.".to_owned()
        }
        AuthError::PasswordHash | AuthError::Repository(_) => "Internal server error".to_owned(),
    }
}

fn sync_status(err: &SyncError) -> StatusCode {
    match err {
        SyncError::StoreNotFound => StatusCode::NOT_FOUND,
        SyncError::MissingAuthCode => StatusCode::BAD_REQUEST,
        SyncError::Lazada(LazadaError::UnsupportedRegion(_)) => StatusCode::BAD_REQUEST,
        SyncError::Lazada(_) => StatusCode::BAD_GATEWAY,
        SyncError::Repository(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn sync_message(err: &SyncError) -> String {
    match err {
        SyncError::StoreNotFound => "No store found with this ID.".to_owned(),
        SyncError::MissingAuthCode => "No auth code provided in the body!".to_owned(),
        SyncError::Lazada(LazadaError::UnsupportedRegion(code)) => {
            format!("Unsupported marketplace region: {code}")
        }
        SyncError::Lazada(_) => "Marketplace service error".to_owned(),
        SyncError::Repository(_) => "Internal server error".to_owned(),
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Capture server errors to Sentry
        if status.is_server_error() || matches!(self, Self::Sync(SyncError::Lazada(_))) {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Request error"
            );
        }

        let envelope_status = if status.is_server_error() {
            "error"
        } else {
            "fail"
        };

        let body = Json(serde_json::json!({
            "status": envelope_status,
            "message": self.client_message(),
        }));

        (status, body).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    fn get_status(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            get_status(AppError::Validation("bad".to_owned())),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            get_status(AppError::Unauthorized("nope".to_owned())),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Forbidden("nope".to_owned())),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            get_status(AppError::NotFound("missing".to_owned())),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            get_status(AppError::Internal("boom".to_owned())),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_credential_errors_are_unauthorized() {
        assert_eq!(
            get_status(AppError::Auth(AuthError::InvalidCredentials)),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            get_status(AppError::Auth(AuthError::WrongCurrentPassword)),
            StatusCode::UNAUTHORIZED
        );
    }

    #[test]
    fn test_upstream_failures_are_bad_gateway() {
        let err = AppError::Sync(SyncError::Lazada(LazadaError::OAuth("denied".to_owned())));
        assert_eq!(get_status(err), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_unsupported_region_is_a_client_error() {
        let err = AppError::Sync(SyncError::Lazada(LazadaError::UnsupportedRegion(
            "us".to_owned(),
        )));
        assert_eq!(get_status(err), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_internal_detail_is_not_leaked() {
        let err = AppError::Internal("secret connection string".to_owned());
        assert_eq!(err.client_message(), "Internal server error");
    }

    #[test]
    fn test_login_failures_share_one_message() {
        // Unknown email and wrong password must be indistinguishable.
        let msg = auth_message(&AuthError::InvalidCredentials);
        assert_eq!(msg, "Email or Password incorrect!");
    }
}
