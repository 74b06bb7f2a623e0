//! Authentication error types.

use thiserror::Error;

use sellerdesk_core::EmailError;

use crate::db::RepositoryError;
use crate::services::token::TokenError;

/// Errors from the authentication service.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Wrong email or password. Deliberately a single variant for both
    /// cases so responses cannot be used to enumerate accounts.
    #[error("Email or Password incorrect!")]
    InvalidCredentials,

    /// Email is already registered.
    #[error("user already exists")]
    UserAlreadyExists,

    /// Password does not meet requirements.
    #[error("weak password: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// Current password check failed on a password change.
    #[error("Your current password is wrong!")]
    WrongCurrentPassword,

    /// Email failed validation.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Password-reset token is unknown or expired.
    #[error("Invalid password reset token!")]
    InvalidResetToken,

    /// No account with that email.
    #[error("no user found with this email")]
    UserNotFound,

    /// Password hashing failed.
    #[error("failed to hash password")]
    PasswordHash,

    /// Session token error.
    #[error(transparent)]
    Token(#[from] TokenError),

    /// Database error.
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}
