//! Outbound notifications.
//!
//! Email delivery is an external collaborator; this default implementation
//! records the dispatch in the log and sends nothing. Token values are never
//! logged.

use crate::models::User;

/// Sends account notifications to users.
#[derive(Debug, Default, Clone)]
pub struct Mailer;

impl Mailer {
    /// Create a mailer.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Notify a new user that their account was created.
    pub fn send_welcome(&self, user: &User) {
        tracing::info!(user_id = %user.id, email = %user.email, "welcome email dispatched");
    }

    /// Deliver a password-reset token to the user.
    ///
    /// The plaintext token goes to the user alone; only the dispatch event
    /// is logged.
    pub fn send_password_reset(&self, user: &User, _token: &str) {
        tracing::info!(
            user_id = %user.id,
            email = %user.email,
            "password reset email dispatched"
        );
    }
}
