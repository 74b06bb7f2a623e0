//! Authentication service.
//!
//! Owns signup, login, and the password lifecycle (change, forgot, reset).
//! Every successful credential check ends in a freshly issued session token.

mod error;

pub use error::AuthError;

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use rand::distr::Alphanumeric;
use sha2::{Digest, Sha256};
use sqlx::PgPool;

use sellerdesk_core::{Email, UserId};

use crate::db::RepositoryError;
use crate::db::users::UserRepository;
use crate::models::User;
use crate::services::mailer::Mailer;
use crate::services::token::TokenService;

/// Minimum password length.
const MIN_PASSWORD_LENGTH: usize = 8;

/// Plaintext length of generated password-reset tokens.
const RESET_TOKEN_LENGTH: usize = 32;

/// How long a password-reset token stays valid, in minutes.
const RESET_TOKEN_TTL_MINUTES: i64 = 10;

/// Input for registering a new account.
#[derive(Debug)]
pub struct SignupInput<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
    pub phone: Option<&'a str>,
}

/// Authentication service.
///
/// Handles registration, login, and password management.
pub struct AuthService<'a> {
    users: UserRepository<'a>,
    tokens: &'a TokenService,
    mailer: &'a Mailer,
}

impl<'a> AuthService<'a> {
    /// Create a new authentication service.
    #[must_use]
    pub const fn new(pool: &'a PgPool, tokens: &'a TokenService, mailer: &'a Mailer) -> Self {
        Self {
            users: UserRepository::new(pool),
            tokens,
            mailer,
        }
    }

    /// Register a new user and issue a session token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::PasswordMismatch` if the confirmation differs,
    /// `AuthError::WeakPassword` if the password is too short,
    /// `AuthError::InvalidEmail` on a malformed email, and
    /// `AuthError::UserAlreadyExists` if the email is taken.
    pub async fn signup(&self, input: SignupInput<'_>) -> Result<(User, String), AuthError> {
        if input.password != input.password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        let email = Email::parse(input.email)?;
        validate_password(input.password)?;

        let password_hash = hash_password(input.password)?;

        let user = self
            .users
            .create(
                input.name,
                &email,
                input.phone,
                &password_hash,
                password_change_stamp(Utc::now()),
            )
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => AuthError::UserAlreadyExists,
                other => AuthError::Repository(other),
            })?;

        let token = self.tokens.issue(user.id)?;
        self.mailer.send_welcome(&user);

        Ok((user, token))
    }

    /// Login with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidCredentials` for an unknown email and a
    /// wrong password alike.
    pub async fn login(&self, email: &str, password: &str) -> Result<(User, String), AuthError> {
        // A malformed email can't belong to an account; same error as a
        // wrong password so the response carries no enumeration signal.
        let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;

        let (user, password_hash) = self
            .users
            .get_with_password_hash(&email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        verify_password(password, &password_hash)?;

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Change the password of an authenticated user and reissue the session
    /// token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WrongCurrentPassword` if the current password
    /// check fails.
    pub async fn update_password(
        &self,
        user_id: UserId,
        current_password: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<(User, String), AuthError> {
        let (_, password_hash) = self
            .users
            .get_with_password_hash_by_id(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        verify_password(current_password, &password_hash)
            .map_err(|_| AuthError::WrongCurrentPassword)?;

        if new_password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        let user = self
            .users
            .update_password(user_id, &new_hash, password_change_stamp(Utc::now()))
            .await?;

        let token = self.tokens.issue(user.id)?;
        Ok((user, token))
    }

    /// Start a password reset: generate a one-time token, store its digest,
    /// and hand the plaintext to the mailer.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::UserNotFound` if no account has this email.
    pub async fn forgot_password(&self, email: &str) -> Result<(), AuthError> {
        let email = Email::parse(email)?;
        let user = self
            .users
            .get_by_email(&email)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        let token = generate_reset_token();
        let digest = digest_reset_token(&token);
        let expires_at = Utc::now() + Duration::minutes(RESET_TOKEN_TTL_MINUTES);

        self.users
            .set_reset_token(user.id, &digest, expires_at)
            .await?;

        self.mailer.send_password_reset(&user, &token);
        Ok(())
    }

    /// Complete a password reset with the emailed token.
    ///
    /// The stored digest is cleared on success, so a token works exactly
    /// once.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidResetToken` if the token is unknown or
    /// expired.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
        password_confirm: &str,
    ) -> Result<User, AuthError> {
        let digest = digest_reset_token(token);
        let user = self
            .users
            .find_by_reset_digest(&digest, Utc::now())
            .await?
            .ok_or(AuthError::InvalidResetToken)?;

        if new_password != password_confirm {
            return Err(AuthError::PasswordMismatch);
        }
        validate_password(new_password)?;

        let new_hash = hash_password(new_password)?;
        let user = self
            .users
            .update_password(user.id, &new_hash, password_change_stamp(Utc::now()))
            .await?;

        Ok(user)
    }
}

/// Timestamp recorded as the moment of a credential change.
///
/// Backdated by one second so a session token issued in the same second as
/// the change is not revoked by the at-or-after comparison.
fn password_change_stamp(now: DateTime<Utc>) -> DateTime<Utc> {
    now - Duration::seconds(1)
}

/// Validate password meets requirements.
fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    Ok(())
}

/// Hash a password using Argon2id.
fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();

    argon2
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a hash.
fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    let argon2 = Argon2::default();

    argon2
        .verify_password(password.as_bytes(), &parsed_hash)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Generate a random alphanumeric reset token.
fn generate_reset_token() -> String {
    rand::rng()
        .sample_iter(Alphanumeric)
        .take(RESET_TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// SHA-256 digest of a reset token, lowercase hex. Only the digest is
/// persisted.
fn digest_reset_token(token: &str) -> String {
    let digest = Sha256::digest(token.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify_roundtrip() {
        let hash = hash_password("correct horse battery").unwrap();
        assert!(verify_password("correct horse battery", &hash).is_ok());
        assert!(verify_password("wrong password", &hash).is_err());
    }

    #[test]
    fn test_hashes_are_salted() {
        let first = hash_password("same-password").unwrap();
        let second = hash_password("same-password").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_validate_password_length() {
        assert!(validate_password("short").is_err());
        assert!(validate_password("long enough password").is_ok());
    }

    #[test]
    fn test_reset_token_shape() {
        let token = generate_reset_token();
        assert_eq!(token.len(), RESET_TOKEN_LENGTH);
        assert!(token.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_reset_tokens_are_unique() {
        assert_ne!(generate_reset_token(), generate_reset_token());
    }

    #[test]
    fn test_digest_is_deterministic_hex() {
        let digest = digest_reset_token("some-token");
        assert_eq!(digest, digest_reset_token("some-token"));
        assert_eq!(digest.len(), 64);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit()));
        assert_ne!(digest, digest_reset_token("other-token"));
    }

    #[test]
    fn test_change_stamp_is_backdated() {
        let now = Utc::now();
        assert_eq!(password_change_stamp(now), now - Duration::seconds(1));
    }
}
