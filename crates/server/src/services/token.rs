//! Stateless session tokens.
//!
//! Sessions are HS256 JWTs carrying the user id and issue time, verified
//! against the configured secret. Nothing is persisted; revocation happens
//! through the password-change timestamp check in the auth middleware.

use std::time::Duration;

use chrono::{DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use sellerdesk_core::UserId;

/// Errors from issuing or verifying session tokens.
#[derive(Debug, Error)]
pub enum TokenError {
    /// The token's expiry has passed.
    #[error("session token expired")]
    Expired,
    /// Bad signature, malformed token, or missing claims.
    #[error("invalid session token")]
    Invalid,
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        match e.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => Self::Expired,
            _ => Self::Invalid,
        }
    }
}

/// Claims carried by a session token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// The authenticated user.
    pub sub: UserId,
    /// Issue time, Unix seconds. Compared against the password-change
    /// timestamp to revoke stale sessions.
    pub iat: i64,
    /// Expiry, Unix seconds.
    pub exp: i64,
}

/// Issues and verifies session tokens.
pub struct TokenService {
    encoding: EncodingKey,
    decoding: DecodingKey,
    validation: Validation,
    ttl: chrono::Duration,
}

impl TokenService {
    /// Create a token service from the signing secret and session lifetime.
    #[must_use]
    pub fn new(secret: &SecretString, ttl: Duration) -> Self {
        let bytes = secret.expose_secret().as_bytes();

        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;

        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            validation,
            ttl: chrono::Duration::from_std(ttl).unwrap_or_else(|_| chrono::Duration::days(90)),
        }
    }

    /// Issue a token for a user.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Invalid` if signing fails.
    pub fn issue(&self, user_id: UserId) -> Result<String, TokenError> {
        self.issue_at(user_id, Utc::now())
    }

    /// Issue a token with an explicit issue time.
    pub(crate) fn issue_at(
        &self,
        user_id: UserId,
        now: DateTime<Utc>,
    ) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user_id,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };

        Ok(jsonwebtoken::encode(
            &Header::default(),
            &claims,
            &self.encoding,
        )?)
    }

    /// Verify a token and return its claims.
    ///
    /// # Errors
    ///
    /// Returns `TokenError::Expired` for an expired token and
    /// `TokenError::Invalid` for anything else that fails verification.
    pub fn verify(&self, token: &str) -> Result<Claims, TokenError> {
        let data = jsonwebtoken::decode::<Claims>(token, &self.decoding, &self.validation)?;
        Ok(data.claims)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration as ChronoDuration;

    use super::*;

    fn service() -> TokenService {
        TokenService::new(
            &SecretString::from("0123456789abcdef0123456789abcdef"),
            Duration::from_secs(3600),
        )
    }

    #[test]
    fn test_issue_verify_roundtrip() {
        let svc = service();
        let token = svc.issue(UserId::new(42)).unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.sub, UserId::new(42));
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_expired_token_is_rejected() {
        let svc = service();
        let long_ago = Utc::now() - ChronoDuration::hours(2);
        let token = svc.issue_at(UserId::new(1), long_ago).unwrap();

        assert!(matches!(svc.verify(&token), Err(TokenError::Expired)));
    }

    #[test]
    fn test_garbage_is_rejected() {
        let svc = service();
        assert!(matches!(
            svc.verify("not-a-token"),
            Err(TokenError::Invalid)
        ));
    }

    #[test]
    fn test_wrong_secret_is_rejected() {
        let token = service().issue(UserId::new(7)).unwrap();

        let other = TokenService::new(
            &SecretString::from("ffffffffffffffffffffffffffffffff"),
            Duration::from_secs(3600),
        );
        assert!(matches!(other.verify(&token), Err(TokenError::Invalid)));
    }

    #[test]
    fn test_iat_matches_issue_time() {
        let svc = service();
        let at = Utc::now() - ChronoDuration::minutes(5);
        let token = svc.issue_at(UserId::new(3), at).unwrap();

        let claims = svc.verify(&token).unwrap();
        assert_eq!(claims.iat, at.timestamp());
    }
}
