//! Store model: a linked marketplace shop and its OAuth token pair.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;

use sellerdesk_core::StoreId;

/// An OAuth token with its absolute expiry.
///
/// Implements `Debug` manually to redact the token value.
#[derive(Clone)]
pub struct OAuthToken {
    pub token: SecretString,
    pub expires_at: DateTime<Utc>,
}

impl OAuthToken {
    /// Build a token from its plaintext value and absolute expiry.
    #[must_use]
    pub fn new(token: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token: SecretString::from(token),
            expires_at,
        }
    }

    /// Whether the token has expired as of `now`.
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at <= now
    }

    /// Plaintext token value for outbound API calls.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.token.expose_secret()
    }
}

impl std::fmt::Debug for OAuthToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OAuthToken")
            .field("token", &"[REDACTED]")
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// A linked marketplace store.
///
/// The store exclusively owns its token pair; only the refresh guard
/// replaces it.
#[derive(Debug, Clone)]
pub struct Store {
    pub id: StoreId,
    pub shop_type: String,
    pub region: String,
    pub store_name: String,
    pub seller_profile: serde_json::Value,
    pub access: OAuthToken,
    pub refresh: OAuthToken,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Store {
    /// Whether the access token must be refreshed before use.
    #[must_use]
    pub fn needs_refresh(&self, now: DateTime<Utc>) -> bool {
        self.access.is_expired(now)
    }
}

/// Store shape returned by the API. Excludes the token pair.
#[derive(Debug, Clone, Serialize)]
pub struct StoreSummary {
    pub id: StoreId,
    pub shop_type: String,
    pub region: String,
    pub store_name: String,
    pub created_at: DateTime<Utc>,
}

impl From<Store> for StoreSummary {
    fn from(store: Store) -> Self {
        Self {
            id: store.id,
            shop_type: store.shop_type,
            region: store.region,
            store_name: store.store_name,
            created_at: store.created_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[test]
    fn test_expired_token() {
        let now = Utc::now();
        let token = OAuthToken::new("abc".to_owned(), now - Duration::seconds(1));
        assert!(token.is_expired(now));
    }

    #[test]
    fn test_fresh_token() {
        let now = Utc::now();
        let token = OAuthToken::new("abc".to_owned(), now + Duration::hours(1));
        assert!(!token.is_expired(now));
    }

    #[test]
    fn test_expiry_boundary_counts_as_expired() {
        let now = Utc::now();
        let token = OAuthToken::new("abc".to_owned(), now);
        assert!(token.is_expired(now));
    }

    #[test]
    fn test_debug_redacts_token() {
        let token = OAuthToken::new("plaintext-token".to_owned(), Utc::now());
        let output = format!("{token:?}");
        assert!(output.contains("[REDACTED]"));
        assert!(!output.contains("plaintext-token"));
    }
}
