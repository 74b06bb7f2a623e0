//! Region mapping and token types for the Lazada open platform.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::LazadaError;

/// A Lazada market.
///
/// Parsed from the two-letter country code the platform uses. Parsing is
/// exhaustive and fails closed: an unrecognized code is an error, never a
/// client pointed at an undefined gateway.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Region {
    Singapore,
    Indonesia,
    Malaysia,
    Philippines,
    Vietnam,
    Thailand,
}

impl Region {
    /// All supported markets.
    pub const ALL: [Self; 6] = [
        Self::Singapore,
        Self::Indonesia,
        Self::Malaysia,
        Self::Philippines,
        Self::Vietnam,
        Self::Thailand,
    ];

    /// Parse a two-letter country code (case-insensitive).
    ///
    /// # Errors
    ///
    /// Returns `LazadaError::UnsupportedRegion` for any code outside the six
    /// markets Lazada operates in.
    pub fn from_code(code: &str) -> Result<Self, LazadaError> {
        match code.to_ascii_lowercase().as_str() {
            "sg" => Ok(Self::Singapore),
            "id" => Ok(Self::Indonesia),
            "my" => Ok(Self::Malaysia),
            "ph" => Ok(Self::Philippines),
            "vn" => Ok(Self::Vietnam),
            "th" => Ok(Self::Thailand),
            other => Err(LazadaError::UnsupportedRegion(other.to_owned())),
        }
    }

    /// The two-letter country code.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::Singapore => "sg",
            Self::Indonesia => "id",
            Self::Malaysia => "my",
            Self::Philippines => "ph",
            Self::Vietnam => "vn",
            Self::Thailand => "th",
        }
    }

    /// REST gateway base URL for this market.
    #[must_use]
    pub const fn gateway(self) -> &'static str {
        match self {
            Self::Singapore => "https://api.lazada.sg/rest",
            Self::Indonesia => "https://api.lazada.co.id/rest",
            Self::Malaysia => "https://api.lazada.com.my/rest",
            Self::Philippines => "https://api.lazada.com.ph/rest",
            Self::Vietnam => "https://api.lazada.vn/rest",
            Self::Thailand => "https://api.lazada.co.th/rest",
        }
    }
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Raw token payload from the auth gateway (`/auth/token/create` and
/// `/auth/token/refresh` share this shape).
#[derive(Debug, Deserialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    /// Access token lifetime in seconds.
    pub expires_in: i64,
    /// Refresh token lifetime in seconds.
    pub refresh_expires_in: i64,
    /// Two-letter country code; present on code exchange.
    #[serde(default)]
    pub country: Option<String>,
}

impl TokenResponse {
    /// Convert relative lifetimes into absolute expiries anchored at `now`.
    ///
    /// This is the one expiry rule used everywhere: `expires_at = now +
    /// expires_in`.
    #[must_use]
    pub fn into_pair(self, now: DateTime<Utc>) -> TokenPair {
        TokenPair {
            access_token: self.access_token,
            access_expires_at: now + Duration::seconds(self.expires_in),
            refresh_token: self.refresh_token,
            refresh_expires_at: now + Duration::seconds(self.refresh_expires_in),
            country: self.country,
        }
    }
}

/// An access/refresh token pair with absolute expiries.
#[derive(Debug, Clone)]
pub struct TokenPair {
    pub access_token: String,
    pub access_expires_at: DateTime<Utc>,
    pub refresh_token: String,
    pub refresh_expires_at: DateTime<Utc>,
    pub country: Option<String>,
}

/// Seller profile returned by `/seller/get`.
///
/// Only the name is interpreted; everything else is kept as an opaque
/// snapshot.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SellerProfile {
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub extra: serde_json::Value,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_all_supported_codes_parse() {
        for region in Region::ALL {
            assert_eq!(Region::from_code(region.code()).unwrap(), region);
        }
    }

    #[test]
    fn test_codes_are_case_insensitive() {
        assert_eq!(Region::from_code("SG").unwrap(), Region::Singapore);
        assert_eq!(Region::from_code("Th").unwrap(), Region::Thailand);
    }

    #[test]
    fn test_unsupported_region_fails_closed() {
        let err = Region::from_code("us").unwrap_err();
        assert!(matches!(err, LazadaError::UnsupportedRegion(code) if code == "us"));
    }

    #[test]
    fn test_each_region_has_a_distinct_gateway() {
        let mut gateways: Vec<&str> = Region::ALL.iter().map(|r| r.gateway()).collect();
        gateways.sort_unstable();
        gateways.dedup();
        assert_eq!(gateways.len(), Region::ALL.len());
    }

    #[test]
    fn test_token_expiries_are_anchored_at_now() {
        let now = Utc::now();
        let response = TokenResponse {
            access_token: "at".to_owned(),
            refresh_token: "rt".to_owned(),
            expires_in: 3600,
            refresh_expires_in: 86400,
            country: Some("sg".to_owned()),
        };

        let pair = response.into_pair(now);
        assert_eq!(pair.access_expires_at, now + Duration::seconds(3600));
        assert_eq!(pair.refresh_expires_at, now + Duration::seconds(86400));
        assert!(pair.access_expires_at > now);
    }
}
