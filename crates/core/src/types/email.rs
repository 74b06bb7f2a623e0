//! Validated email address.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Why a string was rejected as an email address.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum EmailError {
    /// The input string is empty.
    #[error("email cannot be empty")]
    Empty,
    /// The input exceeds the RFC 5321 length limit.
    #[error("email must be at most {0} characters")]
    TooLong(usize),
    /// The input is not of the form `local@domain` with both parts
    /// non-empty.
    #[error("email must look like local@domain")]
    Malformed,
}

/// An email address that passed structural validation.
///
/// Validation is deliberately shallow: non-empty local part, `@`, non-empty
/// domain, bounded length. Anything stricter rejects real addresses; whether
/// the mailbox exists is the mail system's problem, not ours.
///
/// ```
/// use sellerdesk_core::Email;
///
/// let email = Email::parse("seller@example.com")?;
/// assert_eq!(email.domain(), "example.com");
///
/// assert!(Email::parse("not-an-email").is_err());
/// # Ok::<(), sellerdesk_core::EmailError>(())
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct Email(String);

impl Email {
    /// RFC 5321 upper bound on address length.
    pub const MAX_LENGTH: usize = 254;

    /// Validate and wrap an email address.
    ///
    /// # Errors
    ///
    /// Returns [`EmailError`] when the input is empty, too long, or not of
    /// the form `local@domain`.
    pub fn parse(s: &str) -> Result<Self, EmailError> {
        if s.is_empty() {
            return Err(EmailError::Empty);
        }
        if s.len() > Self::MAX_LENGTH {
            return Err(EmailError::TooLong(Self::MAX_LENGTH));
        }

        match s.split_once('@') {
            Some((local, domain)) if !local.is_empty() && !domain.is_empty() => {
                Ok(Self(s.to_owned()))
            }
            _ => Err(EmailError::Malformed),
        }
    }

    /// The address as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Unwrap into the inner string.
    #[must_use]
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The part before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        self.0.split('@').next().unwrap_or("")
    }

    /// The part after the first `@`.
    #[must_use]
    pub fn domain(&self) -> &str {
        self.0.split_once('@').map_or("", |(_, domain)| domain)
    }
}

impl fmt::Display for Email {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::str::FromStr for Email {
    type Err = EmailError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl AsRef<str> for Email {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Stored as TEXT; values read back from the database are trusted.
#[cfg(feature = "postgres")]
impl sqlx::Type<sqlx::Postgres> for Email {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<sqlx::Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<sqlx::Postgres>>::compatible(ty)
    }
}

#[cfg(feature = "postgres")]
impl<'r> sqlx::Decode<'r, sqlx::Postgres> for Email {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s = <String as sqlx::Decode<sqlx::Postgres>>::decode(value)?;
        Ok(Self(s))
    }
}

#[cfg(feature = "postgres")]
impl sqlx::Encode<'_, sqlx::Postgres> for Email {
    fn encode_by_ref(
        &self,
        buf: &mut sqlx::postgres::PgArgumentBuffer,
    ) -> Result<sqlx::encode::IsNull, sqlx::error::BoxDynError> {
        <String as sqlx::Encode<sqlx::Postgres>>::encode_by_ref(&self.0, buf)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_ordinary_addresses() {
        for ok in [
            "seller@example.com",
            "first.last@example.com",
            "tagged+inbox@example.co.id",
            "a@b",
        ] {
            assert!(Email::parse(ok).is_ok(), "{ok} should parse");
        }
    }

    #[test]
    fn test_rejects_empty() {
        assert_eq!(Email::parse(""), Err(EmailError::Empty));
    }

    #[test]
    fn test_rejects_overlong() {
        let s = format!("{}@example.com", "x".repeat(Email::MAX_LENGTH));
        assert_eq!(Email::parse(&s), Err(EmailError::TooLong(Email::MAX_LENGTH)));
    }

    #[test]
    fn test_rejects_structural_garbage() {
        for bad in ["plainaddress", "@example.com", "user@", "@"] {
            assert_eq!(Email::parse(bad), Err(EmailError::Malformed), "{bad}");
        }
    }

    #[test]
    fn test_length_boundary() {
        let local = "x".repeat(Email::MAX_LENGTH - "@example.com".len());
        let exact = format!("{local}@example.com");
        assert_eq!(exact.len(), Email::MAX_LENGTH);
        assert!(Email::parse(&exact).is_ok());
    }

    #[test]
    fn test_part_accessors() {
        let email = Email::parse("seller@mall.example.com").unwrap();
        assert_eq!(email.local_part(), "seller");
        assert_eq!(email.domain(), "mall.example.com");
    }

    #[test]
    fn test_display_and_as_str_agree() {
        let email = Email::parse("seller@example.com").unwrap();
        assert_eq!(email.to_string(), email.as_str());
    }

    #[test]
    fn test_serde_is_transparent() {
        let email = Email::parse("seller@example.com").unwrap();
        let json = serde_json::to_string(&email).unwrap();
        assert_eq!(json, "\"seller@example.com\"");
        assert_eq!(serde_json::from_str::<Email>(&json).unwrap(), email);
    }

    #[test]
    fn test_from_str() {
        let email: Email = "seller@example.com".parse().unwrap();
        assert_eq!(email.into_inner(), "seller@example.com");
    }
}
