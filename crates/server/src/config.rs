//! Server configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SELLERDESK_DATABASE_URL` - `PostgreSQL` connection string
//! - `SELLERDESK_BASE_URL` - Public URL for the API
//! - `SELLERDESK_JWT_SECRET` - Session token signing secret (min 32 chars, high entropy)
//! - `LAZADA_APP_KEY` - Lazada open platform app key
//! - `LAZADA_APP_SECRET` - Lazada open platform app secret
//! - `LAZADA_REDIRECT_URL_BASE` - OAuth callback base URL
//!
//! ## Optional
//! - `SELLERDESK_HOST` - Bind address (default: 127.0.0.1)
//! - `SELLERDESK_PORT` - Listen port (default: 3000)
//! - `SELLERDESK_ENV` - `development` or `production` (default: development);
//!   production marks the auth cookie `Secure`
//! - `SELLERDESK_SESSION_TTL_SECS` - Session token lifetime (default: 90 days)
//! - `SELLERDESK_COOKIE_TTL_SECS` - Auth cookie Max-Age (default: 90 days)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//!
//! Everything is read exactly once, here; nothing else in the crate touches
//! the process environment.

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

const MIN_JWT_SECRET_LENGTH: usize = 32;

/// A real secret is random; anything below this is a word, not a key.
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// 90 days, matching the session token lifetime the original deployment used.
const DEFAULT_TTL_SECS: &str = "7776000";

/// Substrings that mark a secret as copied from documentation rather than
/// generated (matched case-insensitively).
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-", "changeme", "replace", "placeholder", "example", "secret", "password", "xxx", "todo",
    "fixme", "insert", "enter-", "put-your", "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Runtime mode. Production turns on the `Secure` cookie flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AppEnv {
    #[default]
    Development,
    Production,
}

impl AppEnv {
    /// Whether the auth cookie should carry the `Secure` attribute.
    #[must_use]
    pub const fn secure_cookies(self) -> bool {
        matches!(self, Self::Production)
    }
}

impl std::str::FromStr for AppEnv {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "development" | "dev" => Ok(Self::Development),
            "production" | "prod" => Ok(Self::Production),
            other => Err(format!("unknown environment: {other}")),
        }
    }
}

/// Server application configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// `PostgreSQL` connection URL (carries the database password)
    pub database_url: SecretString,
    /// Bind address
    pub host: IpAddr,
    /// Listen port
    pub port: u16,
    /// Public base URL for the API
    pub base_url: String,
    /// Runtime mode
    pub env: AppEnv,
    /// Session token signing secret
    pub jwt_secret: SecretString,
    /// Session token lifetime
    pub session_ttl: Duration,
    /// Auth cookie Max-Age
    pub cookie_ttl: Duration,
    /// Lazada open platform configuration
    pub lazada: LazadaConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
}

/// Lazada open platform configuration.
///
/// Implements `Debug` manually to redact the app secret.
#[derive(Clone)]
pub struct LazadaConfig {
    /// App key issued by the Lazada open platform
    pub app_key: String,
    /// App secret used to sign API requests
    pub app_secret: SecretString,
    /// Base URL the OAuth callback is registered under
    pub redirect_url_base: String,
}

impl std::fmt::Debug for LazadaConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LazadaConfig")
            .field("app_key", &self.app_key)
            .field("app_secret", &"[REDACTED]")
            .field("redirect_url_base", &self.redirect_url_base)
            .finish()
    }
}

impl ServerConfig {
    /// Load configuration from the environment, reading a `.env` file first
    /// when one is present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` when a required variable is missing or
    /// unparseable, or when a secret looks like a placeholder or has too
    /// little entropy to be real.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();

        let database_url = database_url_env("SELLERDESK_DATABASE_URL")?;
        let host = parse_env("SELLERDESK_HOST", "127.0.0.1", str::parse::<IpAddr>)?;
        let port = parse_env("SELLERDESK_PORT", "3000", str::parse::<u16>)?;
        let base_url = require_env("SELLERDESK_BASE_URL")?;
        let env = parse_env("SELLERDESK_ENV", "development", str::parse::<AppEnv>)?;

        let jwt_secret = secret_env("SELLERDESK_JWT_SECRET")?;
        check_secret_length(&jwt_secret, "SELLERDESK_JWT_SECRET")?;

        let session_ttl = duration_env("SELLERDESK_SESSION_TTL_SECS", DEFAULT_TTL_SECS)?;
        let cookie_ttl = duration_env("SELLERDESK_COOKIE_TTL_SECS", DEFAULT_TTL_SECS)?;

        let lazada = LazadaConfig::from_env()?;
        let sentry_dsn = std::env::var("SENTRY_DSN").ok();

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            env,
            jwt_secret,
            session_ttl,
            cookie_ttl,
            lazada,
            sentry_dsn,
        })
    }

    /// The socket address to bind the server to.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl LazadaConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            app_key: require_env("LAZADA_APP_KEY")?,
            app_secret: secret_env("LAZADA_APP_SECRET")?,
            redirect_url_base: require_env("LAZADA_REDIRECT_URL_BASE")?,
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn require_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_owned()))
}

/// Read a variable (or fall back to `default`) and run it through `parse`.
fn parse_env<T, E: ToString>(
    key: &str,
    default: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    let raw = std::env::var(key).unwrap_or_else(|_| default.to_owned());
    parse(&raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_owned(), e.to_string()))
}

/// Database URL, with the conventional `DATABASE_URL` accepted as a
/// fallback so sqlx tooling and the server can share one variable.
fn database_url_env(primary_key: &str) -> Result<SecretString, ConfigError> {
    std::env::var(primary_key)
        .or_else(|_| std::env::var("DATABASE_URL"))
        .map(SecretString::from)
        .map_err(|_| ConfigError::MissingEnvVar(primary_key.to_owned()))
}

/// Whole-seconds duration variable.
fn duration_env(key: &str, default: &str) -> Result<Duration, ConfigError> {
    parse_env(key, default, str::parse::<u64>).map(Duration::from_secs)
}

/// Read a secret variable and reject placeholders and low-entropy values.
fn secret_env(key: &str) -> Result<SecretString, ConfigError> {
    let value = require_env(key)?;
    check_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

fn check_secret_length(secret: &SecretString, var_name: &str) -> Result<(), ConfigError> {
    let len = secret.expose_secret().len();
    if len < MIN_JWT_SECRET_LENGTH {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("must be at least {MIN_JWT_SECRET_LENGTH} characters (got {len})"),
        ));
    }
    Ok(())
}

fn check_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();
    if let Some(pattern) = PLACEHOLDER_PATTERNS.iter().find(|p| lower.contains(*p)) {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!("appears to be a placeholder (contains '{pattern}')"),
        ));
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_owned(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use a randomly generated secret."
            ),
        ));
    }

    Ok(())
}

/// Shannon entropy of the character distribution, in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // secret lengths are far below f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)]
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_entropy_of_degenerate_inputs() {
        assert!(shannon_entropy("").abs() < f64::EPSILON);
        assert!(shannon_entropy("zzzzzzzz").abs() < f64::EPSILON);
    }

    #[test]
    fn test_entropy_of_uniform_two_symbol_string() {
        // Half a, half b: exactly one bit per character.
        assert!((shannon_entropy("abababab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_secrets_are_rejected() {
        for bad in ["your-api-key-here", "changeme-please-9f3k", "s3cret-example"] {
            assert!(
                matches!(
                    check_secret_strength(bad, "TEST_VAR"),
                    Err(ConfigError::InsecureSecret(_, _))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn test_repetitive_secrets_are_rejected() {
        let result = check_secret_strength("abcabcabcabcabcabcabcabcabcabc", "TEST_VAR");
        assert!(matches!(result, Err(ConfigError::InsecureSecret(_, _))));
    }

    #[test]
    fn test_generated_secrets_pass() {
        assert!(check_secret_strength("kR8!vQ2@mZ5#dX9$wN3%jT7^bH4&pL6", "TEST_VAR").is_ok());
    }

    #[test]
    fn test_jwt_secret_length_floor() {
        assert!(check_secret_length(&SecretString::from("tiny"), "TEST_JWT").is_err());
        assert!(check_secret_length(&SecretString::from("k".repeat(32)), "TEST_JWT").is_ok());
    }

    #[test]
    fn test_app_env_parsing() {
        assert_eq!("production".parse::<AppEnv>().unwrap(), AppEnv::Production);
        assert_eq!("dev".parse::<AppEnv>().unwrap(), AppEnv::Development);
        assert!("staging".parse::<AppEnv>().is_err());
    }

    #[test]
    fn test_secure_cookies_only_in_production() {
        assert!(AppEnv::Production.secure_cookies());
        assert!(!AppEnv::Development.secure_cookies());
    }

    #[test]
    fn test_socket_addr_combines_host_and_port() {
        let config = ServerConfig {
            database_url: SecretString::from("postgres://localhost/sellerdesk_test"),
            host: "0.0.0.0".parse().unwrap(),
            port: 4100,
            base_url: "http://localhost:4100".to_owned(),
            env: AppEnv::Development,
            jwt_secret: SecretString::from("k".repeat(32)),
            session_ttl: Duration::from_secs(3600),
            cookie_ttl: Duration::from_secs(3600),
            lazada: LazadaConfig {
                app_key: "112384".to_owned(),
                app_secret: SecretString::from("kR8vQ2mZ5dX9wN3jT7bH4pL6"),
                redirect_url_base: "http://localhost:4100/callback".to_owned(),
            },
            sentry_dsn: None,
        };

        assert_eq!(config.socket_addr().to_string(), "0.0.0.0:4100");
    }

    #[test]
    fn test_lazada_config_debug_redacts_secret() {
        let config = LazadaConfig {
            app_key: "112384".to_owned(),
            app_secret: SecretString::from("kR8vQ2mZ5dX9wN3jT7bH4pL6"),
            redirect_url_base: "http://localhost:4100/callback".to_owned(),
        };

        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("112384"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("kR8vQ2mZ5dX9wN3jT7bH4pL6"));
    }
}
