//! Region-bound Lazada REST client.

use std::sync::Arc;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use tracing::instrument;

use crate::config::LazadaConfig;

use super::sign::sign_request;
use super::types::Region;
use super::LazadaError;

/// Fixed timeout for every call to the platform.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Transport failures are retried this many times in total.
const MAX_ATTEMPTS: u32 = 3;

/// First retry delay; doubles per attempt.
const INITIAL_BACKOFF: Duration = Duration::from_millis(500);

/// Catalog page size used by the product pull.
pub const PAGE_SIZE: u32 = 50;

/// Client for one Lazada market, bound to the application credentials and
/// (for authenticated calls) a seller access token.
#[derive(Clone)]
pub struct LazadaClient {
    inner: Arc<LazadaClientInner>,
}

struct LazadaClientInner {
    http: reqwest::Client,
    app_key: String,
    app_secret: SecretString,
    region: Region,
    access_token: Option<SecretString>,
}

/// Standard response envelope: `code` is "0" on success.
#[derive(Debug, Deserialize)]
struct ApiEnvelope {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: serde_json::Value,
}

impl LazadaClient {
    /// Create a client for a market.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be created. This should never happen
    /// under normal circumstances as we use standard TLS configuration.
    #[must_use]
    pub fn new(config: &LazadaConfig, region: Region, access_token: Option<String>) -> Self {
        #[allow(clippy::expect_used)]
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            inner: Arc::new(LazadaClientInner {
                http,
                app_key: config.app_key.clone(),
                app_secret: config.app_secret.clone(),
                region,
                access_token: access_token.map(SecretString::from),
            }),
        }
    }

    /// The market this client talks to.
    #[must_use]
    pub fn region(&self) -> Region {
        self.inner.region
    }

    /// REST gateway base URL derived from the region.
    #[must_use]
    pub fn gateway(&self) -> &'static str {
        self.inner.region.gateway()
    }

    /// Fetch one catalog page.
    ///
    /// Returns the raw product payloads; an exhausted catalog yields an
    /// empty page.
    ///
    /// # Errors
    ///
    /// Returns `LazadaError::Http` on transport failure (after bounded
    /// retries) and `LazadaError::Api` on a platform error code.
    #[instrument(skip(self), fields(region = %self.inner.region))]
    pub async fn get_products(
        &self,
        offset: u32,
        limit: u32,
    ) -> Result<Vec<serde_json::Value>, LazadaError> {
        let data = self
            .get(
                "/products/get",
                &[
                    ("offset".to_owned(), offset.to_string()),
                    ("limit".to_owned(), limit.to_string()),
                ],
            )
            .await?;

        let products = data
            .get("products")
            .and_then(serde_json::Value::as_array)
            .cloned()
            .unwrap_or_default();

        Ok(products)
    }

    /// Execute a signed GET against the region gateway and unwrap the
    /// response envelope.
    async fn get(
        &self,
        api_path: &str,
        extra: &[(String, String)],
    ) -> Result<serde_json::Value, LazadaError> {
        let mut params = vec![
            ("app_key".to_owned(), self.inner.app_key.clone()),
            ("sign_method".to_owned(), "sha256".to_owned()),
            (
                "timestamp".to_owned(),
                chrono::Utc::now().timestamp_millis().to_string(),
            ),
        ];
        if let Some(token) = &self.inner.access_token {
            params.push(("access_token".to_owned(), token.expose_secret().to_owned()));
        }
        params.extend_from_slice(extra);

        let sign = sign_request(self.inner.app_secret.expose_secret(), api_path, &params);
        params.push(("sign".to_owned(), sign));

        let url = format!("{}{api_path}", self.gateway());
        let response = send_with_retry(&self.inner.http, &url, &params).await?;

        let envelope: ApiEnvelope = response.json().await?;
        if envelope.code != "0" {
            return Err(LazadaError::Api {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }

        Ok(envelope.data)
    }
}

/// Send a GET, retrying transient transport failures with doubling backoff.
///
/// API-level errors are never retried; the platform gives no idempotency
/// guarantee.
pub(super) async fn send_with_retry(
    http: &reqwest::Client,
    url: &str,
    params: &[(String, String)],
) -> Result<reqwest::Response, LazadaError> {
    let mut backoff = INITIAL_BACKOFF;

    for attempt in 1..=MAX_ATTEMPTS {
        match http.get(url).query(params).send().await {
            Ok(response) => return Ok(response),
            Err(e) if attempt < MAX_ATTEMPTS && is_transient(&e) => {
                tracing::warn!(
                    error = %e,
                    attempt,
                    "transient Lazada transport failure, retrying"
                );
                tokio::time::sleep(backoff).await;
                backoff *= 2;
            }
            Err(e) => return Err(e.into()),
        }
    }

    unreachable!("loop returns on the last attempt")
}

fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect()
}
