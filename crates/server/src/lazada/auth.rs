//! OAuth flows against the Lazada auth gateway.
//!
//! Token create/refresh calls go to the shared auth gateway rather than a
//! region gateway, but are signed the same way as every other call.

use secrecy::ExposeSecret;
use tracing::instrument;

use crate::config::LazadaConfig;

use super::client::send_with_retry;
use super::sign::sign_request;
use super::types::{Region, SellerProfile, TokenResponse};
use super::LazadaError;

/// Shared auth gateway for token operations.
const AUTH_GATEWAY: &str = "https://auth.lazada.com/rest";

/// Seller-facing authorization page.
const AUTHORIZE_ENDPOINT: &str = "https://auth.lazada.com/oauth/authorize";

/// Build the URL a seller visits to authorize this application.
///
/// `state` is echoed back on the callback and must be verified there
/// (CSRF protection).
#[must_use]
pub fn authorization_url(config: &LazadaConfig, state: &str) -> String {
    let redirect_uri = format!("{}/lazada", config.redirect_url_base);

    format!(
        "{AUTHORIZE_ENDPOINT}?client_id={}&redirect_uri={}&force_auth=true&response_type=code&state={}",
        urlencoding::encode(&config.app_key),
        urlencoding::encode(&redirect_uri),
        urlencoding::encode(state),
    )
}

/// Exchange an authorization code for a token pair.
///
/// # Errors
///
/// Returns `LazadaError::OAuth` if the gateway rejects the code.
#[instrument(skip(http, config, code))]
pub async fn exchange_code(
    http: &reqwest::Client,
    config: &LazadaConfig,
    code: &str,
) -> Result<TokenResponse, LazadaError> {
    token_call(http, config, "/auth/token/create", ("code", code)).await
}

/// Obtain a fresh token pair from a refresh token.
///
/// # Errors
///
/// Returns `LazadaError::OAuth` if the refresh token is expired or revoked.
#[instrument(skip_all)]
pub async fn refresh_access_token(
    http: &reqwest::Client,
    config: &LazadaConfig,
    refresh_token: &str,
) -> Result<TokenResponse, LazadaError> {
    token_call(
        http,
        config,
        "/auth/token/refresh",
        ("refresh_token", refresh_token),
    )
    .await
}

/// Fetch the seller profile for the authorized account.
///
/// # Errors
///
/// Returns `LazadaError::Api` if the platform rejects the call.
#[instrument(skip(http, config, access_token), fields(region = %region))]
pub async fn get_seller(
    http: &reqwest::Client,
    config: &LazadaConfig,
    region: Region,
    access_token: &str,
) -> Result<SellerProfile, LazadaError> {
    let api_path = "/seller/get";
    let mut params = base_params(config);
    params.push(("access_token".to_owned(), access_token.to_owned()));

    let sign = sign_request(config.app_secret.expose_secret(), api_path, &params);
    params.push(("sign".to_owned(), sign));

    let url = format!("{}{api_path}", region.gateway());
    let response = send_with_retry(http, &url, &params).await?;
    let body: serde_json::Value = response.json().await?;

    check_code(&body)?;

    let data = body.get("data").cloned().unwrap_or_default();
    Ok(serde_json::from_value(data)?)
}

/// Signed call against the auth gateway. Token endpoints return the token
/// fields beside the envelope `code`, not nested under `data`.
async fn token_call(
    http: &reqwest::Client,
    config: &LazadaConfig,
    api_path: &str,
    grant: (&str, &str),
) -> Result<TokenResponse, LazadaError> {
    let mut params = base_params(config);
    params.push((grant.0.to_owned(), grant.1.to_owned()));

    let sign = sign_request(config.app_secret.expose_secret(), api_path, &params);
    params.push(("sign".to_owned(), sign));

    let url = format!("{AUTH_GATEWAY}{api_path}");
    let response = send_with_retry(http, &url, &params).await?;
    let body: serde_json::Value = response.json().await?;

    if let Err(LazadaError::Api { code, message }) = check_code(&body) {
        return Err(LazadaError::OAuth(format!(
            "{api_path} failed ({code}): {message}"
        )));
    }

    Ok(serde_json::from_value(body)?)
}

fn base_params(config: &LazadaConfig) -> Vec<(String, String)> {
    vec![
        ("app_key".to_owned(), config.app_key.clone()),
        ("sign_method".to_owned(), "sha256".to_owned()),
        (
            "timestamp".to_owned(),
            chrono::Utc::now().timestamp_millis().to_string(),
        ),
    ]
}

fn check_code(body: &serde_json::Value) -> Result<(), LazadaError> {
    let code = body.get("code").and_then(serde_json::Value::as_str).unwrap_or("0");
    if code == "0" {
        return Ok(());
    }

    Err(LazadaError::Api {
        code: code.to_owned(),
        message: body
            .get("message")
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_owned(),
    })
}

#[cfg(test)]
mod tests {
    use secrecy::SecretString;

    use super::*;

    fn test_config() -> LazadaConfig {
        LazadaConfig {
            app_key: "112384".to_owned(),
            app_secret: SecretString::from("app-secret"),
            redirect_url_base: "https://partner.example.com/auth".to_owned(),
        }
    }

    #[test]
    fn test_authorization_url_embeds_client_and_callback() {
        let url = authorization_url(&test_config(), "csrf-state");

        assert!(url.starts_with(AUTHORIZE_ENDPOINT));
        assert!(url.contains("client_id=112384"));
        assert!(url.contains("response_type=code"));
        assert!(url.contains(&urlencoding::encode("https://partner.example.com/auth/lazada").into_owned()));
        assert!(url.contains("state=csrf-state"));
    }

    #[test]
    fn test_authorization_url_is_deterministic() {
        let config = test_config();
        assert_eq!(
            authorization_url(&config, "s"),
            authorization_url(&config, "s")
        );
    }

    #[test]
    fn test_check_code_accepts_zero_and_missing() {
        assert!(check_code(&serde_json::json!({"code": "0"})).is_ok());
        assert!(check_code(&serde_json::json!({})).is_ok());
    }

    #[test]
    fn test_check_code_rejects_platform_errors() {
        let body = serde_json::json!({"code": "IncompleteSignature", "message": "bad sign"});
        let err = check_code(&body).unwrap_err();
        assert!(matches!(
            err,
            LazadaError::Api { code, message }
                if code == "IncompleteSignature" && message == "bad sign"
        ));
    }
}
