//! Authentication route handlers.
//!
//! Handles signup, login, logout, and the password lifecycle. Successful
//! credential checks set the session token in the auth cookie as well as
//! returning it in the body.

use axum::{
    Json,
    extract::{Path, State},
    http::{HeaderMap, StatusCode, header::SET_COOKIE},
    response::{IntoResponse, Response},
};
use serde::Deserialize;

use crate::config::ServerConfig;
use crate::error::{AppError, Result};
use crate::middleware::{AUTH_COOKIE_NAME, RequireUser};
use crate::models::PublicUser;
use crate::routes::{success, success_message};
use crate::services::auth::{AuthService, SignupInput};
use crate::state::AppState;

// =============================================================================
// Request Bodies
// =============================================================================

/// Signup request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupBody {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirm: String,
    pub phone: Option<String>,
}

/// Login request body.
#[derive(Debug, Deserialize)]
pub struct LoginBody {
    pub email: String,
    pub password: String,
}

/// Forgot-password request body.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordBody {
    pub email: String,
}

/// Reset-password request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordBody {
    pub new_password: String,
    pub password_confirm: String,
}

/// Password-change request body.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordBody {
    pub curr_password: String,
    pub password: String,
    pub password_confirm: String,
}

// =============================================================================
// Handlers
// =============================================================================

/// Create an account and log the new user in.
///
/// # Route
///
/// `POST /api/users/signup`
pub async fn signup(
    State(state): State<AppState>,
    Json(body): Json<SignupBody>,
) -> Result<Response> {
    let service = AuthService::new(state.pool(), state.tokens(), state.mailer());

    let (user, token) = service
        .signup(SignupInput {
            name: &body.name,
            email: &body.email,
            password: &body.password,
            password_confirm: &body.password_confirm,
            phone: body.phone.as_deref(),
        })
        .await?;

    session_response(StatusCode::CREATED, user.into(), &token, state.config())
}

/// Login with email and password.
///
/// # Route
///
/// `POST /api/users/login`
pub async fn login(State(state): State<AppState>, Json(body): Json<LoginBody>) -> Result<Response> {
    if body.email.is_empty() || body.password.is_empty() {
        return Err(AppError::Validation(
            "Please provide email and password.".to_owned(),
        ));
    }

    let service = AuthService::new(state.pool(), state.tokens(), state.mailer());
    let (user, token) = service.login(&body.email, &body.password).await?;

    session_response(StatusCode::OK, user.into(), &token, state.config())
}

/// Clear the session cookie. Idempotent.
///
/// # Route
///
/// `DELETE /api/users/logout`
pub async fn logout(State(state): State<AppState>) -> Result<Response> {
    let mut response = StatusCode::NO_CONTENT.into_response();
    clear_auth_cookie(response.headers_mut(), state.config())?;
    Ok(response)
}

/// Change the current user's password and reissue the session.
///
/// # Route
///
/// `PATCH /api/users/updatePassword`
pub async fn update_password(
    State(state): State<AppState>,
    RequireUser(user): RequireUser,
    Json(body): Json<UpdatePasswordBody>,
) -> Result<Response> {
    let service = AuthService::new(state.pool(), state.tokens(), state.mailer());

    let (user, token) = service
        .update_password(
            user.id,
            &body.curr_password,
            &body.password,
            &body.password_confirm,
        )
        .await?;

    session_response(StatusCode::OK, user.into(), &token, state.config())
}

/// Issue a password-reset token and dispatch it by email.
///
/// # Route
///
/// `POST /api/users/forgotPassword`
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(body): Json<ForgotPasswordBody>,
) -> Result<Json<serde_json::Value>> {
    let service = AuthService::new(state.pool(), state.tokens(), state.mailer());
    service.forgot_password(&body.email).await?;

    Ok(success_message(
        "Your password reset token has been sent to your email.",
    ))
}

/// Redeem a password-reset token.
///
/// # Route
///
/// `PATCH /api/users/resetPassword/{token}`
pub async fn reset_password(
    State(state): State<AppState>,
    Path(token): Path<String>,
    Json(body): Json<ResetPasswordBody>,
) -> Result<Json<serde_json::Value>> {
    let service = AuthService::new(state.pool(), state.tokens(), state.mailer());
    service
        .reset_password(&token, &body.new_password, &body.password_confirm)
        .await?;

    Ok(success_message(
        "Password updated successfully. You can now log in with the new password.",
    ))
}

// =============================================================================
// Cookie Helpers
// =============================================================================

/// Build a response that carries the session both ways: auth cookie and
/// response body.
fn session_response(
    status: StatusCode,
    user: PublicUser,
    token: &str,
    config: &ServerConfig,
) -> Result<Response> {
    let mut response = (
        status,
        success(serde_json::json!({ "user": user, "token": token })),
    )
        .into_response();

    set_auth_cookie(response.headers_mut(), token, config)?;
    Ok(response)
}

/// Append the auth cookie to the response headers.
fn set_auth_cookie(headers: &mut HeaderMap, token: &str, config: &ServerConfig) -> Result<()> {
    let max_age = i64::try_from(config.cookie_ttl.as_secs()).unwrap_or(i64::MAX);
    append_cookie(headers, token, max_age, config)
}

/// Append an immediately-expiring auth cookie (logout).
fn clear_auth_cookie(headers: &mut HeaderMap, config: &ServerConfig) -> Result<()> {
    append_cookie(headers, "", -86400, config)
}

fn append_cookie(
    headers: &mut HeaderMap,
    value: &str,
    max_age: i64,
    config: &ServerConfig,
) -> Result<()> {
    let mut cookie =
        format!("{AUTH_COOKIE_NAME}={value}; SameSite=Lax; HttpOnly; Path=/; Max-Age={max_age}");
    if config.env.secure_cookies() {
        cookie.push_str("; Secure");
    }

    headers.append(
        SET_COOKIE,
        cookie
            .parse()
            .map_err(|_| AppError::Internal("failed to build auth cookie".to_owned()))?,
    );
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::time::Duration;

    use secrecy::SecretString;

    use crate::config::{AppEnv, LazadaConfig};

    use super::*;

    fn config(env: AppEnv) -> ServerConfig {
        ServerConfig {
            database_url: SecretString::from("postgres://localhost/test"),
            host: "127.0.0.1".parse().unwrap(),
            port: 3000,
            base_url: "http://localhost:3000".to_owned(),
            env,
            jwt_secret: SecretString::from("x".repeat(32)),
            session_ttl: Duration::from_secs(3600),
            cookie_ttl: Duration::from_secs(3600),
            lazada: LazadaConfig {
                app_key: "112384".to_owned(),
                app_secret: SecretString::from("app-secret"),
                redirect_url_base: "http://localhost:3000/callback".to_owned(),
            },
            sentry_dsn: None,
        }
    }

    #[test]
    fn test_auth_cookie_attributes() {
        let mut headers = HeaderMap::new();
        set_auth_cookie(&mut headers, "tok123", &config(AppEnv::Development)).unwrap();

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("authToken=tok123"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=3600"));
        assert!(!cookie.contains("Secure"));
    }

    #[test]
    fn test_auth_cookie_is_secure_in_production() {
        let mut headers = HeaderMap::new();
        set_auth_cookie(&mut headers, "tok123", &config(AppEnv::Production)).unwrap();

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.contains("Secure"));
    }

    #[test]
    fn test_clearing_expires_the_cookie() {
        let mut headers = HeaderMap::new();
        clear_auth_cookie(&mut headers, &config(AppEnv::Development)).unwrap();

        let cookie = headers.get(SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cookie.starts_with("authToken=;"));
        assert!(cookie.contains("Max-Age=-86400"));
    }
}
