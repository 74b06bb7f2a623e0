//! Lazada open platform client.
//!
//! # Architecture
//!
//! - Plain REST over `reqwest` against the per-region API gateway
//! - Every request is signed with HMAC-SHA256 over the sorted parameters,
//!   the way the platform requires
//! - OAuth token exchange and refresh go through the shared auth gateway
//!
//! # Flow
//!
//! 1. Send the seller to [`auth::authorization_url`]
//! 2. Exchange the callback code with [`auth::exchange_code`]
//! 3. Build a region-bound [`LazadaClient`] with the access token
//! 4. Pull catalog pages with [`LazadaClient::get_products`]
//!
//! Access tokens expire; the sync service's refresh guard calls
//! [`auth::refresh_access_token`] before any authenticated call.

pub mod auth;
pub mod client;
mod sign;
pub mod types;

pub use client::LazadaClient;
pub use types::{Region, SellerProfile, TokenPair};

use thiserror::Error;

/// Errors that can occur when talking to the Lazada open platform.
#[derive(Debug, Error)]
pub enum LazadaError {
    /// HTTP transport failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The platform returned an application-level error code.
    #[error("Lazada API error {code}: {message}")]
    Api {
        /// Platform error code (anything but "0").
        code: String,
        /// Human-readable message from the platform.
        message: String,
    },

    /// OAuth exchange or refresh failed.
    #[error("OAuth error: {0}")]
    OAuth(String),

    /// Region code is not one of the markets Lazada operates in.
    #[error("unsupported region code: {0}")]
    UnsupportedRegion(String),
}
