//! Request guards.

pub mod auth;

pub use auth::{AUTH_COOKIE_NAME, RequireAdmin, RequireUser};
