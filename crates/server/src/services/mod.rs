//! Application services.
//!
//! Services own the business logic; routes stay thin and repositories stay
//! dumb.

pub mod auth;
pub mod mailer;
pub mod sync;
pub mod token;

pub use auth::{AuthError, AuthService};
pub use mailer::Mailer;
pub use sync::{RefreshLocks, SyncError, SyncService};
pub use token::{Claims, TokenError, TokenService};
