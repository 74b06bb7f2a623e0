//! User model.

use chrono::{DateTime, Utc};
use serde::Serialize;

use sellerdesk_core::{Email, UserId, UserRole};

/// A user account.
///
/// The password hash never leaves the repository layer; this model carries
/// only the fields the rest of the application is allowed to see.
#[derive(Debug, Clone)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    /// Set one second in the past on every credential change so a token
    /// issued in the same second as the change stays valid.
    pub password_changed_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Whether the password was changed at or after the given token issue
    /// time (Unix seconds). Tokens from before the change are revoked.
    #[must_use]
    pub const fn password_changed_after(&self, issued_at: i64) -> bool {
        self.password_changed_at.timestamp() >= issued_at
    }

    /// Whether this account may access admin-only routes.
    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// User shape returned by the API. Excludes credential fields.
#[derive(Debug, Clone, Serialize)]
pub struct PublicUser {
    pub id: UserId,
    pub name: String,
    pub email: Email,
    pub phone: Option<String>,
    pub role: UserRole,
    pub created_at: DateTime<Utc>,
}

impl From<User> for PublicUser {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn user_changed_at(changed_at: DateTime<Utc>) -> User {
        User {
            id: UserId::new(1),
            name: "Test".to_owned(),
            email: Email::parse("test@example.com").unwrap(),
            phone: None,
            role: UserRole::User,
            password_changed_at: changed_at,
            created_at: changed_at,
            updated_at: changed_at,
        }
    }

    #[test]
    fn test_token_issued_before_change_is_revoked() {
        let changed = Utc::now();
        let user = user_changed_at(changed);
        let issued_before = (changed - Duration::hours(1)).timestamp();
        assert!(user.password_changed_after(issued_before));
    }

    #[test]
    fn test_token_issued_after_change_is_valid() {
        let changed = Utc::now();
        let user = user_changed_at(changed);
        let issued_after = (changed + Duration::seconds(5)).timestamp();
        assert!(!user.password_changed_after(issued_after));
    }

    #[test]
    fn test_token_issued_in_same_second_is_revoked() {
        let changed = Utc::now();
        let user = user_changed_at(changed);
        assert!(user.password_changed_after(changed.timestamp()));
    }

    #[test]
    fn test_only_admin_role_passes_the_admin_gate() {
        let mut user = user_changed_at(Utc::now());
        assert!(!user.is_admin());

        user.role = UserRole::Admin;
        assert!(user.is_admin());
    }

    #[test]
    fn test_public_user_carries_no_credential_fields() {
        let user = user_changed_at(Utc::now());
        let public = PublicUser::from(user.clone());

        let json = serde_json::to_value(&public).unwrap();
        assert_eq!(json["email"], user.email.as_str());
        assert!(json.get("password_hash").is_none());
        assert!(json.get("password_changed_at").is_none());
    }
}
