//! Session-related types.
//!
//! Types stored in the session for authentication state and per-user caches.

use std::fmt;

use serde::{Deserialize, Serialize};

use atelier_core::{Role, UserId};

use crate::api::User;

/// Session-stored user identity.
///
/// Holds the bearer token the API issued at login. The token is never
/// printed by `Debug`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

impl CurrentUser {
    /// Build from an API user and its token.
    #[must_use]
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    /// Admins never get cart or wishlist controls.
    #[must_use]
    pub const fn can_shop(&self) -> bool {
        self.role.can_shop()
    }

    /// First word of the name, for the navbar greeting.
    #[must_use]
    pub fn first_name(&self) -> &str {
        self.name.split_whitespace().next().unwrap_or(&self.email)
    }
}

impl fmt::Debug for CurrentUser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CurrentUser")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("role", &self.role)
            .field("token", &"[REDACTED]")
            .finish()
    }
}

/// Session keys.
pub mod keys {
    /// Key for storing the current logged-in user.
    pub const CURRENT_USER: &str = "current_user";

    /// Key for the cached cart snapshot.
    pub const CART: &str = "cart";

    /// Key for the cached wishlist.
    pub const WISHLIST: &str = "wishlist";

    /// Key for pending toast messages.
    pub const FLASH: &str = "flash";

    /// Key for the in-progress checkout (address and payment choice).
    pub const CHECKOUT: &str = "checkout";

    /// Key for the email a password reset is in progress for.
    pub const RESET_EMAIL: &str = "reset_email";

    /// Key set once the emailed reset code has been verified.
    pub const RESET_VERIFIED: &str = "reset_verified";
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Mona Adel".to_string(),
            email: "mona@example.com".to_string(),
            role,
            token: "eyJhbGciOi.secret.token".to_string(),
        }
    }

    #[test]
    fn test_debug_redacts_token() {
        let rendered = format!("{:?}", user(Role::User));
        assert!(rendered.contains("[REDACTED]"));
        assert!(!rendered.contains("secret"));
    }

    #[test]
    fn test_roles() {
        assert!(user(Role::User).can_shop());
        assert!(!user(Role::Admin).can_shop());
        assert!(user(Role::Admin).is_admin());
        assert_eq!(user(Role::User).first_name(), "Mona");
    }
}
