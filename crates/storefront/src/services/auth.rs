//! Authentication context.
//!
//! Credentials are checked by the commerce API; this service validates forms
//! before calling it, stores the resulting [`CurrentUser`] in the session,
//! and warms the cart and wishlist caches for shoppers.

use atelier_core::Email;
use atelier_core::validation::{
    SignupFields, ValidationError, validate_password_change, validate_password_reset, validate_profile,
    validate_signup,
};
use tower_sessions::Session;
use tower_sessions::cookie::time::Duration;
use tower_sessions::cookie::{Cookie, SameSite};
use tracing::{info, instrument, warn};

use super::cart::CartService;
use super::wishlist::WishlistService;
use super::{ServiceError, ServiceResult};
use crate::api::auth::SignupRequest;
use crate::api::users::UpdateMeRequest;
use crate::api::{ApiClient, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::middleware::auth::{clear_current_user, set_current_user, update_current_user};
use crate::middleware::route_gate::TOKEN_COOKIE;
use crate::models::{CurrentUser, session_keys};

/// Lifetime of the `token` cookie (matches the session expiry).
const TOKEN_COOKIE_DAYS: i64 = 7;

/// Build the `token` cookie the route gate looks for.
#[must_use]
pub fn token_cookie(token: &str, secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, token.to_owned()))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::days(TOKEN_COOKIE_DAYS))
        .build()
}

/// Build a cookie that deletes `token`.
#[must_use]
pub fn expired_token_cookie(secure: bool) -> Cookie<'static> {
    Cookie::build((TOKEN_COOKIE, ""))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(Duration::ZERO)
        .build()
}

/// Authentication operations bound to one visitor's session.
pub struct AuthService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
}

impl<'a> AuthService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session) -> Self {
        Self { api, session }
    }

    /// Store the user and warm the shopper caches. Cache failures are logged
    /// and ignored; the pages refetch on demand.
    async fn establish(&self, user: User, token: String) -> ServiceResult<CurrentUser> {
        let current = CurrentUser::new(user, token);
        set_current_user(self.session, &current).await?;
        set_sentry_user(&current.id, Some(&current.email));

        if current.can_shop() {
            if let Err(e) = CartService::new(self.api, self.session, &current).load().await {
                warn!(error = %e, "Failed to load cart after login");
            }
            if let Err(e) = WishlistService::new(self.api, self.session, &current)
                .load()
                .await
            {
                warn!(error = %e, "Failed to load wishlist after login");
            }
        }

        info!(user_id = %current.id, role = %current.role, "User signed in");
        Ok(current)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, or an API error if
    /// the credentials are rejected.
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> ServiceResult<CurrentUser> {
        let email = Email::parse(email).map_err(ValidationError::from)?;
        if password.is_empty() {
            return Err(ServiceError::Rejected("Enter your password"));
        }
        let auth = self.api.login(email.as_str(), password).await?;
        self.establish(auth.user, auth.token).await
    }

    /// Create an account and sign in.
    ///
    /// Validation runs first; a failing check never reaches the API.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error if signup is
    /// rejected (e.g. the email is taken).
    #[instrument(skip(self, fields), fields(email = %fields.email))]
    pub async fn signup(&self, fields: &SignupFields<'_>) -> ServiceResult<CurrentUser> {
        let valid = validate_signup(fields)?;
        let auth = self
            .api
            .signup(&SignupRequest {
                name: &valid.name,
                email: valid.email.as_str(),
                phone: &valid.phone,
                password: fields.password,
                password_confirm: fields.password_confirm,
            })
            .await?;
        self.establish(auth.user, auth.token).await
    }

    /// Sign out and drop every per-user cache.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> ServiceResult<()> {
        clear_current_user(self.session).await?;
        self.session.cycle_id().await?;
        clear_sentry_user();
        Ok(())
    }

    /// Start a password reset: the API emails a code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a malformed email, or an API error.
    #[instrument(skip(self))]
    pub async fn forgot_password(&self, email: &str) -> ServiceResult<()> {
        let email = Email::parse(email).map_err(ValidationError::from)?;
        self.api.forgot_password(email.as_str()).await?;
        self.session
            .insert(session_keys::RESET_EMAIL, email.as_str())
            .await?;
        self.session
            .remove_value(session_keys::RESET_VERIFIED)
            .await?;
        Ok(())
    }

    /// Check the emailed code.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if no reset was started, or an API
    /// error if the code is wrong.
    #[instrument(skip(self, code))]
    pub async fn verify_reset_code(&self, code: &str) -> ServiceResult<()> {
        self.reset_email().await?;
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::Rejected("Enter the code from the email"));
        }
        self.api.verify_reset_code(code).await?;
        self.session
            .insert(session_keys::RESET_VERIFIED, true)
            .await?;
        Ok(())
    }

    /// Set the new password and sign in with the returned token.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if the code was not verified, a
    /// validation error, or an API error.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, password: &str, confirm: &str) -> ServiceResult<CurrentUser> {
        let email = self.reset_email().await?;
        let verified: bool = self
            .session
            .get(session_keys::RESET_VERIFIED)
            .await?
            .unwrap_or(false);
        if !verified {
            return Err(ServiceError::Rejected("Verify the reset code first"));
        }
        validate_password_reset(password, confirm)?;

        let token = self.api.reset_password(&email, password).await?;
        let user = self.api.get_me(&token).await?;

        self.session.remove_value(session_keys::RESET_EMAIL).await?;
        self.session
            .remove_value(session_keys::RESET_VERIFIED)
            .await?;
        self.establish(user, token).await
    }

    /// Email of the reset in progress.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if none was started.
    pub async fn reset_email(&self) -> ServiceResult<String> {
        self.session
            .get::<String>(session_keys::RESET_EMAIL)
            .await?
            .ok_or(ServiceError::Rejected("Start by requesting a reset code"))
    }

    /// Update name, email and phone.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error.
    #[instrument(skip(self, user), fields(user_id = %user.id))]
    pub async fn update_profile(
        &self,
        user: &CurrentUser,
        name: &str,
        email: &str,
        phone: &str,
    ) -> ServiceResult<CurrentUser> {
        let valid = validate_profile(name, email, phone)?;
        let updated = self
            .api
            .update_me(
                &user.token,
                &UpdateMeRequest {
                    name: &valid.name,
                    email: valid.email.as_str(),
                    phone: &valid.phone,
                },
            )
            .await?;
        let current = CurrentUser::new(updated, user.token.clone());
        update_current_user(self.session, &current).await?;
        Ok(current)
    }

    /// Change the password. The API issues a new token, which replaces the
    /// stored one.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error (e.g. the current
    /// password is wrong).
    #[instrument(skip_all, fields(user_id = %user.id))]
    pub async fn change_password(
        &self,
        user: &CurrentUser,
        current_password: &str,
        password: &str,
        confirm: &str,
    ) -> ServiceResult<CurrentUser> {
        validate_password_change(current_password, password, confirm)?;
        let token = self
            .api
            .change_password(&user.token, current_password, password, confirm)
            .await?;
        let current = CurrentUser {
            token,
            ..user.clone()
        };
        update_current_user(self.session, &current).await?;
        Ok(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_cookie_attributes() {
        let cookie = token_cookie("abc", true);
        assert_eq!(cookie.name(), TOKEN_COOKIE);
        assert_eq!(cookie.value(), "abc");
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(true));
        assert_eq!(cookie.path(), Some("/"));
    }

    #[test]
    fn test_expired_cookie_clears_token() {
        let cookie = expired_token_cookie(false);
        assert_eq!(cookie.value(), "");
        assert_eq!(cookie.max_age(), Some(Duration::ZERO));
    }
}
