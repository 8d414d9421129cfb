//! Authentication route handlers.
//!
//! Handles login, signup, logout and the emailed-code password reset. The
//! API checks credentials; on success the session holds the user and the
//! browser gets the `token` cookie the route gate looks for.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::password::{PasswordStrength, StrengthLevel};
use atelier_core::validation::SignupFields;
use axum::{
    Form,
    extract::{Query, State},
    http::header::SET_COOKIE,
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::inline_error;
use crate::error::Result;
use crate::filters;
use crate::middleware::PageContext;
use crate::middleware::route_gate::safe_callback;
use crate::models::CurrentUser;
use crate::services::auth::{AuthService, expired_token_cookie, token_cookie};
use crate::services::flash;
use crate::state::AppState;

// =============================================================================
// Form Types
// =============================================================================

/// Login form data.
#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Signup form data.
#[derive(Debug, Default, Deserialize)]
pub struct SignupForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

/// Forgot password form data.
#[derive(Debug, Deserialize)]
pub struct ForgotPasswordForm {
    #[serde(default)]
    pub email: String,
}

/// Reset code form data.
#[derive(Debug, Deserialize)]
pub struct VerifyCodeForm {
    #[serde(default)]
    pub code: String,
}

/// Reset password form data.
#[derive(Debug, Deserialize)]
pub struct ResetPasswordForm {
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Strength meter request.
#[derive(Debug, Deserialize)]
pub struct StrengthForm {
    #[serde(default)]
    pub password: String,
}

/// `?callbackUrl=` on the login and signup pages.
#[derive(Debug, Deserialize)]
pub struct CallbackQuery {
    #[serde(rename = "callbackUrl")]
    pub callback_url: Option<String>,
}

// =============================================================================
// Templates
// =============================================================================

/// Login page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/login.html")]
pub struct LoginTemplate {
    pub page: PageContext,
    pub email: String,
    pub callback_url: String,
    pub error: Option<String>,
}

/// Signup page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/signup.html")]
pub struct SignupTemplate {
    pub page: PageContext,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub callback_url: String,
    pub error: Option<String>,
}

/// Forgot password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/forgot_password.html")]
pub struct ForgotPasswordTemplate {
    pub page: PageContext,
    pub error: Option<String>,
}

/// Reset code page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/verify_code.html")]
pub struct VerifyCodeTemplate {
    pub page: PageContext,
    pub email: String,
    pub error: Option<String>,
}

/// Reset password page template.
#[derive(Template, WebTemplate)]
#[template(path = "auth/reset_password.html")]
pub struct ResetPasswordTemplate {
    pub page: PageContext,
    pub error: Option<String>,
}

/// One criterion line under the strength meter.
#[derive(Debug, Clone)]
pub struct CriterionView {
    pub label: &'static str,
    pub met: bool,
}

/// Strength meter fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/password_strength.html")]
pub struct PasswordStrengthTemplate {
    pub score: u8,
    pub label: &'static str,
    pub css_class: &'static str,
    pub criteria: Vec<CriterionView>,
    pub empty: bool,
}

impl PasswordStrengthTemplate {
    fn of(password: &str) -> Self {
        let strength = PasswordStrength::of(password);
        let c = strength.criteria;
        let level: StrengthLevel = strength.level();
        Self {
            score: strength.score,
            label: level.label(),
            css_class: level.css_class(),
            criteria: vec![
                CriterionView {
                    label: "At least 8 characters",
                    met: c.min_length,
                },
                CriterionView {
                    label: "12 characters or more",
                    met: c.long,
                },
                CriterionView {
                    label: "Upper and lower case letters",
                    met: c.mixed_case,
                },
                CriterionView {
                    label: "A number",
                    met: c.digit,
                },
                CriterionView {
                    label: "A symbol",
                    met: c.symbol,
                },
            ],
            empty: password.is_empty(),
        }
    }
}

// =============================================================================
// Helpers
// =============================================================================

/// Where to land after signing in: a safe callback, else the admin console
/// for admins and the home page for shoppers.
fn landing(user: &CurrentUser, callback: Option<&str>) -> String {
    safe_callback(callback.filter(|c| !c.is_empty()))
        .map(str::to_owned)
        .unwrap_or_else(|| if user.is_admin() { "/admin" } else { "/" }.to_owned())
}

fn signed_in(user: &CurrentUser, callback: Option<&str>, secure: bool) -> Response {
    let cookie = token_cookie(&user.token, secure);
    (
        [(SET_COOKIE, cookie.to_string())],
        Redirect::to(&landing(user, callback)),
    )
        .into_response()
}

// =============================================================================
// Login & signup
// =============================================================================

/// Display the login page. Signed-in visitors go straight on.
pub async fn login_page(page: PageContext, Query(query): Query<CallbackQuery>) -> Response {
    if let Some(user) = &page.user {
        return Redirect::to(&landing(user, query.callback_url.as_deref())).into_response();
    }
    LoginTemplate {
        page,
        email: String::new(),
        callback_url: query.callback_url.unwrap_or_default(),
        error: None,
    }
    .into_response()
}

/// Handle login form submission.
#[instrument(skip_all)]
pub async fn login(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<LoginForm>,
) -> Result<Response> {
    match AuthService::new(state.api(), &session)
        .login(&form.email, &form.password)
        .await
    {
        Ok(user) => {
            flash::success(&session, format!("Welcome back, {}", user.first_name())).await?;
            Ok(signed_in(
                &user,
                form.callback_url.as_deref(),
                state.config().is_secure(),
            ))
        }
        Err(e) => {
            tracing::info!(error = %e, "Login refused");
            Ok(LoginTemplate {
                page,
                error: Some(inline_error(e)?),
                email: form.email,
                callback_url: form.callback_url.unwrap_or_default(),
            }
            .into_response())
        }
    }
}

/// Display the signup page.
pub async fn signup_page(page: PageContext, Query(query): Query<CallbackQuery>) -> Response {
    if let Some(user) = &page.user {
        return Redirect::to(&landing(user, query.callback_url.as_deref())).into_response();
    }
    SignupTemplate {
        page,
        name: String::new(),
        email: String::new(),
        phone: String::new(),
        callback_url: query.callback_url.unwrap_or_default(),
        error: None,
    }
    .into_response()
}

/// Handle signup form submission.
///
/// Validation runs before the API is called; a failing check re-renders the
/// form with the first error.
#[instrument(skip_all)]
pub async fn signup(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<SignupForm>,
) -> Result<Response> {
    let fields = SignupFields {
        name: &form.name,
        email: &form.email,
        phone: &form.phone,
        password: &form.password,
        password_confirm: &form.password_confirm,
    };
    match AuthService::new(state.api(), &session).signup(&fields).await {
        Ok(user) => {
            flash::success(&session, format!("Welcome, {}", user.first_name())).await?;
            Ok(signed_in(
                &user,
                form.callback_url.as_deref(),
                state.config().is_secure(),
            ))
        }
        Err(e) => Ok(SignupTemplate {
            page,
            error: Some(inline_error(e)?),
            name: form.name,
            email: form.email,
            phone: form.phone,
            callback_url: form.callback_url.unwrap_or_default(),
        }
        .into_response()),
    }
}

/// Sign out: clear the session caches and delete the `token` cookie.
#[instrument(skip_all)]
pub async fn logout(State(state): State<AppState>, session: Session) -> Result<Response> {
    AuthService::new(state.api(), &session).logout().await?;
    let cookie = expired_token_cookie(state.config().is_secure());
    Ok(([(SET_COOKIE, cookie.to_string())], Redirect::to("/")).into_response())
}

/// Render the strength meter for the typed password.
pub async fn password_strength(Form(form): Form<StrengthForm>) -> impl IntoResponse {
    PasswordStrengthTemplate::of(&form.password)
}

// =============================================================================
// Password reset
// =============================================================================

/// Display the forgot password page.
pub async fn forgot_password_page(page: PageContext) -> impl IntoResponse {
    ForgotPasswordTemplate { page, error: None }
}

/// Request a reset code by email.
#[instrument(skip_all)]
pub async fn forgot_password(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<ForgotPasswordForm>,
) -> Result<Response> {
    match AuthService::new(state.api(), &session)
        .forgot_password(&form.email)
        .await
    {
        Ok(()) => {
            flash::success(&session, "We emailed you a reset code").await?;
            Ok(Redirect::to("/verify-code").into_response())
        }
        Err(e) => Ok(ForgotPasswordTemplate {
            page,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

/// Display the reset code page. Without a reset in progress, start over.
pub async fn verify_code_page(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> Response {
    match AuthService::new(state.api(), &session).reset_email().await {
        Ok(email) => VerifyCodeTemplate {
            page,
            email,
            error: None,
        }
        .into_response(),
        Err(_) => Redirect::to("/forgot-password").into_response(),
    }
}

/// Check the emailed code.
#[instrument(skip_all)]
pub async fn verify_code(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<VerifyCodeForm>,
) -> Result<Response> {
    let auth = AuthService::new(state.api(), &session);
    match auth.verify_reset_code(&form.code).await {
        Ok(()) => Ok(Redirect::to("/reset-password").into_response()),
        Err(e) => {
            let error = inline_error(e)?;
            let email = auth.reset_email().await.unwrap_or_default();
            Ok(VerifyCodeTemplate {
                page,
                email,
                error: Some(error),
            }
            .into_response())
        }
    }
}

/// Display the new password page.
pub async fn reset_password_page(page: PageContext) -> impl IntoResponse {
    ResetPasswordTemplate { page, error: None }
}

/// Set the new password and sign in.
#[instrument(skip_all)]
pub async fn reset_password(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Form(form): Form<ResetPasswordForm>,
) -> Result<Response> {
    match AuthService::new(state.api(), &session)
        .reset_password(&form.password, &form.password_confirm)
        .await
    {
        Ok(user) => {
            flash::success(&session, "Password reset. You're signed in.").await?;
            Ok(signed_in(&user, None, state.config().is_secure()))
        }
        Err(e) => Ok(ResetPasswordTemplate {
            page,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

#[cfg(test)]
mod tests {
    use atelier_core::{Role, UserId};

    use super::*;

    fn user(role: Role) -> CurrentUser {
        CurrentUser {
            id: UserId::new("u1"),
            name: "Mona Adel".to_owned(),
            email: "mona@example.com".to_owned(),
            role,
            token: "t".to_owned(),
        }
    }

    #[test]
    fn test_landing_prefers_safe_callback() {
        assert_eq!(landing(&user(Role::User), Some("/cart")), "/cart");
        assert_eq!(landing(&user(Role::User), Some("//evil.example")), "/");
        assert_eq!(landing(&user(Role::User), Some("")), "/");
    }

    #[test]
    fn test_admins_land_on_console() {
        assert_eq!(landing(&user(Role::Admin), None), "/admin");
    }

    #[test]
    fn test_strength_fragment_reflects_criteria() {
        let meter = PasswordStrengthTemplate::of("abcdefgh");
        assert_eq!(meter.score, 25);
        assert_eq!(meter.criteria.iter().filter(|c| c.met).count(), 1);
        assert!(!meter.empty);
    }
}
