//! `/auth/*` endpoints.

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Envelope, User};

/// A user together with the bearer token the API issued for them.
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub user: User,
    pub token: String,
}

impl AuthSession {
    fn from_envelope(envelope: Envelope<User>) -> Result<Self, ApiError> {
        let token = envelope.token.filter(|t| !t.is_empty()).ok_or_else(|| {
            ApiError::Status {
                status: reqwest::StatusCode::BAD_GATEWAY,
                message: None,
            }
        })?;
        Ok(Self {
            user: envelope.data,
            token,
        })
    }
}

/// `POST /auth/signup` body.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
    pub password: &'a str,
    pub password_confirm: &'a str,
}

#[derive(Serialize)]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct ForgotPasswordRequest<'a> {
    email: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct VerifyResetCodeRequest<'a> {
    reset_code: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ResetPasswordRequest<'a> {
    email: &'a str,
    new_password: &'a str,
}

/// Token-only response of `PUT /auth/resetPassword`.
#[derive(serde::Deserialize)]
struct TokenResponse {
    token: String,
}

/// A 401 from a credential check means wrong credentials, not an expired
/// token, and must not send the visitor through the re-login redirect.
pub(super) fn credentials_refused(err: ApiError) -> ApiError {
    match err {
        ApiError::Unauthorized(message) => ApiError::Status {
            status: reqwest::StatusCode::UNAUTHORIZED,
            message,
        },
        other => other,
    }
}

impl ApiClient {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the signup or the request fails.
    #[instrument(skip(self, request), fields(email = %request.email))]
    pub async fn signup(&self, request: &SignupRequest<'_>) -> Result<AuthSession, ApiError> {
        let envelope = self
            .send(self.request(Method::POST, "/auth/signup", None).json(request))
            .await?;
        AuthSession::from_envelope(envelope)
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials are rejected or the request fails.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &str, password: &str) -> Result<AuthSession, ApiError> {
        let envelope = self
            .send(
                self.request(Method::POST, "/auth/login", None)
                    .json(&LoginRequest { email, password }),
            )
            .await
            .map_err(credentials_refused)?;
        AuthSession::from_envelope(envelope)
    }

    /// Ask the API to email a reset code.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    #[instrument(skip(self), fields(email = %email))]
    pub async fn forgot_password(&self, email: &str) -> Result<(), ApiError> {
        self.send_unit(
            self.request(Method::POST, "/auth/forgotPassword", None)
                .json(&ForgotPasswordRequest { email }),
        )
        .await
    }

    /// Check an emailed reset code.
    ///
    /// # Errors
    ///
    /// Returns an error if the code is wrong or expired.
    #[instrument(skip(self, code))]
    pub async fn verify_reset_code(&self, code: &str) -> Result<(), ApiError> {
        self.send_unit(
            self.request(Method::POST, "/auth/verifyResetCode", None)
                .json(&VerifyResetCodeRequest { reset_code: code }),
        )
        .await
        .map_err(credentials_refused)
    }

    /// Set a new password after a verified reset code. Returns a fresh token.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the reset.
    #[instrument(skip(self, new_password), fields(email = %email))]
    pub async fn reset_password(&self, email: &str, new_password: &str) -> Result<String, ApiError> {
        let response: TokenResponse = self
            .send(
                self.request(Method::PUT, "/auth/resetPassword", None)
                    .json(&ResetPasswordRequest {
                        email,
                        new_password,
                    }),
            )
            .await?;
        Ok(response.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refused_credentials_are_not_session_expiry() {
        let err = credentials_refused(ApiError::Unauthorized(Some(
            "Incorrect email or password".to_owned(),
        )));
        assert!(!err.is_unauthorized());
        assert_eq!(err.user_message(), "Incorrect email or password");
    }
}
