//! `/users/*` endpoints for the signed-in user.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{ApiClient, ApiError, User};

/// `PUT /users/updateMe` body.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateMeRequest<'a> {
    pub name: &'a str,
    pub email: &'a str,
    pub phone: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ChangePasswordRequest<'a> {
    current_password: &'a str,
    password: &'a str,
    password_confirm: &'a str,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: String,
}

impl ApiClient {
    /// Fetch the signed-in user's profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the token is rejected or the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_me(&self, token: &str) -> Result<User, ApiError> {
        self.send_data(self.request(Method::GET, "/users/getMe", Some(token)))
            .await
    }

    /// Update name, email and phone.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, request))]
    pub async fn update_me(
        &self,
        token: &str,
        request: &UpdateMeRequest<'_>,
    ) -> Result<User, ApiError> {
        self.send_data(
            self.request(Method::PUT, "/users/updateMe", Some(token))
                .json(request),
        )
        .await
    }

    /// Change the password. The API invalidates the old token and returns a
    /// new one.
    ///
    /// # Errors
    ///
    /// Returns an error if the current password is wrong or the request fails.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        token: &str,
        current_password: &str,
        password: &str,
        password_confirm: &str,
    ) -> Result<String, ApiError> {
        let response: TokenResponse = self
            .send(
                self.request(Method::PUT, "/users/changeMyPassword", Some(token))
                    .json(&ChangePasswordRequest {
                        current_password,
                        password,
                        password_confirm,
                    }),
            )
            .await?;
        Ok(response.token)
    }
}
