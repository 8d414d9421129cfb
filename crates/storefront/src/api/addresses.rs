//! `/addresses` endpoints.

use atelier_core::AddressId;
use reqwest::Method;
use tracing::instrument;

use super::{Address, AddressInput, ApiClient, ApiError};

fn address_path(id: &AddressId) -> String {
    format!("/addresses/{}", urlencoding::encode(id.as_str()))
}

impl ApiClient {
    /// List saved addresses.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_addresses(&self, token: &str) -> Result<Vec<Address>, ApiError> {
        self.send_data(self.request(Method::GET, "/addresses", Some(token)))
            .await
    }

    /// Save a new address. Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the address.
    #[instrument(skip(self, token, input))]
    pub async fn add_address(
        &self,
        token: &str,
        input: &AddressInput,
    ) -> Result<Vec<Address>, ApiError> {
        self.send_data(
            self.request(Method::POST, "/addresses", Some(token))
                .json(input),
        )
        .await
    }

    /// Replace a saved address. Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(address_id = %id))]
    pub async fn update_address(
        &self,
        token: &str,
        id: &AddressId,
        input: &AddressInput,
    ) -> Result<Vec<Address>, ApiError> {
        self.send_data(
            self.request(Method::PUT, &address_path(id), Some(token))
                .json(input),
        )
        .await
    }

    /// Delete a saved address. Returns the updated list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(address_id = %id))]
    pub async fn remove_address(
        &self,
        token: &str,
        id: &AddressId,
    ) -> Result<Vec<Address>, ApiError> {
        self.send_data(self.request(Method::DELETE, &address_path(id), Some(token)))
            .await
    }
}
