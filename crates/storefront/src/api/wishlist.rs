//! `/wishlist` endpoints.

use atelier_core::ProductId;
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Product};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct WishlistRequest<'a> {
    product_id: &'a ProductId,
}

impl ApiClient {
    /// Fetch the populated wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn get_wishlist(&self, token: &str) -> Result<Vec<Product>, ApiError> {
        self.send_data(self.request(Method::GET, "/wishlist", Some(token)))
            .await
    }

    /// Add a product. The API answers with the bare id list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the addition.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        self.send_data(
            self.request(Method::POST, "/wishlist", Some(token))
                .json(&WishlistRequest { product_id }),
        )
        .await
    }

    /// Remove a product. The API answers with the bare id list.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn remove_from_wishlist(
        &self,
        token: &str,
        product_id: &ProductId,
    ) -> Result<Vec<ProductId>, ApiError> {
        let path = format!("/wishlist/{}", urlencoding::encode(product_id.as_str()));
        self.send_data(self.request(Method::DELETE, &path, Some(token)))
            .await
    }
}
