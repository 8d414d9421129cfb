//! `/cart` endpoints. Every mutation returns the full cart snapshot.

use atelier_core::{CartItemId, ProductId};
use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::{AddToCart, ApiClient, ApiError, Cart};

#[derive(Serialize)]
struct QuantityRequest {
    quantity: u32,
}

#[derive(Serialize)]
struct CouponRequest<'a> {
    coupon: &'a str,
}

fn item_path(id: &CartItemId) -> String {
    format!("/cart/{}", urlencoding::encode(id.as_str()))
}

impl ApiClient {
    /// Fetch the user's cart. `None` when the user has no cart yet (the API
    /// answers 404).
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails for any other reason.
    #[instrument(skip(self, token))]
    pub async fn get_cart(&self, token: &str) -> Result<Option<Cart>, ApiError> {
        match self
            .send_data(self.request(Method::GET, "/cart", Some(token)))
            .await
        {
            Ok(cart) => Ok(Some(cart)),
            Err(ApiError::NotFound(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the addition.
    #[instrument(skip(self, token), fields(product_id = %product_id))]
    pub async fn add_to_cart(
        &self,
        token: &str,
        product_id: &ProductId,
        color: Option<&str>,
        size: Option<&str>,
    ) -> Result<Cart, ApiError> {
        self.send_data(
            self.request(Method::POST, "/cart", Some(token))
                .json(&AddToCart {
                    product_id,
                    color,
                    size,
                }),
        )
        .await
    }

    /// Set the quantity of a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn update_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
        quantity: u32,
    ) -> Result<Cart, ApiError> {
        self.send_data(
            self.request(Method::PUT, &item_path(item_id), Some(token))
                .json(&QuantityRequest { quantity }),
        )
        .await
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(item_id = %item_id))]
    pub async fn remove_cart_item(
        &self,
        token: &str,
        item_id: &CartItemId,
    ) -> Result<Cart, ApiError> {
        self.send_data(self.request(Method::DELETE, &item_path(item_id), Some(token)))
            .await
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    #[instrument(skip(self, token))]
    pub async fn clear_cart(&self, token: &str) -> Result<(), ApiError> {
        self.send_unit(self.request(Method::DELETE, "/cart", Some(token)))
            .await
    }

    /// Apply a coupon code. The returned cart carries
    /// `totalPriceAfterDiscount`.
    ///
    /// # Errors
    ///
    /// Returns an error if the coupon is invalid or expired.
    #[instrument(skip(self, token))]
    pub async fn apply_coupon(&self, token: &str, code: &str) -> Result<Cart, ApiError> {
        self.send_data(
            self.request(Method::PUT, "/cart/applyCoupon", Some(token))
                .json(&CouponRequest { coupon: code }),
        )
        .await
    }
}
