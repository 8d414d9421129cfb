//! `/orders` endpoints for customers.

use atelier_core::{CartId, OrderId};
use reqwest::Method;
use tracing::instrument;

use super::{
    ApiClient, ApiError, CashOrderRequest, CheckoutSessionResponse, Order, Page, ShippingAddress,
};

fn order_path(id: &OrderId) -> String {
    format!("/orders/{}", urlencoding::encode(id.as_str()))
}

impl ApiClient {
    /// The signed-in user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn list_my_orders(&self, token: &str, page: u32) -> Result<Page<Order>, ApiError> {
        let request = self
            .request(Method::GET, "/orders", Some(token))
            .query(&[("page", page.to_string()), ("sort", "-createdAt".to_string())]);
        self.send_page(request).await
    }

    /// A single order owned by the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn get_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        self.send_data(self.request(Method::GET, &order_path(id), Some(token)))
            .await
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses (e.g. the order already shipped).
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn cancel_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("{}/cancel", order_path(id));
        self.send_data(self.request(Method::PUT, &path, Some(token)))
            .await
    }

    /// Place a cash-on-delivery order from the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the order.
    #[instrument(skip(self, token, shipping_address), fields(cart_id = %cart_id))]
    pub async fn create_cash_order(
        &self,
        token: &str,
        cart_id: &CartId,
        shipping_address: ShippingAddress,
    ) -> Result<Order, ApiError> {
        let path = format!("/orders/{}", urlencoding::encode(cart_id.as_str()));
        self.send_data(
            self.request(Method::POST, &path, Some(token))
                .json(&CashOrderRequest { shipping_address }),
        )
        .await
    }

    /// Open a hosted card-payment session for the cart. Returns the URL the
    /// customer is redirected to.
    ///
    /// # Errors
    ///
    /// Returns an error if the API cannot create the session.
    #[instrument(skip(self, token, shipping_address), fields(cart_id = %cart_id))]
    pub async fn create_checkout_session(
        &self,
        token: &str,
        cart_id: &CartId,
        shipping_address: &ShippingAddress,
        return_url: &str,
    ) -> Result<String, ApiError> {
        let path = format!(
            "/orders/checkout-session/{}",
            urlencoding::encode(cart_id.as_str())
        );
        let request = self.request(Method::GET, &path, Some(token)).query(&[
            ("url", return_url),
            ("details", shipping_address.details.as_str()),
            ("phone", shipping_address.phone.as_str()),
            ("city", shipping_address.city.as_str()),
            ("postalCode", shipping_address.postal_code.as_str()),
        ]);
        let response: CheckoutSessionResponse = self.send(request).await?;
        Ok(response.session.url)
    }
}
