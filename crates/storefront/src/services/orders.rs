//! Orders context.

use atelier_core::OrderId;
use tracing::instrument;

use super::{ServiceError, ServiceResult};
use crate::api::{ApiClient, Order, Page};
use crate::models::CurrentUser;

/// Order history for one signed-in user.
pub struct OrderService<'a> {
    api: &'a ApiClient,
    user: &'a CurrentUser,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, user: &'a CurrentUser) -> Self {
        Self { api, user }
    }

    /// The user's orders, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn list_mine(&self, page: u32) -> ServiceResult<Page<Order>> {
        Ok(self.api.list_my_orders(&self.user.token, page.max(1)).await?)
    }

    /// One order.
    ///
    /// # Errors
    ///
    /// Returns an API not-found error if the order does not exist.
    #[instrument(skip(self), fields(user_id = %self.user.id, order_id = %id))]
    pub async fn get(&self, id: &OrderId) -> ServiceResult<Order> {
        Ok(self.api.get_order(&self.user.token, id).await?)
    }

    /// Cancel a pending order.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if the order is past pending, or an
    /// API error.
    #[instrument(skip(self), fields(user_id = %self.user.id, order_id = %id))]
    pub async fn cancel(&self, id: &OrderId) -> ServiceResult<Order> {
        let order = self.get(id).await?;
        if !order.status.is_cancellable_by_customer() {
            return Err(ServiceError::Rejected(
                "Only pending orders can be cancelled",
            ));
        }
        Ok(self.api.cancel_order(&self.user.token, id).await?)
    }
}
