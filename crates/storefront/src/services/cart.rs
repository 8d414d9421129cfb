//! Cart context.
//!
//! The session holds the last cart snapshot the API returned. Every mutation
//! replaces it wholesale; the storefront never edits lines locally.

use atelier_core::{CartItemId, ProductId};
use tower_sessions::Session;
use tracing::instrument;

use super::{ServiceError, ServiceResult};
use crate::api::{ApiClient, Cart};
use crate::error::add_breadcrumb;
use crate::models::{CurrentUser, session_keys};

/// Cart operations for one signed-in user.
pub struct CartService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
    user: &'a CurrentUser,
}

impl<'a> CartService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session, user: &'a CurrentUser) -> Self {
        Self { api, session, user }
    }

    /// The cached cart, without calling the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn cached(&self) -> ServiceResult<Option<Cart>> {
        Ok(self.session.get(session_keys::CART).await?)
    }

    async fn store(&self, cart: Option<&Cart>) -> ServiceResult<()> {
        match cart {
            Some(cart) => self.session.insert(session_keys::CART, cart).await?,
            None => {
                self.session.remove_value(session_keys::CART).await?;
            }
        }
        Ok(())
    }

    /// Fetch the cart from the API and cache it. A missing cart is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call or session write fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn load(&self) -> ServiceResult<Option<Cart>> {
        let cart = self.api.get_cart(&self.user.token).await?;
        self.store(cart.as_ref()).await?;
        Ok(cart)
    }

    fn ensure_shopper(&self) -> ServiceResult<()> {
        if self.user.can_shop() {
            Ok(())
        } else {
            Err(ServiceError::Rejected("Admin accounts can't add items to the cart"))
        }
    }

    /// Add one unit of a product.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] for admins, or an error if the API
    /// rejects the addition.
    #[instrument(skip(self), fields(user_id = %self.user.id, product_id = %product_id))]
    pub async fn add(
        &self,
        product_id: &ProductId,
        color: Option<&str>,
        size: Option<&str>,
    ) -> ServiceResult<Cart> {
        self.ensure_shopper()?;
        let cart = self
            .api
            .add_to_cart(&self.user.token, product_id, color, size)
            .await?;
        self.store(Some(&cart)).await?;
        add_breadcrumb("cart", "Added to cart", Some(&[("product_id", product_id.as_str())]));
        Ok(cart)
    }

    /// Change a line's quantity. Zero removes the line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self), fields(user_id = %self.user.id, item_id = %item_id))]
    pub async fn update_quantity(&self, item_id: &CartItemId, quantity: u32) -> ServiceResult<Cart> {
        if quantity == 0 {
            return self.remove(item_id).await;
        }
        let cart = self
            .api
            .update_cart_item(&self.user.token, item_id, quantity)
            .await?;
        self.store(Some(&cart)).await?;
        Ok(cart)
    }

    /// Remove a line.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self), fields(user_id = %self.user.id, item_id = %item_id))]
    pub async fn remove(&self, item_id: &CartItemId) -> ServiceResult<Cart> {
        let cart = self
            .api
            .remove_cart_item(&self.user.token, item_id)
            .await?;
        self.store(Some(&cart)).await?;
        Ok(cart)
    }

    /// Empty the cart.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the request.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn clear(&self) -> ServiceResult<()> {
        self.api.clear_cart(&self.user.token).await?;
        self.forget().await
    }

    /// Drop the cached cart without calling the API (after an order was
    /// placed, the API has already consumed the cart).
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be modified.
    pub async fn forget(&self) -> ServiceResult<()> {
        self.store(None).await
    }

    /// Apply a coupon code.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a blank code, or an error if the API
    /// rejects the coupon.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn apply_coupon(&self, code: &str) -> ServiceResult<Cart> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ServiceError::Rejected("Enter a coupon code"));
        }
        let cart = self.api.apply_coupon(&self.user.token, code).await?;
        self.store(Some(&cart)).await?;
        Ok(cart)
    }
}

/// Number of units in the cached cart, for the navbar badge.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn cached_item_count(session: &Session) -> ServiceResult<u32> {
    let cart: Option<Cart> = session.get(session_keys::CART).await?;
    Ok(cart.map_or(0, |c| c.item_count()))
}
