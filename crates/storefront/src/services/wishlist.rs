//! Wishlist context.
//!
//! Removal is optimistic: the product disappears from the cached list before
//! the API answers and is put back at its old position if the API refuses.

use atelier_core::ProductId;
use tower_sessions::Session;
use tracing::instrument;

use super::{ServiceError, ServiceResult};
use crate::api::{ApiClient, ApiError, Product};
use crate::models::{CurrentUser, session_keys};

/// Wishlist operations for one signed-in user.
pub struct WishlistService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
    user: &'a CurrentUser,
}

impl<'a> WishlistService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session, user: &'a CurrentUser) -> Self {
        Self { api, session, user }
    }

    /// The cached wishlist, without calling the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn cached(&self) -> ServiceResult<Vec<Product>> {
        Ok(self
            .session
            .get(session_keys::WISHLIST)
            .await?
            .unwrap_or_default())
    }

    async fn store(&self, products: &[Product]) -> ServiceResult<()> {
        self.session.insert(session_keys::WISHLIST, products).await?;
        Ok(())
    }

    /// Fetch the wishlist from the API and cache it.
    ///
    /// # Errors
    ///
    /// Returns an error if the API call or session write fails.
    #[instrument(skip(self), fields(user_id = %self.user.id))]
    pub async fn load(&self) -> ServiceResult<Vec<Product>> {
        let products = self.api.get_wishlist(&self.user.token).await?;
        self.store(&products).await?;
        Ok(products)
    }

    /// Whether the product is in the cached wishlist.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn contains(&self, product_id: &ProductId) -> ServiceResult<bool> {
        Ok(self.cached().await?.iter().any(|p| &p.id == product_id))
    }

    /// Add a product, then refetch (the API only returns ids).
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] for admins, or an error if the API
    /// rejects the addition.
    #[instrument(skip(self), fields(user_id = %self.user.id, product_id = %product_id))]
    pub async fn add(&self, product_id: &ProductId) -> ServiceResult<Vec<Product>> {
        if !self.user.can_shop() {
            return Err(ServiceError::Rejected(
                "Admin accounts can't save items to a wishlist",
            ));
        }
        self.api
            .add_to_wishlist(&self.user.token, product_id)
            .await?;
        self.load().await
    }

    /// Remove a product optimistically.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal; the cached list is
    /// restored first.
    #[instrument(skip(self), fields(user_id = %self.user.id, product_id = %product_id))]
    pub async fn remove(&self, product_id: &ProductId) -> ServiceResult<Vec<Product>> {
        let mut products = self.cached().await?;
        let removed = products
            .iter()
            .position(|p| &p.id == product_id)
            .map(|index| (index, products.remove(index)));
        self.store(&products).await?;

        if let Err(err) = self
            .api
            .remove_from_wishlist(&self.user.token, product_id)
            .await
        {
            let restored = match removed {
                Some((index, product)) => {
                    products.insert(index.min(products.len()), product);
                    self.store(&products).await
                }
                None => Ok(()),
            };
            return Err(refused(err, restored));
        }

        Ok(products)
    }

    /// Add the product if absent, remove it if present. Returns whether the
    /// product is in the wishlist afterwards.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying add or remove fails.
    pub async fn toggle(&self, product_id: &ProductId) -> ServiceResult<bool> {
        if self.contains(product_id).await? {
            self.remove(product_id).await?;
            Ok(false)
        } else {
            self.add(product_id).await?;
            Ok(true)
        }
    }
}

/// The API refusal is what the visitor sees, even when putting the item
/// back into the session also failed.
fn refused(err: ApiError, restored: ServiceResult<()>) -> ServiceError {
    if let Err(store_err) = restored {
        tracing::error!(error = %store_err, api_error = %err, "Failed to restore wishlist after refused removal");
    }
    err.into()
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use tower_sessions::{session, session_store};

    fn locked() -> ApiError {
        ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Wishlist is temporarily locked".to_owned()),
        }
    }

    #[test]
    fn test_refusal_survives_failed_restore() {
        let store_down = ServiceError::Session(session::Error::Store(
            session_store::Error::Backend("store unavailable".to_owned()),
        ));
        let err = refused(locked(), Err(store_down));
        assert!(matches!(err, ServiceError::Api(ApiError::Status { .. })));
        assert_eq!(err.user_message(), "Wishlist is temporarily locked");
    }

    #[test]
    fn test_refusal_after_clean_restore() {
        let err = refused(locked(), Ok(()));
        assert_eq!(err.user_message(), "Wishlist is temporarily locked");
    }
}
