//! Multi-step checkout.
//!
//! 1. Shipping address (saved or new)
//! 2. Payment method
//! 3. Review and place the order
//!
//! Choices made along the way live in the session as a [`CheckoutDraft`]
//! until the order is placed.

use atelier_core::validation::AddressFields;
use atelier_core::{AddressId, PaymentMethod};
use serde::{Deserialize, Serialize};
use tower_sessions::Session;
use tracing::{info, instrument};

use super::addresses::{AddressService, address_input};
use super::cart::CartService;
use super::{ServiceError, ServiceResult};
use crate::api::{ApiClient, Cart, Order, ShippingAddress};
use crate::error::add_breadcrumb;
use crate::models::{CurrentUser, session_keys};

/// Refusal when there is nothing to check out.
pub const EMPTY_CART: &str = "Your cart is empty";

/// Checkout choices so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDraft {
    pub shipping: Option<ShippingAddress>,
    /// Alias of the saved address used, if any.
    pub address_label: Option<String>,
    pub payment: Option<PaymentMethod>,
}

/// Checkout steps, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckoutStep {
    Address,
    Payment,
    Review,
}

impl CheckoutStep {
    /// One-based position for the step indicator.
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            Self::Address => 1,
            Self::Payment => 2,
            Self::Review => 3,
        }
    }

    #[must_use]
    pub fn from_number(n: u8) -> Option<Self> {
        match n {
            1 => Some(Self::Address),
            2 => Some(Self::Payment),
            3 => Some(Self::Review),
            _ => None,
        }
    }

    /// Furthest step the draft allows.
    #[must_use]
    pub const fn reachable(draft: &CheckoutDraft) -> Self {
        match (&draft.shipping, &draft.payment) {
            (None, _) => Self::Address,
            (Some(_), None) => Self::Payment,
            (Some(_), Some(_)) => Self::Review,
        }
    }

    /// The step to show for a requested step number: the request if it is
    /// reachable, otherwise the furthest reachable step.
    #[must_use]
    pub fn resolve(requested: Option<u8>, draft: &CheckoutDraft) -> Self {
        let reachable = Self::reachable(draft);
        requested
            .and_then(Self::from_number)
            .filter(|step| *step <= reachable)
            .unwrap_or(reachable)
    }
}

/// Outcome of placing an order.
#[derive(Debug, Clone)]
pub enum PlacedOrder {
    /// Cash on delivery: the order exists.
    Cash(Box<Order>),
    /// Card: continue on the hosted payment page.
    Redirect(String),
}

/// Checkout operations for one signed-in user.
pub struct CheckoutService<'a> {
    api: &'a ApiClient,
    session: &'a Session,
    user: &'a CurrentUser,
}

impl<'a> CheckoutService<'a> {
    #[must_use]
    pub const fn new(api: &'a ApiClient, session: &'a Session, user: &'a CurrentUser) -> Self {
        Self { api, session, user }
    }

    /// The draft so far.
    ///
    /// # Errors
    ///
    /// Returns an error if the session cannot be read.
    pub async fn draft(&self) -> ServiceResult<CheckoutDraft> {
        Ok(self
            .session
            .get(session_keys::CHECKOUT)
            .await?
            .unwrap_or_default())
    }

    async fn save(&self, draft: &CheckoutDraft) -> ServiceResult<()> {
        self.session.insert(session_keys::CHECKOUT, draft).await?;
        Ok(())
    }

    /// The cart to check out, refreshed from the API.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] when the cart is empty.
    pub async fn cart(&self) -> ServiceResult<Cart> {
        CartService::new(self.api, self.session, self.user)
            .load()
            .await?
            .filter(|cart| !cart.is_empty())
            .ok_or(ServiceError::Rejected(EMPTY_CART))
    }

    /// Step 1, saved address.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if the address does not exist.
    #[instrument(skip(self), fields(user_id = %self.user.id, address_id = %id))]
    pub async fn use_saved_address(&self, id: &AddressId) -> ServiceResult<CheckoutDraft> {
        let address = AddressService::new(self.api, self.user)
            .find(id)
            .await?
            .ok_or(ServiceError::Rejected("That address no longer exists"))?;
        let mut draft = self.draft().await?;
        draft.address_label = Some(address.alias.clone());
        draft.shipping = Some(ShippingAddress {
            details: address.details,
            phone: address.phone,
            city: address.city,
            postal_code: address.postal_code,
        });
        self.save(&draft).await?;
        Ok(draft)
    }

    /// Step 1, new address. Optionally saved to the address book.
    ///
    /// # Errors
    ///
    /// Returns the first validation error, or an API error when saving.
    #[instrument(skip(self, fields), fields(user_id = %self.user.id))]
    pub async fn use_new_address(
        &self,
        fields: &AddressFields<'_>,
        save_to_book: bool,
    ) -> ServiceResult<CheckoutDraft> {
        let input = address_input(fields)?;
        if save_to_book {
            self.api.add_address(&self.user.token, &input).await?;
        }
        let mut draft = self.draft().await?;
        draft.address_label = Some(input.alias.clone());
        draft.shipping = Some(input.into());
        self.save(&draft).await?;
        Ok(draft)
    }

    /// Step 2.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] if no address was chosen yet.
    pub async fn choose_payment(&self, method: PaymentMethod) -> ServiceResult<CheckoutDraft> {
        let mut draft = self.draft().await?;
        if draft.shipping.is_none() {
            return Err(ServiceError::Rejected("Choose a shipping address first"));
        }
        draft.payment = Some(method);
        self.save(&draft).await?;
        Ok(draft)
    }

    /// Step 3. Cash orders are created immediately and the cart cache is
    /// dropped; card orders return the hosted payment URL.
    ///
    /// # Errors
    ///
    /// Returns [`ServiceError::Rejected`] for an empty cart or an incomplete
    /// draft, or an API error.
    #[instrument(skip(self, return_url), fields(user_id = %self.user.id))]
    pub async fn place_order(&self, return_url: &str) -> ServiceResult<PlacedOrder> {
        let draft = self.draft().await?;
        let (Some(shipping), Some(payment)) = (draft.shipping, draft.payment) else {
            return Err(ServiceError::Rejected("Complete the previous steps first"));
        };
        let cart = self.cart().await?;

        match payment {
            PaymentMethod::Cash => {
                let order = self
                    .api
                    .create_cash_order(&self.user.token, &cart.id, shipping)
                    .await?;
                CartService::new(self.api, self.session, self.user)
                    .forget()
                    .await?;
                self.session.remove_value(session_keys::CHECKOUT).await?;
                add_breadcrumb("checkout", "Cash order placed", Some(&[("order_id", order.id.as_str())]));
                info!(order_id = %order.id, "Cash order placed");
                Ok(PlacedOrder::Cash(Box::new(order)))
            }
            PaymentMethod::Card => {
                let url = self
                    .api
                    .create_checkout_session(&self.user.token, &cart.id, &shipping, return_url)
                    .await?;
                info!(cart_id = %cart.id, "Redirecting to hosted payment");
                Ok(PlacedOrder::Redirect(url))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_step_resolution_follows_draft() {
        let empty = CheckoutDraft::default();
        assert_eq!(CheckoutStep::resolve(Some(3), &empty), CheckoutStep::Address);

        let with_address = CheckoutDraft {
            shipping: Some(ShippingAddress::default()),
            ..CheckoutDraft::default()
        };
        assert_eq!(CheckoutStep::resolve(None, &with_address), CheckoutStep::Payment);
        assert_eq!(CheckoutStep::resolve(Some(1), &with_address), CheckoutStep::Address);
        assert_eq!(CheckoutStep::resolve(Some(3), &with_address), CheckoutStep::Payment);

        let complete = CheckoutDraft {
            payment: Some(PaymentMethod::Cash),
            ..with_address
        };
        assert_eq!(CheckoutStep::resolve(None, &complete), CheckoutStep::Review);
        assert_eq!(CheckoutStep::resolve(Some(9), &complete), CheckoutStep::Review);
    }
}
