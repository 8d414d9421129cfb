//! Checkout route handlers.
//!
//! One page, three steps. `?step=N` picks the step to show; a step that the
//! draft cannot reach yet falls back to the furthest one it can.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::pricing::CheckoutSummary;
use atelier_core::validation::AddressFields;
use atelier_core::{AddressId, PaymentMethod};
use axum::{
    Form,
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::flash_failure;
use crate::api::{Address, Cart};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::services::addresses::AddressService;
use crate::services::checkout::{
    CheckoutDraft, CheckoutService, CheckoutStep, EMPTY_CART, PlacedOrder,
};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

/// Step selection query.
#[derive(Debug, Deserialize)]
pub struct StepQuery {
    pub step: Option<u8>,
}

/// Saved address choice.
#[derive(Debug, Deserialize)]
pub struct SavedAddressForm {
    pub address_id: AddressId,
}

/// New address form data.
#[derive(Debug, Default, Deserialize)]
pub struct NewAddressForm {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
    /// Checkbox: also save to the address book.
    pub save: Option<String>,
}

impl NewAddressForm {
    fn fields(&self) -> AddressFields<'_> {
        AddressFields {
            alias: &self.alias,
            details: &self.details,
            phone: &self.phone,
            city: &self.city,
            postal_code: &self.postal_code,
        }
    }
}

/// Payment choice.
#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub payment: PaymentMethod,
}

/// A payment radio option.
#[derive(Debug, Clone)]
pub struct PaymentOption {
    pub value: &'static str,
    pub label: &'static str,
    pub checked: bool,
}

/// Checkout page template.
#[derive(Template, WebTemplate)]
#[template(path = "checkout.html")]
pub struct CheckoutTemplate {
    pub page: PageContext,
    pub step: u8,
    pub cart: Cart,
    pub summary: CheckoutSummary,
    pub draft: CheckoutDraft,
    pub addresses: Vec<Address>,
    pub payments: Vec<PaymentOption>,
}

impl CheckoutTemplate {
    /// Label for the step indicator.
    #[must_use]
    pub fn step_state(&self, n: u8) -> &'static str {
        match n.cmp(&self.step) {
            std::cmp::Ordering::Less => "done",
            std::cmp::Ordering::Equal => "current",
            std::cmp::Ordering::Greater => "upcoming",
        }
    }
}

fn payment_options(selected: Option<PaymentMethod>) -> Vec<PaymentOption> {
    [PaymentMethod::Cash, PaymentMethod::Card]
        .into_iter()
        .map(|method| PaymentOption {
            value: method.as_str(),
            label: method.label(),
            checked: selected.unwrap_or_default() == method,
        })
        .collect()
}

fn step_url(step: CheckoutStep) -> String {
    format!("/checkout?step={}", step.number())
}

/// Display the current checkout step. An empty cart goes back to `/cart`.
#[instrument(skip(state, session, user, page), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
    Query(query): Query<StepQuery>,
) -> Result<Response> {
    let checkout = CheckoutService::new(state.api(), &session, &user);
    let cart = match checkout.cart().await {
        Ok(cart) => cart,
        Err(e @ ServiceError::Rejected(_)) => {
            flash_failure(&session, e).await?;
            return Ok(Redirect::to("/cart").into_response());
        }
        Err(e) => return Err(e.into()),
    };
    let draft = checkout.draft().await?;
    let step = CheckoutStep::resolve(query.step, &draft);

    let addresses = if step == CheckoutStep::Address {
        AddressService::new(state.api(), &user)
            .list()
            .await
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to load saved addresses");
                Vec::new()
            })
    } else {
        Vec::new()
    };

    page.cart_count = cart.item_count();
    Ok(CheckoutTemplate {
        page,
        step: step.number(),
        summary: cart.summary(),
        cart,
        payments: payment_options(draft.payment),
        draft,
        addresses,
    }
    .into_response())
}

/// Step 1: ship to a saved address.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn use_saved_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<SavedAddressForm>,
) -> Result<Redirect> {
    match CheckoutService::new(state.api(), &session, &user)
        .use_saved_address(&form.address_id)
        .await
    {
        Ok(_) => Ok(Redirect::to(&step_url(CheckoutStep::Payment))),
        Err(e) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to(&step_url(CheckoutStep::Address)))
        }
    }
}

/// Step 1: ship to a new address, optionally saving it.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn use_new_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<NewAddressForm>,
) -> Result<Redirect> {
    match CheckoutService::new(state.api(), &session, &user)
        .use_new_address(&form.fields(), form.save.is_some())
        .await
    {
        Ok(_) => Ok(Redirect::to(&step_url(CheckoutStep::Payment))),
        Err(e) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to(&step_url(CheckoutStep::Address)))
        }
    }
}

/// Step 2: choose how to pay.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn choose_payment(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<PaymentForm>,
) -> Result<Redirect> {
    match CheckoutService::new(state.api(), &session, &user)
        .choose_payment(form.payment)
        .await
    {
        Ok(_) => Ok(Redirect::to(&step_url(CheckoutStep::Review))),
        Err(e) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to("/checkout"))
        }
    }
}

/// Step 3: place the order.
///
/// Cash orders land on the order page; card orders continue on the hosted
/// payment page and return to the order history.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn place_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    let return_url = format!("{}/profile/orders", state.config().base_url);
    match CheckoutService::new(state.api(), &session, &user)
        .place_order(&return_url)
        .await
    {
        Ok(PlacedOrder::Cash(order)) => {
            flash::success(&session, "Order placed. Thank you!").await?;
            Ok(Redirect::to(&format!(
                "/profile/orders/{}",
                urlencoding::encode(order.id.as_str())
            )))
        }
        Ok(PlacedOrder::Redirect(url)) => Ok(Redirect::to(&url)),
        Err(e @ ServiceError::Rejected(EMPTY_CART)) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to("/cart"))
        }
        Err(e) => {
            flash_failure(&session, e).await?;
            Ok(Redirect::to("/checkout"))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cash_is_preselected() {
        let options = payment_options(None);
        let checked: Vec<_> = options.iter().filter(|o| o.checked).map(|o| o.value).collect();
        assert_eq!(checked, vec!["cash"]);
    }

    #[test]
    fn test_step_url() {
        assert_eq!(step_url(CheckoutStep::Review), "/checkout?step=3");
    }
}
