//! Cart route handlers.
//!
//! Every mutation replaces the session's cart snapshot with the one the API
//! returns, queues a toast and redirects back.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::pricing::CheckoutSummary;
use atelier_core::{CartItemId, ProductId};
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{flash_failure, redirect_back};
use crate::api::Cart;
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, RequireAuth};
use crate::services::cart::CartService;
use crate::services::flash;
use crate::state::AppState;

/// Add to cart form data.
#[derive(Debug, Deserialize)]
pub struct AddToCartForm {
    pub color: Option<String>,
    pub size: Option<String>,
    pub return_to: Option<String>,
}

/// Update quantity form data.
#[derive(Debug, Deserialize)]
pub struct QuantityForm {
    pub quantity: u32,
}

/// Coupon form data.
#[derive(Debug, Deserialize)]
pub struct CouponForm {
    #[serde(default)]
    pub coupon: String,
}

/// Cart page template.
#[derive(Template, WebTemplate)]
#[template(path = "cart/show.html")]
pub struct CartTemplate {
    pub page: PageContext,
    pub cart: Option<Cart>,
    pub summary: CheckoutSummary,
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn product_page(id: &ProductId) -> String {
    format!("/products/{}", urlencoding::encode(id.as_str()))
}

/// Add a product to the cart.
///
/// Signed-out visitors are sent to log in and come back to the product;
/// no cart call is made.
#[instrument(skip(state, session, user, form))]
pub async fn add(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<AddToCartForm>,
) -> Result<Redirect> {
    let back = product_page(&id);
    let Some(user) = user else {
        let location = format!("/login?callbackUrl={}", urlencoding::encode(&back));
        return Ok(Redirect::to(&location));
    };

    match CartService::new(state.api(), &session, &user)
        .add(
            &id,
            non_empty(form.color.as_deref()),
            non_empty(form.size.as_deref()),
        )
        .await
    {
        Ok(_) => flash::success(&session, "Added to cart").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(redirect_back(form.return_to.as_deref(), &back))
}

/// Display the cart, refreshed from the API.
#[instrument(skip(state, session, page, user), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    mut page: PageContext,
) -> Result<Response> {
    let cart = if user.can_shop() {
        CartService::new(state.api(), &session, &user).load().await?
    } else {
        None
    };
    page.cart_count = cart.as_ref().map_or(0, Cart::item_count);
    let summary = cart.as_ref().map_or_else(
        || CheckoutSummary::compute(std::iter::empty(), None),
        Cart::summary,
    );
    Ok(CartTemplate {
        page,
        cart,
        summary,
    }
    .into_response())
}

/// Set a line's quantity. Zero removes the line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
    Form(form): Form<QuantityForm>,
) -> Result<Redirect> {
    if let Err(e) = CartService::new(state.api(), &session, &user)
        .update_quantity(&id, form.quantity)
        .await
    {
        flash_failure(&session, e).await?;
    }
    Ok(Redirect::to("/cart"))
}

/// Remove a line.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<CartItemId>,
) -> Result<Redirect> {
    match CartService::new(state.api(), &session, &user).remove(&id).await {
        Ok(_) => flash::success(&session, "Item removed").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/cart"))
}

/// Empty the cart.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn clear(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
) -> Result<Redirect> {
    match CartService::new(state.api(), &session, &user).clear().await {
        Ok(()) => flash::success(&session, "Cart cleared").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/cart"))
}

/// Apply a coupon code.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn apply_coupon(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Form(form): Form<CouponForm>,
) -> Result<Redirect> {
    match CartService::new(state.api(), &session, &user)
        .apply_coupon(&form.coupon)
        .await
    {
        Ok(_) => flash::success(&session, "Coupon applied").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/cart"))
}
