//! Wishlist route handlers.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::ProductId;
use axum::{
    Form,
    extract::{Path, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::catalog::ProductCard;
use super::{flash_failure, redirect_back};
use crate::error::Result;
use crate::filters;
use crate::middleware::{OptionalAuth, PageContext, RequireAuth};
use crate::services::flash;
use crate::services::wishlist::WishlistService;
use crate::state::AppState;

/// Toggle/remove form data.
#[derive(Debug, Deserialize)]
pub struct WishlistForm {
    pub return_to: Option<String>,
}

/// Wishlist page template.
#[derive(Template, WebTemplate)]
#[template(path = "wishlist.html")]
pub struct WishlistTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
}

/// Display the wishlist, refreshed from the API.
///
/// A failed refresh falls back to the cached list.
#[instrument(skip(state, session, user, page), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<Response> {
    let service = WishlistService::new(state.api(), &session, &user);
    let products = if user.can_shop() {
        match service.load().await {
            Ok(products) => products,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to refresh wishlist");
                service.cached().await?
            }
        }
    } else {
        Vec::new()
    };
    let products = products
        .into_iter()
        .map(|product| ProductCard {
            product,
            in_wishlist: true,
        })
        .collect();
    Ok(WishlistTemplate { page, products }.into_response())
}

/// Add or remove a product. Signed-out visitors are sent to log in.
#[instrument(skip(state, session, user, form))]
pub async fn toggle(
    State(state): State<AppState>,
    session: Session,
    OptionalAuth(user): OptionalAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<WishlistForm>,
) -> Result<Redirect> {
    let back = format!("/products/{}", urlencoding::encode(id.as_str()));
    let Some(user) = user else {
        let location = format!("/login?callbackUrl={}", urlencoding::encode(&back));
        return Ok(Redirect::to(&location));
    };

    match WishlistService::new(state.api(), &session, &user)
        .toggle(&id)
        .await
    {
        Ok(true) => flash::success(&session, "Saved to your wishlist").await?,
        Ok(false) => flash::success(&session, "Removed from your wishlist").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(redirect_back(form.return_to.as_deref(), &back))
}

/// Remove a product from the wishlist page.
///
/// The cached list is updated before the API answers; on failure the item
/// is restored and an error toast explains why.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn remove(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match WishlistService::new(state.api(), &session, &user)
        .remove(&id)
        .await
    {
        Ok(_) => flash::success(&session, "Removed from your wishlist").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/wishlist"))
}
