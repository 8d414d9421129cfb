//! HTTP route handlers for the storefront and admin console.
//!
//! # Route Structure
//!
//! ```text
//! GET  /                                 - Home page
//! GET  /shop                             - Product listing (filters in query)
//! GET  /categories, /brands              - Taxonomy listings
//! GET  /products/{id}                    - Product detail with reviews
//! POST /products/{id}/add-to-cart        - Add to cart (redirects to login when signed out)
//! POST /products/{id}/wishlist           - Toggle wishlist
//! POST /products/{id}/reviews            - Write a review
//! POST /products/{id}/reviews/{rid}      - Edit own review
//! POST /products/{id}/reviews/{rid}/delete
//! GET  /search/suggest                   - Navbar suggestions (HTMX fragment)
//! GET  /wishlist                         - Wishlist page
//! POST /wishlist/{id}/remove             - Remove (optimistic)
//!
//! # Auth
//! GET|POST /login, /signup, /forgot-password, /verify-code, /reset-password
//! POST /logout
//! POST /password-strength                - Strength meter (HTMX fragment)
//!
//! # Gated by the `token` cookie
//! GET  /cart                             - Cart page
//! POST /cart/items/{id}                  - Set quantity (0 removes)
//! POST /cart/items/{id}/remove
//! POST /cart/clear
//! POST /cart/coupon
//! GET  /checkout?step=N                  - Multi-step checkout
//! POST /checkout/address, /checkout/address/new, /checkout/payment, /checkout/place
//! GET|POST /profile                      - Account details
//! GET|POST /profile/password
//! GET|POST /profile/addresses            - Address book
//! GET  /profile/addresses/{id}/edit
//! POST /profile/addresses/{id}, /profile/addresses/{id}/delete
//! GET  /profile/orders, /profile/orders/{id}
//! POST /profile/orders/{id}/cancel
//! /admin/...                             - Admin console (see `admin`)
//! ```

pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod home;
pub mod profile;
pub mod search;
pub mod wishlist;

use axum::{
    Router,
    response::Redirect,
    routing::{get, post},
};
use tower_sessions::Session;

use crate::api::Pagination;
use crate::error::AppError;
use crate::middleware::auth_rate_limiter;
use crate::middleware::route_gate::safe_callback;
use crate::services::{ServiceError, flash};
use crate::state::AppState;

// =============================================================================
// Shared handler helpers
// =============================================================================

/// Turn a failed service call into an error toast.
///
/// Expired tokens and session faults are not the visitor's to fix and fail
/// the request instead.
pub(crate) async fn flash_failure(session: &Session, err: ServiceError) -> Result<(), AppError> {
    match err {
        ServiceError::Api(ref api) if api.is_unauthorized() => Err(err.into()),
        err if !err.is_user_facing() => Err(err.into()),
        err => {
            tracing::debug!(error = %err, "Action refused");
            flash::error(session, err.user_message()).await?;
            Ok(())
        }
    }
}

/// Hand a failure back for inline display on a re-rendered form, or fail
/// the request when it is not the visitor's to fix.
pub(crate) fn inline_error(err: ServiceError) -> Result<String, AppError> {
    match err {
        ServiceError::Api(ref api) if api.is_unauthorized() => Err(err.into()),
        err if !err.is_user_facing() => Err(err.into()),
        err => Ok(err.user_message()),
    }
}

/// Redirect to a same-site `return_to` form field, or `fallback`.
pub(crate) fn redirect_back(return_to: Option<&str>, fallback: &str) -> Redirect {
    Redirect::to(safe_callback(return_to).unwrap_or(fallback))
}

/// Previous/next links for a paginated list.
#[derive(Debug, Clone, Default)]
pub struct PageLinks {
    pub current: u32,
    pub total: u32,
    pub prev: Option<String>,
    pub next: Option<String>,
}

impl PageLinks {
    /// Build links with `href(page)` for each neighbour that exists.
    pub fn new(pagination: &Pagination, href: impl Fn(u32) -> String) -> Self {
        let current = pagination.current_page.max(1);
        let total = pagination.number_of_pages.max(1);
        Self {
            current,
            total,
            prev: (current > 1).then(|| href(current - 1)),
            next: (current < total).then(|| href(current + 1)),
        }
    }

    #[must_use]
    pub const fn is_paged(&self) -> bool {
        self.total > 1
    }
}

/// `?page=N` appended to `base`, which may already carry a query.
pub(crate) fn with_page(base: &str, page: u32) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!("{base}{separator}page={page}")
}

// =============================================================================
// Routers
// =============================================================================

/// Form posts that try credentials or send email, behind the auth limiter.
fn limited_auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", post(auth::login))
        .route("/signup", post(auth::signup))
        .route("/forgot-password", post(auth::forgot_password))
        .route("/verify-code", post(auth::verify_code))
        .route("/reset-password", post(auth::reset_password))
        .layer(auth_rate_limiter())
}

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/login", get(auth::login_page))
        .route("/signup", get(auth::signup_page))
        .route("/logout", post(auth::logout))
        .route("/forgot-password", get(auth::forgot_password_page))
        .route("/verify-code", get(auth::verify_code_page))
        .route("/reset-password", get(auth::reset_password_page))
        .route("/password-strength", post(auth::password_strength))
        .merge(limited_auth_routes())
}

/// Create the catalog routes router.
pub fn catalog_routes() -> Router<AppState> {
    Router::new()
        .route("/shop", get(catalog::shop))
        .route("/categories", get(catalog::categories))
        .route("/brands", get(catalog::brands))
        .route("/products/{id}", get(catalog::show))
        .route("/products/{id}/add-to-cart", post(cart::add))
        .route("/products/{id}/wishlist", post(wishlist::toggle))
        .route("/products/{id}/reviews", post(catalog::create_review))
        .route("/products/{id}/reviews/{review_id}", post(catalog::update_review))
        .route(
            "/products/{id}/reviews/{review_id}/delete",
            post(catalog::delete_review),
        )
        .route("/search/suggest", get(search::suggest))
}

/// Create the cart routes router.
pub fn cart_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(cart::show))
        .route("/items/{id}", post(cart::update))
        .route("/items/{id}/remove", post(cart::remove))
        .route("/clear", post(cart::clear))
        .route("/coupon", post(cart::apply_coupon))
}

/// Create the checkout routes router.
pub fn checkout_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(checkout::show))
        .route("/address", post(checkout::use_saved_address))
        .route("/address/new", post(checkout::use_new_address))
        .route("/payment", post(checkout::choose_payment))
        .route("/place", post(checkout::place_order))
}

/// Create the profile routes router.
pub fn profile_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(profile::show).post(profile::update))
        .route(
            "/password",
            get(profile::password_page).post(profile::change_password),
        )
        .route(
            "/addresses",
            get(profile::addresses).post(profile::create_address),
        )
        .route("/addresses/{id}", post(profile::update_address))
        .route("/addresses/{id}/edit", get(profile::edit_address))
        .route("/addresses/{id}/delete", post(profile::delete_address))
        .route("/orders", get(profile::orders))
        .route("/orders/{id}", get(profile::order))
        .route("/orders/{id}/cancel", post(profile::cancel_order))
}

/// Create the wishlist routes router.
pub fn wishlist_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(wishlist::show))
        .route("/{id}/remove", post(wishlist::remove))
}

/// Create all routes for the storefront.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(home::home))
        .merge(catalog_routes())
        .merge(auth_routes())
        .nest("/wishlist", wishlist_routes())
        .nest("/cart", cart_routes())
        .nest("/checkout", checkout_routes())
        .nest("/profile", profile_routes())
        .nest("/admin", admin::routes())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pagination(current: u32, total: u32) -> Pagination {
        Pagination {
            current_page: current,
            limit: 12,
            number_of_pages: total,
            next: None,
            prev: None,
        }
    }

    #[test]
    fn test_page_links_at_edges() {
        let first = PageLinks::new(&pagination(1, 3), |p| with_page("/shop", p));
        assert_eq!(first.prev, None);
        assert_eq!(first.next.as_deref(), Some("/shop?page=2"));

        let last = PageLinks::new(&pagination(3, 3), |p| with_page("/shop?sort=price_asc", p));
        assert_eq!(last.prev.as_deref(), Some("/shop?sort=price_asc&page=2"));
        assert_eq!(last.next, None);
    }

    #[test]
    fn test_single_page_is_not_paged() {
        assert!(!PageLinks::new(&pagination(1, 1), |p| with_page("/", p)).is_paged());
    }

    #[test]
    fn test_redirect_back_rejects_offsite() {
        let response = axum::response::IntoResponse::into_response(redirect_back(
            Some("https://evil.example"),
            "/cart",
        ));
        assert_eq!(
            response.headers().get(axum::http::header::LOCATION).and_then(|v| v.to_str().ok()),
            Some("/cart")
        );
    }
}
