//! Admin console route handlers.
//!
//! Every handler takes [`RequireAdmin`](crate::middleware::RequireAdmin):
//! signed-out visitors are sent to log in, shoppers get a 403.
//!
//! # Route Structure
//!
//! ```text
//! GET  /admin                            - Dashboard
//! GET  /admin/products                   - Product list (?keyword, ?page)
//! GET  /admin/products/new               - Create form
//! POST /admin/products                   - Create (multipart)
//! GET  /admin/products/{id}/edit         - Edit form
//! POST /admin/products/{id}              - Update (multipart)
//! POST /admin/products/{id}/delete
//! GET|POST /admin/categories             - List / create (multipart)
//! GET  /admin/categories/{id}/edit
//! POST /admin/categories/{id}, /admin/categories/{id}/delete
//! (same for /admin/brands)
//! GET|POST /admin/coupons                - List / create
//! GET  /admin/coupons/{id}/edit
//! POST /admin/coupons/{id}, /admin/coupons/{id}/delete
//! GET  /admin/orders                     - Order list (?status, ?page)
//! GET  /admin/orders/{id}                - Order detail
//! GET  /admin/orders/{id}/status?status= - Confirm a status change
//! POST /admin/orders/{id}/status         - Apply it (requires confirm=yes)
//! POST /admin/orders/{id}/pay, /admin/orders/{id}/deliver
//! GET  /admin/reviews                    - Review list
//! POST /admin/reviews/{id}/delete
//! GET  /admin/users                      - User list
//! POST /admin/users/{id}/role, /admin/users/{id}/delete
//! ```

mod coupons;
mod dashboard;
mod orders;
mod products;
mod reviews;
mod taxonomy;
mod upload;
mod users;

use axum::{
    Router,
    extract::DefaultBodyLimit,
    routing::{get, post},
};
use serde::Deserialize;

use crate::state::AppState;

pub use upload::MultipartForm;

/// Image uploads go well past axum's 2 MB default.
const UPLOAD_BODY_LIMIT: usize = 20 * 1024 * 1024;

/// `?page=` on admin lists.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// A `<select>` option.
#[derive(Debug, Clone)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
    pub selected: bool,
}

/// Create the admin routes router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(dashboard::index))
        .route("/products", get(products::index).post(products::create))
        .route("/products/new", get(products::new))
        .route("/products/{id}", post(products::update))
        .route("/products/{id}/edit", get(products::edit))
        .route("/products/{id}/delete", post(products::delete))
        .route(
            "/categories",
            get(taxonomy::categories).post(taxonomy::create_category),
        )
        .route("/categories/{id}", post(taxonomy::update_category))
        .route("/categories/{id}/edit", get(taxonomy::edit_category))
        .route("/categories/{id}/delete", post(taxonomy::delete_category))
        .route("/brands", get(taxonomy::brands).post(taxonomy::create_brand))
        .route("/brands/{id}", post(taxonomy::update_brand))
        .route("/brands/{id}/edit", get(taxonomy::edit_brand))
        .route("/brands/{id}/delete", post(taxonomy::delete_brand))
        .route("/coupons", get(coupons::index).post(coupons::create))
        .route("/coupons/{id}", post(coupons::update))
        .route("/coupons/{id}/edit", get(coupons::edit))
        .route("/coupons/{id}/delete", post(coupons::delete))
        .route("/orders", get(orders::index))
        .route("/orders/{id}", get(orders::show))
        .route(
            "/orders/{id}/status",
            get(orders::confirm_status).post(orders::update_status),
        )
        .route("/orders/{id}/pay", post(orders::mark_paid))
        .route("/orders/{id}/deliver", post(orders::mark_delivered))
        .route("/reviews", get(reviews::index))
        .route("/reviews/{id}/delete", post(reviews::delete))
        .route("/users", get(users::index))
        .route("/users/{id}/role", post(users::update_role))
        .route("/users/{id}/delete", post(users::delete))
        .layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT))
}
