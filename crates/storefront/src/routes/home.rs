//! Home page route handler.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::catalog::{ProductQuery, SortOrder};
use axum::{extract::State, response::IntoResponse};
use tower_sessions::Session;
use tracing::instrument;

use super::catalog::{ProductCard, product_cards};
use crate::api::{Brand, Category};
use crate::filters;
use crate::middleware::PageContext;
use crate::state::AppState;

/// Products shown in each home page strip.
const STRIP_SIZE: u32 = 8;

/// Categories shown in the home page grid.
const FEATURED_CATEGORIES: usize = 6;

/// Home page template.
#[derive(Template, WebTemplate)]
#[template(path = "home.html")]
pub struct HomeTemplate {
    pub page: PageContext,
    pub categories: Vec<Category>,
    pub brands: Vec<Brand>,
    pub best_sellers: Vec<ProductCard>,
    pub newest: Vec<ProductCard>,
}

fn strip(sort: SortOrder) -> ProductQuery {
    ProductQuery {
        sort,
        limit: STRIP_SIZE,
        ..ProductQuery::default()
    }
}

/// Display the home page.
///
/// Each section degrades to empty on API failure so the page still renders.
#[instrument(skip(state, session, page))]
pub async fn home(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
) -> impl IntoResponse {
    let api = state.api();
    let best_query = strip(SortOrder::BestSelling);
    let newest_query = strip(SortOrder::Newest);
    let (categories, brands, best_sellers, newest) = tokio::join!(
        api.list_categories(),
        api.list_brands(),
        api.list_products(&best_query),
        api.list_products(&newest_query),
    );

    let mut categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories for home page");
        Vec::new()
    });
    categories.truncate(FEATURED_CATEGORIES);
    let brands = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load brands for home page");
        Vec::new()
    });
    let best_sellers = best_sellers.map(|p| p.items).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load best sellers");
        Vec::new()
    });
    let newest = newest.map(|p| p.items).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load new arrivals");
        Vec::new()
    });

    HomeTemplate {
        best_sellers: product_cards(&session, page.user.as_ref(), best_sellers).await,
        newest: product_cards(&session, page.user.as_ref(), newest).await,
        page,
        categories,
        brands,
    }
}
