//! Navbar search suggestions.
//!
//! The search input fires `hx-get` after a 400 ms pause in typing and swaps
//! this fragment under the box. Submitting the form goes to `/shop`.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::catalog::ProductQuery;
use axum::{
    extract::{Query, State},
    response::IntoResponse,
};
use serde::Deserialize;
use tracing::instrument;

use super::catalog::shop_href;
use crate::api::Product;
use crate::state::AppState;

/// Suggestions shown under the search box.
const SUGGESTION_LIMIT: u32 = 5;

/// Shortest keyword worth a request.
const MIN_KEYWORD_CHARS: usize = 2;

/// Search suggestions query parameters.
#[derive(Debug, Deserialize)]
pub struct SuggestQuery {
    #[serde(default)]
    pub keyword: String,
}

/// Suggestions fragment template (for HTMX).
#[derive(Template, WebTemplate)]
#[template(path = "partials/search_suggestions.html")]
pub struct SuggestionsTemplate {
    pub keyword: String,
    pub products: Vec<Product>,
    pub see_all_href: String,
}

/// Return suggestions for the typed keyword.
///
/// Failures render an empty list; the box keeps working as a plain form.
#[instrument(skip(state))]
pub async fn suggest(
    State(state): State<AppState>,
    Query(query): Query<SuggestQuery>,
) -> impl IntoResponse {
    let keyword = query.keyword.trim().to_owned();
    if keyword.chars().count() < MIN_KEYWORD_CHARS {
        return SuggestionsTemplate {
            keyword,
            products: Vec::new(),
            see_all_href: String::new(),
        };
    }

    let search = ProductQuery {
        keyword: Some(keyword.clone()),
        limit: SUGGESTION_LIMIT,
        ..ProductQuery::default()
    };
    let products = match state.api().list_products(&search).await {
        Ok(page) => page.items,
        Err(e) => {
            tracing::warn!(error = %e, "Search suggestions failed");
            Vec::new()
        }
    };

    SuggestionsTemplate {
        see_all_href: shop_href(&ProductQuery {
            limit: ProductQuery::default().limit,
            ..search
        }),
        keyword,
        products,
    }
}
