//! Catalog route handlers: shop listing, taxonomy pages, product detail and
//! reviews.
//!
//! The shop keeps its filter state in the query string; every filter
//! control is a plain link to the next state, built by [`ProductQuery`].

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::catalog::{ProductQuery, SortOrder};
use atelier_core::validation::validate_review;
use atelier_core::{BrandId, CategoryId, ProductId, ReviewId};
use axum::{
    Form,
    extract::{Path, RawQuery, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{PageLinks, flash_failure};
use crate::api::reviews::ReviewInput;
use crate::api::{Brand, Category, Product, Review};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::models::{CurrentUser, session_keys};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

// =============================================================================
// Product cards
// =============================================================================

/// A product tile with the viewer's wishlist state.
#[derive(Debug, Clone)]
pub struct ProductCard {
    pub product: Product,
    pub in_wishlist: bool,
}

/// Pair products with the cached wishlist. Signed-out visitors and admins
/// see every heart empty.
pub async fn product_cards(
    session: &Session,
    user: Option<&CurrentUser>,
    products: Vec<Product>,
) -> Vec<ProductCard> {
    let wished: Vec<Product> = if user.is_some_and(CurrentUser::can_shop) {
        session
            .get(session_keys::WISHLIST)
            .await
            .ok()
            .flatten()
            .unwrap_or_default()
    } else {
        Vec::new()
    };
    products
        .into_iter()
        .map(|product| ProductCard {
            in_wishlist: wished.iter().any(|w| w.id == product.id),
            product,
        })
        .collect()
}

// =============================================================================
// Shop listing
// =============================================================================

/// `/shop` URL for a filter state.
#[must_use]
pub fn shop_href(query: &ProductQuery) -> String {
    let pairs = query.shop_pairs();
    if pairs.is_empty() {
        return "/shop".to_owned();
    }
    let encoded = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    format!("/shop?{encoded}")
}

/// A checkbox-style filter link.
#[derive(Debug, Clone)]
pub struct FilterOption {
    pub label: String,
    pub checked: bool,
    pub href: String,
}

/// A sort dropdown entry.
#[derive(Debug, Clone)]
pub struct SortOption {
    pub label: &'static str,
    pub selected: bool,
    pub href: String,
}

/// Shop page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/shop.html")]
pub struct ShopTemplate {
    pub page: PageContext,
    pub products: Vec<ProductCard>,
    pub total: u32,
    pub keyword: String,
    pub price_min: String,
    pub price_max: String,
    /// Other filters the price form resubmits as hidden fields.
    pub carry: Vec<(&'static str, String)>,
    pub categories: Vec<FilterOption>,
    pub brands: Vec<FilterOption>,
    pub ratings: Vec<FilterOption>,
    pub sorts: Vec<SortOption>,
    pub sort_param: &'static str,
    pub active_filters: usize,
    pub clear_href: String,
    pub links: PageLinks,
}

fn parse_query(raw: Option<&str>) -> ProductQuery {
    let pairs: Vec<(String, String)> = raw
        .map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default();
    ProductQuery::from_pairs(pairs.iter().map(|(k, v)| (k.as_str(), v.as_str())))
}

fn carried_pairs(query: &ProductQuery) -> Vec<(&'static str, String)> {
    query
        .shop_pairs()
        .into_iter()
        .filter(|(key, _)| !matches!(*key, "keyword" | "price_min" | "price_max" | "page"))
        .collect()
}

fn category_options(categories: &[Category], query: &ProductQuery) -> Vec<FilterOption> {
    categories
        .iter()
        .map(|c| FilterOption {
            label: c.name.clone(),
            checked: query.has_category(c.id.as_str()),
            href: shop_href(&query.clone().toggle_category(&c.id)),
        })
        .collect()
}

fn brand_options(brands: &[Brand], query: &ProductQuery) -> Vec<FilterOption> {
    brands
        .iter()
        .map(|b| FilterOption {
            label: b.name.clone(),
            checked: query.has_brand(b.id.as_str()),
            href: shop_href(&query.clone().toggle_brand(&b.id)),
        })
        .collect()
}

fn rating_options(query: &ProductQuery) -> Vec<FilterOption> {
    (1..=4u8)
        .rev()
        .map(|rating| {
            let checked = query.min_rating == Some(rating);
            let next = ProductQuery {
                min_rating: (!checked).then_some(rating),
                page: 1,
                ..query.clone()
            };
            FilterOption {
                label: format!("{rating}+ stars"),
                checked,
                href: shop_href(&next),
            }
        })
        .collect()
}

fn sort_options(query: &ProductQuery) -> Vec<SortOption> {
    SortOrder::ALL
        .into_iter()
        .map(|sort| SortOption {
            label: sort.label(),
            selected: query.sort == sort,
            href: shop_href(&query.clone().with_sort(sort)),
        })
        .collect()
}

/// Display the product listing.
#[instrument(skip(state, session, page, raw))]
pub async fn shop(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    RawQuery(raw): RawQuery,
) -> Result<Response> {
    let query = parse_query(raw.as_deref());
    let api = state.api();
    let (products, categories, brands) = tokio::join!(
        api.list_products(&query),
        api.list_categories(),
        api.list_brands(),
    );
    let products = products?;
    let categories = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load category filters");
        Vec::new()
    });
    let brands = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load brand filters");
        Vec::new()
    });

    let links = PageLinks::new(&products.pagination, |n| {
        shop_href(&query.clone().with_page(n))
    });
    let cards = product_cards(&session, page.user.as_ref(), products.items).await;

    Ok(ShopTemplate {
        page,
        products: cards,
        total: products.results,
        keyword: query.keyword.clone().unwrap_or_default(),
        price_min: query.price_min.map(|p| p.to_string()).unwrap_or_default(),
        price_max: query.price_max.map(|p| p.to_string()).unwrap_or_default(),
        carry: carried_pairs(&query),
        categories: category_options(&categories, &query),
        brands: brand_options(&brands, &query),
        ratings: rating_options(&query),
        sorts: sort_options(&query),
        sort_param: query.sort.as_param(),
        active_filters: query.active_filter_count(),
        clear_href: shop_href(&query.clone().cleared()),
        links,
    }
    .into_response())
}

// =============================================================================
// Taxonomy pages
// =============================================================================

/// A category or brand tile linking into the filtered shop.
#[derive(Debug, Clone)]
pub struct TaxonomyTile {
    pub name: String,
    pub image: Option<String>,
    pub href: String,
}

/// Categories or brands page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/taxonomy.html")]
pub struct TaxonomyTemplate {
    pub page: PageContext,
    pub title: &'static str,
    pub tiles: Vec<TaxonomyTile>,
}

/// Display every category.
#[instrument(skip(state, page))]
pub async fn categories(State(state): State<AppState>, page: PageContext) -> Result<Response> {
    let tiles = state
        .api()
        .list_categories()
        .await?
        .into_iter()
        .map(|c| TaxonomyTile {
            href: shop_href(&ProductQuery::default().toggle_category(&c.id)),
            name: c.name,
            image: c.image,
        })
        .collect();
    Ok(TaxonomyTemplate {
        page,
        title: "Categories",
        tiles,
    }
    .into_response())
}

/// Display every brand.
#[instrument(skip(state, page))]
pub async fn brands(State(state): State<AppState>, page: PageContext) -> Result<Response> {
    let tiles = state
        .api()
        .list_brands()
        .await?
        .into_iter()
        .map(|b| TaxonomyTile {
            href: shop_href(&ProductQuery::default().toggle_brand(&b.id)),
            name: b.name,
            image: b.image,
        })
        .collect();
    Ok(TaxonomyTemplate {
        page,
        title: "Brands",
        tiles,
    }
    .into_response())
}

// =============================================================================
// Product detail
// =============================================================================

/// A review as shown under the product.
#[derive(Debug, Clone)]
pub struct ReviewView {
    pub review: Review,
    pub mine: bool,
}

/// Product detail page template.
#[derive(Template, WebTemplate)]
#[template(path = "catalog/product.html")]
pub struct ProductTemplate {
    pub page: PageContext,
    pub product: Product,
    pub in_wishlist: bool,
    pub reviews: Vec<ReviewView>,
    /// The viewer's own review, edited in place of a new one.
    pub my_review: Option<Review>,
    pub category_href: Option<String>,
    pub brand_href: Option<String>,
}

impl ProductTemplate {
    /// Signed-in shoppers may review a product once.
    #[must_use]
    pub fn can_review(&self) -> bool {
        self.page.user.as_ref().is_some_and(CurrentUser::can_shop)
    }
}

/// Display a product.
#[instrument(skip(state, session, page))]
pub async fn show(
    State(state): State<AppState>,
    session: Session,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let api = state.api();
    let (product, reviews) = tokio::join!(api.get_product(&id), api.list_product_reviews(&id));
    let product = product?;
    let reviews = reviews.map(|p| p.items).unwrap_or_else(|e| {
        tracing::warn!(error = %e, product_id = %id, "Failed to load reviews");
        Vec::new()
    });

    let viewer = page.user.as_ref().map(|u| u.id.clone());
    let reviews: Vec<ReviewView> = reviews
        .into_iter()
        .map(|review| ReviewView {
            mine: viewer.as_ref().is_some_and(|v| review.is_by(v)),
            review,
        })
        .collect();
    let my_review = reviews.iter().find(|r| r.mine).map(|r| r.review.clone());

    let category_href = product
        .category
        .as_ref()
        .map(|c| shop_href(&ProductQuery::default().toggle_category(&CategoryId::new(c.id()))));
    let brand_href = product
        .brand
        .as_ref()
        .map(|b| shop_href(&ProductQuery::default().toggle_brand(&BrandId::new(b.id()))));

    let mut cards = product_cards(&session, page.user.as_ref(), vec![product]).await;
    let Some(card) = cards.pop() else {
        return Err(AppError::Internal("product card missing".to_string()));
    };

    Ok(ProductTemplate {
        page,
        product: card.product,
        in_wishlist: card.in_wishlist,
        reviews,
        my_review,
        category_href,
        brand_href,
    }
    .into_response())
}

// =============================================================================
// Reviews
// =============================================================================

/// Review form data.
#[derive(Debug, Deserialize)]
pub struct ReviewForm {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub ratings: u8,
}

fn product_path(id: &ProductId) -> String {
    format!("/products/{}#reviews", urlencoding::encode(id.as_str()))
}

/// Write a review.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn create_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<ProductId>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let result = async {
        validate_review(&form.title, form.ratings)?;
        state
            .api()
            .create_review(
                &user.token,
                &id,
                &ReviewInput {
                    title: form.title.trim(),
                    ratings: form.ratings,
                },
            )
            .await?;
        Ok::<_, ServiceError>(())
    }
    .await;

    match result {
        Ok(()) => flash::success(&session, "Thanks for your review").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to(&product_path(&id)))
}

/// Edit one's own review.
#[instrument(skip(state, session, user, form), fields(user_id = %user.id))]
pub async fn update_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path((id, review_id)): Path<(ProductId, ReviewId)>,
    Form(form): Form<ReviewForm>,
) -> Result<Redirect> {
    let result = async {
        validate_review(&form.title, form.ratings)?;
        state
            .api()
            .update_review(
                &user.token,
                &review_id,
                &ReviewInput {
                    title: form.title.trim(),
                    ratings: form.ratings,
                },
            )
            .await?;
        Ok::<_, ServiceError>(())
    }
    .await;

    match result {
        Ok(()) => flash::success(&session, "Review updated").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to(&product_path(&id)))
}

/// Delete one's own review.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn delete_review(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path((id, review_id)): Path<(ProductId, ReviewId)>,
) -> Result<Redirect> {
    match state.api().delete_review(&user.token, &review_id).await {
        Ok(()) => flash::success(&session, "Review deleted").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to(&product_path(&id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shop_href_round_trips_filters() {
        let query = parse_query(Some("category=c1&brand=b2&sort=price_asc&page=3"));
        assert_eq!(shop_href(&query), "/shop?category=c1&brand=b2&sort=price_asc&page=3");
        assert_eq!(shop_href(&ProductQuery::default()), "/shop");
    }

    #[test]
    fn test_toggling_a_category_resets_the_page() {
        let query = parse_query(Some("category=c1&page=4"));
        let options = category_options(
            &[Category {
                id: CategoryId::new("c2"),
                name: "Shoes".to_owned(),
                slug: "shoes".to_owned(),
                image: None,
            }],
            &query,
        );
        assert!(!options[0].checked);
        assert_eq!(options[0].href, "/shop?category=c1&category=c2");
    }

    #[test]
    fn test_rating_option_toggles_off() {
        let query = parse_query(Some("rating=4"));
        let options = rating_options(&query);
        let four = options.iter().find(|o| o.checked).map(|o| o.href.as_str());
        assert_eq!(four, Some("/shop"));
    }

    #[test]
    fn test_sort_options_mark_current() {
        let query = parse_query(Some("sort=top_rated"));
        let selected: Vec<_> = sort_options(&query)
            .into_iter()
            .filter(|s| s.selected)
            .map(|s| s.label)
            .collect();
        assert_eq!(selected, vec![SortOrder::TopRated.label()]);
    }

    #[test]
    fn test_price_form_carries_other_filters() {
        let query = parse_query(Some("keyword=shirt&category=c1&price_min=10&sort=newest&page=2"));
        let carried: Vec<_> = carried_pairs(&query).into_iter().map(|(k, _)| k).collect();
        assert!(carried.contains(&"category"));
        assert!(!carried.contains(&"keyword"));
        assert!(!carried.contains(&"price_min"));
        assert!(!carried.contains(&"page"));
    }
}
