//! Products, categories and brands (public reads).

use atelier_core::ProductId;
use atelier_core::catalog::ProductQuery;
use reqwest::Method;
use tracing::instrument;

use super::{ApiClient, ApiError, Brand, CacheKey, CacheValue, Category, Page, Product};

/// Upper bound for "all categories/brands" requests that feed filter lists.
const TAXONOMY_LIMIT: &str = "100";

impl ApiClient {
    /// List products matching the composed filters.
    ///
    /// Listings are not cached; filter combinations are too varied.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self), fields(page = query.page))]
    pub async fn list_products(&self, query: &ProductQuery) -> Result<Page<Product>, ApiError> {
        let request = self
            .request(Method::GET, "/products", None)
            .query(&query.api_pairs());
        self.send_page(request).await
    }

    /// Get a single product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the product does not exist, or an
    /// error if the API request fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_product(&self, id: &ProductId) -> Result<Product, ApiError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.cached(&key).await {
            return Ok(*product);
        }

        let path = format!("/products/{}", urlencoding::encode(id.as_str()));
        let product: Product = self
            .send_data(self.request(Method::GET, &path, None))
            .await?;

        self.cache_insert(key, CacheValue::Product(Box::new(product.clone())))
            .await;
        Ok(product)
    }

    /// All categories, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_categories(&self) -> Result<Vec<Category>, ApiError> {
        if let Some(CacheValue::Categories(categories)) = self.cached(&CacheKey::Categories).await
        {
            return Ok(categories);
        }

        let request = self
            .request(Method::GET, "/categories", None)
            .query(&[("limit", TAXONOMY_LIMIT)]);
        let page: Page<Category> = self.send_page(request).await?;

        self.cache_insert(CacheKey::Categories, CacheValue::Categories(page.items.clone()))
            .await;
        Ok(page.items)
    }

    /// All brands, cached.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn list_brands(&self) -> Result<Vec<Brand>, ApiError> {
        if let Some(CacheValue::Brands(brands)) = self.cached(&CacheKey::Brands).await {
            return Ok(brands);
        }

        let request = self
            .request(Method::GET, "/brands", None)
            .query(&[("limit", TAXONOMY_LIMIT)]);
        let page: Page<Brand> = self.send_page(request).await?;

        self.cache_insert(CacheKey::Brands, CacheValue::Brands(page.items.clone()))
            .await;
        Ok(page.items)
    }
}
