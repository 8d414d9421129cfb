//! `/admin/*` endpoints. All require an admin bearer token.
//!
//! Catalog writes invalidate the shared catalog cache so the storefront
//! never shows a stale product, category or brand after an edit.

use atelier_core::{
    BrandId, CategoryId, CouponId, OrderId, OrderStatus, ProductId, ReviewId, Role, UserId,
};
use chrono::NaiveDate;
use reqwest::Method;
use reqwest::multipart::{Form, Part};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::instrument;

use super::{ApiClient, ApiError, Brand, Category, Coupon, Order, Page, Product, Review, User};

/// An uploaded image forwarded to the API.
#[derive(Debug, Clone)]
pub struct Upload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    fn into_part(self) -> Result<Part, ApiError> {
        Ok(Part::bytes(self.bytes)
            .file_name(self.file_name)
            .mime_str(&self.content_type)?)
    }
}

/// Product create/update fields.
#[derive(Debug, Clone, Default)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub quantity: u32,
    pub price: Decimal,
    pub price_after_discount: Option<Decimal>,
    pub colors: Vec<String>,
    pub sizes: Vec<String>,
    pub category: Option<CategoryId>,
    pub brand: Option<BrandId>,
    pub image_cover: Option<Upload>,
    pub images: Vec<Upload>,
}

impl ProductInput {
    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new()
            .text("title", self.title)
            .text("description", self.description)
            .text("quantity", self.quantity.to_string())
            .text("price", self.price.to_string());
        if let Some(sale) = self.price_after_discount {
            form = form.text("priceAfterDiscount", sale.to_string());
        }
        for color in self.colors {
            form = form.text("colors", color);
        }
        for size in self.sizes {
            form = form.text("sizes", size);
        }
        if let Some(category) = self.category {
            form = form.text("category", category.to_string());
        }
        if let Some(brand) = self.brand {
            form = form.text("brand", brand.to_string());
        }
        if let Some(cover) = self.image_cover {
            form = form.part("imageCover", cover.into_part()?);
        }
        for image in self.images {
            form = form.part("images", image.into_part()?);
        }
        Ok(form)
    }
}

/// Category or brand create/update fields.
#[derive(Debug, Clone, Default)]
pub struct TaxonomyInput {
    pub name: String,
    pub image: Option<Upload>,
}

impl TaxonomyInput {
    fn into_form(self) -> Result<Form, ApiError> {
        let mut form = Form::new().text("name", self.name);
        if let Some(image) = self.image {
            form = form.part("image", image.into_part()?);
        }
        Ok(form)
    }
}

/// Coupon create/update body.
#[derive(Debug, Clone, Serialize)]
pub struct CouponInput {
    pub name: String,
    pub expire: NaiveDate,
    pub discount: u8,
}

#[derive(Serialize)]
struct StatusRequest {
    status: OrderStatus,
}

#[derive(Serialize)]
struct RoleRequest {
    role: Role,
}

fn admin_path(resource: &str, id: &str) -> String {
    format!("/admin/{resource}/{}", urlencoding::encode(id))
}

impl ApiClient {
    // =========================================================================
    // Products
    // =========================================================================

    /// Paginated product list with optional keyword search.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_products(
        &self,
        token: &str,
        page: u32,
        keyword: Option<&str>,
    ) -> Result<Page<Product>, ApiError> {
        let mut query = vec![("page", page.to_string()), ("sort", "-createdAt".to_string())];
        if let Some(keyword) = keyword.filter(|k| !k.trim().is_empty()) {
            query.push(("keyword", keyword.trim().to_string()));
        }
        let request = self
            .request(Method::GET, "/admin/products", Some(token))
            .query(&query);
        self.send_page(request).await
    }

    /// Create a product from multipart fields.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the product.
    #[instrument(skip(self, token, input), fields(title = %input.title))]
    pub async fn admin_create_product(
        &self,
        token: &str,
        input: ProductInput,
    ) -> Result<Product, ApiError> {
        let form = input.into_form()?;
        let product = self
            .send_data(
                self.request(Method::POST, "/admin/products", Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// Update a product. Omitted images are left untouched.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(product_id = %id))]
    pub async fn admin_update_product(
        &self,
        token: &str,
        id: &ProductId,
        input: ProductInput,
    ) -> Result<Product, ApiError> {
        let form = input.into_form()?;
        let product = self
            .send_data(
                self.request(Method::PUT, &admin_path("products", id.as_str()), Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(product)
    }

    /// Delete a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(product_id = %id))]
    pub async fn admin_delete_product(&self, token: &str, id: &ProductId) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("products", id.as_str()),
            Some(token),
        ))
        .await?;
        self.invalidate_catalog();
        Ok(())
    }

    // =========================================================================
    // Categories & brands
    // =========================================================================

    /// Create a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the category.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn admin_create_category(
        &self,
        token: &str,
        input: TaxonomyInput,
    ) -> Result<Category, ApiError> {
        let form = input.into_form()?;
        let category = self
            .send_data(
                self.request(Method::POST, "/admin/categories", Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(category)
    }

    /// Update a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(category_id = %id))]
    pub async fn admin_update_category(
        &self,
        token: &str,
        id: &CategoryId,
        input: TaxonomyInput,
    ) -> Result<Category, ApiError> {
        let form = input.into_form()?;
        let category = self
            .send_data(
                self.request(Method::PUT, &admin_path("categories", id.as_str()), Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(category)
    }

    /// Delete a category.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(category_id = %id))]
    pub async fn admin_delete_category(
        &self,
        token: &str,
        id: &CategoryId,
    ) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("categories", id.as_str()),
            Some(token),
        ))
        .await?;
        self.invalidate_catalog();
        Ok(())
    }

    /// Create a brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the brand.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn admin_create_brand(
        &self,
        token: &str,
        input: TaxonomyInput,
    ) -> Result<Brand, ApiError> {
        let form = input.into_form()?;
        let brand = self
            .send_data(
                self.request(Method::POST, "/admin/brands", Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(brand)
    }

    /// Update a brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(brand_id = %id))]
    pub async fn admin_update_brand(
        &self,
        token: &str,
        id: &BrandId,
        input: TaxonomyInput,
    ) -> Result<Brand, ApiError> {
        let form = input.into_form()?;
        let brand = self
            .send_data(
                self.request(Method::PUT, &admin_path("brands", id.as_str()), Some(token))
                    .multipart(form),
            )
            .await?;
        self.invalidate_catalog();
        Ok(brand)
    }

    /// Delete a brand.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(brand_id = %id))]
    pub async fn admin_delete_brand(&self, token: &str, id: &BrandId) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("brands", id.as_str()),
            Some(token),
        ))
        .await?;
        self.invalidate_catalog();
        Ok(())
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// All coupons.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_coupons(&self, token: &str) -> Result<Vec<Coupon>, ApiError> {
        let page: Page<Coupon> = self
            .send_page(self.request(Method::GET, "/admin/coupons", Some(token)))
            .await?;
        Ok(page.items)
    }

    /// A single coupon.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the coupon does not exist.
    #[instrument(skip(self, token), fields(coupon_id = %id))]
    pub async fn admin_get_coupon(&self, token: &str, id: &CouponId) -> Result<Coupon, ApiError> {
        self.send_data(self.request(
            Method::GET,
            &admin_path("coupons", id.as_str()),
            Some(token),
        ))
        .await
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the coupon.
    #[instrument(skip(self, token, input), fields(name = %input.name))]
    pub async fn admin_create_coupon(
        &self,
        token: &str,
        input: &CouponInput,
    ) -> Result<Coupon, ApiError> {
        self.send_data(
            self.request(Method::POST, "/admin/coupons", Some(token))
                .json(input),
        )
        .await
    }

    /// Update a coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token, input), fields(coupon_id = %id))]
    pub async fn admin_update_coupon(
        &self,
        token: &str,
        id: &CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, ApiError> {
        self.send_data(
            self.request(Method::PUT, &admin_path("coupons", id.as_str()), Some(token))
                .json(input),
        )
        .await
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(coupon_id = %id))]
    pub async fn admin_delete_coupon(&self, token: &str, id: &CouponId) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("coupons", id.as_str()),
            Some(token),
        ))
        .await
    }

    // =========================================================================
    // Orders
    // =========================================================================

    /// Every order, optionally filtered by status.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_orders(
        &self,
        token: &str,
        status: Option<OrderStatus>,
        page: u32,
    ) -> Result<Page<Order>, ApiError> {
        let mut query = vec![("page", page.to_string()), ("sort", "-createdAt".to_string())];
        if let Some(status) = status {
            query.push(("status", status.as_str().to_string()));
        }
        let request = self
            .request(Method::GET, "/admin/orders", Some(token))
            .query(&query);
        self.send_page(request).await
    }

    /// A single order.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::NotFound`] if the order does not exist.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn admin_get_order(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        self.send_data(self.request(
            Method::GET,
            &admin_path("orders", id.as_str()),
            Some(token),
        ))
        .await
    }

    /// Move an order to a new status. Transition rules live in the API.
    ///
    /// # Errors
    ///
    /// Returns an error if the API refuses the transition.
    #[instrument(skip(self, token), fields(order_id = %id, status = %status))]
    pub async fn admin_update_order_status(
        &self,
        token: &str,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<Order, ApiError> {
        let path = format!("{}/status", admin_path("orders", id.as_str()));
        self.send_data(
            self.request(Method::PUT, &path, Some(token))
                .json(&StatusRequest { status }),
        )
        .await
    }

    /// Mark an order as paid.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn admin_mark_order_paid(&self, token: &str, id: &OrderId) -> Result<Order, ApiError> {
        let path = format!("{}/pay", admin_path("orders", id.as_str()));
        self.send_data(self.request(Method::PUT, &path, Some(token)))
            .await
    }

    /// Mark an order as delivered.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the update.
    #[instrument(skip(self, token), fields(order_id = %id))]
    pub async fn admin_mark_order_delivered(
        &self,
        token: &str,
        id: &OrderId,
    ) -> Result<Order, ApiError> {
        let path = format!("{}/deliver", admin_path("orders", id.as_str()));
        self.send_data(self.request(Method::PUT, &path, Some(token)))
            .await
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Every review, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_reviews(&self, token: &str, page: u32) -> Result<Page<Review>, ApiError> {
        let request = self
            .request(Method::GET, "/admin/reviews", Some(token))
            .query(&[("page", page.to_string())]);
        self.send_page(request).await
    }

    /// Delete any review.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(review_id = %id))]
    pub async fn admin_delete_review(&self, token: &str, id: &ReviewId) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("reviews", id.as_str()),
            Some(token),
        ))
        .await?;
        self.invalidate_catalog();
        Ok(())
    }

    // =========================================================================
    // Users
    // =========================================================================

    /// Every account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip(self, token))]
    pub async fn admin_list_users(&self, token: &str, page: u32) -> Result<Page<User>, ApiError> {
        let request = self
            .request(Method::GET, "/admin/users", Some(token))
            .query(&[("page", page.to_string())]);
        self.send_page(request).await
    }

    /// Promote or demote an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the change.
    #[instrument(skip(self, token), fields(user_id = %id, role = %role))]
    pub async fn admin_update_user_role(
        &self,
        token: &str,
        id: &UserId,
        role: Role,
    ) -> Result<User, ApiError> {
        let path = format!("{}/role", admin_path("users", id.as_str()));
        self.send_data(
            self.request(Method::PUT, &path, Some(token))
                .json(&RoleRequest { role }),
        )
        .await
    }

    /// Delete an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the API rejects the removal.
    #[instrument(skip(self, token), fields(user_id = %id))]
    pub async fn admin_delete_user(&self, token: &str, id: &UserId) -> Result<(), ApiError> {
        self.send_unit(self.request(
            Method::DELETE,
            &admin_path("users", id.as_str()),
            Some(token),
        ))
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_path_encodes_ids() {
        assert_eq!(admin_path("orders", "abc123"), "/admin/orders/abc123");
        assert_eq!(admin_path("users", "a/b"), "/admin/users/a%2Fb");
    }

    #[test]
    fn test_coupon_input_serializes_date() {
        let input = CouponInput {
            name: "SUMMER10".to_string(),
            expire: NaiveDate::from_ymd_opt(2026, 8, 31).unwrap_or_default(),
            discount: 10,
        };
        let json = serde_json::to_value(&input).unwrap_or_default();
        assert_eq!(json["expire"], "2026-08-31");
        assert_eq!(json["discount"], 10);
    }
}
