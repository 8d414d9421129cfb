//! Product management handlers.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::validation::ValidationError;
use atelier_core::{BrandId, CategoryId, ProductId};
use axum::{
    extract::{Multipart, Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use rust_decimal::Decimal;
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::upload::split_list;
use super::{MultipartForm, SelectOption};
use crate::api::admin::ProductInput;
use crate::api::{Brand, Category, Product};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::{PageLinks, flash_failure, inline_error, with_page};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

/// `?keyword=&page=` on the product list.
#[derive(Debug, Deserialize)]
pub struct ProductsQuery {
    pub keyword: Option<String>,
    pub page: Option<u32>,
}

/// Product list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/products.html")]
pub struct ProductsTemplate {
    pub page: PageContext,
    pub products: Vec<Product>,
    pub keyword: String,
    pub links: PageLinks,
}

/// Submitted product fields, kept as text for re-rendering.
#[derive(Debug, Clone, Default)]
pub struct ProductForm {
    pub title: String,
    pub description: String,
    pub quantity: String,
    pub price: String,
    pub price_after_discount: String,
    pub colors: String,
    pub sizes: String,
    pub category: String,
    pub brand: String,
}

impl ProductForm {
    fn from_multipart(form: &MultipartForm) -> Self {
        Self {
            title: form.text("title"),
            description: form.text("description"),
            quantity: form.text("quantity"),
            price: form.text("price"),
            price_after_discount: form.text("priceAfterDiscount"),
            colors: form.text("colors"),
            sizes: form.text("sizes"),
            category: form.text("category"),
            brand: form.text("brand"),
        }
    }

    /// Check the fields and build the API input (without images).
    fn to_input(&self) -> std::result::Result<ProductInput, ServiceError> {
        if self.title.is_empty() {
            return Err(ValidationError::Required("title").into());
        }
        if self.description.is_empty() {
            return Err(ValidationError::Required("description").into());
        }
        let quantity = self
            .quantity
            .parse::<u32>()
            .map_err(|_| ServiceError::Rejected("Quantity must be a whole number"))?;
        let price = self
            .price
            .parse::<Decimal>()
            .ok()
            .filter(|p| p.is_sign_positive())
            .ok_or(ServiceError::Rejected("Enter a valid price"))?;
        let price_after_discount = if self.price_after_discount.is_empty() {
            None
        } else {
            let sale = self
                .price_after_discount
                .parse::<Decimal>()
                .map_err(|_| ServiceError::Rejected("Enter a valid sale price"))?;
            if sale >= price {
                return Err(ServiceError::Rejected(
                    "Sale price must be below the regular price",
                ));
            }
            Some(sale)
        };
        Ok(ProductInput {
            title: self.title.clone(),
            description: self.description.clone(),
            quantity,
            price,
            price_after_discount,
            colors: split_list(&self.colors),
            sizes: split_list(&self.sizes),
            category: (!self.category.is_empty()).then(|| CategoryId::new(&self.category)),
            brand: (!self.brand.is_empty()).then(|| BrandId::new(&self.brand)),
            ..ProductInput::default()
        })
    }
}

impl From<&Product> for ProductForm {
    fn from(product: &Product) -> Self {
        Self {
            title: product.title.clone(),
            description: product.description.clone(),
            quantity: product.quantity.to_string(),
            price: product.price.plain(),
            price_after_discount: product
                .price_after_discount
                .map(|p| p.plain())
                .unwrap_or_default(),
            colors: product.colors.join(", "),
            sizes: product.sizes.join(", "),
            category: product
                .category
                .as_ref()
                .map(|c| c.id().to_owned())
                .unwrap_or_default(),
            brand: product
                .brand
                .as_ref()
                .map(|b| b.id().to_owned())
                .unwrap_or_default(),
        }
    }
}

/// Create/edit product template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/product_form.html")]
pub struct ProductFormTemplate {
    pub page: PageContext,
    pub heading: &'static str,
    pub action: String,
    pub form: ProductForm,
    pub cover: Option<String>,
    pub categories: Vec<SelectOption>,
    pub brands: Vec<SelectOption>,
    pub error: Option<String>,
}

fn options<'a>(
    items: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: &str,
) -> Vec<SelectOption> {
    items
        .into_iter()
        .map(|(id, name)| SelectOption {
            value: id.to_owned(),
            label: name.to_owned(),
            selected: id == selected,
        })
        .collect()
}

/// Build the form page, loading the category and brand choices.
async fn form_page(
    state: &AppState,
    page: PageContext,
    heading: &'static str,
    action: String,
    form: ProductForm,
    cover: Option<String>,
    error: Option<String>,
) -> ProductFormTemplate {
    let api = state.api();
    let (categories, brands) = tokio::join!(api.list_categories(), api.list_brands());
    let categories: Vec<Category> = categories.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load categories for product form");
        Vec::new()
    });
    let brands: Vec<Brand> = brands.unwrap_or_else(|e| {
        tracing::warn!(error = %e, "Failed to load brands for product form");
        Vec::new()
    });
    ProductFormTemplate {
        page,
        heading,
        action,
        categories: options(
            categories.iter().map(|c| (c.id.as_str(), c.name.as_str())),
            &form.category,
        ),
        brands: options(
            brands.iter().map(|b| (b.id.as_str(), b.name.as_str())),
            &form.brand,
        ),
        form,
        cover,
        error,
    }
}

fn product_path(id: &ProductId) -> String {
    format!("/admin/products/{}", urlencoding::encode(id.as_str()))
}

/// Display the product list.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Query(query): Query<ProductsQuery>,
) -> Result<Response> {
    let keyword = query.keyword.unwrap_or_default().trim().to_owned();
    let products = state
        .api()
        .admin_list_products(
            &admin.token,
            query.page.unwrap_or(1),
            (!keyword.is_empty()).then_some(keyword.as_str()),
        )
        .await?;
    let base = if keyword.is_empty() {
        "/admin/products".to_owned()
    } else {
        format!("/admin/products?keyword={}", urlencoding::encode(&keyword))
    };
    let links = PageLinks::new(&products.pagination, |n| with_page(&base, n));
    Ok(ProductsTemplate {
        page,
        products: products.items,
        keyword,
        links,
    }
    .into_response())
}

/// Display the create form.
pub async fn new(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
) -> impl IntoResponse {
    form_page(
        &state,
        page,
        "New product",
        "/admin/products".to_owned(),
        ProductForm::default(),
        None,
        None,
    )
    .await
}

/// Create a product.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    let mut upload = MultipartForm::read(multipart).await?;
    let form = ProductForm::from_multipart(&upload);
    let result = match form.to_input() {
        Ok(mut input) => {
            input.image_cover = upload.take_file("imageCover");
            input.images = upload.take_files("images");
            if input.image_cover.is_none() {
                Err(ServiceError::Rejected("A cover image is required"))
            } else {
                state
                    .api()
                    .admin_create_product(&admin.token, input)
                    .await
                    .map_err(ServiceError::from)
            }
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(product) => {
            tracing::info!(product_id = %product.id, "Product created");
            flash::success(&session, format!("Created {}", product.title)).await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            let error = inline_error(e)?;
            let action = "/admin/products".to_owned();
            Ok(form_page(&state, page, "New product", action, form, None, Some(error))
                .await
                .into_response())
        }
    }
}

/// Display the edit form.
#[instrument(skip(state, page, _admin))]
pub async fn edit(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<ProductId>,
) -> Result<Response> {
    let product = state.api().get_product(&id).await?;
    Ok(form_page(
        &state,
        page,
        "Edit product",
        product_path(&id),
        ProductForm::from(&product),
        Some(product.image_cover),
        None,
    )
    .await
    .into_response())
}

/// Update a product. Images are only replaced when new files are sent.
#[instrument(skip_all, fields(admin_id = %admin.id, product_id = %id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<ProductId>,
    multipart: Multipart,
) -> Result<Response> {
    let mut upload = MultipartForm::read(multipart).await?;
    let form = ProductForm::from_multipart(&upload);
    let result = match form.to_input() {
        Ok(mut input) => {
            input.image_cover = upload.take_file("imageCover");
            input.images = upload.take_files("images");
            state
                .api()
                .admin_update_product(&admin.token, &id, input)
                .await
                .map_err(ServiceError::from)
        }
        Err(e) => Err(e),
    };

    match result {
        Ok(product) => {
            flash::success(&session, format!("Saved {}", product.title)).await?;
            Ok(Redirect::to("/admin/products").into_response())
        }
        Err(e) => {
            let error = inline_error(e)?;
            Ok(form_page(
                &state,
                page,
                "Edit product",
                product_path(&id),
                form,
                None,
                Some(error),
            )
            .await
            .into_response())
        }
    }
}

/// Delete a product.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn delete(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<ProductId>,
) -> Result<Redirect> {
    match state.api().admin_delete_product(&admin.token, &id).await {
        Ok(()) => flash::success(&session, "Product deleted").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to("/admin/products"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn valid() -> ProductForm {
        ProductForm {
            title: "Linen shirt".to_owned(),
            description: "Breathable".to_owned(),
            quantity: "10".to_owned(),
            price: "450".to_owned(),
            colors: "white, sand".to_owned(),
            category: "c1".to_owned(),
            ..ProductForm::default()
        }
    }

    #[test]
    fn test_valid_form_builds_input() {
        let input = valid().to_input().unwrap();
        assert_eq!(input.quantity, 10);
        assert_eq!(input.price, Decimal::from(450));
        assert_eq!(input.colors, vec!["white", "sand"]);
        assert_eq!(input.category.as_ref().map(CategoryId::as_str), Some("c1"));
        assert!(input.brand.is_none());
        assert!(input.price_after_discount.is_none());
    }

    #[test]
    fn test_sale_price_must_undercut() {
        let form = ProductForm {
            price_after_discount: "500".to_owned(),
            ..valid()
        };
        assert!(matches!(form.to_input(), Err(ServiceError::Rejected(_))));
    }

    #[test]
    fn test_missing_title_is_required_error() {
        let form = ProductForm {
            title: String::new(),
            ..valid()
        };
        assert_eq!(
            form.to_input().err().map(|e| e.user_message()),
            Some("Title is required".to_owned())
        );
    }

    #[test]
    fn test_select_marks_current() {
        let opts = options([("a", "Shirts"), ("b", "Shoes")], "b");
        assert!(!opts[0].selected);
        assert!(opts[1].selected);
    }
}
