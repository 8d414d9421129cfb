//! Category and brand management handlers.
//!
//! Both resources have the same shape (a name and an image), so each pair
//! of handlers delegates to one implementation keyed by [`Taxonomy`].

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::validation::ValidationError;
use atelier_core::{BrandId, CategoryId};
use axum::{
    extract::{Multipart, Path, State},
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::Session;
use tracing::instrument;

use super::MultipartForm;
use crate::api::admin::TaxonomyInput;
use crate::api::{ApiError, Brand, Category};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::models::CurrentUser;
use crate::routes::{flash_failure, inline_error};
use crate::services::{ServiceError, flash};
use crate::state::AppState;

/// Which list is being managed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Taxonomy {
    Categories,
    Brands,
}

impl Taxonomy {
    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::Categories => "Categories",
            Self::Brands => "Brands",
        }
    }

    #[must_use]
    pub const fn singular(self) -> &'static str {
        match self {
            Self::Categories => "category",
            Self::Brands => "brand",
        }
    }

    #[must_use]
    pub const fn base_path(self) -> &'static str {
        match self {
            Self::Categories => "/admin/categories",
            Self::Brands => "/admin/brands",
        }
    }

    fn item_path(self, id: &str) -> String {
        format!("{}/{}", self.base_path(), urlencoding::encode(id))
    }
}

/// One row of the list.
#[derive(Debug, Clone)]
pub struct TaxonomyRow {
    pub id: String,
    pub name: String,
    pub image: Option<String>,
    pub edit_href: String,
    pub delete_href: String,
}

impl TaxonomyRow {
    fn new(kind: Taxonomy, id: &str, name: &str, image: Option<&String>) -> Self {
        let path = kind.item_path(id);
        Self {
            id: id.to_owned(),
            name: name.to_owned(),
            image: image.cloned(),
            edit_href: format!("{path}/edit"),
            delete_href: format!("{path}/delete"),
        }
    }
}

/// List and create template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/taxonomy.html")]
pub struct TaxonomyTemplate {
    pub page: PageContext,
    pub kind: Taxonomy,
    pub rows: Vec<TaxonomyRow>,
    pub name: String,
    pub error: Option<String>,
}

/// Edit template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/taxonomy_edit.html")]
pub struct TaxonomyEditTemplate {
    pub page: PageContext,
    pub kind: Taxonomy,
    pub action: String,
    pub name: String,
    pub image: Option<String>,
    pub error: Option<String>,
}

// =============================================================================
// Shared implementation
// =============================================================================

async fn rows(state: &AppState, kind: Taxonomy) -> std::result::Result<Vec<TaxonomyRow>, ApiError> {
    let api = state.api();
    Ok(match kind {
        Taxonomy::Categories => api
            .list_categories()
            .await?
            .into_iter()
            .map(|c: Category| TaxonomyRow::new(kind, c.id.as_str(), &c.name, c.image.as_ref()))
            .collect(),
        Taxonomy::Brands => api
            .list_brands()
            .await?
            .into_iter()
            .map(|b: Brand| TaxonomyRow::new(kind, b.id.as_str(), &b.name, b.image.as_ref()))
            .collect(),
    })
}

fn read_input(mut form: MultipartForm) -> std::result::Result<TaxonomyInput, ServiceError> {
    let name = form.text("name");
    if name.is_empty() {
        return Err(ValidationError::Required("name").into());
    }
    Ok(TaxonomyInput {
        name,
        image: form.take_file("image"),
    })
}

async fn save(
    state: &AppState,
    admin: &CurrentUser,
    kind: Taxonomy,
    id: Option<&str>,
    input: TaxonomyInput,
) -> std::result::Result<String, ApiError> {
    let api = state.api();
    let token = admin.token.as_str();
    Ok(match (kind, id) {
        (Taxonomy::Categories, None) => api.admin_create_category(token, input).await?.name,
        (Taxonomy::Categories, Some(id)) => {
            api.admin_update_category(token, &CategoryId::new(id), input)
                .await?
                .name
        }
        (Taxonomy::Brands, None) => api.admin_create_brand(token, input).await?.name,
        (Taxonomy::Brands, Some(id)) => {
            api.admin_update_brand(token, &BrandId::new(id), input)
                .await?
                .name
        }
    })
}

async fn list(state: &AppState, page: PageContext, kind: Taxonomy) -> Result<Response> {
    Ok(TaxonomyTemplate {
        page,
        kind,
        rows: rows(state, kind).await?,
        name: String::new(),
        error: None,
    }
    .into_response())
}

async fn create(
    state: &AppState,
    session: &Session,
    admin: &CurrentUser,
    page: PageContext,
    kind: Taxonomy,
    multipart: Multipart,
) -> Result<Response> {
    let form = MultipartForm::read(multipart).await?;
    let name = form.text("name");
    let result = match read_input(form) {
        Ok(input) => save(state, admin, kind, None, input)
            .await
            .map_err(ServiceError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(saved) => {
            tracing::info!(kind = kind.singular(), name = %saved, "Created");
            flash::success(session, format!("Created {saved}")).await?;
            Ok(Redirect::to(kind.base_path()).into_response())
        }
        Err(e) => Ok(TaxonomyTemplate {
            page,
            kind,
            error: Some(inline_error(e)?),
            rows: rows(state, kind).await?,
            name,
        }
        .into_response()),
    }
}

async fn edit(
    state: &AppState,
    page: PageContext,
    kind: Taxonomy,
    id: &str,
) -> Result<Response> {
    let row = rows(state, kind)
        .await?
        .into_iter()
        .find(|row| row.id == id)
        .ok_or_else(|| AppError::NotFound(format!("{} {id}", kind.singular())))?;
    Ok(TaxonomyEditTemplate {
        page,
        kind,
        action: kind.item_path(id),
        name: row.name,
        image: row.image,
        error: None,
    }
    .into_response())
}

async fn update(
    state: &AppState,
    session: &Session,
    admin: &CurrentUser,
    page: PageContext,
    kind: Taxonomy,
    id: &str,
    multipart: Multipart,
) -> Result<Response> {
    let form = MultipartForm::read(multipart).await?;
    let name = form.text("name");
    let result = match read_input(form) {
        Ok(input) => save(state, admin, kind, Some(id), input)
            .await
            .map_err(ServiceError::from),
        Err(e) => Err(e),
    };
    match result {
        Ok(saved) => {
            flash::success(session, format!("Saved {saved}")).await?;
            Ok(Redirect::to(kind.base_path()).into_response())
        }
        Err(e) => Ok(TaxonomyEditTemplate {
            page,
            kind,
            action: kind.item_path(id),
            name,
            image: None,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

async fn delete(
    state: &AppState,
    session: &Session,
    admin: &CurrentUser,
    kind: Taxonomy,
    id: &str,
) -> Result<Redirect> {
    let api = state.api();
    let result = match kind {
        Taxonomy::Categories => {
            api.admin_delete_category(&admin.token, &CategoryId::new(id))
                .await
        }
        Taxonomy::Brands => api.admin_delete_brand(&admin.token, &BrandId::new(id)).await,
    };
    match result {
        Ok(()) => {
            let message = format!("Deleted {}", kind.singular());
            flash::success(session, message).await?;
        }
        Err(e) => flash_failure(session, e.into()).await?,
    }
    Ok(Redirect::to(kind.base_path()))
}

// =============================================================================
// Categories
// =============================================================================

/// Display the category list.
pub async fn categories(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
) -> Result<Response> {
    list(&state, page, Taxonomy::Categories).await
}

/// Create a category.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    create(&state, &session, &admin, page, Taxonomy::Categories, multipart).await
}

/// Display the category edit form.
pub async fn edit_category(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response> {
    edit(&state, page, Taxonomy::Categories, &id).await
}

/// Update a category.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn update_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    update(&state, &session, &admin, page, Taxonomy::Categories, &id, multipart).await
}

/// Delete a category.
#[instrument(skip_all, fields(admin_id = %admin.id, category_id = %id))]
pub async fn delete_category(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    delete(&state, &session, &admin, Taxonomy::Categories, &id).await
}

// =============================================================================
// Brands
// =============================================================================

/// Display the brand list.
pub async fn brands(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
) -> Result<Response> {
    list(&state, page, Taxonomy::Brands).await
}

/// Create a brand.
#[instrument(skip_all, fields(admin_id = %admin.id))]
pub async fn create_brand(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    multipart: Multipart,
) -> Result<Response> {
    create(&state, &session, &admin, page, Taxonomy::Brands, multipart).await
}

/// Display the brand edit form.
pub async fn edit_brand(
    State(state): State<AppState>,
    RequireAdmin(_admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<String>,
) -> Result<Response> {
    edit(&state, page, Taxonomy::Brands, &id).await
}

/// Update a brand.
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn update_brand(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Result<Response> {
    update(&state, &session, &admin, page, Taxonomy::Brands, &id, multipart).await
}

/// Delete a brand.
#[instrument(skip_all, fields(admin_id = %admin.id, brand_id = %id))]
pub async fn delete_brand(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<String>,
) -> Result<Redirect> {
    delete(&state, &session, &admin, Taxonomy::Brands, &id).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_row_links() {
        let row = TaxonomyRow::new(Taxonomy::Brands, "b 1", "Acme", None);
        assert_eq!(row.edit_href, "/admin/brands/b%201/edit");
        assert_eq!(row.delete_href, "/admin/brands/b%201/delete");
    }

    #[test]
    fn test_name_is_required() {
        let err = read_input(MultipartForm::default()).err();
        assert_eq!(
            err.map(|e| e.user_message()),
            Some("Name is required".to_owned())
        );
    }
}
