//! Profile route handlers: account details, password, address book and
//! order history.
//!
//! Forms re-render with an inline error and the submitted values when
//! validation or the API refuses them.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::validation::AddressFields;
use atelier_core::{AddressId, OrderId};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use super::{PageLinks, flash_failure, inline_error, with_page};
use crate::api::{Address, Order};
use crate::error::{AppError, Result};
use crate::filters;
use crate::middleware::{PageContext, RequireAuth};
use crate::services::addresses::AddressService;
use crate::services::auth::AuthService;
use crate::services::flash;
use crate::services::orders::OrderService;
use crate::state::AppState;

// =============================================================================
// Account details
// =============================================================================

/// Profile form data.
#[derive(Debug, Default, Deserialize)]
pub struct ProfileForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub phone: String,
}

/// Profile page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/show.html")]
pub struct ProfileTemplate {
    pub page: PageContext,
    pub form: ProfileForm,
    pub error: Option<String>,
}

/// Display the account details form.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<Response> {
    let me = state.api().get_me(&user.token).await?;
    Ok(ProfileTemplate {
        page,
        form: ProfileForm {
            name: me.name,
            email: me.email,
            phone: me.phone.unwrap_or_default(),
        },
        error: None,
    }
    .into_response())
}

/// Save the account details.
#[instrument(skip(state, session, user, page, form), fields(user_id = %user.id))]
pub async fn update(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Form(form): Form<ProfileForm>,
) -> Result<Response> {
    match AuthService::new(state.api(), &session)
        .update_profile(&user, &form.name, &form.email, &form.phone)
        .await
    {
        Ok(_) => {
            flash::success(&session, "Profile updated").await?;
            Ok(Redirect::to("/profile").into_response())
        }
        Err(e) => Ok(ProfileTemplate {
            page,
            form,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

// =============================================================================
// Password
// =============================================================================

/// Change password form data.
#[derive(Debug, Deserialize)]
pub struct PasswordForm {
    #[serde(default)]
    pub current_password: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub password_confirm: String,
}

/// Change password page template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/password.html")]
pub struct PasswordTemplate {
    pub page: PageContext,
    pub error: Option<String>,
}

/// Display the change password form.
pub async fn password_page(RequireAuth(_user): RequireAuth, page: PageContext) -> impl IntoResponse {
    PasswordTemplate { page, error: None }
}

/// Change the password. The API's new token replaces the stored one.
#[instrument(skip_all, fields(user_id = %user.id))]
pub async fn change_password(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Form(form): Form<PasswordForm>,
) -> Result<Response> {
    match AuthService::new(state.api(), &session)
        .change_password(
            &user,
            &form.current_password,
            &form.password,
            &form.password_confirm,
        )
        .await
    {
        Ok(current) => {
            flash::success(&session, "Password changed").await?;
            let cookie = crate::services::auth::token_cookie(
                &current.token,
                state.config().is_secure(),
            );
            Ok((
                [(axum::http::header::SET_COOKIE, cookie.to_string())],
                Redirect::to("/profile"),
            )
                .into_response())
        }
        Err(e) => Ok(PasswordTemplate {
            page,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

// =============================================================================
// Address book
// =============================================================================

/// Address form data.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AddressForm {
    #[serde(default)]
    pub alias: String,
    #[serde(default)]
    pub details: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub postal_code: String,
}

impl AddressForm {
    fn fields(&self) -> AddressFields<'_> {
        AddressFields {
            alias: &self.alias,
            details: &self.details,
            phone: &self.phone,
            city: &self.city,
            postal_code: &self.postal_code,
        }
    }
}

impl From<&Address> for AddressForm {
    fn from(address: &Address) -> Self {
        Self {
            alias: address.alias.clone(),
            details: address.details.clone(),
            phone: address.phone.clone(),
            city: address.city.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

/// Address book template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/addresses.html")]
pub struct AddressesTemplate {
    pub page: PageContext,
    pub addresses: Vec<Address>,
    pub form: AddressForm,
    pub error: Option<String>,
}

/// Edit address template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/address_edit.html")]
pub struct AddressEditTemplate {
    pub page: PageContext,
    pub id: AddressId,
    pub form: AddressForm,
    pub error: Option<String>,
}

/// Display the address book.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn addresses(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
) -> Result<Response> {
    let addresses = AddressService::new(state.api(), &user).list().await?;
    Ok(AddressesTemplate {
        page,
        addresses,
        form: AddressForm::default(),
        error: None,
    }
    .into_response())
}

/// Add an address.
#[instrument(skip(state, session, user, page, form), fields(user_id = %user.id))]
pub async fn create_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    let service = AddressService::new(state.api(), &user);
    match service.add(&form.fields()).await {
        Ok(_) => {
            flash::success(&session, "Address saved").await?;
            Ok(Redirect::to("/profile/addresses").into_response())
        }
        Err(e) => {
            let error = inline_error(e)?;
            let addresses = service.list().await.unwrap_or_default();
            Ok(AddressesTemplate {
                page,
                addresses,
                form,
                error: Some(error),
            }
            .into_response())
        }
    }
}

/// Display the edit form for one address.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn edit_address(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<AddressId>,
) -> Result<Response> {
    let address = AddressService::new(state.api(), &user)
        .find(&id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("address {id}")))?;
    Ok(AddressEditTemplate {
        page,
        form: AddressForm::from(&address),
        id,
        error: None,
    }
    .into_response())
}

/// Save an edited address.
#[instrument(skip(state, session, user, page, form), fields(user_id = %user.id))]
pub async fn update_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<AddressId>,
    Form(form): Form<AddressForm>,
) -> Result<Response> {
    match AddressService::new(state.api(), &user)
        .update(&id, &form.fields())
        .await
    {
        Ok(_) => {
            flash::success(&session, "Address updated").await?;
            Ok(Redirect::to("/profile/addresses").into_response())
        }
        Err(e) => Ok(AddressEditTemplate {
            page,
            id,
            form,
            error: Some(inline_error(e)?),
        }
        .into_response()),
    }
}

/// Delete an address.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn delete_address(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<AddressId>,
) -> Result<Redirect> {
    match AddressService::new(state.api(), &user).remove(&id).await {
        Ok(_) => flash::success(&session, "Address removed").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to("/profile/addresses"))
}

// =============================================================================
// Orders
// =============================================================================

/// Page selection query.
#[derive(Debug, Deserialize)]
pub struct PageQuery {
    pub page: Option<u32>,
}

/// Order history template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub links: PageLinks,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "profile/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: Order,
    pub can_cancel: bool,
}

/// Display the order history.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn orders(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Query(query): Query<PageQuery>,
) -> Result<Response> {
    let orders = OrderService::new(state.api(), &user)
        .list_mine(query.page.unwrap_or(1))
        .await?;
    let links = PageLinks::new(&orders.pagination, |n| with_page("/profile/orders", n));
    Ok(OrdersTemplate {
        page,
        orders: orders.items,
        links,
    }
    .into_response())
}

/// Display one order.
#[instrument(skip(state, user, page), fields(user_id = %user.id))]
pub async fn order(
    State(state): State<AppState>,
    RequireAuth(user): RequireAuth,
    page: PageContext,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = OrderService::new(state.api(), &user).get(&id).await?;
    Ok(OrderTemplate {
        page,
        can_cancel: order.status.is_cancellable_by_customer(),
        order,
    }
    .into_response())
}

/// Cancel a pending order.
#[instrument(skip(state, session, user), fields(user_id = %user.id))]
pub async fn cancel_order(
    State(state): State<AppState>,
    session: Session,
    RequireAuth(user): RequireAuth,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    match OrderService::new(state.api(), &user).cancel(&id).await {
        Ok(_) => flash::success(&session, "Order cancelled").await?,
        Err(e) => flash_failure(&session, e).await?,
    }
    Ok(Redirect::to(&format!(
        "/profile/orders/{}",
        urlencoding::encode(id.as_str())
    )))
}
