//! Order management handlers.
//!
//! A status change is two requests: `GET /admin/orders/{id}/status?status=X`
//! renders a confirmation page, and only its `POST` with `confirm=yes`
//! reaches the API. The detail page is always fetched fresh, so after a
//! refused change it shows whatever status the server still holds.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::{OrderId, OrderStatus};
use axum::{
    Form,
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
};
use serde::Deserialize;
use tower_sessions::Session;
use tracing::instrument;

use crate::api::Order;
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::routes::{PageLinks, flash_failure, with_page};
use crate::services::flash;
use crate::state::AppState;

/// `?status=&page=` on the order list. An unknown status means "all".
#[derive(Debug, Deserialize)]
pub struct OrdersQuery {
    pub status: Option<String>,
    pub page: Option<u32>,
}

impl OrdersQuery {
    fn status(&self) -> Option<OrderStatus> {
        self.status.as_deref().and_then(|s| s.parse::<OrderStatus>().ok())
    }
}

/// `?status=` on the confirmation page.
#[derive(Debug, Deserialize)]
pub struct TargetQuery {
    pub status: Option<String>,
}

/// Confirmed status change.
#[derive(Debug, Deserialize)]
pub struct StatusForm {
    pub status: OrderStatus,
    /// Must be `"yes"`; anything else goes back to the confirmation page.
    pub confirm: Option<String>,
}

impl StatusForm {
    fn is_confirmed(&self) -> bool {
        self.confirm.as_deref() == Some("yes")
    }
}

/// A status filter tab.
#[derive(Debug, Clone)]
pub struct StatusTab {
    pub label: &'static str,
    pub href: String,
    pub active: bool,
}

/// A status `<option>` on the detail page.
#[derive(Debug, Clone)]
pub struct StatusChoice {
    pub value: &'static str,
    pub label: &'static str,
    pub current: bool,
}

/// Order list template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/orders.html")]
pub struct OrdersTemplate {
    pub page: PageContext,
    pub orders: Vec<Order>,
    pub tabs: Vec<StatusTab>,
    pub links: PageLinks,
}

/// Order detail template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order.html")]
pub struct OrderTemplate {
    pub page: PageContext,
    pub order: Order,
    pub path: String,
    pub statuses: Vec<StatusChoice>,
}

/// Status change confirmation template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/order_status_confirm.html")]
pub struct ConfirmStatusTemplate {
    pub page: PageContext,
    pub order: Order,
    pub path: String,
    pub target: OrderStatus,
}

fn order_path(id: &OrderId) -> String {
    format!("/admin/orders/{}", urlencoding::encode(id.as_str()))
}

fn list_base(status: Option<OrderStatus>) -> String {
    status.map_or_else(
        || "/admin/orders".to_owned(),
        |s| format!("/admin/orders?status={}", s.as_str()),
    )
}

fn status_tabs(selected: Option<OrderStatus>) -> Vec<StatusTab> {
    std::iter::once(StatusTab {
        label: "All",
        href: list_base(None),
        active: selected.is_none(),
    })
    .chain(OrderStatus::ALL.into_iter().map(|status| StatusTab {
        label: status.label(),
        href: list_base(Some(status)),
        active: selected == Some(status),
    }))
    .collect()
}

fn status_choices(current: OrderStatus) -> Vec<StatusChoice> {
    OrderStatus::ALL
        .into_iter()
        .map(|status| StatusChoice {
            value: status.as_str(),
            label: status.label(),
            current: status == current,
        })
        .collect()
}

fn confirm_path(id: &OrderId, status: OrderStatus) -> String {
    format!("{}/status?status={}", order_path(id), status.as_str())
}

/// Display the order list.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Query(query): Query<OrdersQuery>,
) -> Result<Response> {
    let status = query.status();
    let orders = state
        .api()
        .admin_list_orders(&admin.token, status, query.page.unwrap_or(1))
        .await?;
    let base = list_base(status);
    let links = PageLinks::new(&orders.pagination, |n| with_page(&base, n));
    Ok(OrdersTemplate {
        page,
        orders: orders.items,
        tabs: status_tabs(status),
        links,
    }
    .into_response())
}

/// Display one order with its current server-side status.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn show(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<OrderId>,
) -> Result<Response> {
    let order = state.api().admin_get_order(&admin.token, &id).await?;
    Ok(OrderTemplate {
        page,
        path: order_path(&id),
        statuses: status_choices(order.status),
        order,
    }
    .into_response())
}

/// Ask for confirmation before changing an order's status.
#[instrument(skip(state, session, admin, page), fields(admin_id = %admin.id))]
pub async fn confirm_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
    Path(id): Path<OrderId>,
    Query(query): Query<TargetQuery>,
) -> Result<Response> {
    let Some(target) = query.status.as_deref().and_then(|s| s.parse::<OrderStatus>().ok()) else {
        flash::error(&session, "Choose a status").await?;
        return Ok(Redirect::to(&order_path(&id)).into_response());
    };
    let order = state.api().admin_get_order(&admin.token, &id).await?;
    if order.status == target {
        flash::error(&session, format!("Order is already {}", target.label())).await?;
        return Ok(Redirect::to(&order_path(&id)).into_response());
    }
    Ok(ConfirmStatusTemplate {
        page,
        path: order_path(&id),
        order,
        target,
    }
    .into_response())
}

/// Apply a confirmed status change.
///
/// Without `confirm=yes` no API call is made. On failure the admin lands on
/// the detail page, which re-reads the unchanged status from the API.
#[instrument(skip(state, session, admin, form), fields(admin_id = %admin.id, status = %form.status))]
pub async fn update_status(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
    Form(form): Form<StatusForm>,
) -> Result<Redirect> {
    if !form.is_confirmed() {
        return Ok(Redirect::to(&confirm_path(&id, form.status)));
    }
    match state
        .api()
        .admin_update_order_status(&admin.token, &id, form.status)
        .await
    {
        Ok(order) => {
            tracing::info!(order_id = %order.id, status = %order.status, "Order status changed");
            let message = format!("Order marked {}", order.status.label());
            flash::success(&session, message).await?;
        }
        Err(e) => {
            tracing::warn!(order_id = %id, error = %e, "Order status change refused");
            flash_failure(&session, e.into()).await?;
        }
    }
    Ok(Redirect::to(&order_path(&id)))
}

/// Mark an order as paid.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn mark_paid(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    match state.api().admin_mark_order_paid(&admin.token, &id).await {
        Ok(_) => flash::success(&session, "Order marked paid").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to(&order_path(&id)))
}

/// Mark an order as delivered.
#[instrument(skip(state, session, admin), fields(admin_id = %admin.id))]
pub async fn mark_delivered(
    State(state): State<AppState>,
    session: Session,
    RequireAdmin(admin): RequireAdmin,
    Path(id): Path<OrderId>,
) -> Result<Redirect> {
    match state
        .api()
        .admin_mark_order_delivered(&admin.token, &id)
        .await
    {
        Ok(_) => flash::success(&session, "Order marked delivered").await?,
        Err(e) => flash_failure(&session, e.into()).await?,
    }
    Ok(Redirect::to(&order_path(&id)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_status_filter_means_all() {
        let query = OrdersQuery {
            status: Some("bogus".to_owned()),
            page: None,
        };
        assert_eq!(query.status(), None);
        let tabs = status_tabs(query.status());
        assert!(tabs.first().is_some_and(|t| t.active));
        assert_eq!(tabs.iter().filter(|t| t.active).count(), 1);
    }

    #[test]
    fn test_tabs_link_each_status() {
        let tabs = status_tabs(Some(OrderStatus::Shipped));
        let active: Vec<_> = tabs.iter().filter(|t| t.active).map(|t| t.href.as_str()).collect();
        assert_eq!(active, vec!["/admin/orders?status=shipped"]);
        assert_eq!(tabs.len(), OrderStatus::ALL.len() + 1);
    }

    #[test]
    fn test_confirmation_required() {
        let unconfirmed = StatusForm {
            status: OrderStatus::Shipped,
            confirm: None,
        };
        assert!(!unconfirmed.is_confirmed());
        assert_eq!(
            confirm_path(&OrderId::new("o1"), unconfirmed.status),
            "/admin/orders/o1/status?status=shipped"
        );
        let confirmed = StatusForm {
            confirm: Some("yes".to_owned()),
            ..unconfirmed
        };
        assert!(confirmed.is_confirmed());
    }

    #[test]
    fn test_current_status_is_selected() {
        let choices = status_choices(OrderStatus::Processing);
        let current: Vec<_> = choices.iter().filter(|c| c.current).map(|c| c.value).collect();
        assert_eq!(current, vec!["processing"]);
    }
}
