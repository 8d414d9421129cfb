//! Dashboard route handler.

use askama::Template;
use askama_web::WebTemplate;
use atelier_core::OrderStatus;
use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use tracing::instrument;

use crate::api::{ApiError, Order, Page};
use crate::error::Result;
use crate::filters;
use crate::middleware::{PageContext, RequireAdmin};
use crate::state::AppState;

/// Orders shown in the recent list.
const RECENT_ORDERS: usize = 8;

/// One status tile.
#[derive(Debug, Clone)]
pub struct StatusCount {
    pub label: &'static str,
    pub badge_class: &'static str,
    /// Count as displayed; `"12+"` when the list spans several pages.
    pub count: String,
    pub href: String,
}

impl StatusCount {
    fn new(status: OrderStatus, page: std::result::Result<Page<Order>, ApiError>) -> Self {
        let count = match page {
            Ok(page) if page.pagination.is_paged() => format!("{}+", page.results),
            Ok(page) => page.results.to_string(),
            Err(e) => {
                tracing::warn!(error = %e, status = %status, "Failed to count orders");
                "?".to_owned()
            }
        };
        Self {
            label: status.label(),
            badge_class: status.badge_class(),
            count,
            href: format!("/admin/orders?status={}", status.as_str()),
        }
    }
}

/// Dashboard template.
#[derive(Template, WebTemplate)]
#[template(path = "admin/dashboard.html")]
pub struct DashboardTemplate {
    pub page: PageContext,
    pub counts: Vec<StatusCount>,
    /// The most recent orders, newest first.
    pub orders: Vec<Order>,
}

/// Display the dashboard: counts per status and the latest orders.
#[instrument(skip(state, admin, page), fields(admin_id = %admin.id))]
pub async fn index(
    State(state): State<AppState>,
    RequireAdmin(admin): RequireAdmin,
    page: PageContext,
) -> Result<Response> {
    let api = state.api();
    let token = admin.token.as_str();
    let [pending, processing, shipped, delivered, cancelled] = OrderStatus::ALL;
    let (recent, c1, c2, c3, c4, c5) = tokio::join!(
        api.admin_list_orders(token, None, 1),
        api.admin_list_orders(token, Some(pending), 1),
        api.admin_list_orders(token, Some(processing), 1),
        api.admin_list_orders(token, Some(shipped), 1),
        api.admin_list_orders(token, Some(delivered), 1),
        api.admin_list_orders(token, Some(cancelled), 1),
    );

    let counts = vec![
        StatusCount::new(pending, c1),
        StatusCount::new(processing, c2),
        StatusCount::new(shipped, c3),
        StatusCount::new(delivered, c4),
        StatusCount::new(cancelled, c5),
    ];
    let mut orders = recent?.items;
    orders.truncate(RECENT_ORDERS);

    Ok(DashboardTemplate {
        page,
        counts,
        orders,
    }
    .into_response())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::Pagination;

    fn page(results: u32, pages: u32) -> Page<Order> {
        Page {
            items: Vec::new(),
            results,
            pagination: Pagination {
                current_page: 1,
                limit: 12,
                number_of_pages: pages,
                next: None,
                prev: None,
            },
        }
    }

    #[test]
    fn test_count_marks_partial_totals() {
        assert_eq!(StatusCount::new(OrderStatus::Pending, Ok(page(4, 1))).count, "4");
        assert_eq!(StatusCount::new(OrderStatus::Pending, Ok(page(12, 3))).count, "12+");
    }

    #[test]
    fn test_count_survives_failure() {
        let tile = StatusCount::new(OrderStatus::Shipped, Err(ApiError::RateLimited(1)));
        assert_eq!(tile.count, "?");
        assert_eq!(tile.href, "/admin/orders?status=shipped");
    }
}
