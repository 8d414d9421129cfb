//! Admin order status changes.

#![allow(clippy::unwrap_used)]

use atelier_integration_tests::{ADMIN_EMAIL, TestApp, location, order};
use reqwest::StatusCode;

const STATUS_CALL: &str = "PUT /admin/orders/o-1/status";

async fn admin_with_order() -> TestApp {
    let app = TestApp::spawn().await;
    app.api.state().orders = vec![order("o-1", "pending")];
    app.login(ADMIN_EMAIL).await;
    app
}

#[tokio::test]
async fn test_status_change_requires_confirmation() {
    let app = admin_with_order().await;

    let body = app.page("/admin/orders/o-1/status?status=shipped").await;
    assert!(body.contains("Change order status?"));
    assert!(body.contains(r#"name="confirm" value="yes""#));

    let response = app
        .post_form("/admin/orders/o-1/status", &[("status", "shipped")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        location(&response),
        "/admin/orders/o-1/status?status=shipped"
    );
    assert!(!app.api.was_called(STATUS_CALL));
}

#[tokio::test]
async fn test_confirmed_status_change_reaches_api() {
    let app = admin_with_order().await;

    let response = app
        .post_form(
            "/admin/orders/o-1/status",
            &[("status", "shipped"), ("confirm", "yes")],
        )
        .await;

    assert_eq!(location(&response), "/admin/orders/o-1");
    assert!(app.api.was_called(STATUS_CALL));
    let body = app.page("/admin/orders/o-1").await;
    assert!(body.contains(r#"<span class="badge badge-info">Shipped</span>"#));
    assert!(body.contains("Order marked Shipped"));
}

#[tokio::test]
async fn test_refused_status_change_leaves_status_unchanged() {
    let app = admin_with_order().await;
    app.api.state().fail_status_update = true;

    let response = app
        .post_form(
            "/admin/orders/o-1/status",
            &[("status", "delivered"), ("confirm", "yes")],
        )
        .await;

    assert_eq!(location(&response), "/admin/orders/o-1");
    assert!(app.api.was_called(STATUS_CALL));
    let body = app.page("/admin/orders/o-1").await;
    assert!(body.contains(r#"<span class="badge badge-warning">Pending</span>"#));
    assert!(body.contains("This order can no longer change status"));
}

#[tokio::test]
async fn test_dashboard_counts_orders_per_status() {
    let app = admin_with_order().await;

    let body = app.page("/admin").await;

    assert!(body.contains("Dashboard"));
    assert!(body.contains("#o-1"));
    assert!(app.api.was_called("GET /admin/orders"));
}
