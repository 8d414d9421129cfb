//! Cart, wishlist and checkout against the fake API.

#![allow(clippy::unwrap_used)]

use atelier_integration_tests::{SHOPPER_EMAIL, TestApp, cart, location, product};
use reqwest::StatusCode;

#[tokio::test]
async fn test_add_to_cart_signed_out_goes_to_login_without_cart_call() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form("/products/p-1/add-to-cart", &[("color", "Blue")])
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?callbackUrl=%2Fproducts%2Fp-1");
    assert!(!app.api.was_called("POST /cart"));
}

#[tokio::test]
async fn test_add_to_cart_signed_in_calls_api_and_returns() {
    let app = TestApp::spawn().await;
    app.login(SHOPPER_EMAIL).await;

    let response = app.post_form("/products/p-1/add-to-cart", &[]).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/products/p-1");
    assert!(app.api.was_called("POST /cart"));
}

#[tokio::test]
async fn test_failed_wishlist_removal_keeps_the_item() {
    let app = TestApp::spawn().await;
    {
        let mut state = app.api.state();
        state.wishlist = vec![product("p-1", "Linen Shirt", 100)];
        state.fail_wishlist_remove = true;
    }
    app.login(SHOPPER_EMAIL).await;

    let response = app.post_form("/wishlist/p-1/remove", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/wishlist");
    assert!(app.api.was_called("DELETE /wishlist/p-1"));

    let body = app.page("/wishlist").await;
    assert!(body.contains("Linen Shirt"), "item vanished after a refused removal");
    assert!(body.contains("Wishlist is temporarily locked"));
}

#[tokio::test]
async fn test_checkout_summary_adds_flat_shipping() {
    let app = TestApp::spawn().await;
    app.api.state().cart = Some(cart(&[("p-1", "Linen Shirt", 100, 2)]));
    app.login(SHOPPER_EMAIL).await;

    let body = app.page("/checkout").await;

    assert!(body.contains("EGP 200.00"), "subtotal missing");
    assert!(body.contains("EGP 50.00"), "shipping missing");
    assert!(body.contains("EGP 250.00"), "total missing");
}

#[tokio::test]
async fn test_checkout_with_empty_cart_returns_to_cart() {
    let app = TestApp::spawn().await;
    app.login(SHOPPER_EMAIL).await;

    let response = app.get("/checkout").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/cart");
}

#[tokio::test]
async fn test_home_page_fills_both_product_strips() {
    let app = TestApp::spawn().await;
    app.api.state().products = vec![product("p-1", "Linen Shirt", 100)];

    let body = app.page("/").await;

    assert!(body.contains("Best sellers"));
    assert!(body.contains("New arrivals"));
    assert!(body.contains("Linen Shirt"));
    let product_calls = app
        .api
        .calls()
        .iter()
        .filter(|c| c.as_str() == "GET /products")
        .count();
    assert_eq!(product_calls, 2);
}
