//! Sign-in, sign-up and the cookie gate.

#![allow(clippy::unwrap_used)]

use atelier_integration_tests::{ADMIN_EMAIL, SHOPPER_EMAIL, TestApp, location};
use reqwest::StatusCode;

#[tokio::test]
async fn test_signup_with_mismatched_passwords_never_reaches_api() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/signup",
            &[
                ("name", "Mona Adel"),
                ("email", "new@example.com"),
                ("phone", "01012345678"),
                ("password", "Secret123!"),
                ("password_confirm", "Secret124!"),
            ],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("form-error"), "no inline error shown");
    assert!(body.contains("match"));
    assert!(body.contains("new@example.com"), "email not kept in the form");
    assert!(!app.api.was_called("POST /auth/signup"));
}

#[tokio::test]
async fn test_wrong_password_shows_api_message_inline() {
    let app = TestApp::spawn().await;

    let response = app
        .post_form(
            "/login",
            &[("email", SHOPPER_EMAIL), ("password", "not-it")],
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Incorrect email or password"));
    assert!(app.api.was_called("POST /auth/login"));
}

#[tokio::test]
async fn test_login_lands_by_role_and_honours_callback() {
    let app = TestApp::spawn().await;
    let response = app.login(ADMIN_EMAIL).await;
    assert_eq!(location(&response), "/admin");

    let shopper = TestApp::spawn().await;
    let response = shopper
        .post_form(
            "/login",
            &[
                ("email", SHOPPER_EMAIL),
                ("password", atelier_integration_tests::PASSWORD),
                ("callbackUrl", "/cart"),
            ],
        )
        .await;
    assert_eq!(location(&response), "/cart");
    assert!(shopper.api.was_called("GET /cart"));
    assert!(shopper.api.was_called("GET /wishlist"));
}

#[tokio::test]
async fn test_login_ignores_callback_with_embedded_tab() {
    let app = TestApp::spawn().await;
    let response = app
        .post_form(
            "/login",
            &[
                ("email", SHOPPER_EMAIL),
                ("password", atelier_integration_tests::PASSWORD),
                ("callbackUrl", "/\t/evil.example"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/");
}

#[tokio::test]
async fn test_gate_redirects_without_token_cookie() {
    let app = TestApp::spawn().await;

    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?callbackUrl=%2Fcart");

    let response = app.get("/admin/orders?status=pending").await;
    assert_eq!(
        location(&response),
        "/login?callbackUrl=%2Fadmin%2Forders%3Fstatus%3Dpending"
    );

    let response = app.post_form("/checkout/place", &[]).await;
    assert_eq!(location(&response), "/login?callbackUrl=%2Fcheckout");

    assert!(app.api.calls().is_empty());
}

#[tokio::test]
async fn test_shopper_cannot_open_admin_console() {
    let app = TestApp::spawn().await;
    app.login(SHOPPER_EMAIL).await;

    let response = app.get("/admin").await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_logout_clears_token_cookie() {
    let app = TestApp::spawn().await;
    app.login(SHOPPER_EMAIL).await;
    assert_eq!(app.get("/cart").await.status(), StatusCode::OK);

    let response = app.post_form("/logout", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);

    let response = app.get("/cart").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login"));
}
