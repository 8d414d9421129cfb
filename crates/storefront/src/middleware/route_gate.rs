//! Cookie-presence gate for protected areas.
//!
//! Requests under [`PROTECTED_PREFIXES`] without a non-empty `token` cookie
//! are redirected to `/login?callbackUrl=...` before any handler runs. The
//! gate only checks presence; the session's user is authoritative.

use axum::{
    extract::Request,
    http::{HeaderMap, Method, header::COOKIE},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use tower_sessions::cookie::Cookie;

/// Cookie mirroring the API bearer token.
pub const TOKEN_COOKIE: &str = "token";

/// Path prefixes that require the token cookie.
pub const PROTECTED_PREFIXES: [&str; 4] = ["/profile", "/cart", "/checkout", "/admin"];

/// The protected prefix `path` falls under, if any.
#[must_use]
pub fn protected_prefix(path: &str) -> Option<&'static str> {
    PROTECTED_PREFIXES.into_iter().find(|prefix| {
        path.strip_prefix(prefix)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with('/'))
    })
}

/// Whether the request carries a non-empty `token` cookie.
#[must_use]
pub fn has_token_cookie(headers: &HeaderMap) -> bool {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(Cookie::split_parse)
        .filter_map(Result::ok)
        .any(|cookie| cookie.name() == TOKEN_COOKIE && !cookie.value().is_empty())
}

/// Where to send a visitor who must sign in first.
///
/// Page loads come back to the exact page. Form posts come back to the
/// section root, since replaying a POST target as a GET would 405.
#[must_use]
pub fn login_redirect_path(path: &str, path_and_query: &str, is_get: bool) -> String {
    let callback = if is_get {
        path_and_query
    } else {
        protected_prefix(path).unwrap_or("/")
    };
    format!("/login?callbackUrl={}", urlencoding::encode(callback))
}

/// Only same-site relative paths are valid login callbacks.
///
/// Browsers drop tabs and newlines while parsing a `Location`, so any
/// whitespace or control character could turn `/\t/host` into `//host`.
#[must_use]
pub fn safe_callback(callback: Option<&str>) -> Option<&str> {
    callback.filter(|c| {
        c.starts_with('/')
            && !c.starts_with("//")
            && !c.starts_with("/\\")
            && !c.contains("://")
            && !c.chars().any(|ch| ch.is_control() || ch.is_whitespace())
    })
}

/// Middleware that enforces the token cookie on protected prefixes.
pub async fn route_gate_middleware(request: Request, next: Next) -> Response {
    let path = request.uri().path();
    if protected_prefix(path).is_some() && !has_token_cookie(request.headers()) {
        let path_and_query = request
            .uri()
            .path_and_query()
            .map_or(path, |pq| pq.as_str());
        let location =
            login_redirect_path(path, path_and_query, request.method() == Method::GET);
        tracing::debug!(path = %path, "No token cookie, redirecting to login");
        return Redirect::to(&location).into_response();
    }
    next.run(request).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_protected_prefix_matches_whole_segments() {
        assert_eq!(protected_prefix("/cart"), Some("/cart"));
        assert_eq!(protected_prefix("/cart/items/1"), Some("/cart"));
        assert_eq!(protected_prefix("/admin/orders"), Some("/admin"));
        assert_eq!(protected_prefix("/profile"), Some("/profile"));
        assert_eq!(protected_prefix("/cartography"), None);
        assert_eq!(protected_prefix("/products/1/add-to-cart"), None);
        assert_eq!(protected_prefix("/"), None);
    }

    #[test]
    fn test_token_cookie_detection() {
        let mut headers = HeaderMap::new();
        assert!(!has_token_cookie(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("atelier_session=abc; token="));
        assert!(!has_token_cookie(&headers));

        headers.insert(COOKIE, HeaderValue::from_static("atelier_session=abc; token=eyJ"));
        assert!(has_token_cookie(&headers));
    }

    #[test]
    fn test_login_redirect_path() {
        assert_eq!(
            login_redirect_path("/checkout", "/checkout?step=2", true),
            "/login?callbackUrl=%2Fcheckout%3Fstep%3D2"
        );
        assert_eq!(
            login_redirect_path("/cart/items/9", "/cart/items/9", false),
            "/login?callbackUrl=%2Fcart"
        );
    }

    #[test]
    fn test_safe_callback_rejects_off_site_targets() {
        assert_eq!(safe_callback(Some("/products/42")), Some("/products/42"));
        assert_eq!(safe_callback(Some("//evil.example")), None);
        assert_eq!(safe_callback(Some("/\\evil.example")), None);
        assert_eq!(safe_callback(Some("https://evil.example")), None);
        assert_eq!(safe_callback(Some("profile")), None);
        assert_eq!(safe_callback(None), None);
    }

    #[test]
    fn test_safe_callback_rejects_whitespace_smuggled_hosts() {
        assert_eq!(safe_callback(Some("/\t/evil.example")), None);
        assert_eq!(safe_callback(Some("/\n/evil.example")), None);
        assert_eq!(safe_callback(Some("/\r\n/evil.example")), None);
        assert_eq!(safe_callback(Some("/ /evil.example")), None);
        assert_eq!(
            safe_callback(Some("/shop?keyword=linen%20shirt")),
            Some("/shop?keyword=linen%20shirt")
        );
    }
}
