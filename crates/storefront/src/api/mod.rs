//! Commerce REST API client.
//!
//! # Architecture
//!
//! - The API is the source of truth for users, catalog, carts and orders.
//!   Nothing is persisted locally except the session.
//! - Every resource module (`auth`, `catalog`, `cart`, ...) adds methods to
//!   [`ApiClient`]; they all funnel through [`ApiClient::send`].
//! - Categories, brands and product details are cached via `moka`
//!   (5 minute TTL). Admin writes invalidate the cache.
//!
//! # Wire format
//!
//! Successful responses use the envelope
//! `{ data, results?, paginationResult?, token?, numOfCartItems? }`.
//! Failures carry `{ message }` (or a validator's `{ errors: [{ msg }] }`).
//!
//! # Example
//!
//! ```rust,ignore
//! let api = ApiClient::new(&config.api)?;
//! let page = api.list_products(&ProductQuery::default()).await?;
//! let cart = api.get_cart(&user.token).await?;
//! ```

mod cache;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod catalog;
pub mod orders;
pub mod reviews;
pub mod types;
pub mod users;
pub mod wishlist;

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use reqwest::{Method, RequestBuilder, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use thiserror::Error;
use tracing::{debug, instrument};

use crate::config::ApiConfig;

pub use cache::{CacheKey, CacheValue};
pub use types::*;

/// Toast text used when the API gave no usable message.
pub const GENERIC_ERROR_MESSAGE: &str = "Something went wrong. Please try again.";

/// Catalog cache lifetime.
const CACHE_TTL: Duration = Duration::from_secs(300);

/// Errors that can occur when calling the commerce API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// Transport failure (connection refused, timeout, TLS, ...).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-success status.
    #[error("API returned {status}: {}", .message.as_deref().unwrap_or("(no message)"))]
    Status {
        status: StatusCode,
        message: Option<String>,
    },

    /// Missing or expired bearer token.
    #[error("Unauthorized: {}", .0.as_deref().unwrap_or("(no message)"))]
    Unauthorized(Option<String>),

    /// Resource not found.
    #[error("Not found: {}", .0.as_deref().unwrap_or("(no message)"))]
    NotFound(Option<String>),

    /// Rate limited by the API.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
}

impl ApiError {
    /// Best-effort text for a toast: the API's own message when it sent one,
    /// otherwise [`GENERIC_ERROR_MESSAGE`].
    #[must_use]
    pub fn user_message(&self) -> String {
        let message = match self {
            Self::Status { message, .. } | Self::Unauthorized(message) | Self::NotFound(message) => {
                message.as_deref()
            }
            Self::RateLimited(_) => Some("Too many requests. Please wait a moment and try again."),
            Self::Http(_) | Self::Parse(_) => None,
        };
        message
            .map(str::trim)
            .filter(|m| !m.is_empty())
            .map_or_else(|| GENERIC_ERROR_MESSAGE.to_string(), str::to_string)
    }

    /// Whether the API rejected the bearer token.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the resource does not exist.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Failure body shapes the API is known to produce.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    #[serde(default)]
    errors: Vec<FieldError>,
}

#[derive(Debug, Deserialize)]
struct FieldError {
    msg: Option<String>,
}

/// Pull a human message out of a failure body, if there is one.
fn extract_message(body: &str) -> Option<String> {
    let parsed: ErrorBody = serde_json::from_str(body).ok()?;
    parsed
        .message
        .filter(|m| !m.trim().is_empty())
        .or_else(|| parsed.errors.into_iter().find_map(|e| e.msg))
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the commerce REST API.
///
/// Cheap to clone; the connection pool and cache are shared.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: String,
    cache: Cache<CacheKey, CacheValue>,
}

impl ApiClient {
    /// Create a new API client.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(CACHE_TTL)
            .build();

        let mut builder = reqwest::Client::builder().user_agent(concat!(
            env!("CARGO_PKG_NAME"),
            "/",
            env!("CARGO_PKG_VERSION")
        ));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client: builder.build()?,
                base_url: config.base_url.trim_end_matches('/').to_string(),
                cache,
            }),
        })
    }

    /// The API root this client talks to.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.inner.base_url
    }

    /// Start a request against `path` (relative to the API root), attaching
    /// the bearer token when one is given.
    fn request(&self, method: Method, path: &str, token: Option<&str>) -> RequestBuilder {
        let url = format!("{}{path}", self.inner.base_url);
        let builder = self.inner.client.request(method, url);
        match token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    /// Send a request and decode the body as `T`.
    async fn send<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let response = request.send().await?;
        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get(reqwest::header::RETRY_AFTER)
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if !status.is_success() {
            let message = extract_message(&body);
            debug!(status = %status, message = ?message, "API returned non-success status");
            return Err(match status {
                StatusCode::UNAUTHORIZED => ApiError::Unauthorized(message),
                StatusCode::NOT_FOUND => ApiError::NotFound(message),
                _ => {
                    if status.is_server_error() {
                        tracing::error!(
                            status = %status,
                            body = %body.chars().take(500).collect::<String>(),
                            "API server error"
                        );
                    }
                    ApiError::Status { status, message }
                }
            });
        }

        // DELETE endpoints answer 204 with an empty body.
        let body = if body.trim().is_empty() { "null" } else { body.as_str() };

        serde_json::from_str(body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }

    /// Send a request whose response body is irrelevant.
    async fn send_unit(&self, request: RequestBuilder) -> Result<(), ApiError> {
        let _: serde::de::IgnoredAny = self.send(request).await?;
        Ok(())
    }

    /// Send a request and unwrap the `data` field of the envelope.
    async fn send_data<T: DeserializeOwned>(&self, request: RequestBuilder) -> Result<T, ApiError> {
        let envelope: Envelope<T> = self.send(request).await?;
        Ok(envelope.data)
    }

    /// Send a request and unwrap a paginated list envelope.
    async fn send_page<T: DeserializeOwned>(
        &self,
        request: RequestBuilder,
    ) -> Result<Page<T>, ApiError> {
        let envelope: Envelope<Vec<T>> = self.send(request).await?;
        Ok(Page::from_envelope(envelope))
    }

    // =========================================================================
    // Cache
    // =========================================================================

    async fn cached(&self, key: &CacheKey) -> Option<CacheValue> {
        let hit = self.inner.cache.get(key).await;
        if hit.is_some() {
            debug!(key = ?key, "Cache hit");
        }
        hit
    }

    async fn cache_insert(&self, key: CacheKey, value: CacheValue) {
        self.inner.cache.insert(key, value).await;
    }

    /// Drop every cached catalog entry. Called after admin writes.
    #[instrument(skip(self))]
    pub fn invalidate_catalog(&self) {
        self.inner.cache.invalidate_all();
        debug!("Catalog cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefers_api_message() {
        let err = ApiError::Status {
            status: StatusCode::BAD_REQUEST,
            message: Some("Coupon is invalid or expired".to_string()),
        };
        assert_eq!(err.user_message(), "Coupon is invalid or expired");
    }

    #[test]
    fn test_user_message_falls_back_to_generic() {
        let err = ApiError::Status {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: None,
        };
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let err = ApiError::NotFound(Some("   ".to_string()));
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);

        let err = ApiError::Parse(serde_json::from_str::<u8>("x").unwrap_err());
        assert_eq!(err.user_message(), GENERIC_ERROR_MESSAGE);
    }

    #[test]
    fn test_extract_message() {
        assert_eq!(
            extract_message(r#"{"status":"fail","message":"Incorrect email or password"}"#),
            Some("Incorrect email or password".to_string())
        );
        assert_eq!(
            extract_message(r#"{"errors":[{"msg":"E-mail already in use","path":"email"}]}"#),
            Some("E-mail already in use".to_string())
        );
        assert_eq!(extract_message("<html>Bad Gateway</html>"), None);
        assert_eq!(extract_message(r#"{"message":""}"#), None);
    }

    #[test]
    fn test_error_display() {
        let err = ApiError::Unauthorized(None);
        assert_eq!(err.to_string(), "Unauthorized: (no message)");
        assert!(err.is_unauthorized());
        assert!(ApiError::NotFound(None).is_not_found());
    }

    #[test]
    fn test_base_url_is_trimmed() {
        let client = ApiClient::new(&ApiConfig {
            base_url: "http://localhost:8000/api/v1/".to_string(),
            timeout: Some(Duration::from_secs(5)),
        })
        .unwrap();
        assert_eq!(client.base_url(), "http://localhost:8000/api/v1");
    }
}
