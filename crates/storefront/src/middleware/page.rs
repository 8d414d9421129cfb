//! Per-page layout data.
//!
//! Every full-page template renders the navbar, the toast area and inline
//! scripts. [`PageContext`] gathers what those need in one extractor so
//! handlers only deal with their own content.

use axum::{extract::FromRequestParts, http::request::Parts};
use tower_sessions::Session;

use super::auth::AuthRejection;
use super::csp::CspNonce;
use crate::models::{CurrentUser, session_keys};
use crate::services::cart::cached_item_count;
use crate::services::flash::{self, Flash};

/// Debounce for the navbar search suggestions, in milliseconds.
pub const SEARCH_DEBOUNCE_MS: u32 = 400;

/// Layout data shared by every full page.
#[derive(Debug, Clone, Default)]
pub struct PageContext {
    pub user: Option<CurrentUser>,
    /// Toasts queued by the previous request.
    pub flashes: Vec<Flash>,
    pub nonce: String,
    pub cart_count: u32,
    pub path: String,
    pub search_delay_ms: u32,
}

impl PageContext {
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.user.is_some()
    }

    #[must_use]
    pub fn is_admin(&self) -> bool {
        self.user.as_ref().is_some_and(CurrentUser::is_admin)
    }

    /// Whether a nav link should be marked active.
    #[must_use]
    pub fn is_active(&self, prefix: &str) -> bool {
        if prefix == "/" {
            self.path == "/"
        } else {
            self.path == prefix || self.path.starts_with(&format!("{prefix}/"))
        }
    }
}

impl<S> FromRequestParts<S> for PageContext
where
    S: Send + Sync,
{
    type Rejection = AuthRejection;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let session = parts
            .extensions
            .get::<Session>()
            .cloned()
            .ok_or(AuthRejection::MissingSession)?;
        let nonce = parts
            .extensions
            .get::<CspNonce>()
            .map(|n| n.value().to_owned())
            .unwrap_or_default();

        let user: Option<CurrentUser> = session
            .get(session_keys::CURRENT_USER)
            .await
            .ok()
            .flatten();
        let flashes = flash::drain(&session).await.unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Failed to drain flash messages");
            Vec::new()
        });
        let cart_count = if user.as_ref().is_some_and(CurrentUser::can_shop) {
            cached_item_count(&session).await.unwrap_or(0)
        } else {
            0
        };

        Ok(Self {
            user,
            flashes,
            nonce,
            cart_count,
            path: parts.uri.path().to_owned(),
            search_delay_ms: SEARCH_DEBOUNCE_MS,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_active_link_matching() {
        let page = PageContext {
            path: "/profile/orders".to_owned(),
            ..PageContext::default()
        };
        assert!(page.is_active("/profile"));
        assert!(!page.is_active("/"));
        assert!(!page.is_active("/prof"));
    }
}
