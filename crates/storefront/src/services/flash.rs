//! Toast notifications carried across a redirect.
//!
//! Handlers push a [`Flash`] into the session; the next rendered page drains
//! them into the toast area.

use serde::{Deserialize, Serialize};
use tower_sessions::Session;

use crate::api::ApiError;
use crate::models::session_keys;

/// Toast severity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlashKind {
    Success,
    Error,
    Info,
}

impl FlashKind {
    /// CSS modifier for the toast.
    #[must_use]
    pub const fn css_class(self) -> &'static str {
        match self {
            Self::Success => "toast-success",
            Self::Error => "toast-error",
            Self::Info => "toast-info",
        }
    }
}

/// A single toast.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

/// Queue a toast.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn push(
    session: &Session,
    kind: FlashKind,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    let mut pending: Vec<Flash> = session
        .get(session_keys::FLASH)
        .await?
        .unwrap_or_default();
    pending.push(Flash {
        kind,
        message: message.into(),
    });
    session.insert(session_keys::FLASH, pending).await
}

/// Queue a success toast.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn success(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashKind::Success, message).await
}

/// Queue an error toast.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn error(
    session: &Session,
    message: impl Into<String>,
) -> Result<(), tower_sessions::session::Error> {
    push(session, FlashKind::Error, message).await
}

/// Queue an error toast for a failed API call, using its best-effort message.
///
/// # Errors
///
/// Returns an error if the session cannot be modified.
pub async fn api_error(
    session: &Session,
    err: &ApiError,
) -> Result<(), tower_sessions::session::Error> {
    tracing::warn!(error = %err, "API call failed");
    error(session, err.user_message()).await
}

/// Take every pending toast.
///
/// # Errors
///
/// Returns an error if the session cannot be read.
pub async fn drain(session: &Session) -> Result<Vec<Flash>, tower_sessions::session::Error> {
    Ok(session
        .remove::<Vec<Flash>>(session_keys::FLASH)
        .await?
        .unwrap_or_default())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use tower_sessions::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session::new(None, Arc::new(MemoryStore::default()), None)
    }

    #[tokio::test]
    async fn test_flashes_drain_in_order() {
        let session = session();
        success(&session, "Added to cart").await.unwrap();
        error(&session, "Coupon expired").await.unwrap();

        let flashes = drain(&session).await.unwrap();
        assert_eq!(flashes.len(), 2);
        assert_eq!(flashes[0].kind, FlashKind::Success);
        assert_eq!(flashes[1].message, "Coupon expired");

        assert!(drain(&session).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_api_error_uses_best_effort_message() {
        let session = session();
        api_error(&session, &ApiError::NotFound(None)).await.unwrap();
        let flashes = drain(&session).await.unwrap();
        assert_eq!(flashes[0].message, crate::api::GENERIC_ERROR_MESSAGE);
    }
}
