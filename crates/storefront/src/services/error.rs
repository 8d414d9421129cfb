//! Service error type.

use atelier_core::validation::ValidationError;
use thiserror::Error;

use crate::api::{ApiError, GENERIC_ERROR_MESSAGE};
use crate::error::AppError;

/// Errors that can occur in a context service.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Form input failed synchronous validation. No API call was made.
    #[error("validation failed: {0}")]
    Validation(#[from] ValidationError),

    /// The commerce API rejected the call.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Session store operation failed.
    #[error("session error: {0}")]
    Session(#[from] tower_sessions::session::Error),

    /// The action is not allowed in the current state (e.g. checkout with an
    /// empty cart). The message is shown to the user as-is.
    #[error("{0}")]
    Rejected(&'static str),
}

impl ServiceError {
    /// Text for the toast or inline form error.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(err) => capitalize(&err.to_string()),
            Self::Api(err) => err.user_message(),
            Self::Rejected(message) => (*message).to_string(),
            Self::Session(_) => GENERIC_ERROR_MESSAGE.to_string(),
        }
    }

    /// Whether the failure is the visitor's to fix (bad input or an API
    /// refusal), as opposed to a server fault.
    #[must_use]
    pub const fn is_user_facing(&self) -> bool {
        !matches!(self, Self::Session(_))
    }
}

impl From<ServiceError> for AppError {
    fn from(err: ServiceError) -> Self {
        match err {
            ServiceError::Validation(e) => Self::BadRequest(capitalize(&e.to_string())),
            ServiceError::Api(e) => Self::Api(e),
            ServiceError::Session(e) => Self::Session(e),
            ServiceError::Rejected(msg) => Self::BadRequest(msg.to_string()),
        }
    }
}

/// Upper-case the first letter of a validation message for display.
fn capitalize(message: &str) -> String {
    let mut chars = message.chars();
    chars.next().map_or_else(String::new, |first| {
        first.to_uppercase().chain(chars).collect()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_message_is_capitalized() {
        let err = ServiceError::from(ValidationError::PasswordMismatch);
        assert_eq!(err.user_message(), "Passwords don't match");
        assert!(err.is_user_facing());
    }

    #[test]
    fn test_rejected_message_passes_through() {
        let err = ServiceError::Rejected("Your cart is empty");
        assert_eq!(err.user_message(), "Your cart is empty");
    }
}
