//! Domain models for storefront.
//!
//! Records from the commerce API live in [`crate::api::types`]; this module
//! only holds what the storefront keeps in the session.

pub mod session;

pub use session::CurrentUser;
pub use session::keys as session_keys;
