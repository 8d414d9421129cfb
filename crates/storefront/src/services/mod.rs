//! Per-request context services.
//!
//! Each service wraps one API resource for the signed-in user and keeps the
//! user's copy of that resource in the session. Mutations call the API
//! first and then replace the cached copy with the server's snapshot;
//! wishlist removal is the one optimistic exception.
//!
//! # Services
//!
//! - [`auth`] - Login, signup, logout, password reset, profile
//! - [`cart`] - Cart snapshot and mutations
//! - [`wishlist`] - Wishlist with optimistic removal
//! - [`addresses`] - Saved addresses
//! - [`orders`] - Order history and cancellation
//! - [`checkout`] - Multi-step checkout and order placement
//! - [`flash`] - Toast notifications

pub mod addresses;
pub mod auth;
pub mod cart;
pub mod checkout;
pub mod flash;
pub mod orders;
pub mod wishlist;

mod error;

pub use error::ServiceError;

/// Result alias for service calls.
pub type ServiceResult<T> = Result<T, ServiceError>;
