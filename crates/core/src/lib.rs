//! Atelier Core - Shared types and pure storefront rules.
//!
//! This crate provides the types used across Atelier components:
//! - `storefront` - Public shop and `/admin` console (axum, server-rendered)
//! - `integration-tests` - End-to-end tests against a fake commerce API
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no HTTP
//! clients, no sessions. Everything that decides *what* to show (checkout
//! totals, password strength, filter composition, form validation) lives here
//! so it can be unit tested without a running server.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, and statuses
//! - [`pricing`] - Checkout summary arithmetic
//! - [`password`] - Password strength scoring
//! - [`validation`] - Synchronous form validation
//! - [`catalog`] - Product listing filter composition

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod catalog;
pub mod password;
pub mod pricing;
pub mod types;
pub mod validation;

pub use types::*;
