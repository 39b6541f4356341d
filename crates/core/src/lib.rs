//! Koshimart Core - Shared types library.
//!
//! This crate provides the domain types used by the Koshimart client crates:
//! - `storefront` - HTTP adapter, session/cart container, router and views
//! - `cli` - Command-line shell for browsing the storefront
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no global
//! state. The backend owns every business rule; these types only make sure
//! identifiers and credentials are well-formed before a request is issued.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, identifiers, emails, sessions and
//!   the cart count

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
