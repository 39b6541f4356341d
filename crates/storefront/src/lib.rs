//! Koshimart storefront client library.
//!
//! The client side of the Koshimart marketplace: a customer storefront and
//! a vendor console under `/admin`, driven by the Koshimart REST backend.
//!
//! - [`api`]: the HTTP adapter and the typed endpoint helpers
//! - [`state`]: the observable session/cart container
//! - [`router`]: path resolution and the route guard
//! - [`views`]: one view per route, plus the user actions
//! - [`app`]: the navigator tying them together

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod api;
pub mod app;
pub mod config;
pub mod error;
pub mod router;
pub mod state;
pub mod views;

#[cfg(test)]
mod testing;

pub use app::{App, NavigationOutcome};
