//! Core types for Koshimart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod cart;
pub mod email;
pub mod id;
pub mod identifier;
pub mod session;

pub use cart::CartCount;
pub use email::{Email, EmailError};
pub use id::*;
pub use identifier::{CartId, IdentifierError, OrderOid, Slug};
pub use session::{Session, SessionError, TokenClaims};
