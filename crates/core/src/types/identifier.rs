//! String identifiers used in URLs and request bodies.
//!
//! Products are addressed by slug, orders by their public `oid`, and the
//! anonymous cart by a random client-generated id.

use core::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors that can occur when parsing a string identifier.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentifierError {
    /// The value was empty or a placeholder (`undefined`, `null`).
    #[error("{kind} is missing")]
    Missing {
        /// Identifier kind, e.g. `Slug`.
        kind: &'static str,
    },
    /// The value contains characters that cannot appear in a path segment.
    #[error("{kind} contains invalid characters: {value:?}")]
    InvalidCharacters {
        /// Identifier kind, e.g. `Slug`.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

fn validate(kind: &'static str, raw: &str) -> Result<String, IdentifierError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() || trimmed == "undefined" || trimmed == "null" {
        return Err(IdentifierError::Missing { kind });
    }
    if !trimmed
        .chars()
        .all(|c| c.is_alphanumeric() || c == '-' || c == '_')
    {
        return Err(IdentifierError::InvalidCharacters {
            kind,
            value: trimmed.to_owned(),
        });
    }
    Ok(trimmed.to_owned())
}

macro_rules! define_identifier {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Parse and validate the identifier.
            ///
            /// # Errors
            ///
            /// Returns an error if the value is missing or contains
            /// characters other than alphanumerics, `-` and `_`.
            pub fn parse(raw: &str) -> Result<Self, IdentifierError> {
                validate(stringify!($name), raw).map(Self)
            }

            /// Returns the identifier as a string slice.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl core::str::FromStr for $name {
            type Err = IdentifierError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Self::parse(s)
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }
    };
}

define_identifier!(
    /// URL slug of a product (e.g. `organic-green-tea`).
    Slug
);

define_identifier!(
    /// Public order identifier (`oid`) shown to customers and vendors.
    OrderOid
);

define_identifier!(
    /// Anonymous cart identifier.
    ///
    /// The backend groups cart lines by this id; it is created by the client
    /// once per browsing session.
    CartId
);

impl CartId {
    /// Generate a fresh random cart id.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().simple().to_string())
    }
}
