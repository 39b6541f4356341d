//! Newtype IDs for type-safe entity references.
//!
//! The backend keys products, users, vendors, reviews, coupons and
//! notifications by positive integers. Use the `define_id!` macro to create
//! wrappers that prevent accidentally mixing IDs from different entity types.

use thiserror::Error;

/// Error returned when a raw value cannot be used as an entity ID.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdError {
    /// The value was empty or a JavaScript-style placeholder (`undefined`, `null`).
    #[error("{kind} is missing")]
    Missing {
        /// Entity kind, e.g. `ProductId`.
        kind: &'static str,
    },
    /// The value is not a positive integer.
    #[error("{kind} must be a positive integer, got {value:?}")]
    Invalid {
        /// Entity kind, e.g. `ProductId`.
        kind: &'static str,
        /// The rejected input.
        value: String,
    },
}

/// Placeholder strings the browser client used to leak into URLs.
const MISSING_MARKERS: &[&str] = &["", "undefined", "null", "NaN"];

/// Parse a raw ID string, rejecting placeholders and non-positive values.
///
/// # Errors
///
/// Returns [`IdError::Missing`] for empty/placeholder input and
/// [`IdError::Invalid`] for anything that is not a positive `i32`.
pub fn parse_positive(kind: &'static str, raw: &str) -> Result<i32, IdError> {
    let trimmed = raw.trim();
    if MISSING_MARKERS.contains(&trimmed) {
        return Err(IdError::Missing { kind });
    }
    match trimmed.parse::<i32>() {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(IdError::Invalid {
            kind,
            value: trimmed.to_owned(),
        }),
    }
}

/// Macro to define a type-safe ID wrapper.
///
/// Creates a newtype wrapper around `i32` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Copy`, `PartialEq`, `Eq`, `Hash`
/// - Conversion methods: `new()`, `as_i32()`
/// - `FromStr` that rejects missing and non-positive values
/// - `From<i32>` and `Into<i32>` implementations
///
/// # Example
///
/// ```rust
/// # use koshimart_core::define_id;
/// define_id!(UserId);
/// define_id!(OrderItemId);
///
/// let user_id = UserId::new(1);
/// let item_id: OrderItemId = "7".parse().unwrap();
///
/// assert_eq!(item_id.as_i32(), 7);
/// assert!("undefined".parse::<UserId>().is_err());
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(i32);

        impl $name {
            /// Create a new ID from an i32 value.
            #[must_use]
            pub const fn new(id: i32) -> Self {
                Self(id)
            }

            /// Get the underlying i32 value.
            #[must_use]
            pub const fn as_i32(&self) -> i32 {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl ::core::str::FromStr for $name {
            type Err = $crate::types::id::IdError;

            fn from_str(s: &str) -> ::core::result::Result<Self, Self::Err> {
                $crate::types::id::parse_positive(stringify!($name), s).map(Self)
            }
        }

        impl From<i32> for $name {
            fn from(id: i32) -> Self {
                Self(id)
            }
        }

        impl From<$name> for i32 {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

// Define standard entity IDs
define_id!(UserId);
define_id!(VendorId);
define_id!(ProductId);
define_id!(ReviewId);
define_id!(CouponId);
define_id!(NotificationId);
define_id!(CartItemId);
