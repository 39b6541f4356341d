//! Cart badge count.

use core::fmt;

use serde::{Deserialize, Serialize};

/// Number of items in the active cart, used only for display.
///
/// The authoritative cart contents live in the backend; this value is what
/// the navigation badge shows.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct CartCount(u32);

impl CartCount {
    /// An empty cart.
    pub const ZERO: Self = Self(0);

    /// Create a new count.
    #[must_use]
    pub const fn new(count: u32) -> Self {
        Self(count)
    }

    /// Count derived from the number of cart lines returned by the backend.
    #[must_use]
    pub fn from_lines(lines: usize) -> Self {
        Self(u32::try_from(lines).unwrap_or(u32::MAX))
    }

    /// Get the underlying value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }

    /// Returns `true` when the cart is empty.
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for CartCount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for CartCount {
    fn from(count: u32) -> Self {
        Self(count)
    }
}

impl From<CartCount> for u32 {
    fn from(count: CartCount) -> Self {
        count.0
    }
}
