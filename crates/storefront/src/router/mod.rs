//! Path resolution and the route guard.
//!
//! # Navigation states
//!
//! ```text
//! Unresolved -> Resolving -> Authorized   -> Rendering
//!                         -> Unauthorized -> Redirecting
//! ```
//!
//! `Authorized -> Unauthorized` also happens when the backend answers 401
//! while the view loads.
//!
//! [`resolve`] never fails: unmatched paths map to [`ViewId::NotFound`].
//! [`authorize`] is a pure predicate over the session container; it reads
//! the session and nothing else, so repeated calls without an intervening
//! session change agree.

mod pattern;
mod table;

pub use pattern::{Params, normalize, query_param};
pub use table::{LOGIN_PATH, ROUTES, Route, ViewId};

use crate::state::AppState;

/// Result of resolving a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteMatch {
    /// View to render.
    pub view: ViewId,
    /// Pattern that matched (`*` for the not-found fallback).
    pub pattern: &'static str,
    /// Whether the guard applies.
    pub guarded: bool,
    /// Captured `:name` parameters.
    pub params: Params,
    /// The path as requested, query string included.
    pub path: String,
}

impl RouteMatch {
    /// Captured parameter by name.
    #[must_use]
    pub fn param(&self, name: &str) -> Option<&str> {
        self.params.get(name)
    }

    /// Query-string parameter by name.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        query_param(&self.path, name)
    }
}

/// Guard decision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    /// Render the requested view.
    Allow,
    /// Navigate to the target instead; the requested path is dropped.
    Redirect(&'static str),
}

/// Per-navigation state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavState {
    Unresolved,
    Resolving,
    Authorized,
    Unauthorized,
    Rendering,
    Redirecting,
}

impl NavState {
    /// `Rendering` and `Redirecting` end a navigation.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Rendering | Self::Redirecting)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_advance_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Unresolved, Self::Resolving)
                | (Self::Resolving, Self::Authorized | Self::Unauthorized)
                | (Self::Authorized, Self::Rendering | Self::Unauthorized)
                | (Self::Unauthorized, Self::Redirecting)
        )
    }
}

/// Map a path to its route. Unmatched paths resolve to
/// [`ViewId::NotFound`].
#[must_use]
pub fn resolve(path: &str) -> RouteMatch {
    let segments = pattern::segments(path);

    ROUTES
        .iter()
        .find_map(|route| {
            pattern::match_pattern(route.pattern, &segments).map(|params| RouteMatch {
                view: route.view,
                pattern: route.pattern,
                guarded: route.guarded,
                params,
                path: path.to_string(),
            })
        })
        .unwrap_or_else(|| RouteMatch {
            view: ViewId::NotFound,
            pattern: "*",
            guarded: false,
            params: Params::default(),
            path: path.to_string(),
        })
}

/// Guard check for a resolved route.
#[must_use]
pub fn authorize_match(route: &RouteMatch, state: &AppState) -> Authorization {
    if !route.guarded || state.is_signed_in() {
        Authorization::Allow
    } else {
        Authorization::Redirect(LOGIN_PATH)
    }
}

/// Guard check for a path. Unguarded paths are always allowed.
#[must_use]
pub fn authorize(path: &str, state: &AppState) -> Authorization {
    authorize_match(&resolve(path), state)
}
