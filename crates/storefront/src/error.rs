//! Unified error handling with Sentry integration.
//!
//! Provides the `AppError` type returned by view lifecycle hooks and user
//! actions. Nothing here is fatal: the navigator turns `Unauthorized` into a
//! redirect and reports everything else before rendering degraded data.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;

/// Application-level error type for the storefront.
#[derive(Debug, Error)]
pub enum AppError {
    /// Backend call failed.
    #[error("API error: {0}")]
    Api(ApiError),

    /// The backend rejected (or the guard found no) credentials while
    /// entering `path`.
    #[error("Unauthorized: {path}")]
    Unauthorized {
        /// Path being entered when the rejection happened.
        path: String,
    },

    /// Configuration could not be loaded.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A user-supplied value was missing or malformed.
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<ApiError> for AppError {
    fn from(err: ApiError) -> Self {
        match err {
            ApiError::InvalidInput(message) => Self::InvalidInput(message),
            other => Self::Api(other),
        }
    }
}

impl AppError {
    /// Classify an adapter error raised while entering `path`. A 401 becomes
    /// [`AppError::Unauthorized`] so it is never degraded away.
    #[must_use]
    pub fn from_api(err: ApiError, path: &str) -> Self {
        if err.is_unauthorized() {
            Self::Unauthorized {
                path: path.to_string(),
            }
        } else {
            err.into()
        }
    }

    /// Returns `true` if the error must send the user to the login page.
    #[must_use]
    pub const fn is_unauthorized(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    /// Capture server-side and transport failures to Sentry.
    ///
    /// Client errors (4xx, invalid input, unauthorized) are expected during
    /// normal browsing and only logged.
    pub fn report(&self) {
        let server_side = match self {
            Self::Api(err) => !err.is_client_error(),
            Self::Config(_) => true,
            Self::Unauthorized { .. } | Self::InvalidInput(_) => false,
        };

        if server_side {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "View error"
            );
        } else {
            tracing::debug!(error = %self, "View error");
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after a successful login to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
///
/// Call this on logout to stop associating errors with the user.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("navigation", "Entered view", Some(&[("path", "/detail/rice-cooker")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    if let Some(pairs) = data {
        for (key, value) in pairs {
            breadcrumb.data.insert(
                (*key).to_string(),
                serde_json::Value::String((*value).to_string()),
            );
        }
    }

    sentry::add_breadcrumb(breadcrumb);
}
