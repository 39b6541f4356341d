//! Storefront client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Optional
//! - `KOSHIMART_API_BASE_URL` - Backend API origin and prefix
//!   (default: `https://koshimart-api-6973a89b9858.herokuapp.com/api/v1/`)
//! - `KOSHIMART_USER_AGENT` - `User-Agent` sent with every request
//!   (default: `koshimart-storefront/<version>`)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use thiserror::Error;
use url::Url;

/// Default backend API base URL.
pub const DEFAULT_API_BASE_URL: &str = "https://koshimart-api-6973a89b9858.herokuapp.com/api/v1/";

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Storefront client configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Base URL every API path is joined to. Always ends with `/`.
    pub api_base_url: Url,
    /// `User-Agent` header value
    pub user_agent: String,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment (e.g. `production`, `staging`)
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Create a configuration for the given API base URL with defaults for
    /// everything else.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidEnvVar` if the URL cannot be parsed or is
    /// not `http`/`https`.
    pub fn new(api_base_url: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            api_base_url: parse_base_url("KOSHIMART_API_BASE_URL", api_base_url)?,
            user_agent: default_user_agent(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is present but invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let api_base_url = parse_base_url(
            "KOSHIMART_API_BASE_URL",
            &get_env_or_default("KOSHIMART_API_BASE_URL", DEFAULT_API_BASE_URL),
        )?;
        let user_agent = get_optional_env("KOSHIMART_USER_AGENT")
            .filter(|ua| !ua.trim().is_empty())
            .unwrap_or_else(default_user_agent);

        Ok(Self {
            api_base_url,
            user_agent,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

fn default_user_agent() -> String {
    format!("koshimart-storefront/{}", env!("CARGO_PKG_VERSION"))
}

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok()
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the API base URL, requiring `http`/`https` and a trailing slash so
/// that relative paths are joined under the prefix instead of replacing its
/// last segment.
fn parse_base_url(var_name: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url = Url::parse(raw.trim())
        .map_err(|e| ConfigError::InvalidEnvVar(var_name.to_string(), e.to_string()))?;

    if !matches!(url.scheme(), "http" | "https") {
        return Err(ConfigError::InvalidEnvVar(
            var_name.to_string(),
            format!("unsupported scheme '{}'", url.scheme()),
        ));
    }

    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}
