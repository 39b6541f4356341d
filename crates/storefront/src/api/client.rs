//! The HTTP client adapter.
//!
//! [`ApiClient`] is the only component that talks to the backend. It joins
//! relative paths to the configured base URL, attaches the default headers
//! and the bearer credential, normalizes every failure into [`ApiError`] and
//! logs it exactly once.

use std::sync::Arc;

use reqwest::header::{ACCEPT, AUTHORIZATION, HeaderMap, HeaderValue, USER_AGENT};
use reqwest::Method;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::instrument;
use url::Url;

use crate::config::StorefrontConfig;

use super::error::ApiError;
use super::transport::{ApiRequest, HttpTransport, RawResponse, RequestBody, Transport};

/// Source of the bearer credential attached to outgoing requests.
///
/// Implemented by the session container; the adapter never stores
/// credentials itself.
pub trait CredentialProvider: Send + Sync {
    /// The access token to send, if a session exists.
    fn bearer_token(&self) -> Option<String>;

    /// Called when the backend answered 401 to a request that carried a
    /// token from this provider.
    fn credentials_rejected(&self);
}

/// Koshimart REST API client.
///
/// Cheaply cloneable; all clones share the transport and configuration.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    transport: Arc<dyn Transport>,
    base_url: Url,
    default_headers: HeaderMap,
    credentials: Option<Arc<dyn CredentialProvider>>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .field("has_credentials", &self.inner.credentials.is_some())
            .finish_non_exhaustive()
    }
}

impl ApiClient {
    /// Create a client that sends requests over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP transport cannot be created or the
    /// configured user agent is not a valid header value.
    pub fn new(
        config: &StorefrontConfig,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Self, ApiError> {
        Self::with_transport(config, Arc::new(HttpTransport::new()?), credentials)
    }

    /// Create a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] if the configured user agent is not
    /// a valid header value.
    pub fn with_transport(
        config: &StorefrontConfig,
        transport: Arc<dyn Transport>,
        credentials: Option<Arc<dyn CredentialProvider>>,
    ) -> Result<Self, ApiError> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        default_headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&config.user_agent)
                .map_err(|e| ApiError::InvalidInput(format!("invalid user agent: {e}")))?,
        );

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                transport,
                base_url: config.api_base_url.clone(),
                default_headers,
                credentials,
            }),
        })
    }

    /// Base URL every path is joined to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Send a request and decode the JSON payload.
    ///
    /// `path` is relative to the base URL (a leading `/` is ignored). An empty
    /// success body decodes to [`Value::Null`].
    ///
    /// # Errors
    ///
    /// - [`ApiError::InvalidInput`] if `path` is absolute or cannot be joined
    /// - [`ApiError::Network`] if no response was received
    /// - [`ApiError::Http`] for non-success statuses
    /// - [`ApiError::Decode`] if a success body is not JSON
    #[instrument(skip(self, body), fields(method = %method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
    ) -> Result<Value, ApiError> {
        let token = self
            .inner
            .credentials
            .as_ref()
            .and_then(|provider| provider.bearer_token());

        let result = self.dispatch(method.clone(), path, body, token.as_deref()).await;

        if let Err(err) = &result {
            log_failure(&method, path, err);
            if err.is_unauthorized()
                && token.is_some()
                && let Some(provider) = &self.inner.credentials
            {
                provider.credentials_rejected();
            }
        }

        result
    }

    /// `GET` a path.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn get(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::GET, path, None).await
    }

    /// `POST` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`]; also [`ApiError::InvalidInput`] if `body`
    /// cannot be serialized.
    pub async fn post_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, ApiError> {
        let body = to_json_body(body)?;
        self.request(Method::POST, path, Some(body)).await
    }

    /// `PATCH` a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::post_json`].
    pub async fn patch_json<T: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &T,
    ) -> Result<Value, ApiError> {
        let body = to_json_body(body)?;
        self.request(Method::PATCH, path, Some(body)).await
    }

    /// `POST` a multipart form of text fields.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn post_multipart(
        &self,
        path: &str,
        fields: Vec<(String, String)>,
    ) -> Result<Value, ApiError> {
        self.request(Method::POST, path, Some(RequestBody::Multipart(fields)))
            .await
    }

    /// `DELETE` a path.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete(&self, path: &str) -> Result<Value, ApiError> {
        self.request(Method::DELETE, path, None).await
    }

    async fn dispatch(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        token: Option<&str>,
    ) -> Result<Value, ApiError> {
        let url = self.url_for(path)?;

        let mut headers = self.inner.default_headers.clone();
        if let Some(token) = token {
            match HeaderValue::from_str(&format!("Bearer {token}")) {
                Ok(mut value) => {
                    value.set_sensitive(true);
                    headers.insert(AUTHORIZATION, value);
                }
                Err(_) => tracing::warn!("Session token is not a valid header value, sending anonymously"),
            }
        }

        let response = self
            .inner
            .transport
            .send(ApiRequest {
                method,
                url,
                headers,
                body,
            })
            .await?;

        decode_response(response)
    }

    /// Join a relative path to the base URL.
    fn url_for(&self, path: &str) -> Result<Url, ApiError> {
        let relative = path.trim_start_matches('/');
        if relative.starts_with("//") || relative.contains("://") {
            return Err(ApiError::InvalidInput(format!(
                "API paths must be relative, got {path:?}"
            )));
        }
        self.inner
            .base_url
            .join(relative)
            .map_err(|e| ApiError::InvalidInput(format!("invalid API path {path:?}: {e}")))
    }
}

fn to_json_body<T: Serialize + ?Sized>(body: &T) -> Result<RequestBody, ApiError> {
    serde_json::to_value(body)
        .map(RequestBody::Json)
        .map_err(|e| ApiError::InvalidInput(format!("request body is not serializable: {e}")))
}

/// Decode a JSON payload into a typed model.
///
/// The request that produced `value` succeeded and logged nothing, so a
/// payload of the wrong shape gets its single log entry here.
pub(super) fn decode<T: DeserializeOwned>(value: Value) -> Result<T, ApiError> {
    serde_json::from_value(value).map_err(|e| {
        let err = ApiError::Decode(e.to_string());
        tracing::error!(
            model = std::any::type_name::<T>(),
            error = %err,
            "API response has an unexpected shape"
        );
        err
    })
}

fn decode_response(response: RawResponse) -> Result<Value, ApiError> {
    if !response.status.is_success() {
        return Err(ApiError::from_response(
            response.status.as_u16(),
            &response.body,
        ));
    }

    if response.body.trim().is_empty() {
        return Ok(Value::Null);
    }

    serde_json::from_str(&response.body).map_err(|e| {
        ApiError::Decode(format!(
            "{e} (body starts with {:?})",
            response.body.chars().take(80).collect::<String>()
        ))
    })
}

/// The single log entry for a failed call.
fn log_failure(method: &Method, path: &str, err: &ApiError) {
    match err {
        ApiError::Http { status, message } if err.is_client_error() => {
            tracing::warn!(%method, path, status, message = %message, "API request rejected");
        }
        ApiError::Http { status, message } => {
            tracing::error!(%method, path, status, message = %message, "API request failed");
        }
        ApiError::InvalidInput(message) => {
            tracing::warn!(%method, path, message = %message, "API request not sent");
        }
        ApiError::Network(message) | ApiError::Decode(message) => {
            tracing::error!(%method, path, error = %err, detail = %message, "API request failed");
        }
    }
}
