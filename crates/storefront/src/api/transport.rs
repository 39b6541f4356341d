//! Outbound HTTP transport.
//!
//! The adapter builds a fully-formed [`ApiRequest`] and hands it to a
//! [`Transport`]. Production code uses [`HttpTransport`] (`reqwest`); tests
//! substitute an in-memory transport.

use futures::future::BoxFuture;
use reqwest::header::HeaderMap;
use reqwest::{Method, StatusCode};
use serde_json::Value;
use url::Url;

use super::error::ApiError;

/// Request body, serialized as the matching content type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RequestBody {
    /// `application/json`
    Json(Value),
    /// `multipart/form-data` with text fields only.
    Multipart(Vec<(String, String)>),
}

/// A request ready to be sent.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Absolute URL (base URL joined with the relative path).
    pub url: Url,
    /// Default headers plus per-request credentials.
    pub headers: HeaderMap,
    /// Optional body.
    pub body: Option<RequestBody>,
}

/// Status and body text of a response that reached the client.
#[derive(Debug, Clone)]
pub struct RawResponse {
    /// HTTP status.
    pub status: StatusCode,
    /// Response body as text.
    pub body: String,
}

/// Sends requests to the backend.
///
/// Implementations only report failures where no response was received
/// (as [`ApiError::Network`]); status handling and decoding happen in the
/// adapter.
pub trait Transport: Send + Sync {
    /// Send a request and return the raw response.
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>>;
}

/// `reqwest`-backed transport.
///
/// Uses the transport's default timeouts; the adapter adds no retry or
/// timeout policy of its own.
#[derive(Clone, Debug)]
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    /// Create a new transport.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Network`] if the TLS backend cannot be initialized.
    pub fn new() -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| ApiError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client })
    }

    async fn execute(&self, request: ApiRequest) -> Result<RawResponse, ApiError> {
        let mut builder = self
            .client
            .request(request.method, request.url)
            .headers(request.headers);

        builder = match request.body {
            Some(RequestBody::Json(value)) => builder.json(&value),
            Some(RequestBody::Multipart(fields)) => {
                let form = fields
                    .into_iter()
                    .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                        form.text(name, value)
                    });
                builder.multipart(form)
            }
            None => builder,
        };

        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::Network(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ApiError::Network(format!("failed to read response body: {e}")))?;

        Ok(RawResponse { status, body })
    }
}

impl Transport for HttpTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>> {
        Box::pin(self.execute(request))
    }
}
