//! In-memory transport and fixtures for unit tests.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use futures::future::BoxFuture;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use reqwest::{Method, StatusCode};
use tokio::sync::Notify;

use crate::api::{ApiError, ApiRequest, RawResponse, Transport};
use crate::config::StorefrontConfig;

pub const BASE_URL: &str = "http://backend.test/api/v1/";

pub fn test_config() -> StorefrontConfig {
    StorefrontConfig::new(BASE_URL).expect("test base url")
}

#[derive(Clone)]
enum Canned {
    Response(StatusCode, String),
    Failure(String),
}

/// Records every request and replays canned responses keyed by the path
/// relative to [`BASE_URL`]. Unknown paths answer 404.
#[derive(Default)]
pub struct RecordingTransport {
    canned: Mutex<HashMap<(Option<Method>, String), Canned>>,
    requests: Mutex<Vec<ApiRequest>>,
    gates: Mutex<HashMap<String, Arc<Notify>>>,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer any method on `path`.
    pub fn respond(&self, path: &str, status: StatusCode, body: &str) {
        self.insert(None, path, Canned::Response(status, body.to_string()));
    }

    /// Answer only `method` on `path`.
    pub fn respond_to(&self, method: Method, path: &str, status: StatusCode, body: &str) {
        self.insert(Some(method), path, Canned::Response(status, body.to_string()));
    }

    /// Fail `path` as if the server were unreachable.
    pub fn fail(&self, path: &str, message: &str) {
        self.insert(None, path, Canned::Failure(message.to_string()));
    }

    /// Hold responses for `path` until the returned gate is notified.
    pub fn gate(&self, path: &str) -> Arc<Notify> {
        let gate = Arc::new(Notify::new());
        self.gates
            .lock()
            .expect("gates lock")
            .insert(path.to_string(), gate.clone());
        gate
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests.lock().expect("requests lock").clone()
    }

    /// Relative paths (with query) of every request, in order.
    pub fn paths(&self) -> Vec<String> {
        self.requests().iter().map(relative_path).collect()
    }

    fn insert(&self, method: Option<Method>, path: &str, canned: Canned) {
        self.canned
            .lock()
            .expect("canned lock")
            .insert((method, path.to_string()), canned);
    }

    fn lookup(&self, method: &Method, path: &str) -> Option<Canned> {
        let canned = self.canned.lock().expect("canned lock");
        canned
            .get(&(Some(method.clone()), path.to_string()))
            .or_else(|| canned.get(&(None, path.to_string())))
            .cloned()
    }
}

fn relative_path(request: &ApiRequest) -> String {
    let url = request.url.as_str();
    url.strip_prefix(BASE_URL).unwrap_or(url).to_string()
}

impl Transport for RecordingTransport {
    fn send(&self, request: ApiRequest) -> BoxFuture<'_, Result<RawResponse, ApiError>> {
        Box::pin(async move {
            let path = relative_path(&request);
            let method = request.method.clone();
            self.requests.lock().expect("requests lock").push(request);

            let gate = self.gates.lock().expect("gates lock").get(&path).cloned();
            if let Some(gate) = gate {
                gate.notified().await;
            }

            match self.lookup(&method, &path) {
                Some(Canned::Response(status, body)) => Ok(RawResponse { status, body }),
                Some(Canned::Failure(message)) => Err(ApiError::Network(message)),
                None => Ok(RawResponse {
                    status: StatusCode::NOT_FOUND,
                    body: r#"{"detail":"Not found."}"#.to_string(),
                }),
            }
        })
    }
}

/// Build an unsigned JWT carrying the given claims.
pub fn jwt(claims: &serde_json::Value) -> String {
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;

    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.sig")
}

/// Captures log events as JSON lines for the current thread.
#[derive(Clone, Default)]
pub struct LogCapture {
    buffer: Arc<Mutex<Vec<u8>>>,
}

impl LogCapture {
    /// Route this thread's events into the capture until the guard drops.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::registry().with(
            tracing_subscriber::fmt::layer()
                .json()
                .flatten_event(true)
                .with_writer(self.clone()),
        );
        tracing::subscriber::set_default(subscriber)
    }

    pub fn events(&self) -> Vec<serde_json::Value> {
        let buffer = self.buffer.lock().expect("log lock");
        String::from_utf8_lossy(&buffer)
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    /// Events at `WARN` or `ERROR`.
    pub fn problems(&self) -> Vec<serde_json::Value> {
        self.events()
            .into_iter()
            .filter(|event| matches!(event["level"].as_str(), Some("WARN" | "ERROR")))
            .collect()
    }
}

impl std::io::Write for LogCapture {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.buffer.lock().expect("log lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogCapture {
    type Writer = Self;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
