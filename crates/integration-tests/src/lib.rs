//! End-to-end tests for the Koshimart storefront client.
//!
//! [`MockBackend`] serves a small slice of the Koshimart REST API from an
//! in-process axum server on `127.0.0.1:0`. Tests point a real
//! [`koshimart_storefront::App`] (with the `reqwest` transport) at it.
//!
//! ```bash
//! cargo test -p koshimart-integration-tests
//! ```

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};

use axum::extract::{Multipart, Path, Request, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use koshimart_storefront::config::StorefrontConfig;
use serde_json::{Value, json};

/// Password the mock accepts for every account.
pub const PASSWORD: &str = "hunter22";

/// User id carried by the issued access token.
pub const USER_ID: i32 = 5;

/// A request as the backend saw it.
#[derive(Debug, Clone)]
pub struct Seen {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
    pub accept: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Default)]
struct Recorded {
    seen: Mutex<Vec<Seen>>,
    reviews: Mutex<Vec<Vec<(String, String)>>>,
    cart: Mutex<Vec<Value>>,
}

/// Running mock backend. The server stops when the value is dropped.
pub struct MockBackend {
    addr: SocketAddr,
    recorded: Arc<Recorded>,
    server: tokio::task::JoinHandle<()>,
}

impl Drop for MockBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

impl MockBackend {
    /// Bind an ephemeral port and start serving.
    ///
    /// # Panics
    ///
    /// Panics if the listener cannot be bound.
    pub async fn start() -> Self {
        let recorded = Arc::new(Recorded::default());
        let api = Router::new()
            .route("/category/", get(categories))
            .route("/products/", get(products))
            .route("/products/{slug}/", get(product))
            .route("/reviews/{product_id}/", get(reviews).post(create_review))
            .route("/user/token/", post(token))
            .route("/customer/orders/{user_id}/", get(customer_orders))
            .route("/cart-view/", post(add_to_cart))
            .route("/cart-list/{cart_id}/", get(cart_list))
            .route("/cart-list/{cart_id}/{user_id}/", get(cart_list_for_user))
            .route("/broken/", get(broken));
        let app = Router::new()
            .nest("/api/v1", api)
            .layer(middleware::from_fn_with_state(recorded.clone(), record))
            .with_state(recorded.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend address");
        let server = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            addr,
            recorded,
            server,
        }
    }

    /// Client configuration pointing at this backend.
    ///
    /// # Panics
    ///
    /// Never in practice; the URL is always well formed.
    #[must_use]
    pub fn config(&self) -> StorefrontConfig {
        StorefrontConfig::new(&format!("http://{}/api/v1/", self.addr)).expect("mock base url")
    }

    /// Every request received so far.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the log.
    #[must_use]
    pub fn seen(&self) -> Vec<Seen> {
        self.recorded.seen.lock().expect("seen lock").clone()
    }

    /// Fields of every review form received.
    ///
    /// # Panics
    ///
    /// Panics if a handler panicked while holding the log.
    #[must_use]
    pub fn reviews(&self) -> Vec<Vec<(String, String)>> {
        self.recorded.reviews.lock().expect("reviews lock").clone()
    }
}

/// Access token the mock issues and accepts.
#[must_use]
pub fn access_token() -> String {
    let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let claims = json!({
        "token_type": "access",
        "user_id": USER_ID,
        "vendor_id": 0,
        "email": "ana@example.com",
        "full_name": "Ana Sato",
    });
    let payload = URL_SAFE_NO_PAD.encode(claims.to_string());
    format!("{header}.{payload}.mock-signature")
}

fn teapot() -> Value {
    json!({
        "id": 12,
        "title": "Iron Teapot",
        "slug": "teapot",
        "price": "20.00",
        "shipping_amount": "3.00",
        "stock_qty": 4,
        "in_stock": true,
        "product_rating": 4.5,
        "rating_count": 2
    })
}

fn not_found() -> Response {
    (StatusCode::NOT_FOUND, Json(json!({ "detail": "Not found." }))).into_response()
}

fn header_value(headers: &HeaderMap, name: header::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(String::from)
}

async fn record(State(recorded): State<Arc<Recorded>>, request: Request, next: Next) -> Response {
    let headers = request.headers();
    let seen = Seen {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: header_value(headers, header::AUTHORIZATION),
        accept: header_value(headers, header::ACCEPT),
        user_agent: header_value(headers, header::USER_AGENT),
    };
    recorded.seen.lock().expect("seen lock").push(seen);
    next.run(request).await
}

async fn categories() -> Json<Value> {
    Json(json!([{ "id": 1, "title": "Kitchen", "slug": "kitchen" }]))
}

async fn products() -> Json<Value> {
    Json(json!([teapot()]))
}

async fn product(Path(slug): Path<String>) -> Response {
    if slug == "teapot" {
        Json(teapot()).into_response()
    } else {
        not_found()
    }
}

async fn reviews(Path(product_id): Path<i32>) -> Json<Value> {
    if product_id == 12 {
        Json(json!([{ "id": 1, "rating": 5, "review": "Keeps tea hot", "reply": null }]))
    } else {
        Json(json!([]))
    }
}

async fn create_review(
    State(recorded): State<Arc<Recorded>>,
    Path(_product_id): Path<i32>,
    mut form: Multipart,
) -> (StatusCode, Json<Value>) {
    let mut fields = Vec::new();
    while let Ok(Some(field)) = form.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let value = field.text().await.unwrap_or_default();
        fields.push((name, value));
    }
    recorded.reviews.lock().expect("reviews lock").push(fields);
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Review created successfully." })),
    )
}

async fn token(Json(body): Json<Value>) -> Response {
    if body["password"] == PASSWORD {
        Json(json!({ "access": access_token(), "refresh": "mock-refresh" })).into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "No active account found with the given credentials" })),
        )
            .into_response()
    }
}

async fn customer_orders(headers: HeaderMap, Path(user_id): Path<i32>) -> Response {
    let expected = format!("Bearer {}", access_token());
    if header_value(&headers, header::AUTHORIZATION).as_deref() != Some(expected.as_str()) {
        return (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "detail": "Given token not valid for any token type" })),
        )
            .into_response();
    }
    if user_id != USER_ID {
        return not_found();
    }
    Json(json!([{
        "oid": "k7d2x9",
        "full_name": "Ana Sato",
        "total": "26.00",
        "payment_status": "paid",
        "order_status": "Pending"
    }]))
    .into_response()
}

async fn add_to_cart(
    State(recorded): State<Arc<Recorded>>,
    Json(line): Json<Value>,
) -> (StatusCode, Json<Value>) {
    let mut cart = recorded.cart.lock().expect("cart lock");
    let id = cart.len() + 1;
    cart.push(json!({
        "id": id,
        "qty": line["qty"],
        "price": line["price"],
        "cart_id": line["cart_id"],
    }));
    (
        StatusCode::CREATED,
        Json(json!({ "message": "Cart Created Successfully" })),
    )
}

fn lines_for(recorded: &Recorded, cart_id: &str) -> Json<Value> {
    let cart = recorded.cart.lock().expect("cart lock");
    let lines: Vec<Value> = cart
        .iter()
        .filter(|line| line["cart_id"] == cart_id)
        .cloned()
        .collect();
    Json(Value::Array(lines))
}

async fn cart_list(
    State(recorded): State<Arc<Recorded>>,
    Path(cart_id): Path<String>,
) -> Json<Value> {
    lines_for(&recorded, &cart_id)
}

async fn cart_list_for_user(
    State(recorded): State<Arc<Recorded>>,
    Path((cart_id, _user_id)): Path<(String, i32)>,
) -> Json<Value> {
    lines_for(&recorded, &cart_id)
}

async fn broken() -> (StatusCode, &'static str) {
    (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
}
