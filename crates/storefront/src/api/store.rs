//! Catalog, review, cart, order and payment endpoints.
//!
//! The `safely_*` helpers never fail: they validate identifiers before any
//! request is issued and degrade errors to empty data, which is what the
//! storefront pages render.

use koshimart_core::{CartId, CartItemId, OrderOid, ProductId, Slug, UserId};
use serde::Deserialize;
use tracing::instrument;

use super::client::{ApiClient, decode};
use super::error::ApiError;
use super::types::{
    Ack, CartItem, CartLineInput, CartTotals, Category, Order, OrderInput, Product, Review,
    ReviewInput,
};

/// Ratings accepted by the review endpoint.
pub const RATING_RANGE: std::ops::RangeInclusive<u8> = 1..=5;

#[derive(Debug, Deserialize)]
struct CreatedOrder {
    order_oid: OrderOid,
}

/// `{cart_id}/` or `{cart_id}/{user_id}/`.
fn cart_suffix(cart_id: &CartId, user_id: Option<UserId>) -> String {
    match user_id {
        Some(user_id) => format!("{cart_id}/{user_id}/"),
        None => format!("{cart_id}/"),
    }
}

impl ApiClient {
    // =========================================================================
    // Catalog
    // =========================================================================

    /// List product categories.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn categories(&self) -> Result<Vec<Category>, ApiError> {
        decode(self.get("category/").await?)
    }

    /// List published products.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn products(&self) -> Result<Vec<Product>, ApiError> {
        decode(self.get("products/").await?)
    }

    /// Fetch a product by slug.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] (404) for unknown slugs.
    pub async fn product_by_slug(&self, slug: &Slug) -> Result<Product, ApiError> {
        decode(self.get(&format!("products/{slug}/")).await?)
    }

    /// Search products by title.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn search_products(&self, query: &str) -> Result<Vec<Product>, ApiError> {
        let path = format!("search/?query={}", urlencoding::encode(query.trim()));
        decode(self.get(&path).await?)
    }

    /// Products or an empty list.
    pub async fn safely_fetch_products(&self) -> Vec<Product> {
        self.products().await.unwrap_or_default()
    }

    /// Product for a raw slug, or `None` if the slug is missing or the fetch
    /// fails. No request is issued for a missing slug.
    pub async fn safely_fetch_product(&self, raw_slug: Option<&str>) -> Option<Product> {
        let slug = match Slug::parse(raw_slug.unwrap_or_default()) {
            Ok(slug) => slug,
            Err(e) => {
                tracing::warn!(error = %e, "Not fetching product for invalid slug");
                return None;
            }
        };
        self.product_by_slug(&slug).await.ok()
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// List a product's reviews.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn reviews(&self, product_id: ProductId) -> Result<Vec<Review>, ApiError> {
        let payload = self.get(&format!("reviews/{product_id}/")).await?;
        if payload.is_null() {
            return Ok(Vec::new());
        }
        decode(payload)
    }

    /// Post a review as a multipart form.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a rating
    /// outside 1-5 or an empty review.
    #[instrument(skip(self, input), fields(product_id = %input.product_id))]
    pub async fn submit_review(&self, input: &ReviewInput) -> Result<Ack, ApiError> {
        if !RATING_RANGE.contains(&input.rating) {
            return Err(ApiError::InvalidInput(format!(
                "rating must be between 1 and 5, got {}",
                input.rating
            )));
        }
        if input.review.trim().is_empty() {
            return Err(ApiError::InvalidInput("review text is empty".into()));
        }

        let mut fields = vec![
            ("product_id".to_string(), input.product_id.to_string()),
            ("rating".to_string(), input.rating.to_string()),
            ("review".to_string(), input.review.trim().to_string()),
        ];
        if let Some(user_id) = input.user_id {
            fields.push(("user_id".to_string(), user_id.to_string()));
        }

        let payload = self
            .post_multipart(&format!("reviews/{}/", input.product_id), fields)
            .await?;
        if payload.is_null() {
            return Ok(Ack {
                message: "Review submitted".into(),
                status: Some("success".into()),
            });
        }
        decode(payload)
    }

    /// Reviews for a raw product id. Missing or malformed ids yield `[]`
    /// without a request; fetch failures also yield `[]`.
    pub async fn safely_fetch_reviews(&self, raw_product_id: Option<&str>) -> Vec<Review> {
        let product_id = match raw_product_id.unwrap_or_default().parse::<ProductId>() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Not fetching reviews for invalid product id");
                return Vec::new();
            }
        };
        self.reviews(product_id).await.unwrap_or_default()
    }

    /// Submit a review for a raw product id, reporting failure as an
    /// error-status [`Ack`] instead of an `Err`.
    pub async fn safely_submit_review(
        &self,
        raw_product_id: Option<&str>,
        user_id: Option<UserId>,
        rating: u8,
        review: &str,
    ) -> Ack {
        let product_id = match raw_product_id.unwrap_or_default().parse::<ProductId>() {
            Ok(id) => id,
            Err(e) => {
                tracing::warn!(error = %e, "Not submitting review for invalid product id");
                return error_ack("Invalid product ID");
            }
        };

        let input = ReviewInput {
            product_id,
            user_id,
            rating,
            review: review.to_string(),
        };
        self.submit_review(&input)
            .await
            .unwrap_or_else(|_| error_ack("Error submitting review"))
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// Add a line to the cart (or update the quantity of an existing line).
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a zero
    /// quantity.
    #[instrument(skip(self, line), fields(product_id = %line.product_id, qty = line.qty))]
    pub async fn add_to_cart(&self, line: &CartLineInput) -> Result<Ack, ApiError> {
        if line.qty == 0 {
            return Err(ApiError::InvalidInput("quantity must be at least 1".into()));
        }
        decode(self.post_json("cart-view/", line).await?)
    }

    /// Lines in a cart.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn cart_items(
        &self,
        cart_id: &CartId,
        user_id: Option<UserId>,
    ) -> Result<Vec<CartItem>, ApiError> {
        decode(
            self.get(&format!("cart-list/{}", cart_suffix(cart_id, user_id)))
                .await?,
        )
    }

    /// Summed amounts for a cart.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn cart_totals(
        &self,
        cart_id: &CartId,
        user_id: Option<UserId>,
    ) -> Result<CartTotals, ApiError> {
        decode(
            self.get(&format!("cart-detail/{}", cart_suffix(cart_id, user_id)))
                .await?,
        )
    }

    /// Remove a cart line.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn remove_cart_item(
        &self,
        cart_id: &CartId,
        item_id: CartItemId,
        user_id: Option<UserId>,
    ) -> Result<(), ApiError> {
        let path = match user_id {
            Some(user_id) => format!("cart-delete/{cart_id}/{item_id}/{user_id}/"),
            None => format!("cart-delete/{cart_id}/{item_id}/"),
        };
        self.delete(&path).await.map(|_| ())
    }

    // =========================================================================
    // Orders & payment
    // =========================================================================

    /// Turn the cart into an order and return its id.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request if the email is
    /// malformed or a shipping field is blank.
    #[instrument(skip(self, input), fields(cart_id = %input.cart_id))]
    pub async fn create_order(&self, input: &OrderInput) -> Result<OrderOid, ApiError> {
        koshimart_core::Email::parse(&input.email)?;
        let required = [
            ("full_name", &input.full_name),
            ("mobile", &input.mobile),
            ("address", &input.address),
            ("city", &input.city),
            ("state", &input.state),
            ("country", &input.country),
        ];
        if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ApiError::InvalidInput(format!("{field} is required")));
        }

        let created: CreatedOrder = decode(self.post_json("create-order/", input).await?)?;
        Ok(created.order_oid)
    }

    /// Order summary shown on the checkout page.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn checkout(&self, oid: &OrderOid) -> Result<Order, ApiError> {
        decode(self.get(&format!("checkout/{oid}/")).await?)
    }

    /// Apply a coupon code to an order.
    ///
    /// The backend answers 200 with an error-status [`Ack`] for unknown or
    /// already-applied codes.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a blank code.
    pub async fn apply_coupon(&self, oid: &OrderOid, code: &str) -> Result<Ack, ApiError> {
        let code = code.trim();
        if code.is_empty() {
            return Err(ApiError::InvalidInput("coupon code is empty".into()));
        }
        decode(
            self.post_json(
                "coupon/",
                &serde_json::json!({ "order_oid": oid, "coupon_code": code }),
            )
            .await?,
        )
    }

    /// Start a Stripe checkout session for an order.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn stripe_checkout(&self, oid: &OrderOid) -> Result<serde_json::Value, ApiError> {
        self.post_json(&format!("stripe-checkout/{oid}/"), &serde_json::json!({}))
            .await
    }

    /// Confirm payment after returning from Stripe.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] (400) for an unknown session id.
    pub async fn payment_success(&self, oid: &OrderOid, session_id: &str) -> Result<Ack, ApiError> {
        decode(
            self.post_json(
                &format!("payment-success/{oid}/"),
                &serde_json::json!({ "order_oid": oid, "session_id": session_id }),
            )
            .await?,
        )
    }
}

fn error_ack(message: &str) -> Ack {
    Ack {
        message: message.to_string(),
        status: Some("error".to_string()),
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;
    use std::sync::Arc;

    use reqwest::{Method, StatusCode};
    use rust_decimal::Decimal;

    use super::*;
    use crate::api::RequestBody;
    use crate::testing::{LogCapture, RecordingTransport, test_config};

    fn client(transport: &Arc<RecordingTransport>) -> ApiClient {
        ApiClient::with_transport(&test_config(), transport.clone(), None).unwrap()
    }

    #[tokio::test]
    async fn test_payload_of_wrong_shape_is_logged_once() {
        let logs = LogCapture::default();
        let _guard = logs.install();
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("products/", StatusCode::OK, r#"{"results":[{"id":1}]}"#);
        let client = client(&transport);

        let err = client.products().await.unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
        assert_eq!(logs.problems().len(), 1);

        assert!(client.safely_fetch_products().await.is_empty());
        assert_eq!(logs.problems().len(), 2);

        transport.fail("products/", "connection refused");
        assert!(client.safely_fetch_products().await.is_empty());
        assert_eq!(logs.problems().len(), 3);
    }

    #[tokio::test]
    async fn test_safely_fetch_reviews_undefined_issues_no_request() {
        let transport = Arc::new(RecordingTransport::new());
        let client = client(&transport);

        assert!(client.safely_fetch_reviews(Some("undefined")).await.is_empty());
        assert!(client.safely_fetch_reviews(None).await.is_empty());
        assert!(client.safely_fetch_reviews(Some("")).await.is_empty());
        assert!(client.safely_fetch_reviews(Some("-1")).await.is_empty());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_safely_fetch_reviews_degrades_errors() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("reviews/3/", StatusCode::INTERNAL_SERVER_ERROR, "boom");

        let reviews = client(&transport).safely_fetch_reviews(Some("3")).await;
        assert!(reviews.is_empty());
        assert_eq!(transport.paths(), vec!["reviews/3/".to_string()]);
    }

    #[tokio::test]
    async fn test_safely_fetch_reviews_returns_reviews() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "reviews/3/",
            StatusCode::OK,
            r#"[{"id":1,"rating":4,"review":"Great","profile":{"full_name":"Aiko"}}]"#,
        );

        let reviews = client(&transport).safely_fetch_reviews(Some("3")).await;
        assert_eq!(reviews.len(), 1);
        assert_eq!(reviews.first().unwrap().rating, 4);
    }

    #[tokio::test]
    async fn test_safely_submit_review_rejects_missing_id() {
        let transport = Arc::new(RecordingTransport::new());
        let ack = client(&transport)
            .safely_submit_review(Some("undefined"), None, 5, "Nice")
            .await;
        assert_eq!(ack.status.as_deref(), Some("error"));
        assert_eq!(ack.message, "Invalid product ID");
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_submit_review_sends_form_fields() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond_to(
            Method::POST,
            "reviews/3/",
            StatusCode::CREATED,
            r#"{"message":"Review Created Successfully."}"#,
        );

        let ack = client(&transport)
            .safely_submit_review(Some("3"), Some(UserId::new(8)), 5, " Lovely ")
            .await;
        assert_eq!(ack.message, "Review Created Successfully.");

        let request = transport.requests().remove(0);
        assert_eq!(
            request.body,
            Some(RequestBody::Multipart(vec![
                ("product_id".into(), "3".into()),
                ("rating".into(), "5".into()),
                ("review".into(), "Lovely".into()),
                ("user_id".into(), "8".into()),
            ]))
        );
    }

    #[tokio::test]
    async fn test_submit_review_rejects_out_of_range_rating() {
        let transport = Arc::new(RecordingTransport::new());
        let input = ReviewInput {
            product_id: ProductId::new(3),
            user_id: None,
            rating: 6,
            review: "Too good".into(),
        };
        assert!(matches!(
            client(&transport).submit_review(&input).await,
            Err(ApiError::InvalidInput(_))
        ));
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_safely_fetch_product_missing_slug() {
        let transport = Arc::new(RecordingTransport::new());
        let client = client(&transport);
        assert!(client.safely_fetch_product(None).await.is_none());
        assert!(client.safely_fetch_product(Some("undefined")).await.is_none());
        assert!(transport.requests().is_empty());

        assert!(client.safely_fetch_product(Some("teapot")).await.is_none());
        assert_eq!(transport.paths(), vec!["products/teapot/".to_string()]);
    }

    #[tokio::test]
    async fn test_search_encodes_query() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("search/?query=green%20tea", StatusCode::OK, "[]");

        let results = client(&transport).search_products(" green tea ").await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_cart_paths_include_user_when_signed_in() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("cart-list/abc/", StatusCode::OK, "[]");
        transport.respond("cart-list/abc/7/", StatusCode::OK, r#"[{"id":1,"qty":2}]"#);
        transport.respond("cart-delete/abc/1/7/", StatusCode::NO_CONTENT, "");
        let client = client(&transport);
        let cart_id = CartId::parse("abc").unwrap();

        assert!(client.cart_items(&cart_id, None).await.unwrap().is_empty());
        let items = client
            .cart_items(&cart_id, Some(UserId::new(7)))
            .await
            .unwrap();
        assert_eq!(items.first().unwrap().qty, 2);
        client
            .remove_cart_item(&cart_id, CartItemId::new(1), Some(UserId::new(7)))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_add_to_cart_posts_line() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "cart-view/",
            StatusCode::CREATED,
            r#"{"message":"Cart created successfully"}"#,
        );
        let line = CartLineInput {
            product_id: ProductId::new(4),
            user_id: None,
            qty: 1,
            price: Decimal::from_str("49.99").unwrap(),
            shipping_amount: Decimal::from_str("5.00").unwrap(),
            country: "Japan".into(),
            size: None,
            color: Some("Red".into()),
            cart_id: CartId::parse("abc").unwrap(),
        };

        let ack = client(&transport).add_to_cart(&line).await.unwrap();
        assert_eq!(ack.message, "Cart created successfully");

        let Some(RequestBody::Json(body)) = transport.requests().remove(0).body else {
            panic!("expected JSON body");
        };
        assert_eq!(body["cart_id"], "abc");
        assert_eq!(body["product_id"], 4);
        assert_eq!(body["user_id"], serde_json::Value::Null);
    }

    #[tokio::test]
    async fn test_create_order_returns_oid() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "create-order/",
            StatusCode::CREATED,
            r#"{"message":"Order Created Successfully","order_oid":"k7d2x9"}"#,
        );
        let input = OrderInput {
            full_name: "Aiko Tan".into(),
            email: "aiko@example.com".into(),
            mobile: "555".into(),
            address: "1 Main".into(),
            city: "Osaka".into(),
            state: "Osaka".into(),
            country: "Japan".into(),
            cart_id: CartId::parse("abc").unwrap(),
            user_id: None,
        };

        let oid = client(&transport).create_order(&input).await.unwrap();
        assert_eq!(oid.as_str(), "k7d2x9");

        let blank = OrderInput {
            city: "  ".into(),
            ..input
        };
        let err = client(&transport).create_order(&blank).await.unwrap_err();
        assert_eq!(err, ApiError::InvalidInput("city is required".into()));
        assert_eq!(transport.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_apply_coupon_reports_backend_status() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "coupon/",
            StatusCode::OK,
            r#"{"message":"Coupon Does not Exists","status":"error"}"#,
        );
        let oid = OrderOid::parse("k7d2x9").unwrap();

        let ack = client(&transport).apply_coupon(&oid, "NOPE").await.unwrap();
        assert_eq!(ack.status.as_deref(), Some("error"));
        assert!(client(&transport).apply_coupon(&oid, " ").await.is_err());
    }
}
