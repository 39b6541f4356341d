//! Storefront pages: catalog, product detail, search, checkout, payment.

use koshimart_core::{OrderOid, Slug};

use super::{PageData, ViewContext};
use crate::error::Result;

pub(super) async fn catalog(ctx: &ViewContext) -> Result<PageData> {
    let (categories, products) = tokio::join!(ctx.api.categories(), ctx.api.products());
    Ok(PageData::Catalog {
        categories: ctx.degrade(categories)?,
        products: ctx.degrade(products)?,
    })
}

/// Product by slug plus its reviews. A missing product skips the review
/// fetch entirely; an invalid slug skips both.
pub(super) async fn product_detail(ctx: &ViewContext) -> Result<PageData> {
    let product = match Slug::parse(ctx.route.param("slug").unwrap_or_default()) {
        Ok(slug) => ctx.degrade_opt(ctx.api.product_by_slug(&slug).await)?,
        Err(e) => {
            tracing::warn!(error = %e, "Not fetching product for invalid slug");
            None
        }
    };
    let reviews = match &product {
        Some(product) => ctx.degrade(ctx.api.reviews(product.id).await)?,
        None => Vec::new(),
    };
    Ok(PageData::ProductDetail { product, reviews })
}

pub(super) async fn search(ctx: &ViewContext) -> Result<PageData> {
    let query = ctx.query("query").unwrap_or_default().trim().to_string();
    let results = if query.is_empty() {
        Vec::new()
    } else {
        ctx.degrade(ctx.api.search_products(&query).await)?
    };
    Ok(PageData::Search { query, results })
}

/// `/checkout?order_oid=...` shows the order summary.
pub(super) async fn checkout(ctx: &ViewContext) -> Result<PageData> {
    let Some(raw) = ctx.query("order_oid").or_else(|| ctx.query("oid")) else {
        return Ok(PageData::Checkout { order: None });
    };
    let oid = OrderOid::parse(&raw).map_err(crate::api::ApiError::from)?;
    let order = ctx.degrade_opt(ctx.api.checkout(&oid).await)?;
    Ok(PageData::Checkout { order })
}

/// `/payment-success/:oid?session_id=...` confirms the payment and, once it
/// succeeded, starts a fresh cart.
pub(super) async fn payment_success(ctx: &ViewContext) -> Result<PageData> {
    let oid: OrderOid = ctx.param("oid")?;

    let payment = match ctx.query("session_id") {
        Some(session_id) => ctx.degrade_opt(ctx.api.payment_success(&oid, &session_id).await)?,
        None => None,
    };
    if payment
        .as_ref()
        .is_some_and(|ack| ack.status.as_deref() == Some("success"))
    {
        ctx.state.reset_cart();
    }

    let order = ctx.degrade_opt(ctx.api.checkout(&oid).await)?;
    Ok(PageData::PaymentSuccess { order, payment })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use koshimart_core::CartCount;
    use reqwest::StatusCode;

    use super::super::test_support::context;
    use super::*;
    use crate::error::AppError;
    use crate::state::AppState;
    use crate::testing::RecordingTransport;

    #[tokio::test]
    async fn test_catalog_degrades_failed_fetches_to_empty() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("category/", StatusCode::OK, r#"[{"id":1,"title":"Kitchen"}]"#);
        transport.fail("products/", "connection reset");
        let ctx = context(&transport, &AppState::new(), "/");

        let PageData::Catalog {
            categories,
            products,
        } = catalog(&ctx).await.unwrap()
        else {
            panic!("expected catalog");
        };
        assert_eq!(categories.len(), 1);
        assert!(products.is_empty());
    }

    #[tokio::test]
    async fn test_product_detail_for_unknown_slug_skips_reviews() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(&transport, &AppState::new(), "/detail/ghost");

        let data = product_detail(&ctx).await.unwrap();
        assert_eq!(
            data,
            PageData::ProductDetail {
                product: None,
                reviews: Vec::new()
            }
        );
        assert_eq!(transport.paths(), vec!["products/ghost/".to_string()]);
    }

    #[tokio::test]
    async fn test_product_detail_keeps_rejected_session_as_unauthorized() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("products/teapot/", StatusCode::UNAUTHORIZED, "{}");
        let ctx = context(&transport, &AppState::new(), "/detail/teapot");

        assert!(matches!(
            product_detail(&ctx).await,
            Err(AppError::Unauthorized { .. })
        ));
        assert_eq!(transport.paths(), vec!["products/teapot/".to_string()]);
    }

    #[tokio::test]
    async fn test_product_detail_loads_reviews_by_product_id() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "products/teapot/",
            StatusCode::OK,
            r#"{"id":12,"title":"Teapot","slug":"teapot"}"#,
        );
        transport.respond("reviews/12/", StatusCode::OK, r#"[{"id":1,"rating":5}]"#);
        let ctx = context(&transport, &AppState::new(), "/detail/teapot");

        let PageData::ProductDetail { product, reviews } = product_detail(&ctx).await.unwrap()
        else {
            panic!("expected product detail");
        };
        assert_eq!(product.unwrap().title, "Teapot");
        assert_eq!(reviews.len(), 1);
    }

    #[tokio::test]
    async fn test_empty_search_issues_no_request() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(&transport, &AppState::new(), "/search?query=%20");

        let data = search(&ctx).await.unwrap();
        assert_eq!(
            data,
            PageData::Search {
                query: String::new(),
                results: Vec::new()
            }
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_payment_success_resets_cart() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond(
            "payment-success/k7d2x9/",
            StatusCode::OK,
            r#"{"message":"Payment completed successfully","status":"success"}"#,
        );
        transport.respond("checkout/k7d2x9/", StatusCode::OK, r#"{"oid":"k7d2x9"}"#);
        let state = AppState::new();
        state.set_cart_count(CartCount::new(2));
        let ctx = context(&transport, &state, "/payment-success/k7d2x9?session_id=cs_1");

        let PageData::PaymentSuccess { order, payment } = payment_success(&ctx).await.unwrap()
        else {
            panic!("expected payment page");
        };
        assert!(order.is_some());
        assert_eq!(payment.unwrap().status.as_deref(), Some("success"));
        assert!(state.cart_count().is_empty());
    }
}
