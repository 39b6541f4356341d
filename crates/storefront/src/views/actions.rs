//! User actions that change shared state.
//!
//! Views call these from their controls. Each action goes through the API
//! adapter and then writes the outcome into [`AppState`], so every
//! subscriber (the cart badge, an open cart page) sees it.

use koshimart_core::{CartCount, CartItemId, Email, OrderOid, ProductId, Session};
use rust_decimal::Decimal;
use tracing::instrument;

use crate::api::{Ack, ApiClient, CartLineInput, OrderInput, Product};
use crate::error::{AppError, Result, add_breadcrumb, clear_sentry_user, set_sentry_user};
use crate::state::AppState;

/// Sign in and store the session.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for a malformed email and
/// [`AppError::Api`] when the backend rejects the credentials.
#[instrument(skip(api, state, password))]
pub async fn login(api: &ApiClient, state: &AppState, email: &str, password: &str) -> Result<Session> {
    let email = Email::parse(email).map_err(|e| AppError::InvalidInput(e.to_string()))?;
    let session = api.login(&email, password).await?;

    if let Some(user_id) = session.user_id() {
        set_sentry_user(&user_id, Some(email.as_str()));
    }
    state.set_session(session.clone());
    tracing::info!(user_id = ?session.user_id(), vendor = session.is_vendor(), "Signed in");
    Ok(session)
}

/// Swap an expired access token for a fresh one before it is sent.
///
/// Sessions that are absent or still valid are left alone. An expired
/// session without a refresh token, or whose refresh the backend rejects, is
/// cleared so the guard sends the user to `/login`. Other failures keep the
/// session and leave the verdict to the backend's 401.
#[instrument(skip(api, state))]
pub async fn renew_session(api: &ApiClient, state: &AppState) {
    let Some(session) = state.session().filter(Session::is_expired) else {
        return;
    };
    if session.refresh_token().is_none() {
        tracing::info!(user_id = ?session.user_id(), "Session expired without a refresh token");
        state.clear_session();
        return;
    }

    match api.refresh_session(&session).await {
        Ok(renewed) => {
            state.set_session(renewed);
            tracing::info!(user_id = ?session.user_id(), "Session renewed");
        }
        Err(err) if err.is_unauthorized() => {
            if state.is_signed_in() {
                state.clear_session();
            }
        }
        Err(_) => {}
    }
}

/// End the session and start a fresh cart.
pub fn logout(state: &AppState) {
    state.clear_session();
    state.reset_cart();
    clear_sentry_user();
    tracing::info!("Signed out");
}

/// Line options chosen on the product page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LineOptions {
    pub qty: u32,
    pub country: String,
    pub size: Option<String>,
    pub color: Option<String>,
}

/// Put a product in the cart, then recount the cart lines.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for a zero quantity and
/// [`AppError::Api`] if the backend refuses the line. A failed recount keeps
/// the previous badge count.
#[instrument(skip(api, state, product, options), fields(product_id = %product.id, qty = options.qty))]
pub async fn add_to_cart(
    api: &ApiClient,
    state: &AppState,
    product: &Product,
    options: LineOptions,
) -> Result<CartCount> {
    let line = CartLineInput {
        product_id: product.id,
        user_id: state.session().and_then(|s| s.user_id()),
        qty: options.qty,
        price: product.price.unwrap_or(Decimal::ZERO),
        shipping_amount: product.shipping_amount.unwrap_or(Decimal::ZERO),
        country: options.country,
        size: options.size,
        color: options.color,
        cart_id: state.cart_id(),
    };
    api.add_to_cart(&line).await?;
    let slug = product.slug.as_deref().unwrap_or_default();
    add_breadcrumb("cart", "Added to cart", Some(&[("product", slug)]));
    Ok(recount(api, state).await)
}

/// Remove a cart line, then recount.
///
/// # Errors
///
/// Returns [`AppError::Api`] if the backend refuses the removal.
pub async fn remove_cart_item(api: &ApiClient, state: &AppState, item_id: CartItemId) -> Result<CartCount> {
    let user_id = state.session().and_then(|s| s.user_id());
    api.remove_cart_item(&state.cart_id(), item_id, user_id).await?;
    Ok(recount(api, state).await)
}

/// Re-list the cart and write the line count into the container.
async fn recount(api: &ApiClient, state: &AppState) -> CartCount {
    let user_id = state.session().and_then(|s| s.user_id());
    match api.cart_items(&state.cart_id(), user_id).await {
        Ok(items) => {
            let count = CartCount::from_lines(items.len());
            state.set_cart_count(count);
            count
        }
        Err(_) => state.cart_count(),
    }
}

/// Review a product as the signed-in user (or anonymously).
///
/// Never fails: problems come back as an error-status [`Ack`].
pub async fn submit_review(
    api: &ApiClient,
    state: &AppState,
    raw_product_id: Option<&str>,
    rating: u8,
    review: &str,
) -> Ack {
    let user_id = state.session().and_then(|s| s.user_id());
    api.safely_submit_review(raw_product_id, user_id, rating, review)
        .await
}

/// Add or remove a product from the signed-in user's wishlist.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] without a session.
pub async fn toggle_wishlist(api: &ApiClient, state: &AppState, product_id: ProductId) -> Result<Ack> {
    let user_id = state
        .session()
        .and_then(|s| s.user_id())
        .ok_or_else(|| AppError::InvalidInput("sign in to use the wishlist".into()))?;
    Ok(api.toggle_wishlist(user_id, product_id).await?)
}

/// Shipping details entered on the cart page.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Shipping {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
}

/// Turn the current cart into an order. The cart stays as it is until the
/// payment succeeds.
///
/// # Errors
///
/// Returns [`AppError::InvalidInput`] for incomplete shipping details.
#[instrument(skip(api, state, shipping))]
pub async fn place_order(api: &ApiClient, state: &AppState, shipping: Shipping) -> Result<OrderOid> {
    let input = OrderInput {
        full_name: shipping.full_name,
        email: shipping.email,
        mobile: shipping.mobile,
        address: shipping.address,
        city: shipping.city,
        state: shipping.state,
        country: shipping.country,
        cart_id: state.cart_id(),
        user_id: state.session().and_then(|s| s.user_id()),
    };
    let oid = api.create_order(&input).await?;
    tracing::info!(%oid, "Order created");
    Ok(oid)
}
