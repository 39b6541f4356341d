//! Views and their lifecycle.
//!
//! Every route renders a [`View`]. The navigator calls [`View::on_enter`]
//! once the guard allowed the route and [`View::on_exit`] when the user
//! leaves. `on_enter` loads the page model through the API adapter;
//! backend failures degrade to empty data, except a 401 which surfaces as
//! [`AppError::Unauthorized`] so the navigator can redirect.
//!
//! # Page loaders
//!
//! | module | views |
//! |---|---|
//! | `auth` | Register, Login, ForgotPassword, CreatePassword, Logout |
//! | `store` | Products, ProductDetail, Search, Checkout, PaymentSuccess |
//! | `cart` | Cart (plus the navigation [`CartBadge`]) |
//! | `customer` | Orders, OrderDetail, Account, Wishlist, notifications, Invoice, settings |
//! | `vendor` | everything under `/admin` |

pub mod actions;
mod auth;
mod badge;
mod cart;
mod customer;
mod store;
mod vendor;

use std::fmt::Display;
use std::str::FromStr;

use futures::future::BoxFuture;
use koshimart_core::{UserId, VendorId};
use serde::Serialize;

pub use badge::CartBadge;
pub use cart::CartPage;

use crate::api::{
    Ack, ApiClient, ApiError, CartItem, CartTotals, Category, Coupon, CouponStats, Earning,
    MonthlyEarning, Notification, NotificationSummary, Order, Product, Profile, Review, Shop,
    VendorStats, WishlistItem,
};
use crate::error::{AppError, Result};
use crate::router::{RouteMatch, ViewId};
use crate::state::AppState;

/// Everything a view needs while entering: the adapter, the shared state
/// container and the route that selected it.
#[derive(Debug, Clone)]
pub struct ViewContext {
    pub api: ApiClient,
    pub state: AppState,
    pub route: RouteMatch,
}

impl ViewContext {
    /// Signed-in user's id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the session carries no user id.
    pub fn user_id(&self) -> Result<UserId> {
        self.state
            .session()
            .and_then(|s| s.user_id())
            .ok_or_else(|| AppError::InvalidInput("session has no user id".into()))
    }

    /// Signed-in vendor's id.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the account has no shop.
    pub fn vendor_id(&self) -> Result<VendorId> {
        self.state
            .session()
            .and_then(|s| s.vendor_id())
            .ok_or_else(|| AppError::InvalidInput("account has no vendor shop".into()))
    }

    /// Parse a `:name` route parameter.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] if the parameter is absent or does
    /// not parse.
    pub fn param<T>(&self, name: &str) -> Result<T>
    where
        T: FromStr,
        T::Err: Display,
    {
        self.route
            .param(name)
            .unwrap_or_default()
            .parse()
            .map_err(|e: T::Err| AppError::InvalidInput(format!("{name}: {e}")))
    }

    /// Query-string parameter.
    #[must_use]
    pub fn query(&self, name: &str) -> Option<String> {
        self.route.query(name)
    }

    /// Keep a 401 as [`AppError::Unauthorized`]; turn every other failure
    /// into the default value. The adapter logs every failure, including
    /// payloads of the wrong shape, so nothing is logged here.
    fn degrade<T: Default>(&self, result: std::result::Result<T, ApiError>) -> Result<T> {
        match result {
            Ok(value) => Ok(value),
            Err(err) if err.is_unauthorized() => Err(AppError::from_api(err, &self.route.path)),
            Err(_) => Ok(T::default()),
        }
    }

    /// [`ViewContext::degrade`] for single records, which degrade to `None`.
    fn degrade_opt<T>(&self, result: std::result::Result<T, ApiError>) -> Result<Option<T>> {
        self.degrade(result.map(Some))
    }
}

/// Data a view renders.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum PageData {
    /// Nothing loaded (forms, or a load that has not run).
    #[default]
    Empty,
    PasswordReset {
        uid: String,
        token: String,
    },
    Catalog {
        categories: Vec<Category>,
        products: Vec<Product>,
    },
    ProductDetail {
        product: Option<Product>,
        reviews: Vec<Review>,
    },
    Search {
        query: String,
        results: Vec<Product>,
    },
    Cart {
        items: Vec<CartItem>,
        totals: CartTotals,
    },
    Checkout {
        order: Option<Order>,
    },
    PaymentSuccess {
        order: Option<Order>,
        payment: Option<Ack>,
    },
    Orders {
        orders: Vec<Order>,
    },
    Order {
        order: Option<Order>,
    },
    Profile {
        profile: Option<Profile>,
    },
    Wishlist {
        items: Vec<WishlistItem>,
    },
    Notifications {
        notifications: Vec<Notification>,
    },
    Dashboard {
        stats: VendorStats,
        products: Vec<Product>,
        orders: Vec<Order>,
    },
    Earning {
        earning: Earning,
        monthly: Vec<MonthlyEarning>,
    },
    VendorNotifications {
        summary: NotificationSummary,
        unseen: Vec<Notification>,
        seen: Vec<Notification>,
    },
    Reviews {
        reviews: Vec<Review>,
    },
    Coupons {
        stats: CouponStats,
        coupons: Vec<Coupon>,
    },
    Shop {
        shop: Option<Shop>,
        products: Vec<Product>,
    },
    VendorSettings {
        profile: Option<Profile>,
        shop: Option<Shop>,
    },
    Products {
        products: Vec<Product>,
    },
    ProductForm {
        categories: Vec<Category>,
        product: Option<Product>,
    },
    NotFound {
        path: String,
    },
}

/// A page with explicit lifecycle hooks.
pub trait View: Send {
    /// Which route this view renders.
    fn id(&self) -> ViewId;

    /// Load the page model. Called once per navigation, after the guard.
    fn on_enter<'a>(&'a mut self, ctx: &'a ViewContext) -> BoxFuture<'a, Result<()>>;

    /// Release subscriptions. Responses still in flight are discarded by the
    /// navigator.
    fn on_exit(&mut self, _ctx: &ViewContext) {}

    /// Current page model.
    fn data(&self) -> &PageData;
}

/// A view whose model is produced by a single loader.
#[derive(Debug)]
pub struct Page {
    id: ViewId,
    data: PageData,
}

impl Page {
    #[must_use]
    pub const fn new(id: ViewId) -> Self {
        Self {
            id,
            data: PageData::Empty,
        }
    }
}

impl View for Page {
    fn id(&self) -> ViewId {
        self.id
    }

    fn on_enter<'a>(&'a mut self, ctx: &'a ViewContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.data = load(self.id, ctx).await?;
            Ok(())
        })
    }

    fn data(&self) -> &PageData {
        &self.data
    }
}

/// Build the view for a route.
#[must_use]
pub fn create(view: ViewId) -> Box<dyn View> {
    match view {
        ViewId::Cart => Box::new(CartPage::new()),
        other => Box::new(Page::new(other)),
    }
}

async fn load(view: ViewId, ctx: &ViewContext) -> Result<PageData> {
    match view {
        ViewId::Register | ViewId::Login | ViewId::ForgotPassword => Ok(PageData::Empty),
        ViewId::CreatePassword => auth::password_reset(ctx),
        ViewId::Logout => Ok(auth::logout(ctx)),

        ViewId::Products => store::catalog(ctx).await,
        ViewId::ProductDetail => store::product_detail(ctx).await,
        ViewId::Search => store::search(ctx).await,
        ViewId::Checkout => store::checkout(ctx).await,
        ViewId::PaymentSuccess => store::payment_success(ctx).await,
        ViewId::Cart => cart::load(ctx).await,

        ViewId::Orders => customer::orders(ctx).await,
        ViewId::OrderDetail | ViewId::Invoice => customer::order(ctx).await,
        ViewId::Account | ViewId::CustomerSettings => customer::profile(ctx).await,
        ViewId::Wishlist => customer::wishlist(ctx).await,
        ViewId::CustomerNotifications => customer::notifications(ctx).await,

        ViewId::Dashboard => vendor::dashboard(ctx).await,
        ViewId::Earning => vendor::earning(ctx).await,
        ViewId::VendorOrders => vendor::orders(ctx).await,
        ViewId::VendorOrderDetail => vendor::order(ctx).await,
        ViewId::VendorNotifications => vendor::notifications(ctx).await,
        ViewId::VendorReviews => vendor::reviews(ctx).await,
        ViewId::Coupons => vendor::coupons(ctx).await,
        ViewId::Shop => vendor::shop(ctx).await,
        ViewId::VendorSettings => vendor::settings(ctx).await,
        ViewId::VendorProducts => vendor::products(ctx).await,
        ViewId::AddProduct | ViewId::UpdateProduct => vendor::product_form(ctx).await,

        ViewId::NotFound => Ok(PageData::NotFound {
            path: ctx.route.path.clone(),
        }),
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use koshimart_core::Session;

    use super::ViewContext;
    use crate::api::ApiClient;
    use crate::router::resolve;
    use crate::state::AppState;
    use crate::testing::{RecordingTransport, jwt, test_config};

    pub fn context(transport: &Arc<RecordingTransport>, state: &AppState, path: &str) -> ViewContext {
        let api = ApiClient::with_transport(
            &test_config(),
            transport.clone(),
            Some(Arc::new(state.clone())),
        )
        .expect("client");
        ViewContext {
            api,
            state: state.clone(),
            route: resolve(path),
        }
    }

    /// State with a session for user 5, who owns vendor 2.
    pub fn vendor_state() -> AppState {
        let state = AppState::new();
        let access = jwt(&serde_json::json!({ "user_id": 5, "vendor_id": 2 }));
        state.set_session(Session::from_tokens(&access, None).expect("session"));
        state
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use reqwest::StatusCode;

    use super::test_support::{context, vendor_state};
    use super::*;
    use crate::testing::RecordingTransport;

    #[tokio::test]
    async fn test_not_found_page_keeps_path() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(&transport, &AppState::new(), "/nowhere?x=1");
        let mut view = create(ctx.route.view);
        view.on_enter(&ctx).await.unwrap();

        assert_eq!(view.id(), ViewId::NotFound);
        assert_eq!(
            view.data(),
            &PageData::NotFound {
                path: "/nowhere?x=1".into()
            }
        );
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_degrade_keeps_unauthorized() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(&transport, &vendor_state(), "/orders");

        let ok: Vec<Order> = ctx
            .degrade(Err(ApiError::from_response(500, "boom")))
            .unwrap();
        assert!(ok.is_empty());

        let err = ctx
            .degrade::<Vec<Order>>(Err(ApiError::from_response(401, "{}")))
            .unwrap_err();
        assert!(err.is_unauthorized());
    }

    #[tokio::test]
    async fn test_param_parse_errors_are_invalid_input() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(&transport, &vendor_state(), "/admin/update-product/abc");
        let err = ctx.param::<koshimart_core::ProductId>("pid").unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_page_data_serializes_with_kind_tag() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("category/", StatusCode::OK, "[]");
        transport.respond("products/", StatusCode::OK, r#"[{"id":1,"title":"Tea"}]"#);
        let ctx = context(&transport, &AppState::new(), "/");

        let mut view = create(ViewId::Products);
        view.on_enter(&ctx).await.unwrap();

        let json = serde_json::to_value(view.data()).unwrap();
        assert_eq!(json["kind"], "catalog");
        assert_eq!(json["products"][0]["title"], "Tea");
    }
}
