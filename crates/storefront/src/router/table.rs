//! The static route table.

use std::fmt;

/// Identifier of every page the client can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ViewId {
    // Auth
    Register,
    Login,
    ForgotPassword,
    CreatePassword,
    Logout,

    // Store
    Products,
    ProductDetail,
    Search,
    Cart,
    Checkout,
    PaymentSuccess,

    // Customer account
    Orders,
    OrderDetail,
    Account,
    Wishlist,
    CustomerNotifications,
    Invoice,
    CustomerSettings,

    // Vendor console
    Dashboard,
    Earning,
    VendorOrders,
    VendorOrderDetail,
    VendorNotifications,
    VendorReviews,
    Coupons,
    Shop,
    VendorSettings,
    VendorProducts,
    AddProduct,
    UpdateProduct,

    /// Fallback for every unmatched path.
    NotFound,
}

impl ViewId {
    /// Stable name used in logs and the CLI.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Register => "Register",
            Self::Login => "Login",
            Self::ForgotPassword => "ForgotPassword",
            Self::CreatePassword => "CreatePassword",
            Self::Logout => "Logout",
            Self::Products => "Products",
            Self::ProductDetail => "ProductDetail",
            Self::Search => "Search",
            Self::Cart => "Cart",
            Self::Checkout => "Checkout",
            Self::PaymentSuccess => "PaymentSuccess",
            Self::Orders => "Orders",
            Self::OrderDetail => "OrderDetail",
            Self::Account => "Account",
            Self::Wishlist => "Wishlist",
            Self::CustomerNotifications => "CustomerNotifications",
            Self::Invoice => "Invoice",
            Self::CustomerSettings => "CustomerSettings",
            Self::Dashboard => "Dashboard",
            Self::Earning => "Earning",
            Self::VendorOrders => "VendorOrders",
            Self::VendorOrderDetail => "VendorOrderDetail",
            Self::VendorNotifications => "VendorNotifications",
            Self::VendorReviews => "VendorReviews",
            Self::Coupons => "Coupons",
            Self::Shop => "Shop",
            Self::VendorSettings => "VendorSettings",
            Self::VendorProducts => "VendorProducts",
            Self::AddProduct => "AddProduct",
            Self::UpdateProduct => "UpdateProduct",
            Self::NotFound => "NotFound",
        }
    }
}

impl fmt::Display for ViewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One entry of the route table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Route {
    /// Path pattern; `:name` segments capture a parameter.
    pub pattern: &'static str,
    /// View rendered for the pattern.
    pub view: ViewId,
    /// Whether the guard must find a session before rendering.
    pub guarded: bool,
}

const fn open(pattern: &'static str, view: ViewId) -> Route {
    Route {
        pattern,
        view,
        guarded: false,
    }
}

const fn guarded(pattern: &'static str, view: ViewId) -> Route {
    Route {
        pattern,
        view,
        guarded: true,
    }
}

/// Path the guard redirects to.
pub const LOGIN_PATH: &str = "/login";

/// Every routable path, in match order. Unmatched paths render
/// [`ViewId::NotFound`].
///
/// ```text
/// # Auth
/// /register                      Register
/// /login                         Login
/// /forgot-password               ForgotPassword
/// /reset-password/:uid/:token    CreatePassword
/// /logout                        Logout
///
/// # Store
/// /                              Products
/// /detail/:slug                  ProductDetail
/// /search                        Search
/// /cart                          Cart
/// /checkout                      Checkout
/// /payment-success/:oid          PaymentSuccess
///
/// # Customer account (guarded)
/// /orders, /orders/:oid, /account, /wishlist, /notifications,
/// /invoice/:oid, /settings
///
/// # Vendor console (guarded)
/// /admin and /admin/*
/// ```
pub static ROUTES: &[Route] = &[
    // Auth
    open("/register", ViewId::Register),
    open("/login", ViewId::Login),
    open("/forgot-password", ViewId::ForgotPassword),
    open("/reset-password/:uid/:token", ViewId::CreatePassword),
    open("/logout", ViewId::Logout),
    // Store
    open("/", ViewId::Products),
    open("/detail/:slug", ViewId::ProductDetail),
    open("/search", ViewId::Search),
    open("/cart", ViewId::Cart),
    open("/checkout", ViewId::Checkout),
    open("/payment-success/:oid", ViewId::PaymentSuccess),
    // Customer account
    guarded("/orders", ViewId::Orders),
    guarded("/orders/:oid", ViewId::OrderDetail),
    guarded("/account", ViewId::Account),
    guarded("/wishlist", ViewId::Wishlist),
    guarded("/notifications", ViewId::CustomerNotifications),
    guarded("/invoice/:oid", ViewId::Invoice),
    guarded("/settings", ViewId::CustomerSettings),
    // Vendor console
    guarded("/admin", ViewId::Dashboard),
    guarded("/admin/earning", ViewId::Earning),
    guarded("/admin/orders", ViewId::VendorOrders),
    guarded("/admin/orders/:oid", ViewId::VendorOrderDetail),
    guarded("/admin/notifications", ViewId::VendorNotifications),
    guarded("/admin/reviews", ViewId::VendorReviews),
    guarded("/admin/coupons", ViewId::Coupons),
    guarded("/admin/shop", ViewId::Shop),
    guarded("/admin/settings", ViewId::VendorSettings),
    guarded("/admin/products", ViewId::VendorProducts),
    guarded("/admin/add-product", ViewId::AddProduct),
    guarded("/admin/update-product/:pid", ViewId::UpdateProduct),
];
