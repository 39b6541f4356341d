//! Response and request payloads for the Koshimart REST API.
//!
//! Models are lenient: every field not needed to key or render a record is
//! optional or defaulted, and unknown fields are ignored, so that backend
//! serializer changes degrade to missing data instead of decode failures.

use koshimart_core::{
    CartId, CartItemId, CouponId, NotificationId, OrderOid, ProductId, ReviewId, UserId, VendorId,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use serde_json::Value;

// =============================================================================
// Catalog
// =============================================================================

/// Product category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: i32,
    pub title: String,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Shop summary embedded in products and returned by the shop endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shop {
    pub id: VendorId,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub slug: Option<String>,
}

/// Product as listed in the catalog and on detail pages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub title: String,
    #[serde(default)]
    pub slug: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub category: Option<Category>,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub old_price: Option<Decimal>,
    #[serde(default)]
    pub shipping_amount: Option<Decimal>,
    #[serde(default)]
    pub stock_qty: Option<i32>,
    #[serde(default)]
    pub in_stock: Option<bool>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub featured: Option<bool>,
    #[serde(default)]
    pub product_rating: Option<f64>,
    #[serde(default)]
    pub rating_count: Option<i32>,
    #[serde(default)]
    pub vendor: Option<Value>,
    #[serde(default)]
    pub gallery: Vec<Value>,
    #[serde(default)]
    pub specification: Vec<Value>,
    #[serde(default)]
    pub size: Vec<ProductOption>,
    #[serde(default)]
    pub color: Vec<ProductOption>,
}

/// A size or color option offered for a product.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductOption {
    pub name: String,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub color_code: Option<String>,
}

/// Reviewer details embedded in a review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReviewProfile {
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
}

/// Product review.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Review {
    pub id: ReviewId,
    pub rating: u8,
    #[serde(default)]
    pub review: Option<String>,
    #[serde(default)]
    pub reply: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub profile: Option<ReviewProfile>,
}

/// Review submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReviewInput {
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub rating: u8,
    pub review: String,
}

// =============================================================================
// Cart & Orders
// =============================================================================

/// Line submitted to `cart-view/`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CartLineInput {
    pub product_id: ProductId,
    pub user_id: Option<UserId>,
    pub qty: u32,
    pub price: Decimal,
    pub shipping_amount: Decimal,
    pub country: String,
    pub size: Option<String>,
    pub color: Option<String>,
    pub cart_id: CartId,
}

/// Line stored in the cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CartItem {
    pub id: CartItemId,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub sub_total: Option<Decimal>,
    #[serde(default)]
    pub shipping_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_fee: Option<Decimal>,
    #[serde(default)]
    pub service_fee: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// Aggregated cart amounts from `cart-detail/`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartTotals {
    #[serde(default)]
    pub shipping: Decimal,
    #[serde(default)]
    pub tax: Decimal,
    #[serde(default)]
    pub service_fee: Decimal,
    #[serde(default)]
    pub sub_total: Decimal,
    #[serde(default)]
    pub total: Decimal,
}

/// Shipping details for a new order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderInput {
    pub full_name: String,
    pub email: String,
    pub mobile: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub country: String,
    pub cart_id: CartId,
    pub user_id: Option<UserId>,
}

/// Line of a placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub qty: u32,
    #[serde(default)]
    pub price: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
}

/// A placed order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub oid: OrderOid,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub sub_total: Option<Decimal>,
    #[serde(default)]
    pub shipping_amount: Option<Decimal>,
    #[serde(default)]
    pub tax_fee: Option<Decimal>,
    #[serde(default)]
    pub service_fee: Option<Decimal>,
    #[serde(default)]
    pub total: Option<Decimal>,
    #[serde(default)]
    pub saved: Option<Decimal>,
    #[serde(default)]
    pub payment_status: Option<String>,
    #[serde(default)]
    pub order_status: Option<String>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub orderitem: Vec<OrderItem>,
}

// =============================================================================
// Accounts
// =============================================================================

/// Account profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub image: Option<String>,
    #[serde(default)]
    pub about: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

/// Editable profile fields; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProfileUpdate {
    pub full_name: Option<String>,
    pub about: Option<String>,
    pub gender: Option<String>,
    pub country: Option<String>,
    pub state: Option<String>,
    pub city: Option<String>,
    pub address: Option<String>,
}

impl ProfileUpdate {
    /// Multipart fields for the set values.
    #[must_use]
    pub fn into_fields(self) -> Vec<(String, String)> {
        [
            ("full_name", self.full_name),
            ("about", self.about),
            ("gender", self.gender),
            ("country", self.country),
            ("state", self.state),
            ("city", self.city),
            ("address", self.address),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

/// Account registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    pub password2: String,
}

/// Password change after following a reset link.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasswordChange {
    pub otp: String,
    pub uidb64: String,
    pub password: String,
}

/// `{message, status}` acknowledgement returned by cart, coupon and payment
/// endpoints.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ack {
    #[serde(default)]
    pub message: String,
    /// `success`, `warning`, `info` or `error` where the backend sends one.
    #[serde(default)]
    pub status: Option<String>,
}

/// Wishlist entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WishlistItem {
    #[serde(default)]
    pub id: Option<i32>,
    #[serde(default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub date: Option<String>,
}

/// Customer or vendor notification.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Notification {
    pub id: NotificationId,
    #[serde(default)]
    pub seen: bool,
    #[serde(default)]
    pub order: Option<Value>,
    #[serde(default)]
    pub order_item: Option<Value>,
    #[serde(default)]
    pub date: Option<String>,
}

// =============================================================================
// Vendor
// =============================================================================

/// Headline numbers for the vendor dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VendorStats {
    #[serde(default)]
    pub products: i64,
    #[serde(default)]
    pub orders: i64,
    #[serde(default)]
    pub revenue: Decimal,
}

/// Earning totals for the vendor earning page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Earning {
    #[serde(default)]
    pub monthly_revenue: Decimal,
    #[serde(default)]
    pub total_revenue: Decimal,
}

/// One month of the vendor earning tracker.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyEarning {
    pub month: u32,
    #[serde(default)]
    pub sales_count: i64,
    #[serde(default)]
    pub total_earning: Decimal,
}

/// Discount coupon owned by a vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Coupon {
    pub id: CouponId,
    pub code: String,
    #[serde(default)]
    pub discount: i32,
    #[serde(default)]
    pub active: bool,
    #[serde(default)]
    pub date: Option<String>,
}

/// Coupon creation or update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CouponInput {
    pub code: String,
    pub discount: i32,
    pub active: bool,
}

/// Coupon counts for the coupon page header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CouponStats {
    #[serde(default)]
    pub total_coupons: i64,
    #[serde(default)]
    pub active_coupons: i64,
}

/// Notification counts for the vendor console.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationSummary {
    #[serde(default)]
    pub un_read_noti: i64,
    #[serde(default)]
    pub read_noti: i64,
    #[serde(default)]
    pub all_noti: i64,
}

/// Editable shop fields.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShopUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub mobile: Option<String>,
    pub email: Option<String>,
}

impl ShopUpdate {
    /// Multipart fields for the set values.
    #[must_use]
    pub fn into_fields(self) -> Vec<(String, String)> {
        [
            ("name", self.name),
            ("description", self.description),
            ("mobile", self.mobile),
            ("email", self.email),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.map(|v| (name.to_string(), v)))
        .collect()
    }
}

/// Product form submitted by the vendor console.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductInput {
    pub title: String,
    pub description: String,
    pub category: i32,
    pub price: Decimal,
    pub old_price: Option<Decimal>,
    pub shipping_amount: Decimal,
    pub stock_qty: u32,
}

impl ProductInput {
    /// Multipart fields in the backend's `product_data[...]` layout.
    #[must_use]
    pub fn into_fields(self, vendor_id: VendorId) -> Vec<(String, String)> {
        let mut fields = vec![
            ("title".to_string(), self.title),
            ("description".to_string(), self.description),
            ("category".to_string(), self.category.to_string()),
            ("price".to_string(), self.price.to_string()),
            (
                "shipping_amount".to_string(),
                self.shipping_amount.to_string(),
            ),
            ("stock_qty".to_string(), self.stock_qty.to_string()),
            ("vendor".to_string(), vendor_id.to_string()),
        ];
        if let Some(old_price) = self.old_price {
            fields.push(("old_price".to_string(), old_price.to_string()));
        }
        fields
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use super::*;

    #[test]
    fn test_product_decodes_string_prices_and_ignores_unknown_fields() {
        let product: Product = serde_json::from_value(serde_json::json!({
            "id": 4,
            "title": "Rice cooker",
            "slug": "rice-cooker",
            "price": "49.99",
            "shipping_amount": "5.00",
            "views": 12,
            "size": [{ "name": "XL", "price": "2.00" }],
        }))
        .unwrap();

        assert_eq!(product.id, ProductId::new(4));
        assert_eq!(product.price, Some(Decimal::from_str("49.99").unwrap()));
        assert_eq!(product.size.first().unwrap().name, "XL");
        assert!(product.color.is_empty());
    }

    #[test]
    fn test_cart_totals_default_to_zero() {
        let totals: CartTotals = serde_json::from_value(serde_json::json!({ "total": 12.5 })).unwrap();
        assert_eq!(totals.total, Decimal::from_str("12.5").unwrap());
        assert_eq!(totals.shipping, Decimal::ZERO);
    }

    #[test]
    fn test_profile_update_only_sends_set_fields() {
        let update = ProfileUpdate {
            full_name: Some("Aiko Tan".into()),
            city: Some("Osaka".into()),
            ..ProfileUpdate::default()
        };
        assert_eq!(
            update.into_fields(),
            vec![
                ("full_name".to_string(), "Aiko Tan".to_string()),
                ("city".to_string(), "Osaka".to_string()),
            ]
        );
    }

    #[test]
    fn test_product_input_fields_include_vendor() {
        let input = ProductInput {
            title: "Teapot".into(),
            description: "Cast iron".into(),
            category: 2,
            price: Decimal::from_str("30.00").unwrap(),
            old_price: None,
            shipping_amount: Decimal::ZERO,
            stock_qty: 3,
        };
        let fields = input.into_fields(VendorId::new(9));
        assert!(fields.contains(&("vendor".to_string(), "9".to_string())));
        assert!(!fields.iter().any(|(name, _)| name == "old_price"));
    }
}
