//! Vendor console endpoints.
//!
//! Summary endpoints answer with a one-element list; the helpers unwrap it
//! and fall back to zeroed totals when the list is empty.

use koshimart_core::{CouponId, NotificationId, OrderOid, ProductId, ReviewId, Slug, UserId, VendorId};
use serde::de::DeserializeOwned;
use serde_json::Value;

use super::client::{ApiClient, decode};
use super::error::ApiError;
use super::transport::RequestBody;
use super::types::{
    Coupon, CouponInput, CouponStats, Earning, MonthlyEarning, Notification, NotificationSummary,
    Order, Product, ProductInput, Profile, ProfileUpdate, Review, Shop, ShopUpdate, VendorStats,
};

fn first_or_default<T: DeserializeOwned + Default>(payload: Value) -> Result<T, ApiError> {
    let rows: Vec<T> = decode(payload)?;
    Ok(rows.into_iter().next().unwrap_or_default())
}

impl ApiClient {
    // =========================================================================
    // Dashboard
    // =========================================================================

    /// Product, order and revenue totals.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_stats(&self, vendor_id: VendorId) -> Result<VendorStats, ApiError> {
        first_or_default(self.get(&format!("vendor/stats/{vendor_id}/")).await?)
    }

    /// The vendor's products.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_products(&self, vendor_id: VendorId) -> Result<Vec<Product>, ApiError> {
        decode(self.get(&format!("vendor/products/{vendor_id}/")).await?)
    }

    /// Paid orders containing the vendor's products.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_orders(&self, vendor_id: VendorId) -> Result<Vec<Order>, ApiError> {
        decode(self.get(&format!("vendor/orders/{vendor_id}/")).await?)
    }

    /// One order as seen by the vendor.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_order(
        &self,
        vendor_id: VendorId,
        oid: &OrderOid,
    ) -> Result<Order, ApiError> {
        decode(self.get(&format!("vendor/orders/{vendor_id}/{oid}/")).await?)
    }

    /// Raw revenue rows.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_revenue(&self, vendor_id: VendorId) -> Result<Value, ApiError> {
        self.get(&format!("vendor/revenue/{vendor_id}/")).await
    }

    // =========================================================================
    // Earning
    // =========================================================================

    /// Monthly and all-time revenue.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_earning(&self, vendor_id: VendorId) -> Result<Earning, ApiError> {
        first_or_default(self.get(&format!("vendor-earning/{vendor_id}/")).await?)
    }

    /// Sales and earning per month, latest month first.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_monthly_earning(
        &self,
        vendor_id: VendorId,
    ) -> Result<Vec<MonthlyEarning>, ApiError> {
        decode(
            self.get(&format!("vendor-monthly-earning/{vendor_id}/"))
                .await?,
        )
    }

    // =========================================================================
    // Reviews
    // =========================================================================

    /// Reviews of the vendor's products.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_reviews(&self, vendor_id: VendorId) -> Result<Vec<Review>, ApiError> {
        decode(self.get(&format!("vendor-reviews/{vendor_id}/")).await?)
    }

    /// Reply to a review.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for an empty
    /// reply.
    pub async fn reply_to_review(
        &self,
        vendor_id: VendorId,
        review_id: ReviewId,
        reply: &str,
    ) -> Result<Review, ApiError> {
        let reply = reply.trim();
        if reply.is_empty() {
            return Err(ApiError::InvalidInput("reply is empty".into()));
        }
        decode(
            self.patch_json(
                &format!("vendor-reviews/{vendor_id}/{review_id}/"),
                &serde_json::json!({ "reply": reply }),
            )
            .await?,
        )
    }

    // =========================================================================
    // Coupons
    // =========================================================================

    /// The vendor's coupons.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_coupons(&self, vendor_id: VendorId) -> Result<Vec<Coupon>, ApiError> {
        decode(self.get(&format!("vendor-coupon-list/{vendor_id}/")).await?)
    }

    /// Create a coupon.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a blank code
    /// or a discount outside 1-100.
    pub async fn create_coupon(
        &self,
        vendor_id: VendorId,
        input: &CouponInput,
    ) -> Result<Value, ApiError> {
        validate_coupon(input)?;
        self.post_json(
            &format!("vendor-coupon-list/{vendor_id}/"),
            &serde_json::json!({
                "vendor_id": vendor_id,
                "code": input.code.trim(),
                "discount": input.discount,
                "active": input.active,
            }),
        )
        .await
    }

    /// One coupon.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_coupon(
        &self,
        vendor_id: VendorId,
        coupon_id: CouponId,
    ) -> Result<Coupon, ApiError> {
        decode(
            self.get(&format!("vendor-coupon-detail/{vendor_id}/{coupon_id}/"))
                .await?,
        )
    }

    /// Update a coupon.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create_coupon`].
    pub async fn update_coupon(
        &self,
        vendor_id: VendorId,
        coupon_id: CouponId,
        input: &CouponInput,
    ) -> Result<Coupon, ApiError> {
        validate_coupon(input)?;
        decode(
            self.patch_json(
                &format!("vendor-coupon-detail/{vendor_id}/{coupon_id}/"),
                input,
            )
            .await?,
        )
    }

    /// Delete a coupon.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn delete_coupon(&self, vendor_id: VendorId, coupon_id: CouponId) -> Result<(), ApiError> {
        self.delete(&format!("vendor-coupon-detail/{vendor_id}/{coupon_id}/"))
            .await
            .map(|_| ())
    }

    /// Total and active coupon counts.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_coupon_stats(&self, vendor_id: VendorId) -> Result<CouponStats, ApiError> {
        first_or_default(self.get(&format!("vendor-coupon-stats/{vendor_id}/")).await?)
    }

    // =========================================================================
    // Notifications
    // =========================================================================

    /// Unseen notifications.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_unseen_notifications(
        &self,
        vendor_id: VendorId,
    ) -> Result<Vec<Notification>, ApiError> {
        decode(self.get(&format!("vendor-noti-unseen/{vendor_id}/")).await?)
    }

    /// Seen notifications.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_seen_notifications(
        &self,
        vendor_id: VendorId,
    ) -> Result<Vec<Notification>, ApiError> {
        decode(self.get(&format!("vendor-noti-seen/{vendor_id}/")).await?)
    }

    /// Read, unread and total notification counts.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_notification_summary(
        &self,
        vendor_id: VendorId,
    ) -> Result<NotificationSummary, ApiError> {
        first_or_default(self.get(&format!("vendor-noti-summary/{vendor_id}/")).await?)
    }

    /// Mark a vendor notification as seen.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn mark_vendor_notification_seen(
        &self,
        vendor_id: VendorId,
        notification_id: NotificationId,
    ) -> Result<Notification, ApiError> {
        decode(
            self.get(&format!(
                "vendor-noti-mark-as-seen/{vendor_id}/{notification_id}/"
            ))
            .await?,
        )
    }

    // =========================================================================
    // Settings & shop
    // =========================================================================

    /// The vendor's personal profile.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_profile(&self, user_id: UserId) -> Result<Profile, ApiError> {
        decode(self.get(&format!("vendor-settings/{user_id}/")).await?)
    }

    /// The vendor's own shop details.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_shop(&self, vendor_id: VendorId) -> Result<Shop, ApiError> {
        decode(self.get(&format!("vendor-shop-settings/{vendor_id}/")).await?)
    }

    /// Update the vendor's personal profile.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn update_vendor_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, ApiError> {
        decode(
            self.request(
                reqwest::Method::PATCH,
                &format!("vendor-settings/{user_id}/"),
                Some(RequestBody::Multipart(update.into_fields())),
            )
            .await?,
        )
    }

    /// Update shop details.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn update_shop(&self, vendor_id: VendorId, update: ShopUpdate) -> Result<Shop, ApiError> {
        decode(
            self.request(
                reqwest::Method::PATCH,
                &format!("vendor-shop-settings/{vendor_id}/"),
                Some(RequestBody::Multipart(update.into_fields())),
            )
            .await?,
        )
    }

    /// Public shop page.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn shop(&self, slug: &Slug) -> Result<Shop, ApiError> {
        decode(self.get(&format!("shop/{slug}/")).await?)
    }

    /// Products listed on a public shop page.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn shop_products(&self, slug: &Slug) -> Result<Vec<Product>, ApiError> {
        decode(self.get(&format!("vendor-products/{slug}/")).await?)
    }

    // =========================================================================
    // Product management
    // =========================================================================

    /// Create a product.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for a blank title
    /// or a non-positive price.
    pub async fn create_product(
        &self,
        vendor_id: VendorId,
        input: ProductInput,
    ) -> Result<Value, ApiError> {
        validate_product(&input)?;
        self.post_multipart(
            &format!("vendor-product-create/{vendor_id}/"),
            input.into_fields(vendor_id),
        )
        .await
    }

    /// A product as stored for editing.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn vendor_product(
        &self,
        vendor_id: VendorId,
        product_id: ProductId,
    ) -> Result<Product, ApiError> {
        decode(
            self.get(&format!("vendor-product-edit/{vendor_id}/{product_id}/"))
                .await?,
        )
    }

    /// Replace a product's details.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::create_product`].
    pub async fn update_product(
        &self,
        vendor_id: VendorId,
        product_id: ProductId,
        input: ProductInput,
    ) -> Result<Value, ApiError> {
        validate_product(&input)?;
        self.request(
            reqwest::Method::PATCH,
            &format!("vendor-product-edit/{vendor_id}/{product_id}/"),
            Some(RequestBody::Multipart(input.into_fields(vendor_id))),
        )
        .await
    }
}

fn validate_coupon(input: &CouponInput) -> Result<(), ApiError> {
    if input.code.trim().is_empty() {
        return Err(ApiError::InvalidInput("coupon code is empty".into()));
    }
    if !(1..=100).contains(&input.discount) {
        return Err(ApiError::InvalidInput(format!(
            "discount must be between 1 and 100, got {}",
            input.discount
        )));
    }
    Ok(())
}

fn validate_product(input: &ProductInput) -> Result<(), ApiError> {
    if input.title.trim().is_empty() {
        return Err(ApiError::InvalidInput("product title is empty".into()));
    }
    if input.price <= rust_decimal::Decimal::ZERO {
        return Err(ApiError::InvalidInput("price must be positive".into()));
    }
    Ok(())
}
