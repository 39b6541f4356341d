//! Customer account endpoints: orders, wishlist and notifications.

use koshimart_core::{NotificationId, OrderOid, ProductId, UserId};

use super::client::{ApiClient, decode};
use super::error::ApiError;
use super::types::{Ack, Notification, Order, WishlistItem};

impl ApiClient {
    /// A customer's orders, newest first.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn customer_orders(&self, user_id: UserId) -> Result<Vec<Order>, ApiError> {
        decode(self.get(&format!("customer/orders/{user_id}/")).await?)
    }

    /// One of a customer's orders.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn customer_order(&self, user_id: UserId, oid: &OrderOid) -> Result<Order, ApiError> {
        decode(
            self.get(&format!("customer/order/{user_id}/{oid}/"))
                .await?,
        )
    }

    /// A customer's wishlist.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn wishlist(&self, user_id: UserId) -> Result<Vec<WishlistItem>, ApiError> {
        decode(self.get(&format!("customer/wishlist/{user_id}/")).await?)
    }

    /// Toggle a product on the wishlist. The backend removes it when it is
    /// already present.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn toggle_wishlist(
        &self,
        user_id: UserId,
        product_id: ProductId,
    ) -> Result<Ack, ApiError> {
        decode(
            self.post_json(
                &format!("customer/wishlist/{user_id}/"),
                &serde_json::json!({ "product_id": product_id, "user_id": user_id }),
            )
            .await?,
        )
    }

    /// Unseen notifications for a customer.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn customer_notifications(
        &self,
        user_id: UserId,
    ) -> Result<Vec<Notification>, ApiError> {
        decode(
            self.get(&format!("customer/notification/{user_id}/"))
                .await?,
        )
    }

    /// Mark a customer notification as seen.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn mark_customer_notification_seen(
        &self,
        user_id: UserId,
        notification_id: NotificationId,
    ) -> Result<Notification, ApiError> {
        decode(
            self.get(&format!(
                "customer/notification/{user_id}/{notification_id}/"
            ))
            .await?,
        )
    }
}
