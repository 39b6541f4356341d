//! Customer account pages.

use koshimart_core::OrderOid;

use super::{PageData, ViewContext};
use crate::error::Result;

pub(super) async fn orders(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    Ok(PageData::Orders {
        orders: ctx.degrade(ctx.api.customer_orders(user_id).await)?,
    })
}

/// Order detail and invoice share the same record.
pub(super) async fn order(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    let oid: OrderOid = ctx.param("oid")?;
    Ok(PageData::Order {
        order: ctx.degrade_opt(ctx.api.customer_order(user_id, &oid).await)?,
    })
}

/// Account overview and settings both start from the profile.
pub(super) async fn profile(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    Ok(PageData::Profile {
        profile: ctx.degrade_opt(ctx.api.profile(user_id).await)?,
    })
}

pub(super) async fn wishlist(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    Ok(PageData::Wishlist {
        items: ctx.degrade(ctx.api.wishlist(user_id).await)?,
    })
}

pub(super) async fn notifications(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    Ok(PageData::Notifications {
        notifications: ctx.degrade(ctx.api.customer_notifications(user_id).await)?,
    })
}
