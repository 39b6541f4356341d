//! Vendor console pages under `/admin`.
//!
//! Pages fetch their independent sections concurrently; each section
//! degrades on its own.

use koshimart_core::{OrderOid, ProductId};

use super::{PageData, ViewContext};
use crate::error::Result;

pub(super) async fn dashboard(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let (stats, products, orders) = tokio::join!(
        ctx.api.vendor_stats(vendor_id),
        ctx.api.vendor_products(vendor_id),
        ctx.api.vendor_orders(vendor_id),
    );
    Ok(PageData::Dashboard {
        stats: ctx.degrade(stats)?,
        products: ctx.degrade(products)?,
        orders: ctx.degrade(orders)?,
    })
}

pub(super) async fn earning(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let (earning, monthly) = tokio::join!(
        ctx.api.vendor_earning(vendor_id),
        ctx.api.vendor_monthly_earning(vendor_id),
    );
    Ok(PageData::Earning {
        earning: ctx.degrade(earning)?,
        monthly: ctx.degrade(monthly)?,
    })
}

pub(super) async fn orders(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    Ok(PageData::Orders {
        orders: ctx.degrade(ctx.api.vendor_orders(vendor_id).await)?,
    })
}

pub(super) async fn order(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let oid: OrderOid = ctx.param("oid")?;
    Ok(PageData::Order {
        order: ctx.degrade_opt(ctx.api.vendor_order(vendor_id, &oid).await)?,
    })
}

pub(super) async fn notifications(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let (summary, unseen, seen) = tokio::join!(
        ctx.api.vendor_notification_summary(vendor_id),
        ctx.api.vendor_unseen_notifications(vendor_id),
        ctx.api.vendor_seen_notifications(vendor_id),
    );
    Ok(PageData::VendorNotifications {
        summary: ctx.degrade(summary)?,
        unseen: ctx.degrade(unseen)?,
        seen: ctx.degrade(seen)?,
    })
}

pub(super) async fn reviews(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    Ok(PageData::Reviews {
        reviews: ctx.degrade(ctx.api.vendor_reviews(vendor_id).await)?,
    })
}

pub(super) async fn coupons(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let (stats, coupons) = tokio::join!(
        ctx.api.vendor_coupon_stats(vendor_id),
        ctx.api.vendor_coupons(vendor_id),
    );
    Ok(PageData::Coupons {
        stats: ctx.degrade(stats)?,
        coupons: ctx.degrade(coupons)?,
    })
}

pub(super) async fn shop(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let (shop, products) = tokio::join!(
        ctx.api.vendor_shop(vendor_id),
        ctx.api.vendor_products(vendor_id),
    );
    Ok(PageData::Shop {
        shop: ctx.degrade_opt(shop)?,
        products: ctx.degrade(products)?,
    })
}

pub(super) async fn settings(ctx: &ViewContext) -> Result<PageData> {
    let user_id = ctx.user_id()?;
    let vendor_id = ctx.vendor_id()?;
    let (profile, shop) = tokio::join!(
        ctx.api.vendor_profile(user_id),
        ctx.api.vendor_shop(vendor_id),
    );
    Ok(PageData::VendorSettings {
        profile: ctx.degrade_opt(profile)?,
        shop: ctx.degrade_opt(shop)?,
    })
}

pub(super) async fn products(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    Ok(PageData::Products {
        products: ctx.degrade(ctx.api.vendor_products(vendor_id).await)?,
    })
}

/// Add and update share the form; update also loads the product.
pub(super) async fn product_form(ctx: &ViewContext) -> Result<PageData> {
    let vendor_id = ctx.vendor_id()?;
    let product_id = match ctx.route.param("pid") {
        Some(_) => Some(ctx.param::<ProductId>("pid")?),
        None => None,
    };

    let categories = ctx.degrade(ctx.api.categories().await)?;
    let product = match product_id {
        Some(product_id) => {
            ctx.degrade_opt(ctx.api.vendor_product(vendor_id, product_id).await)?
        }
        None => None,
    };
    Ok(PageData::ProductForm {
        categories,
        product,
    })
}
