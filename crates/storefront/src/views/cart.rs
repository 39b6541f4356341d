//! Cart page.
//!
//! Loading the cart is the one place the badge count is reconciled with the
//! backend: the number of lines listed becomes the new [`CartCount`]. A
//! failed listing leaves the count alone.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use futures::future::BoxFuture;
use koshimart_core::CartCount;

use super::{PageData, View, ViewContext};
use crate::error::Result;
use crate::router::ViewId;
use crate::state::{StateEvent, Subscription};

pub(super) async fn load(ctx: &ViewContext) -> Result<PageData> {
    let cart_id = ctx.state.cart_id();
    let user_id = ctx.state.session().and_then(|s| s.user_id());

    let (items, totals) = tokio::join!(
        ctx.api.cart_items(&cart_id, user_id),
        ctx.api.cart_totals(&cart_id, user_id),
    );
    let listed = items.as_ref().ok().map(|lines| CartCount::from_lines(lines.len()));
    let items = ctx.degrade(items)?;
    let totals = ctx.degrade(totals)?;

    if let Some(count) = listed {
        ctx.state.set_cart_count(count);
    }
    Ok(PageData::Cart { items, totals })
}

/// The cart view. While entered it watches the badge count and flags the
/// listing as stale when another action changes the cart underneath it.
#[derive(Debug, Default)]
pub struct CartPage {
    data: PageData,
    stale: Arc<AtomicBool>,
    subscription: Option<Subscription>,
}

impl CartPage {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` once the badge count moved away from the listed lines.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.stale.load(Ordering::Acquire)
    }

    fn listed(&self) -> CartCount {
        match &self.data {
            PageData::Cart { items, .. } => CartCount::from_lines(items.len()),
            _ => CartCount::ZERO,
        }
    }
}

impl View for CartPage {
    fn id(&self) -> ViewId {
        ViewId::Cart
    }

    fn on_enter<'a>(&'a mut self, ctx: &'a ViewContext) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move {
            self.subscription = None;
            self.data = load(ctx).await?;
            self.stale.store(false, Ordering::Release);

            let listed = self.listed();
            let stale = self.stale.clone();
            self.subscription = Some(ctx.state.subscribe(move |event, _| {
                if let StateEvent::CartCountChanged(count) = event {
                    if *count != listed {
                        stale.store(true, Ordering::Release);
                    }
                }
            }));
            Ok(())
        })
    }

    fn on_exit(&mut self, _ctx: &ViewContext) {
        self.subscription = None;
    }

    fn data(&self) -> &PageData {
        &self.data
    }
}
