//! Navigation cart badge.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use crate::state::{AppState, StateEvent, Subscription};

/// Mirrors [`AppState::cart_count`] for the navigation bar. Lives as long as
/// the app shell; dropping it unsubscribes.
#[derive(Debug)]
pub struct CartBadge {
    count: Arc<AtomicU32>,
    _subscription: Subscription,
}

impl CartBadge {
    /// Start mirroring `state`.
    pub fn attach(state: &AppState) -> Self {
        let count = Arc::new(AtomicU32::new(state.cart_count().get()));
        let sink = count.clone();
        let subscription = state.subscribe(move |event, _| {
            if let StateEvent::CartCountChanged(new) = event {
                sink.store(new.get(), Ordering::Release);
            }
        });
        Self {
            count,
            _subscription: subscription,
        }
    }

    #[must_use]
    pub fn count(&self) -> u32 {
        self.count.load(Ordering::Acquire)
    }

    /// Badge text; empty when the cart is empty.
    #[must_use]
    pub fn label(&self) -> String {
        match self.count() {
            0 => String::new(),
            n if n > 99 => "99+".to_string(),
            n => n.to_string(),
        }
    }
}
