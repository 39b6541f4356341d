//! Session and cart state shared across views.
//!
//! [`AppState`] is the single owner of the cross-view UI state: the current
//! [`Session`] and the cart badge [`CartCount`] (plus the anonymous
//! [`CartId`] the cart endpoints are keyed by). Views hold a cheap clone of
//! the handle, read through the getters and request changes through the
//! setters; nothing else can mutate the state.
//!
//! # Notifications
//!
//! Every setter notifies all current subscribers synchronously, in
//! registration order, before it returns. Writes from different threads are
//! serialized, and events are delivered in the order the writes happened. An
//! observer may call a setter itself; that nested event is delivered right
//! after the current round instead of recursing, still before the outermost
//! setter returns.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, Weak};
use std::thread::{self, ThreadId};

use koshimart_core::{CartCount, CartId, Session, UserId};

use crate::api::CredentialProvider;

/// A change announced to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateEvent {
    /// A session was stored (login or token refresh).
    SessionStarted {
        /// User id carried by the new session.
        user_id: Option<UserId>,
    },
    /// The session was removed (logout or rejected credentials).
    SessionCleared,
    /// The cart badge count was written.
    CartCountChanged(CartCount),
}

/// Identifier of a registered observer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&StateEvent, &AppState) + Send + Sync>;

/// Shared, observable session/cart container.
///
/// Cheaply cloneable via `Arc`; all clones refer to the same state.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    values: RwLock<Values>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
    dispatch: Mutex<Dispatch>,
    /// Held by the thread currently delivering events.
    turn: Mutex<()>,
    next_id: AtomicU64,
}

#[derive(Default)]
struct Values {
    session: Option<Session>,
    cart_count: CartCount,
    cart_id: Option<CartId>,
}

#[derive(Default)]
struct Dispatch {
    owner: Option<ThreadId>,
    queue: VecDeque<StateEvent>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("signed_in", &self.is_signed_in())
            .field("cart_count", &self.cart_count())
            .field("observers", &self.observer_count())
            .finish()
    }
}

impl AppState {
    /// Create an empty container: no session, cart count zero.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: Arc::new(AppStateInner {
                values: RwLock::new(Values::default()),
                observers: Mutex::new(Vec::new()),
                dispatch: Mutex::new(Dispatch::default()),
                turn: Mutex::new(()),
                next_id: AtomicU64::new(1),
            }),
        }
    }

    // =========================================================================
    // Session
    // =========================================================================

    /// The current session, if any.
    #[must_use]
    pub fn session(&self) -> Option<Session> {
        self.read(|values| values.session.clone())
    }

    /// Returns `true` if a session is stored.
    #[must_use]
    pub fn is_signed_in(&self) -> bool {
        self.read(|values| values.session.is_some())
    }

    /// Store a session and notify subscribers.
    ///
    /// Called from inside an observer, the value is written at once but the
    /// event is queued behind the current round, so this call returns before
    /// any subscriber has seen it. The outermost setter still returns only
    /// after every queued event is delivered.
    pub fn set_session(&self, session: Session) {
        let user_id = session.user_id();
        self.write(StateEvent::SessionStarted { user_id }, move |values| {
            values.session = Some(session);
        });
    }

    /// Remove the session and notify subscribers.
    ///
    /// Called from inside an observer, the value is written at once but the
    /// event is queued behind the current round, so this call returns before
    /// any subscriber has seen it. The outermost setter still returns only
    /// after every queued event is delivered.
    pub fn clear_session(&self) {
        self.write(StateEvent::SessionCleared, |values| {
            values.session = None;
        });
    }

    // =========================================================================
    // Cart
    // =========================================================================

    /// The cart badge count.
    #[must_use]
    pub fn cart_count(&self) -> CartCount {
        self.read(|values| values.cart_count)
    }

    /// Write the cart badge count and notify subscribers.
    ///
    /// Called from inside an observer, the value is written at once but the
    /// event is queued behind the current round, so this call returns before
    /// any subscriber has seen it. The outermost setter still returns only
    /// after every queued event is delivered.
    pub fn set_cart_count(&self, count: CartCount) {
        self.write(StateEvent::CartCountChanged(count), move |values| {
            values.cart_count = count;
        });
    }

    /// The anonymous cart id, generated on first use.
    #[must_use]
    pub fn cart_id(&self) -> CartId {
        if let Some(id) = self.read(|values| values.cart_id.clone()) {
            return id;
        }
        let mut values = self
            .inner
            .values
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        values.cart_id.get_or_insert_with(CartId::generate).clone()
    }

    /// Start a new, empty cart (after a completed order) and notify
    /// subscribers of the zero count.
    pub fn reset_cart(&self) {
        self.write(StateEvent::CartCountChanged(CartCount::ZERO), |values| {
            values.cart_id = Some(CartId::generate());
            values.cart_count = CartCount::ZERO;
        });
    }

    // =========================================================================
    // Subscriptions
    // =========================================================================

    /// Register an observer.
    ///
    /// The observer receives the event and a handle to this container for
    /// reads. It stays registered until the returned [`Subscription`] is
    /// dropped or [`Subscription::unsubscribe`] is called.
    pub fn subscribe<F>(&self, observer: F) -> Subscription
    where
        F: Fn(&StateEvent, &Self) + Send + Sync + 'static,
    {
        let id = SubscriptionId(self.inner.next_id.fetch_add(1, Ordering::Relaxed));
        let observer: Observer = Arc::new(observer);
        lock(&self.inner.observers).push((id, observer));
        tracing::trace!(subscription = id.0, "Observer subscribed");

        Subscription {
            id,
            state: Arc::downgrade(&self.inner),
        }
    }

    /// Number of registered observers.
    #[must_use]
    pub fn observer_count(&self) -> usize {
        lock(&self.inner.observers).len()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn read<T>(&self, f: impl FnOnce(&Values) -> T) -> T {
        let values = self
            .inner
            .values
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        f(&values)
    }

    /// Apply a mutation and deliver its event.
    ///
    /// The mutation and the enqueue happen under the dispatch lock so the
    /// event order always matches the write order.
    fn write(&self, event: StateEvent, mutate: impl FnOnce(&mut Values)) {
        let me = thread::current().id();
        {
            let mut dispatch = lock(&self.inner.dispatch);
            {
                let mut values = self
                    .inner
                    .values
                    .write()
                    .unwrap_or_else(PoisonError::into_inner);
                mutate(&mut values);
            }
            dispatch.queue.push_back(event);
            if dispatch.owner == Some(me) {
                // Nested write from an observer: the running loop delivers it.
                return;
            }
        }

        let _turn = lock(&self.inner.turn);
        let _owner = OwnerGuard::claim(&self.inner.dispatch, me);
        loop {
            let next = lock(&self.inner.dispatch).queue.pop_front();
            let Some(event) = next else { break };
            self.deliver(&event);
        }
    }

    fn deliver(&self, event: &StateEvent) {
        let snapshot: Vec<(SubscriptionId, Observer)> = lock(&self.inner.observers).clone();
        tracing::debug!(?event, observers = snapshot.len(), "Notifying observers");

        for (id, observer) in snapshot {
            // Skip observers removed earlier in this round.
            let live = lock(&self.inner.observers)
                .iter()
                .any(|(other, _)| *other == id);
            if live {
                observer(event, self);
            }
        }
    }
}

/// Marks the current thread as the event deliverer until dropped, even if an
/// observer panics.
struct OwnerGuard<'a> {
    dispatch: &'a Mutex<Dispatch>,
}

impl<'a> OwnerGuard<'a> {
    fn claim(dispatch: &'a Mutex<Dispatch>, owner: ThreadId) -> Self {
        lock(dispatch).owner = Some(owner);
        Self { dispatch }
    }
}

impl Drop for OwnerGuard<'_> {
    fn drop(&mut self) {
        lock(self.dispatch).owner = None;
    }
}

impl CredentialProvider for AppState {
    fn bearer_token(&self) -> Option<String> {
        self.read(|values| {
            values
                .session
                .as_ref()
                .map(|session| session.access_token().to_owned())
        })
    }

    fn credentials_rejected(&self) {
        if self.is_signed_in() {
            tracing::warn!("Backend rejected the session credentials, signing out");
            self.clear_session();
        }
    }
}

/// Registration handle returned by [`AppState::subscribe`].
///
/// Dropping it unsubscribes the observer. Views keep their subscriptions in
/// their own state so leaving the view tears them down.
#[derive(Debug)]
#[must_use = "dropping the Subscription unsubscribes immediately"]
pub struct Subscription {
    id: SubscriptionId,
    state: Weak<AppStateInner>,
}

impl Subscription {
    /// Identifier of the observer.
    #[must_use]
    pub const fn id(&self) -> SubscriptionId {
        self.id
    }

    /// Unsubscribe now.
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(inner) = self.state.upgrade() {
            lock(&inner.observers).retain(|(id, _)| *id != self.id);
            tracing::trace!(subscription = self.id.0, "Observer unsubscribed");
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    fn recorder(state: &AppState) -> (Subscription, Arc<Mutex<Vec<StateEvent>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let subscription = state.subscribe(move |event, _| sink.lock().unwrap().push(event.clone()));
        (subscription, seen)
    }

    #[test]
    fn test_initial_state() {
        let state = AppState::new();
        assert!(state.session().is_none());
        assert!(!state.is_signed_in());
        assert_eq!(state.cart_count(), CartCount::ZERO);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn test_session_lifecycle() {
        let state = AppState::new();
        state.set_session(Session::new("token", Some(UserId::new(8))));
        assert_eq!(state.session().unwrap().user_id(), Some(UserId::new(8)));
        assert_eq!(state.bearer_token().as_deref(), Some("token"));

        state.clear_session();
        assert!(state.session().is_none());
        assert!(state.bearer_token().is_none());
    }

    #[test]
    fn test_two_writes_two_notifications_final_value() {
        let state = AppState::new();
        let (_subscription, seen) = recorder(&state);

        state.set_cart_count(CartCount::new(0));
        state.set_cart_count(CartCount::new(3));

        let seen = seen.lock().unwrap();
        assert_eq!(
            *seen,
            vec![
                StateEvent::CartCountChanged(CartCount::new(0)),
                StateEvent::CartCountChanged(CartCount::new(3)),
            ]
        );
        assert_eq!(state.cart_count(), CartCount::new(3));
    }

    #[test]
    fn test_observers_read_new_value_in_registration_order() {
        let state = AppState::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        let first_log = order.clone();
        let _first = state.subscribe(move |_, state| {
            first_log.lock().unwrap().push(("first", state.cart_count()));
        });
        let second_log = order.clone();
        let _second = state.subscribe(move |_, state| {
            second_log.lock().unwrap().push(("second", state.cart_count()));
        });

        state.set_cart_count(CartCount::new(5));

        assert_eq!(
            *order.lock().unwrap(),
            vec![("first", CartCount::new(5)), ("second", CartCount::new(5))]
        );
    }

    #[test]
    fn test_dropping_subscription_stops_notifications() {
        let state = AppState::new();
        let (subscription, seen) = recorder(&state);

        state.set_cart_count(CartCount::new(1));
        subscription.unsubscribe();
        state.set_cart_count(CartCount::new(2));

        assert_eq!(seen.lock().unwrap().len(), 1);
        assert_eq!(state.observer_count(), 0);
    }

    #[test]
    fn test_subscription_outliving_state_is_harmless() {
        let state = AppState::new();
        let (subscription, _seen) = recorder(&state);
        drop(state);
        drop(subscription);
    }

    #[test]
    fn test_nested_write_is_delivered_before_outer_setter_returns() {
        let state = AppState::new();
        let (_recorder, seen) = recorder(&state);
        let _resetter = state.subscribe(|event, state| {
            if *event == StateEvent::SessionCleared {
                state.set_cart_count(CartCount::ZERO);
            }
        });

        state.set_cart_count(CartCount::new(4));
        state.clear_session();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                StateEvent::CartCountChanged(CartCount::new(4)),
                StateEvent::SessionCleared,
                StateEvent::CartCountChanged(CartCount::ZERO),
            ]
        );
        assert_eq!(state.cart_count(), CartCount::ZERO);
    }

    #[test]
    fn test_nested_setter_returns_before_its_event_is_delivered() {
        let state = AppState::new();
        let (_recorder, seen) = recorder(&state);
        let during = Arc::new(Mutex::new(None));
        let during_in_observer = during.clone();
        let seen_in_observer = seen.clone();
        let _resetter = state.subscribe(move |event, state| {
            if *event == StateEvent::SessionCleared {
                state.set_cart_count(CartCount::new(9));
                *during_in_observer.lock().unwrap() =
                    Some((state.cart_count(), seen_in_observer.lock().unwrap().len()));
            }
        });

        state.clear_session();

        // Value already written, event not yet seen by the recorder.
        assert_eq!(*during.lock().unwrap(), Some((CartCount::new(9), 1)));
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_observer_unsubscribed_mid_round_is_skipped() {
        let state = AppState::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let victim_slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let slot = victim_slot.clone();
        let _killer = state.subscribe(move |_, _| {
            slot.lock().unwrap().take();
        });
        let counter = calls.clone();
        let victim = state.subscribe(move |_, _| {
            counter.fetch_add(1, Ordering::SeqCst);
        });
        *victim_slot.lock().unwrap() = Some(victim);

        state.set_cart_count(CartCount::new(1));
        assert_eq!(calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_writes_from_many_threads_are_all_delivered() {
        let state = AppState::new();
        let (_subscription, seen) = recorder(&state);

        let handles: Vec<_> = (1..=8)
            .map(|n| {
                let state = state.clone();
                thread::spawn(move || state.set_cart_count(CartCount::new(n)))
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 8);
        assert_eq!(
            seen.last().unwrap(),
            &StateEvent::CartCountChanged(state.cart_count())
        );
    }

    #[test]
    fn test_cart_id_is_stable_until_reset() {
        let state = AppState::new();
        let first = state.cart_id();
        assert_eq!(state.cart_id(), first);

        state.set_cart_count(CartCount::new(2));
        state.reset_cart();
        assert_ne!(state.cart_id(), first);
        assert_eq!(state.cart_count(), CartCount::ZERO);
    }

    #[test]
    fn test_credentials_rejected_clears_session() {
        let state = AppState::new();
        let (_subscription, seen) = recorder(&state);
        state.set_session(Session::new("expired", None));

        state.credentials_rejected();
        assert!(!state.is_signed_in());

        // Already signed out: no second event.
        state.credentials_rejected();
        assert_eq!(
            *seen.lock().unwrap(),
            vec![
                StateEvent::SessionStarted { user_id: None },
                StateEvent::SessionCleared,
            ]
        );
    }
}
