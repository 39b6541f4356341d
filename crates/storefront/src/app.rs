//! The navigator.
//!
//! [`App`] owns the adapter, the state container and the current view. Each
//! navigation runs the state machine in [`crate::router`]:
//!
//! 1. resolve the path, renew an expired session and ask the guard;
//! 2. on `Redirect`, stop and report the target;
//! 3. otherwise call `on_exit` on the previous view, create the new view and
//!    await its `on_enter`.
//!
//! A navigation that started later wins. An earlier one whose `on_enter`
//! finishes afterwards is discarded: its view exits immediately and the
//! result is [`NavigationOutcome::Superseded`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{Value, json};
use tokio::sync::Mutex as AsyncMutex;
use tracing::instrument;

use crate::api::{ApiClient, Transport};
use crate::config::StorefrontConfig;
use crate::error::{Result, add_breadcrumb};
use crate::router::{Authorization, LOGIN_PATH, NavState, ViewId, authorize_match, resolve};
use crate::state::AppState;
use crate::views::{CartBadge, PageData, View, ViewContext, actions, create};

/// Redirect hops [`App::visit`] follows before giving up.
pub const MAX_REDIRECTS: usize = 3;

/// How a navigation ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationOutcome {
    /// The view was entered and is now current.
    Rendered(ViewId),
    /// The guard (or a 401 while loading) sent the user elsewhere.
    Redirected(&'static str),
    /// A later navigation replaced this one before it finished.
    Superseded,
}

/// The client application shell.
///
/// Cheaply cloneable; clones share the same views and state, so several
/// navigations may be in flight at once.
#[derive(Clone)]
pub struct App {
    inner: Arc<AppInner>,
}

struct AppInner {
    api: ApiClient,
    state: AppState,
    current: AsyncMutex<Option<Current>>,
    generation: AtomicU64,
    nav_state: Mutex<NavState>,
    badge: CartBadge,
}

struct Current {
    view: Box<dyn View>,
    ctx: ViewContext,
}

impl std::fmt::Debug for App {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("App")
            .field("api", &self.inner.api)
            .field("state", &self.inner.state)
            .field("nav_state", &self.nav_state())
            .finish_non_exhaustive()
    }
}

impl App {
    /// Create an app talking to the configured backend over HTTP.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn new(config: &StorefrontConfig) -> Result<Self> {
        let state = AppState::new();
        let api = ApiClient::new(config, Some(Arc::new(state.clone())))?;
        Ok(Self::assemble(api, state))
    }

    /// Create an app over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the configured user agent is invalid.
    pub fn with_transport(config: &StorefrontConfig, transport: Arc<dyn Transport>) -> Result<Self> {
        let state = AppState::new();
        let api = ApiClient::with_transport(config, transport, Some(Arc::new(state.clone())))?;
        Ok(Self::assemble(api, state))
    }

    fn assemble(api: ApiClient, state: AppState) -> Self {
        let badge = CartBadge::attach(&state);
        Self {
            inner: Arc::new(AppInner {
                api,
                state,
                current: AsyncMutex::new(None),
                generation: AtomicU64::new(0),
                nav_state: Mutex::new(NavState::Unresolved),
                badge,
            }),
        }
    }

    #[must_use]
    pub fn api(&self) -> &ApiClient {
        &self.inner.api
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.inner.state
    }

    /// Navigation-bar cart badge.
    #[must_use]
    pub fn badge(&self) -> &CartBadge {
        &self.inner.badge
    }

    /// State of the most recent navigation.
    #[must_use]
    pub fn nav_state(&self) -> NavState {
        *self
            .inner
            .nav_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// View currently rendered, if any.
    pub async fn current_view(&self) -> Option<ViewId> {
        self.inner.current.lock().await.as_ref().map(|c| c.view.id())
    }

    /// Page model of the current view.
    pub async fn current_data(&self) -> Option<PageData> {
        self.inner
            .current
            .lock()
            .await
            .as_ref()
            .map(|c| c.view.data().clone())
    }

    /// JSON picture of what is on screen.
    pub async fn snapshot(&self) -> Value {
        let current = self.inner.current.lock().await;
        let (path, view, data) = match current.as_ref() {
            Some(c) => (
                Some(c.ctx.route.path.clone()),
                Some(c.view.id().name()),
                serde_json::to_value(c.view.data()).unwrap_or(Value::Null),
            ),
            None => (None, None, Value::Null),
        };
        json!({
            "path": path,
            "view": view,
            "signed_in": self.inner.state.is_signed_in(),
            "cart_count": self.inner.badge.count(),
            "data": data,
        })
    }

    /// Navigate to `path` once, without following redirects.
    ///
    /// Never fails: backend failures other than a 401 are reported and the
    /// view still renders with whatever data it degraded to.
    #[instrument(skip(self), fields(generation = tracing::field::Empty))]
    pub async fn navigate(&self, path: &str) -> NavigationOutcome {
        let generation = self.inner.generation.fetch_add(1, Ordering::SeqCst) + 1;
        tracing::Span::current().record("generation", generation);
        self.set_nav_state(NavState::Unresolved);

        self.advance(NavState::Resolving);
        let route = resolve(path);
        add_breadcrumb(
            "navigation",
            "Navigate",
            Some(&[("path", path), ("view", route.view.name())]),
        );

        actions::renew_session(&self.inner.api, &self.inner.state).await;
        if let Authorization::Redirect(target) = authorize_match(&route, &self.inner.state) {
            self.advance(NavState::Unauthorized);
            self.advance(NavState::Redirecting);
            tracing::info!(path, target, "Guard redirected");
            return NavigationOutcome::Redirected(target);
        }
        self.advance(NavState::Authorized);

        if let Some(mut previous) = self.inner.current.lock().await.take() {
            tracing::debug!(view = %previous.view.id(), "Exiting view");
            previous.view.on_exit(&previous.ctx);
        }

        let ctx = ViewContext {
            api: self.inner.api.clone(),
            state: self.inner.state.clone(),
            route,
        };
        let mut view = create(ctx.route.view);
        tracing::debug!(view = %view.id(), "Entering view");
        let entered = view.on_enter(&ctx).await;

        let mut current = self.inner.current.lock().await;
        if self.inner.generation.load(Ordering::SeqCst) != generation {
            tracing::debug!(view = %view.id(), "Discarding superseded navigation");
            view.on_exit(&ctx);
            return NavigationOutcome::Superseded;
        }

        match entered {
            Err(err) if err.is_unauthorized() => {
                view.on_exit(&ctx);
                self.advance(NavState::Unauthorized);
                self.advance(NavState::Redirecting);
                tracing::info!(path, "Session rejected while loading, redirecting");
                return NavigationOutcome::Redirected(LOGIN_PATH);
            }
            Err(err) => err.report(),
            Ok(()) => {}
        }

        let id = view.id();
        *current = Some(Current { view, ctx });
        self.advance(NavState::Rendering);
        NavigationOutcome::Rendered(id)
    }

    /// Navigate to `path`, following up to [`MAX_REDIRECTS`] redirects.
    pub async fn visit(&self, path: &str) -> NavigationOutcome {
        let mut outcome = self.navigate(path).await;
        for _ in 0..MAX_REDIRECTS {
            let NavigationOutcome::Redirected(target) = outcome else {
                break;
            };
            outcome = self.navigate(target).await;
        }
        outcome
    }

    fn set_nav_state(&self, next: NavState) {
        *self
            .inner
            .nav_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = next;
    }

    fn advance(&self, next: NavState) {
        let mut nav_state = self
            .inner
            .nav_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if !nav_state.can_advance_to(next) {
            tracing::warn!(from = ?*nav_state, to = ?next, "Unexpected navigation transition");
        }
        tracing::debug!(from = ?*nav_state, to = ?next, "Navigation transition");
        *nav_state = next;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use koshimart_core::{CartCount, Session, UserId};
    use reqwest::StatusCode;

    use super::*;
    use crate::testing::{RecordingTransport, jwt, test_config};

    fn app(transport: &Arc<RecordingTransport>) -> App {
        App::with_transport(&test_config(), transport.clone()).unwrap()
    }

    #[tokio::test]
    async fn test_guest_is_redirected_to_login() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(&transport);

        let outcome = app.navigate("/orders").await;
        assert_eq!(outcome, NavigationOutcome::Redirected(LOGIN_PATH));
        assert_eq!(app.nav_state(), NavState::Redirecting);
        assert!(app.current_view().await.is_none());
        assert!(transport.requests().is_empty());

        assert_eq!(
            app.visit("/orders").await,
            NavigationOutcome::Rendered(ViewId::Login)
        );
        assert_eq!(app.current_view().await, Some(ViewId::Login));
    }

    #[tokio::test]
    async fn test_signed_in_user_renders_orders() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("customer/orders/7/", StatusCode::OK, r#"[{"oid":"a1"}]"#);
        let app = app(&transport);
        app.state().set_session(Session::new("token", Some(UserId::new(7))));

        let outcome = app.navigate("/orders").await;
        assert_eq!(outcome, NavigationOutcome::Rendered(ViewId::Orders));
        assert_eq!(app.nav_state(), NavState::Rendering);

        let snapshot = app.snapshot().await;
        assert_eq!(snapshot["view"], "Orders");
        assert_eq!(snapshot["data"]["orders"][0]["oid"], "a1");
    }

    #[tokio::test]
    async fn test_rejected_session_redirects_and_signs_out() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("customer/orders/7/", StatusCode::UNAUTHORIZED, "{}");
        let app = app(&transport);
        app.state().set_session(Session::new("stale", Some(UserId::new(7))));

        assert_eq!(
            app.visit("/orders").await,
            NavigationOutcome::Rendered(ViewId::Login)
        );
        assert!(!app.state().is_signed_in());
    }

    #[tokio::test]
    async fn test_expired_session_is_renewed_before_loading() {
        let transport = Arc::new(RecordingTransport::new());
        let fresh = jwt(&serde_json::json!({ "user_id": 7, "exp": 4_000_000_000_i64 }));
        transport.respond(
            "user/token/refresh/",
            StatusCode::OK,
            &serde_json::json!({ "access": fresh }).to_string(),
        );
        transport.respond("customer/orders/7/", StatusCode::OK, "[]");
        let app = app(&transport);
        let expired = jwt(&serde_json::json!({ "user_id": 7, "exp": 1_000 }));
        app.state()
            .set_session(Session::from_tokens(&expired, Some("refresh-7")).unwrap());

        assert_eq!(
            app.navigate("/orders").await,
            NavigationOutcome::Rendered(ViewId::Orders)
        );
        let session = app.state().session().unwrap();
        assert!(!session.is_expired());
        assert_eq!(session.access_token(), fresh);
        assert_eq!(session.refresh_token(), Some("refresh-7"));
        assert_eq!(
            transport.paths(),
            vec!["user/token/refresh/".to_string(), "customer/orders/7/".to_string()]
        );
    }

    #[tokio::test]
    async fn test_expired_session_without_refresh_token_is_signed_out() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(&transport);
        let expired = jwt(&serde_json::json!({ "user_id": 7, "exp": 1_000 }));
        app.state()
            .set_session(Session::from_tokens(&expired, None).unwrap());

        assert_eq!(
            app.navigate("/orders").await,
            NavigationOutcome::Redirected(LOGIN_PATH)
        );
        assert!(!app.state().is_signed_in());
        assert!(transport.requests().is_empty());
    }

    #[tokio::test]
    async fn test_vendor_renders_dashboard() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("vendor/products/2/", StatusCode::OK, r#"[{"id":3,"title":"Mug"}]"#);
        let app = app(&transport);
        let access = jwt(&serde_json::json!({ "user_id": 5, "vendor_id": 2 }));
        app.state()
            .set_session(Session::from_tokens(&access, None).unwrap());

        assert_eq!(
            app.navigate("/admin").await,
            NavigationOutcome::Rendered(ViewId::Dashboard)
        );
        let snapshot = app.snapshot().await;
        assert_eq!(snapshot["view"], "Dashboard");
        assert_eq!(snapshot["data"]["products"][0]["title"], "Mug");
    }

    #[tokio::test]
    async fn test_unknown_path_renders_not_found() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(&transport);

        assert_eq!(
            app.navigate("/nowhere").await,
            NavigationOutcome::Rendered(ViewId::NotFound)
        );
    }

    #[tokio::test]
    async fn test_backend_failure_still_renders() {
        let transport = Arc::new(RecordingTransport::new());
        transport.fail("category/", "connection refused");
        transport.fail("products/", "connection refused");
        let app = app(&transport);

        assert_eq!(
            app.navigate("/").await,
            NavigationOutcome::Rendered(ViewId::Products)
        );
        assert_eq!(
            app.current_data().await,
            Some(PageData::Catalog {
                categories: Vec::new(),
                products: Vec::new()
            })
        );
    }

    #[tokio::test]
    async fn test_leaving_cart_drops_its_subscription() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(&transport);
        let badge_only = app.state().observer_count();

        let _ = app.navigate("/cart").await;
        assert_eq!(app.state().observer_count(), badge_only + 1);

        let _ = app.navigate("/").await;
        assert_eq!(app.state().observer_count(), badge_only);
    }

    #[tokio::test]
    async fn test_logout_route_resets_badge() {
        let transport = Arc::new(RecordingTransport::new());
        let app = app(&transport);
        app.state().set_session(Session::new("token", Some(UserId::new(7))));
        app.state().set_cart_count(CartCount::new(3));
        assert_eq!(app.badge().count(), 3);

        let _ = app.navigate("/logout").await;
        assert_eq!(app.badge().count(), 0);
        assert!(!app.state().is_signed_in());
    }

    #[tokio::test]
    async fn test_slow_navigation_is_superseded() {
        let transport = Arc::new(RecordingTransport::new());
        transport.respond("products/teapot/", StatusCode::OK, r#"{"id":12,"title":"Teapot"}"#);
        let gate = transport.gate("products/teapot/");
        let app = app(&transport);

        let slow = app.navigate("/detail/teapot");
        let fast = async {
            let outcome = app.navigate("/login").await;
            gate.notify_one();
            outcome
        };
        let (slow, fast) = tokio::join!(slow, fast);

        assert_eq!(slow, NavigationOutcome::Superseded);
        assert_eq!(fast, NavigationOutcome::Rendered(ViewId::Login));
        assert_eq!(app.current_view().await, Some(ViewId::Login));
    }
}
