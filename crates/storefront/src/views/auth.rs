//! Account pages.

use super::{PageData, ViewContext};
use crate::error::{AppError, Result};

/// `/reset-password/:uid/:token` keeps the link parameters for the form.
pub(super) fn password_reset(ctx: &ViewContext) -> Result<PageData> {
    let uid = ctx.route.param("uid").unwrap_or_default();
    let token = ctx.route.param("token").unwrap_or_default();
    if uid.is_empty() || token.is_empty() {
        return Err(AppError::InvalidInput("reset link is incomplete".into()));
    }
    Ok(PageData::PasswordReset {
        uid: uid.to_string(),
        token: token.to_string(),
    })
}

/// `/logout` ends the session and starts a fresh cart.
pub(super) fn logout(ctx: &ViewContext) -> PageData {
    super::actions::logout(&ctx.state);
    PageData::Empty
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::super::test_support::{context, vendor_state};
    use super::*;
    use crate::router::ViewId;
    use crate::testing::RecordingTransport;
    use crate::views::create;

    #[tokio::test]
    async fn test_logout_clears_session_and_cart() {
        let transport = Arc::new(RecordingTransport::new());
        let state = vendor_state();
        state.set_cart_count(koshimart_core::CartCount::new(4));
        let old_cart = state.cart_id();

        let ctx = context(&transport, &state, "/logout");
        let mut view = create(ViewId::Logout);
        view.on_enter(&ctx).await.unwrap();

        assert!(!state.is_signed_in());
        assert!(state.cart_count().is_empty());
        assert_ne!(state.cart_id(), old_cart);
        assert!(transport.requests().is_empty());
    }

    #[test]
    fn test_password_reset_keeps_link_params() {
        let transport = Arc::new(RecordingTransport::new());
        let ctx = context(
            &transport,
            &crate::state::AppState::new(),
            "/reset-password/7/9f8e",
        );
        assert_eq!(
            password_reset(&ctx).unwrap(),
            PageData::PasswordReset {
                uid: "7".into(),
                token: "9f8e".into()
            }
        );
    }
}
