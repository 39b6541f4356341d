//! Account endpoints: tokens, registration, password reset and profiles.

use koshimart_core::{Email, Session, UserId};
use serde::Deserialize;
use tracing::instrument;

use super::client::{ApiClient, decode};
use super::error::ApiError;
use super::transport::RequestBody;
use super::types::{Ack, PasswordChange, Profile, ProfileUpdate, Registration};

/// Minimum password length enforced by the backend.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Deserialize)]
struct TokenPair {
    access: String,
    #[serde(default)]
    refresh: Option<String>,
}

impl ApiClient {
    /// Exchange credentials for a session.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] (401) for wrong credentials and
    /// [`ApiError::Decode`] if the returned access token carries no readable
    /// claims.
    #[instrument(skip(self, password), fields(email = %email))]
    pub async fn login(&self, email: &Email, password: &str) -> Result<Session, ApiError> {
        let payload = self
            .post_json(
                "user/token/",
                &serde_json::json!({ "email": email.as_str(), "password": password }),
            )
            .await?;
        let tokens: TokenPair = decode(payload)?;

        Session::from_tokens(&tokens.access, tokens.refresh.as_deref()).map_err(|e| {
            tracing::error!(error = %e, "Access token carries no readable claims");
            ApiError::Decode(e.to_string())
        })
    }

    /// Obtain a new access token for a session that has a refresh token.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] if the session has no refresh token,
    /// otherwise any adapter error.
    pub async fn refresh_session(&self, session: &Session) -> Result<Session, ApiError> {
        let refresh = session
            .refresh_token()
            .ok_or_else(|| ApiError::InvalidInput("session has no refresh token".into()))?;
        let payload = self
            .post_json("user/token/refresh/", &serde_json::json!({ "refresh": refresh }))
            .await?;
        let tokens: TokenPair = decode(payload)?;

        Ok(session.clone().with_access_token(&tokens.access))
    }

    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request if the email is
    /// malformed or the passwords are too short or do not match.
    pub async fn register(&self, registration: &Registration) -> Result<serde_json::Value, ApiError> {
        let email = Email::parse(&registration.email)?;
        validate_password(&registration.password)?;
        if registration.password != registration.password2 {
            return Err(ApiError::InvalidInput("passwords do not match".into()));
        }

        let body = Registration {
            email: email.into_inner(),
            ..registration.clone()
        };
        self.post_json("user/register/", &body).await
    }

    /// Start a password reset for `email`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] (404) if no account uses the address.
    pub async fn request_password_reset(&self, email: &Email) -> Result<(), ApiError> {
        let path = format!(
            "user/password-reset/{}/",
            urlencoding::encode(email.as_str())
        );
        self.get(&path).await.map(|_| ())
    }

    /// Set a new password using the one-time code from the reset link.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidInput`] without a request for missing
    /// fields or a short password.
    pub async fn change_password(&self, change: &PasswordChange) -> Result<Ack, ApiError> {
        if change.otp.trim().is_empty() || change.uidb64.trim().is_empty() {
            return Err(ApiError::InvalidInput("reset link is incomplete".into()));
        }
        validate_password(&change.password)?;

        decode(self.post_json("user/password-change/", change).await?)
    }

    /// Fetch a user's profile.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn profile(&self, user_id: UserId) -> Result<Profile, ApiError> {
        decode(self.get(&format!("user/profile/{user_id}/")).await?)
    }

    /// Update the set fields of a user's profile.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::request`].
    pub async fn update_profile(
        &self,
        user_id: UserId,
        update: ProfileUpdate,
    ) -> Result<Profile, ApiError> {
        let payload = self
            .request(
                reqwest::Method::PATCH,
                &format!("user/profile/{user_id}/"),
                Some(RequestBody::Multipart(update.into_fields())),
            )
            .await?;
        decode(payload)
    }
}

fn validate_password(password: &str) -> Result<(), ApiError> {
    if password.chars().count() < MIN_PASSWORD_LEN {
        return Err(ApiError::InvalidInput(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters long"
        )));
    }
    Ok(())
}
