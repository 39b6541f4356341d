//! Authenticated session.
//!
//! A session is the client-held proof of identity: the access token issued by
//! the backend's token endpoint plus whatever identity the token carries. The
//! backend issues JWTs whose payload includes the user and vendor ids; the
//! client reads them without verifying the signature (the backend verifies on
//! every request).

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use thiserror::Error;

use super::id::{UserId, VendorId};

/// Errors that can occur when building a session from tokens.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The access token was empty.
    #[error("access token is empty")]
    EmptyToken,
    /// The token is not a three-part JWT.
    #[error("access token is not a JWT")]
    MalformedToken,
    /// The payload segment is not valid base64url.
    #[error("invalid token payload encoding: {0}")]
    Encoding(#[from] base64::DecodeError),
    /// The payload is not the expected JSON claims object.
    #[error("invalid token claims: {0}")]
    Claims(#[from] serde_json::Error),
}

/// Claims read from the access token payload.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TokenClaims {
    /// Backend user id.
    #[serde(default)]
    pub user_id: Option<i32>,
    /// Vendor id; the backend sends `0` for customers without a shop.
    #[serde(default)]
    pub vendor_id: Option<i32>,
    /// Account email.
    #[serde(default)]
    pub email: Option<String>,
    /// Display name.
    #[serde(default)]
    pub full_name: Option<String>,
    /// Username (local part of the email at registration).
    #[serde(default)]
    pub username: Option<String>,
    /// Expiry as a Unix timestamp.
    #[serde(default)]
    pub exp: Option<i64>,
}

impl TokenClaims {
    /// Decode the payload segment of a JWT.
    ///
    /// # Errors
    ///
    /// Returns an error if the token does not have three segments or the
    /// payload is not base64url-encoded JSON.
    pub fn decode(token: &str) -> Result<Self, SessionError> {
        let mut segments = token.split('.');
        let (Some(_header), Some(payload), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(SessionError::MalformedToken);
        };

        let bytes = URL_SAFE_NO_PAD.decode(payload.trim_end_matches('='))?;
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Session-held user identity and credentials.
///
/// Implements `Debug` manually to redact the tokens.
#[derive(Clone)]
pub struct Session {
    access_token: SecretString,
    refresh_token: Option<SecretString>,
    user_id: Option<UserId>,
    vendor_id: Option<VendorId>,
    email: Option<String>,
    full_name: Option<String>,
    expires_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("access_token", &"[REDACTED]")
            .field(
                "refresh_token",
                &self.refresh_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("user_id", &self.user_id)
            .field("vendor_id", &self.vendor_id)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

impl Session {
    /// Create a session from an opaque credential.
    #[must_use]
    pub fn new(access_token: impl Into<String>, user_id: Option<UserId>) -> Self {
        Self {
            access_token: SecretString::from(access_token.into()),
            refresh_token: None,
            user_id,
            vendor_id: None,
            email: None,
            full_name: None,
            expires_at: None,
        }
    }

    /// Create a session from the access/refresh pair returned by the token
    /// endpoint, reading identity from the access token's claims.
    ///
    /// # Errors
    ///
    /// Returns an error if the access token is empty or its claims cannot be
    /// decoded.
    pub fn from_tokens(access: &str, refresh: Option<&str>) -> Result<Self, SessionError> {
        if access.trim().is_empty() {
            return Err(SessionError::EmptyToken);
        }
        let claims = TokenClaims::decode(access)?;

        Ok(Self {
            access_token: SecretString::from(access.to_owned()),
            refresh_token: refresh
                .filter(|r| !r.is_empty())
                .map(|r| SecretString::from(r.to_owned())),
            user_id: claims.user_id.filter(|id| *id > 0).map(UserId::new),
            vendor_id: claims.vendor_id.filter(|id| *id > 0).map(VendorId::new),
            email: claims.email,
            full_name: claims.full_name,
            expires_at: claims
                .exp
                .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0)),
        })
    }

    /// The bearer credential sent with API requests.
    #[must_use]
    pub fn access_token(&self) -> &str {
        self.access_token.expose_secret()
    }

    /// The refresh token, if the backend issued one.
    #[must_use]
    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_ref().map(|r| r.expose_secret())
    }

    /// Backend user id.
    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        self.user_id
    }

    /// Vendor id, when the account owns a shop.
    #[must_use]
    pub const fn vendor_id(&self) -> Option<VendorId> {
        self.vendor_id
    }

    /// Returns `true` if the account owns a shop.
    #[must_use]
    pub const fn is_vendor(&self) -> bool {
        self.vendor_id.is_some()
    }

    /// Account email, if present in the token.
    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    /// Display name, if present in the token.
    #[must_use]
    pub fn full_name(&self) -> Option<&str> {
        self.full_name.as_deref()
    }

    /// Access token expiry.
    #[must_use]
    pub const fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Returns `true` if the access token expired before `now`.
    ///
    /// Sessions without an expiry never expire on the client side.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|exp| exp <= now)
    }

    /// [`Session::is_expired_at`] the current time.
    #[must_use]
    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    /// Replace the access token after a refresh, keeping the identity.
    #[must_use]
    pub fn with_access_token(mut self, access: &str) -> Self {
        if let Ok(claims) = TokenClaims::decode(access) {
            self.expires_at = claims
                .exp
                .and_then(|exp| DateTime::<Utc>::from_timestamp(exp, 0));
        }
        self.access_token = SecretString::from(access.to_owned());
        self
    }
}
