//! Bearer token types.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AuthError;

/// An access token sent as `Authorization: Bearer <token>`.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AccessToken(String);

impl AccessToken {
    /// Create a new access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in authorization headers.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("AccessToken").field(&"[REDACTED]").finish()
    }
}

/// A refresh token exchanged at the OAuth token endpoint.
///
/// # Security
///
/// - Never logged or displayed in Debug output
/// - Treat as opaque; do not parse or inspect
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshToken(String);

impl RefreshToken {
    /// Create a new refresh token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Returns the token value for use in refresh requests.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

// Hide token value in Debug output
impl fmt::Debug for RefreshToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("RefreshToken").field(&"[REDACTED]").finish()
    }
}

/// Successful response body from the token endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct TokenResponse {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    pub expires_in: i64,
}

/// The credential state persisted by a [`TokenStore`](crate::TokenStore).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenSet {
    pub access_token: AccessToken,
    #[serde(default)]
    pub refresh_token: Option<RefreshToken>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl TokenSet {
    pub fn new(
        access_token: AccessToken,
        refresh_token: Option<RefreshToken>,
        expires_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            access_token,
            refresh_token,
            expires_at,
        }
    }

    /// Whether the access token should be considered expired at `now`.
    ///
    /// A token with no known expiry is assumed valid; the server's 401
    /// is the authority in that case.
    pub fn is_expired_at(&self, now: DateTime<Utc>, leeway: Duration) -> bool {
        match self.expires_at {
            Some(expires_at) => now + leeway >= expires_at,
            None => false,
        }
    }

    /// Build the token set that replaces this one after a refresh.
    ///
    /// The refresh token is only replaced when the server rotated it.
    pub fn apply_refresh(
        &self,
        response: TokenResponse,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, AuthError> {
        TokenSet::from_response(response, self.refresh_token.clone(), now)
    }

    /// Build a token set from a token endpoint response.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidResponse`] if `expires_in` does not yield
    /// a representable timestamp.
    pub fn from_response(
        response: TokenResponse,
        fallback_refresh: Option<RefreshToken>,
        now: DateTime<Utc>,
    ) -> Result<TokenSet, AuthError> {
        let expires_at =
            expiry_after(now, response.expires_in).ok_or_else(|| AuthError::InvalidResponse {
                message: format!("expires_in {} is out of range", response.expires_in),
            })?;

        Ok(TokenSet {
            access_token: response.access_token,
            refresh_token: response.refresh_token.or(fallback_refresh),
            expires_at: Some(expires_at),
        })
    }
}

/// `now` plus `secs` seconds, or `None` if the result is not representable.
/// Negative lifetimes count as already expired.
pub fn expiry_after(now: DateTime<Utc>, secs: i64) -> Option<DateTime<Utc>> {
    Duration::try_seconds(secs.max(0)).and_then(|lifetime| now.checked_add_signed(lifetime))
}
