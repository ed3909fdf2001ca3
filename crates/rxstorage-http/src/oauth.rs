//! OAuth token endpoint client.

use reqwest::StatusCode;
use tracing::{debug, instrument, warn};

use rxstorage_core::error::AuthError;
use rxstorage_core::{ApiUrl, RefreshToken, TokenResponse};

use crate::error::{auth_transport, truncate_body};

/// Path of the token endpoint relative to the issuer.
const TOKEN_PATH: &str = "oauth/token";

/// Error bodies are cut to this many bytes before being put in an error.
const MAX_ERROR_BODY: usize = 512;

/// Client for the issuer's `oauth/token` endpoint.
#[derive(Debug, Clone)]
pub struct TokenEndpoint {
    http: reqwest::Client,
    url: String,
    client_id: String,
}

impl TokenEndpoint {
    /// Create a token endpoint client for `issuer`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::InvalidUrl`] if the issuer is not a valid base URL.
    pub fn new(
        http: reqwest::Client,
        issuer: &str,
        client_id: impl Into<String>,
    ) -> Result<Self, AuthError> {
        let issuer = ApiUrl::new(issuer).map_err(|e| AuthError::InvalidUrl {
            value: issuer.to_string(),
            reason: e.to_string(),
        })?;

        Ok(Self {
            http,
            url: issuer.join(TOKEN_PATH),
            client_id: client_id.into(),
        })
    }

    /// The full token endpoint URL.
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Exchange a refresh token for a new access token.
    ///
    /// Anything other than HTTP 200 is a failure.
    #[instrument(skip_all, fields(url = %self.url))]
    pub async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenResponse, AuthError> {
        debug!("Requesting token refresh");

        let params = [
            ("grant_type", "refresh_token"),
            ("refresh_token", refresh_token.as_str()),
            ("client_id", self.client_id.as_str()),
        ];

        let response = self
            .http
            .post(&self.url)
            .form(&params)
            .send()
            .await
            .map_err(auth_transport)?;

        let status = response.status();
        let body = response.text().await.map_err(auth_transport)?;

        if status != StatusCode::OK {
            warn!(status = status.as_u16(), "Token endpoint rejected refresh");
            return Err(AuthError::RefreshFailed {
                status: status.as_u16(),
                body: truncate_body(&body, MAX_ERROR_BODY),
            });
        }

        serde_json::from_str::<TokenResponse>(&body).map_err(|e| AuthError::InvalidResponse {
            message: e.to_string(),
        })
    }
}
