//! Client configuration.

use std::time::Duration;

use rxstorage_core::ApiUrl;

/// Default per-request timeout.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Tokens expiring within this window are refreshed before use.
pub const DEFAULT_EXPIRY_LEEWAY: Duration = Duration::from_secs(60);

/// Everything needed to build an [`ApiClient`](crate::ApiClient).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL of the REST API.
    pub api_url: ApiUrl,
    /// OAuth issuer; the token endpoint is `<issuer>/oauth/token`.
    pub issuer: String,
    /// OAuth client id sent with refresh requests.
    pub client_id: String,
    pub timeout: Duration,
    pub expiry_leeway: Duration,
}

impl ClientConfig {
    pub fn new(api_url: ApiUrl, issuer: impl Into<String>, client_id: impl Into<String>) -> Self {
        Self {
            api_url,
            issuer: issuer.into(),
            client_id: client_id.into(),
            timeout: DEFAULT_TIMEOUT,
            expiry_leeway: DEFAULT_EXPIRY_LEEWAY,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_expiry_leeway(mut self, leeway: Duration) -> Self {
        self.expiry_leeway = leeway;
        self
    }
}
