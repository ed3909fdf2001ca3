//! REST client for the RxStorage API.

use std::sync::Arc;

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, trace};

use rxstorage_core::error::{ApiError, Error};
use rxstorage_core::{ApiUrl, Page, PageRequest, TokenStore};

use crate::auth::{AuthMiddleware, AuthOptions};
use crate::config::ClientConfig;
use crate::entities::{Entity, QueryFilter};
use crate::error::{transport, truncate_body};
use crate::oauth::TokenEndpoint;

const MAX_ERROR_DETAIL: usize = 512;

/// Error body shape used by the API: `{"error": ..., "message": ...}`.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

/// Authenticated client for the list and detail endpoints.
#[derive(Debug, Clone)]
pub struct ApiClient {
    base: ApiUrl,
    http: reqwest::Client,
    auth: AuthMiddleware,
}

impl ApiClient {
    /// Build a client, its HTTP connection pool and its auth middleware.
    pub fn new(config: &ClientConfig, store: Arc<dyn TokenStore>) -> Result<Self, Error> {
        Self::with_options(
            config,
            store,
            AuthOptions {
                expiry_leeway: config.expiry_leeway,
                ..AuthOptions::default()
            },
        )
    }

    /// Like [`ApiClient::new`], with explicit auth options (e.g. a test clock).
    pub fn with_options(
        config: &ClientConfig,
        store: Arc<dyn TokenStore>,
        options: AuthOptions,
    ) -> Result<Self, Error> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rxstorage/", env!("CARGO_PKG_VERSION")))
            .timeout(config.timeout)
            .build()
            .map_err(transport)?;

        let endpoint = TokenEndpoint::new(http.clone(), &config.issuer, config.client_id.clone())?;
        let auth = AuthMiddleware::new(http.clone(), endpoint, store, options);

        Ok(Self {
            base: config.api_url.clone(),
            http,
            auth,
        })
    }

    /// Returns the API base URL.
    pub fn base(&self) -> &ApiUrl {
        &self.base
    }

    /// The middleware every request passes through.
    pub fn auth(&self) -> &AuthMiddleware {
        &self.auth
    }

    /// Fetch one page of `E`.
    #[instrument(skip(self, request), fields(path = E::PATH, search = ?request.search))]
    pub async fn list<E: Entity>(&self, request: &PageRequest<E::Filter>) -> Result<Page<E>, Error> {
        let mut params: Vec<(&'static str, String)> = Vec::new();
        if let Some(cursor) = &request.cursor {
            params.push(("cursor", cursor.as_str().to_string()));
        }
        if let Some(direction) = request.direction {
            params.push(("direction", direction.as_str().to_string()));
        }
        if let Some(limit) = request.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(search) = &request.search {
            params.push(("search", search.clone()));
        }
        request.filter.append_pairs(&mut params);

        let page: Page<E> = self.get_json(E::PATH, &params).await?;
        debug!(
            count = page.data.len(),
            has_next_page = page.pagination.has_next_page,
            "Fetched page"
        );
        Ok(page)
    }

    /// Fetch a single `E` by id.
    #[instrument(skip(self), fields(path = E::PATH))]
    pub async fn get<E: Entity>(&self, id: i64) -> Result<E, Error> {
        let path = format!("{}/{}", E::PATH, id);
        self.get_json(&path, &[] as &[(&str, String)]).await
    }

    async fn get_json<R: DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, String)],
    ) -> Result<R, Error> {
        let url = self.base.join(path);
        trace!(%url, ?params, "GET");

        let request = self
            .http
            .get(&url)
            .query(params)
            .build()
            .map_err(transport)?;

        let response = self.auth.execute(request).await?;
        handle_response(response).await
    }
}

async fn handle_response<R: DeserializeOwned>(response: reqwest::Response) -> Result<R, Error> {
    let status = response.status();
    trace!(status = %status, "API response");

    let bytes = response.bytes().await.map_err(transport)?;

    if status.is_success() {
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Decoding(e.to_string()).into())
    } else {
        let detail = error_detail(&bytes);
        Err(ApiError::from_status(status.as_u16(), detail).into())
    }
}

fn error_detail(bytes: &[u8]) -> Option<String> {
    if let Ok(body) = serde_json::from_slice::<ErrorBody>(bytes)
        && let Some(detail) = body.message.or(body.error)
    {
        return Some(detail);
    }

    let text = String::from_utf8_lossy(bytes);
    let text = text.trim();
    (!text.is_empty()).then(|| truncate_body(text, MAX_ERROR_DETAIL))
}
