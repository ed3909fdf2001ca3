//! Bearer-token middleware with single-flight refresh.
//!
//! Every outbound request passes through [`AuthMiddleware::execute`]. The
//! middleware owns the refresh state machine:
//!
//! ```text
//! Idle ──(token expired | HTTP 401)──▶ Refreshing ──(done)──▶ Idle
//! ```
//!
//! While a refresh is running, further callers queue as waiters instead of
//! starting their own. The refresh itself runs on a spawned task, so a
//! caller whose future is dropped never leaves the other waiters hanging.

use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use reqwest::header::{AUTHORIZATION, HeaderValue};
use tokio::sync::{broadcast, oneshot};
use tracing::{debug, info, instrument, warn};

use rxstorage_core::error::{AuthError, Error, InvalidInputError};
use rxstorage_core::{AccessToken, TokenStore};

use crate::config::DEFAULT_EXPIRY_LEEWAY;
use crate::error::transport;
use crate::oauth::TokenEndpoint;

/// Source of the current time, replaceable in tests.
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

/// Broadcast when a refresh fails and the user has to sign in again.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionExpired;

type RefreshOutcome = Result<AccessToken, AuthError>;

enum RefreshState {
    Idle,
    Refreshing {
        waiters: Vec<oneshot::Sender<RefreshOutcome>>,
    },
}

/// Tuning for [`AuthMiddleware`].
#[derive(Clone)]
pub struct AuthOptions {
    /// Tokens that expire within this window are refreshed before use.
    pub expiry_leeway: Duration,
    pub clock: Clock,
}

impl Default for AuthOptions {
    fn default() -> Self {
        Self {
            expiry_leeway: DEFAULT_EXPIRY_LEEWAY,
            clock: Arc::new(Utc::now),
        }
    }
}

impl fmt::Debug for AuthOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthOptions")
            .field("expiry_leeway", &self.expiry_leeway)
            .finish_non_exhaustive()
    }
}

/// Attaches bearer tokens and recovers from expiry.
///
/// Cheap to clone; clones share the refresh state and the session-expired
/// channel.
#[derive(Clone)]
pub struct AuthMiddleware {
    inner: Arc<AuthInner>,
}

struct AuthInner {
    http: reqwest::Client,
    endpoint: TokenEndpoint,
    store: Arc<dyn TokenStore>,
    leeway: chrono::Duration,
    clock: Clock,
    state: Mutex<RefreshState>,
    expired_tx: broadcast::Sender<SessionExpired>,
}

impl AuthMiddleware {
    pub fn new(
        http: reqwest::Client,
        endpoint: TokenEndpoint,
        store: Arc<dyn TokenStore>,
        options: AuthOptions,
    ) -> Self {
        let (expired_tx, _) = broadcast::channel(16);
        let leeway = chrono::Duration::from_std(options.expiry_leeway)
            .unwrap_or_else(|_| chrono::Duration::seconds(60));

        Self {
            inner: Arc::new(AuthInner {
                http,
                endpoint,
                store,
                leeway,
                clock: options.clock,
                state: Mutex::new(RefreshState::Idle),
                expired_tx,
            }),
        }
    }

    /// Subscribe to session-expired notifications.
    ///
    /// One notification is sent per failed refresh, however many callers
    /// were waiting on it.
    pub fn subscribe_session_expired(&self) -> broadcast::Receiver<SessionExpired> {
        self.inner.expired_tx.subscribe()
    }

    /// The token store this middleware reads and writes.
    pub fn store(&self) -> &Arc<dyn TokenStore> {
        &self.inner.store
    }

    /// Whether a refresh is currently in flight.
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.inner.lock_state(), RefreshState::Refreshing { .. })
    }

    /// Return a usable access token, refreshing first if the stored one has
    /// expired.
    pub async fn access_token(&self) -> Result<AccessToken, Error> {
        let now = (self.inner.clock)();
        match self.inner.store.load().await? {
            Some(tokens) if !tokens.is_expired_at(now, self.inner.leeway) => {
                Ok(tokens.access_token)
            }
            Some(tokens) => {
                debug!("Stored access token expired, refreshing");
                Ok(self.refresh_after(Some(tokens.access_token)).await?)
            }
            None => {
                debug!("No stored tokens");
                Ok(self.refresh_after(None).await?)
            }
        }
    }

    /// Refresh now, joining any refresh that is already running.
    #[instrument(skip(self))]
    pub async fn force_refresh(&self) -> Result<AccessToken, Error> {
        Ok(self.refresh_after(None).await?)
    }

    /// Send `request` with a bearer token.
    ///
    /// A 401 triggers one refresh and one retry. The retry's response is
    /// returned whatever its status. If the refresh fails, its error is
    /// returned instead of the 401.
    #[instrument(skip_all, fields(method = %request.method(), url = %request.url()))]
    pub async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response, Error> {
        let token = self.access_token().await?;
        let replay = request.try_clone();

        let response = self.send_with(request, &token).await?;
        if response.status() != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }

        let Some(replay) = replay else {
            warn!("Request body cannot be replayed; returning 401");
            return Ok(response);
        };

        debug!("Received 401, refreshing token and retrying once");
        let token = self.refresh_after(Some(token)).await?;
        self.send_with(replay, &token).await
    }

    async fn send_with(
        &self,
        mut request: reqwest::Request,
        token: &AccessToken,
    ) -> Result<reqwest::Response, Error> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token.as_str())).map_err(
            |_| InvalidInputError::Other {
                message: "stored access token is not a valid header value".to_string(),
            },
        )?;
        value.set_sensitive(true);
        request.headers_mut().insert(AUTHORIZATION, value);

        self.inner.http.execute(request).await.map_err(transport)
    }

    /// Single-flight entry point.
    ///
    /// `stale` is the token the caller found unusable. If the store already
    /// holds a different, unexpired token by the time the refresh runs, that
    /// token is returned without contacting the token endpoint.
    async fn refresh_after(&self, stale: Option<AccessToken>) -> RefreshOutcome {
        let (tx, rx) = oneshot::channel();

        let leader = {
            let mut state = self.inner.lock_state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    waiters.push(tx);
                    false
                }
                RefreshState::Idle => {
                    *state = RefreshState::Refreshing { waiters: vec![tx] };
                    true
                }
            }
        };

        if leader {
            let inner = Arc::clone(&self.inner);
            tokio::spawn(async move { inner.run_refresh(stale).await });
        } else {
            debug!("Joining in-flight token refresh");
        }

        rx.await.unwrap_or_else(|_| {
            Err(AuthError::Transport {
                message: "token refresh task ended without a result".to_string(),
            })
        })
    }
}

impl AuthInner {
    fn lock_state(&self) -> std::sync::MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    async fn run_refresh(&self, stale: Option<AccessToken>) {
        let mut release = ReleaseWaiters {
            inner: self,
            outcome: None,
        };
        let outcome = self.perform_refresh(stale).await;

        if let Err(err) = &outcome {
            warn!(error = %err, "Token refresh failed, session expired");
            // No receivers is fine: nobody is listening for sign-out.
            let _ = self.expired_tx.send(SessionExpired);
        }

        release.outcome = Some(outcome);
    }

    async fn perform_refresh(&self, stale: Option<AccessToken>) -> RefreshOutcome {
        let current = self.store.load().await.map_err(store_error)?;
        let Some(current) = current else {
            return Err(AuthError::NoRefreshToken);
        };

        if let Some(stale) = &stale
            && current.access_token != *stale
            && !current.is_expired_at((self.clock)(), self.leeway)
        {
            debug!("Token was already refreshed by another request");
            return Ok(current.access_token);
        }

        let refresh_token = current
            .refresh_token
            .clone()
            .ok_or(AuthError::NoRefreshToken)?;

        let response = self.endpoint.refresh(&refresh_token).await?;
        let rotated = response.refresh_token.is_some();
        let next = current.apply_refresh(response, (self.clock)())?;

        self.store.save(&next).await.map_err(store_error)?;

        info!(expires_at = ?next.expires_at, rotated, "Access token refreshed");
        Ok(next.access_token)
    }
}

/// Returns the middleware to `Idle` and resolves every waiter, even if the
/// refresh task unwinds. Waiters dropped without an outcome see the refresh
/// as failed.
struct ReleaseWaiters<'a> {
    inner: &'a AuthInner,
    outcome: Option<RefreshOutcome>,
}

impl Drop for ReleaseWaiters<'_> {
    fn drop(&mut self) {
        let waiters = match std::mem::replace(&mut *self.inner.lock_state(), RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };

        let Some(outcome) = self.outcome.take() else {
            warn!(waiters = waiters.len(), "Token refresh aborted without a result");
            return;
        };

        debug!(waiters = waiters.len(), "Releasing refresh waiters");
        for waiter in waiters {
            let _ = waiter.send(outcome.clone());
        }
    }
}

fn store_error(err: Error) -> AuthError {
    AuthError::Store {
        message: err.to_string(),
    }
}

impl fmt::Debug for AuthMiddleware {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthMiddleware")
            .field("token_endpoint", &self.inner.endpoint.url())
            .field("refreshing", &self.is_refreshing())
            .field("tokens", &"[REDACTED]")
            .finish()
    }
}
