//! Token persistence and API connection setup for commands.

pub mod storage;

use std::sync::Arc;

use anyhow::Result;
use tokio::sync::broadcast;
use tracing::warn;

use rxstorage_core::TokenStore;
use rxstorage_http::{ApiClient, SessionExpired};

use crate::cli::ApiArgs;
use crate::output;

pub use storage::FileTokenStore;

/// An authenticated API client backed by the token file.
pub struct Connection {
    pub client: ApiClient,
    pub store: Arc<FileTokenStore>,
    expired: broadcast::Receiver<SessionExpired>,
}

impl Connection {
    pub fn open(api: &ApiArgs) -> Result<Self> {
        let config = api.client_config()?;
        let store = Arc::new(FileTokenStore::resolve(api.token_file.as_deref())?);
        let client = ApiClient::new(&config, Arc::clone(&store) as Arc<dyn TokenStore>)?;
        let expired = client.auth().subscribe_session_expired();

        Ok(Self {
            client,
            store,
            expired,
        })
    }

    /// Pass `result` through, signing out first if the session expired
    /// while producing it.
    pub async fn finish<T>(mut self, result: Result<T>) -> Result<T> {
        if self.expired.try_recv().is_ok() {
            if let Err(e) = self.store.clear().await {
                warn!(error = %e, "Failed to clear expired tokens");
            }
            output::error("Session expired.");
            output::hint("Run 'rxstorage auth import' with fresh tokens to sign in again.");
        }
        result
    }
}
