//! Token storage seam.

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{Result, TokenSet};

/// Persistence for the current [`TokenSet`].
///
/// Reads happen before every outbound request; writes happen only when a
/// refresh completes or the user imports or clears credentials.
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored tokens, if any.
    async fn load(&self) -> Result<Option<TokenSet>>;

    /// Replace the stored tokens.
    async fn save(&self, tokens: &TokenSet) -> Result<()>;

    /// Remove any stored tokens.
    async fn clear(&self) -> Result<()>;
}

/// A [`TokenStore`] that keeps tokens in process memory.
#[derive(Debug, Default)]
pub struct MemoryTokenStore {
    tokens: RwLock<Option<TokenSet>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store pre-populated with `tokens`.
    pub fn with_tokens(tokens: TokenSet) -> Self {
        Self {
            tokens: RwLock::new(Some(tokens)),
        }
    }
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> Result<Option<TokenSet>> {
        Ok(self.tokens.read().await.clone())
    }

    async fn save(&self, tokens: &TokenSet) -> Result<()> {
        *self.tokens.write().await = Some(tokens.clone());
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        *self.tokens.write().await = None;
        Ok(())
    }
}
