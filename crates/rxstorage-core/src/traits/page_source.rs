//! Paginated list source trait.

use async_trait::async_trait;

use crate::pagination::{Page, PageRequest};
use crate::Result;

use super::Identifiable;

/// A remote collection that can be fetched one page at a time.
#[async_trait]
pub trait PageSource: Send + Sync + 'static {
    /// Entry type in each page.
    type Item: Identifiable + Clone + Send + Sync + 'static;
    /// Entity-specific filter set.
    type Filter: Clone + Default + PartialEq + Send + Sync + 'static;

    /// Fetch a single page.
    async fn fetch_page(&self, request: &PageRequest<Self::Filter>) -> Result<Page<Self::Item>>;
}
