//! Controller tuning.

use std::time::Duration;

/// Quiet period before a typed query is dispatched.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// How close to the end of the list an item must be to trigger a prefetch.
pub const DEFAULT_PREFETCH_THRESHOLD: usize = 3;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchConfig {
    pub debounce: Duration,
    pub prefetch_threshold: usize,
    /// Page size sent as `limit`; `None` leaves it to the server.
    pub page_limit: Option<u32>,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            debounce: DEFAULT_DEBOUNCE,
            prefetch_threshold: DEFAULT_PREFETCH_THRESHOLD,
            page_limit: None,
        }
    }
}

impl SearchConfig {
    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    pub fn with_page_limit(mut self, limit: Option<u32>) -> Self {
        self.page_limit = limit;
        self
    }
}
