//! Observable list state.

use std::collections::HashSet;
use std::sync::Arc;

use rxstorage_core::{Cursor, Error, Identifiable};

/// Everything a list view renders.
#[derive(Debug, Clone)]
pub struct ListState<T, F> {
    /// Results in display order, unique by id.
    pub items: Vec<T>,
    pub next_cursor: Option<Cursor>,
    pub has_next_page: bool,
    /// A first-page load is in flight.
    pub is_loading: bool,
    /// A next-page load is in flight.
    pub is_loading_more: bool,
    /// Last non-cancellation failure; cleared when a new load starts.
    pub error: Option<Arc<Error>>,
    /// Raw query text as typed.
    pub query: String,
    pub filter: F,
    pub(crate) active_query: Option<String>,
    pub(crate) generation: u64,
}

impl<T, F: Default> Default for ListState<T, F> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            next_cursor: None,
            has_next_page: false,
            is_loading: false,
            is_loading_more: false,
            error: None,
            query: String::new(),
            filter: F::default(),
            active_query: None,
            generation: 0,
        }
    }
}

impl<T: Identifiable, F> ListState<T, F> {
    /// Whether any load is in flight.
    pub fn is_busy(&self) -> bool {
        self.is_loading || self.is_loading_more
    }

    /// The query text the current results were loaded for.
    pub fn active_query(&self) -> Option<&str> {
        self.active_query.as_deref()
    }

    /// Replace all items, dropping repeated ids.
    pub(crate) fn replace_items(&mut self, items: Vec<T>) -> usize {
        let mut seen = HashSet::with_capacity(items.len());
        self.items = items
            .into_iter()
            .filter(|item| seen.insert(item.id()))
            .collect();
        self.items.len()
    }

    /// Append items whose id is not already present. Returns how many were
    /// added.
    pub(crate) fn append_unique(&mut self, items: Vec<T>) -> usize {
        let mut seen: HashSet<T::Id> = self.items.iter().map(Identifiable::id).collect();
        let before = self.items.len();
        self.items
            .extend(items.into_iter().filter(|item| seen.insert(item.id())));
        self.items.len() - before
    }
}
