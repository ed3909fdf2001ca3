//! Cursor pagination types shared by every list endpoint.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Opaque, server-issued pagination cursor.
///
/// Clients must not parse or construct cursor values themselves.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cursor(String);

impl Cursor {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Cursor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Direction to move from a cursor.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    #[default]
    Next,
    Prev,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::Next => "next",
            Direction::Prev => "prev",
        }
    }
}

/// Parameters for fetching one page of a list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageRequest<F> {
    /// Free-text search, already normalized by [`PageRequest::with_search`].
    pub search: Option<String>,
    /// Entity-specific filters.
    pub filter: F,
    pub cursor: Option<Cursor>,
    pub direction: Option<Direction>,
    pub limit: Option<u32>,
}

impl<F> PageRequest<F> {
    /// A first-page request with the given filter.
    pub fn first(filter: F) -> Self {
        Self {
            search: None,
            filter,
            cursor: None,
            direction: None,
            limit: None,
        }
    }

    /// Set the search text. Blank text means "no search".
    pub fn with_search(mut self, text: impl AsRef<str>) -> Self {
        let trimmed = text.as_ref().trim();
        self.search = (!trimmed.is_empty()).then(|| trimmed.to_string());
        self
    }

    pub fn with_limit(mut self, limit: Option<u32>) -> Self {
        self.limit = limit;
        self
    }

    /// Continue from `cursor` in the given direction.
    pub fn after(mut self, cursor: Cursor, direction: Direction) -> Self {
        self.cursor = Some(cursor);
        self.direction = Some(direction);
        self
    }
}

/// Pagination metadata returned alongside a page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    #[serde(default)]
    pub next_cursor: Option<Cursor>,
    #[serde(default)]
    pub prev_cursor: Option<Cursor>,
    #[serde(default)]
    pub has_next_page: bool,
    #[serde(default)]
    pub has_prev_page: bool,
}

/// One page of results: `{ "data": [...], "pagination": {...} }`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Page<T> {
    pub data: Vec<T>,
    #[serde(default)]
    pub pagination: PageInfo,
}

impl<T> Page<T> {
    /// A page with no items and no continuation.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            pagination: PageInfo::default(),
        }
    }
}
