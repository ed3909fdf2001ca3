//! rxstorage-search - list controller shared by every searchable entity.
//!
//! A [`SearchController`] wraps any [`rxstorage_core::PageSource`] and gives
//! the presentation layer a single observable [`ListState`]: debounced query
//! input, first-page loads that replace results, cursor-driven "load more"
//! that appends without duplicates, and a prefetch hint for scrolling.

mod config;
mod controller;
mod state;

pub use config::SearchConfig;
pub use controller::{LoadOutcome, SearchController};
pub use state::ListState;
