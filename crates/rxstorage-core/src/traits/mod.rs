//! Core traits for list sources.

mod identifiable;
mod page_source;

pub use identifiable::Identifiable;
pub use page_source::PageSource;
