//! rxstorage-core - Core types and traits for the RxStorage API client.
//!
//! This crate holds everything the transport and presentation crates share:
//! the error taxonomy, bearer token types, the token store seam, and the
//! cursor pagination model. It performs no network I/O.

pub mod error;
pub mod pagination;
pub mod store;
pub mod tokens;
pub mod traits;
pub mod types;

pub use error::{ApiError, AuthError, Error};
pub use pagination::{Cursor, Direction, Page, PageInfo, PageRequest};
pub use store::{MemoryTokenStore, TokenStore};
pub use tokens::{AccessToken, RefreshToken, TokenResponse, TokenSet, expiry_after};
pub use traits::{Identifiable, PageSource};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
