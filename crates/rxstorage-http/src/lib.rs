//! rxstorage-http - reqwest transport for the RxStorage API.
//!
//! Every request goes through [`AuthMiddleware`], which attaches the bearer
//! token and coalesces concurrent OAuth refreshes into a single call to the
//! token endpoint. [`ApiClient`] layers typed list endpoints on top, and
//! [`EntityList`] adapts them to [`rxstorage_core::PageSource`].

mod auth;
mod client;
mod config;
mod entities;
mod error;
mod oauth;

pub use auth::{AuthMiddleware, AuthOptions, Clock, SessionExpired};
pub use client::ApiClient;
pub use config::ClientConfig;
pub use entities::{
    Author, Category, Entity, EntityList, Item, ItemFilter, Location, PositionSchema, QueryFilter,
    Visibility,
};
pub use oauth::TokenEndpoint;
