//! Command implementations.

pub mod auth;
pub mod get;
pub mod list;
