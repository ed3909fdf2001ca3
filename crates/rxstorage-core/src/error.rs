//! Error types for the RxStorage client.
//!
//! Errors are split by domain: [`AuthError`] covers the token refresh
//! protocol, [`ApiError`] covers responses from the REST endpoints, and
//! [`Error`] unifies them with transport, input and storage failures.

use thiserror::Error;

/// The unified error type for RxStorage operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Network transport errors (DNS, TLS, connection, timeout).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Token refresh errors.
    #[error("authentication error: {0}")]
    Auth(#[from] AuthError),

    /// Error responses from the REST API.
    #[error("api error: {0}")]
    Api(#[from] ApiError),

    /// Input validation errors (bad URLs, malformed ids).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),

    /// Token store failures.
    #[error("token store error: {message}")]
    Store { message: String },

    /// The operation was cancelled before it completed.
    #[error("operation cancelled")]
    Cancelled,
}

impl Error {
    /// Returns true for cancellation, which callers treat as a silent no-op.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Error::Cancelled)
    }

    /// Returns true when the server rejected the bearer credential.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, Error::Api(ApiError::Unauthorized))
    }

    /// Create a store error from anything displayable.
    pub fn store(message: impl std::fmt::Display) -> Self {
        Error::Store {
            message: message.to_string(),
        }
    }
}

/// Transport-level errors.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out")]
    Timeout,

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },
}

/// Errors from the OAuth refresh protocol.
///
/// One refresh outcome is handed to every caller that waited on it, so this
/// type is `Clone`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No refresh token is stored, so a refresh cannot be attempted.
    #[error("no refresh token available")]
    NoRefreshToken,

    /// The issuer or token endpoint URL is malformed.
    #[error("invalid URL '{value}': {reason}")]
    InvalidUrl { value: String, reason: String },

    /// The token endpoint answered 200 with a body we could not decode.
    #[error("invalid token response: {message}")]
    InvalidResponse { message: String },

    /// The token endpoint answered with a non-200 status.
    #[error("token refresh failed with HTTP {status}: {body}")]
    RefreshFailed { status: u16, body: String },

    /// The token endpoint could not be reached.
    #[error("token endpoint unreachable: {message}")]
    Transport { message: String },

    /// Reading or persisting tokens failed during a refresh.
    #[error("token store failed during refresh: {message}")]
    Store { message: String },
}

/// Error responses from the REST API.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ApiError {
    /// HTTP 400 with the server's message.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// HTTP 401.
    #[error("unauthorized")]
    Unauthorized,

    /// HTTP 403.
    #[error("forbidden")]
    Forbidden,

    /// HTTP 404.
    #[error("not found")]
    NotFound,

    /// HTTP 5xx with whatever detail the server sent.
    #[error("server error: {0}")]
    ServerError(String),

    /// Any other non-success status.
    #[error("unexpected HTTP {status}")]
    UnexpectedStatus { status: u16 },

    /// The response body did not match the expected shape.
    #[error("failed to decode response: {0}")]
    Decoding(String),
}

impl ApiError {
    /// Map a non-success HTTP status and its error detail to an `ApiError`.
    pub fn from_status(status: u16, detail: Option<String>) -> Self {
        match status {
            400 => ApiError::BadRequest(detail.unwrap_or_else(|| "bad request".to_string())),
            401 => ApiError::Unauthorized,
            403 => ApiError::Forbidden,
            404 => ApiError::NotFound,
            500..=599 => ApiError::ServerError(detail.unwrap_or_else(|| format!("HTTP {status}"))),
            _ => ApiError::UnexpectedStatus { status },
        }
    }
}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid base URL.
    #[error("invalid URL '{value}': {reason}")]
    Url { value: String, reason: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}
