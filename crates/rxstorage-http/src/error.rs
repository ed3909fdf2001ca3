//! Conversions from reqwest failures into the core error types.

use rxstorage_core::error::{AuthError, Error, TransportError};

/// Classify a reqwest error.
pub(crate) fn transport_error(err: &reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else if err.is_connect() {
        TransportError::Connection {
            message: err.to_string(),
        }
    } else {
        TransportError::Http {
            message: err.to_string(),
        }
    }
}

pub(crate) fn transport(err: reqwest::Error) -> Error {
    Error::Transport(transport_error(&err))
}

/// Token endpoint failures are auth-domain errors so they can be shared
/// with every waiter of a refresh.
pub(crate) fn auth_transport(err: reqwest::Error) -> AuthError {
    AuthError::Transport {
        message: transport_error(&err).to_string(),
    }
}

/// Shorten a response body for diagnostics without splitting a UTF-8 char.
pub(crate) fn truncate_body(body: &str, max: usize) -> String {
    if body.len() <= max {
        return body.to_string();
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
