//! Transport error types.

use std::time::Duration;
use thiserror::Error;

/// Errors raised by the transport underneath a session.
///
/// None of these is fatal: the session manager reacts to every one of them by
/// closing the session and scheduling a reconnect.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TransportError {
    #[error("invalid controller URL: {0}")]
    InvalidUrl(String),

    #[error("connection timeout after {0:?}")]
    Timeout(Duration),

    #[error("websocket error: {0}")]
    WebSocket(String),

    #[error("transport closed: {0}")]
    Closed(String),
}

impl From<url::ParseError> for TransportError {
    fn from(err: url::ParseError) -> Self {
        TransportError::InvalidUrl(err.to_string())
    }
}
