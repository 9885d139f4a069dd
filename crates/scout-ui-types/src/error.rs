//! Error types for protocol operations.

use thiserror::Error;

/// Errors raised while decoding a frame received from the other side.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ProtocolError {
    /// The frame is not valid JSON.
    #[error("Invalid JSON frame: {message}")]
    InvalidJson { message: String },

    /// The frame is valid JSON but not an object.
    #[error("Frame is not a JSON object")]
    NotAnObject,

    /// The discriminator field (`type` or `action`) is absent or not a string.
    #[error("Missing required field: {field}")]
    MissingField { field: String },

    /// The `type` discriminator names an event this side does not know.
    #[error("Unknown event type: {event_type}")]
    UnknownEventType { event_type: String },

    /// The `action` discriminator names a command this side does not know.
    #[error("Unknown command action: {action}")]
    UnknownAction { action: String },

    /// The discriminator is known but the remaining fields do not fit it.
    #[error("Invalid {kind} payload: {message}")]
    InvalidPayload { kind: String, message: String },
}

impl ProtocolError {
    /// Create a new invalid JSON error.
    pub fn invalid_json(message: impl Into<String>) -> Self {
        Self::InvalidJson {
            message: message.into(),
        }
    }

    /// Create a new missing field error.
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Create a new invalid payload error.
    pub fn invalid_payload(kind: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidPayload {
            kind: kind.into(),
            message: message.into(),
        }
    }

    /// Whether the frame was well-formed but carried a tag this side does not know.
    pub fn is_unrecognized(&self) -> bool {
        matches!(
            self,
            Self::UnknownEventType { .. } | Self::UnknownAction { .. }
        )
    }
}

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;
