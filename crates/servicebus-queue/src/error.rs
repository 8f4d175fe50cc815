//! Error types for queue operations.
//!
//! [`QueueError`] is a closed set: six variants classify an HTTP status
//! returned by the service, [`QueueError::UnknownStatus`] covers every other
//! status code, and the remaining variants wrap failures that happened before
//! a status was available (building the request, sending it, reading the
//! body).

use thiserror::Error;

/// Boxed error used as the source of wrapped failures.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Comprehensive error type for all queue operations
#[derive(Debug, Error)]
pub enum QueueError {
    /// The queue had no message to hand out before the server-side timeout.
    #[error("No messages available (status {status}): {body}")]
    NoMessagesAvailable { status: u16, body: String },

    #[error("Bad request (status {status}): {body}")]
    BadRequest { status: u16, body: String },

    #[error("Not authorized (status {status}): {body}")]
    NotAuthorized { status: u16, body: String },

    /// The message or its lock no longer exists.
    #[error("Message does not exist (status {status}): {body}")]
    MessageNotFound { status: u16, body: String },

    #[error("Queue does not exist (status {status}): {body}")]
    QueueNotFound { status: u16, body: String },

    #[error("Internal service error (status {status}): {body}")]
    InternalServiceError { status: u16, body: String },

    #[error("Unknown status {status} with body {body}")]
    UnknownStatus { status: u16, body: String },

    #[error("Request creation failed: {message}")]
    RequestConstruction {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Transport failed: {message}")]
    Transport {
        message: String,
        #[source]
        source: BoxError,
    },

    #[error("Error reading message body: {source}")]
    BodyRead {
        #[source]
        source: BoxError,
    },
}

impl QueueError {
    pub(crate) fn request_construction(
        message: impl Into<String>,
        source: impl Into<BoxError>,
    ) -> Self {
        Self::RequestConstruction {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn transport(message: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::Transport {
            message: message.into(),
            source: source.into(),
        }
    }

    pub(crate) fn body_read(source: impl Into<BoxError>) -> Self {
        Self::BodyRead {
            source: source.into(),
        }
    }

    /// HTTP status code carried by the error, if a response was received.
    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::NoMessagesAvailable { status, .. }
            | Self::BadRequest { status, .. }
            | Self::NotAuthorized { status, .. }
            | Self::MessageNotFound { status, .. }
            | Self::QueueNotFound { status, .. }
            | Self::InternalServiceError { status, .. }
            | Self::UnknownStatus { status, .. } => Some(*status),
            Self::RequestConstruction { .. } | Self::Transport { .. } | Self::BodyRead { .. } => {
                None
            }
        }
    }

    /// Raw response body carried by the error, if a response was received.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::NoMessagesAvailable { body, .. }
            | Self::BadRequest { body, .. }
            | Self::NotAuthorized { body, .. }
            | Self::MessageNotFound { body, .. }
            | Self::QueueNotFound { body, .. }
            | Self::InternalServiceError { body, .. }
            | Self::UnknownStatus { body, .. } => Some(body),
            Self::RequestConstruction { .. } | Self::Transport { .. } | Self::BodyRead { .. } => {
                None
            }
        }
    }

    /// Check if the error was produced from an HTTP response status.
    ///
    /// Returns `false` for failures where no response was ever received,
    /// which lets callers tell "never got a response" from "got an error
    /// response".
    pub fn is_classified(&self) -> bool {
        self.status_code().is_some()
    }

    /// Check if the queue was simply empty, i.e. the caller should poll again.
    pub fn is_no_messages(&self) -> bool {
        matches!(self, Self::NoMessagesAvailable { .. })
    }
}

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigurationError {
    #[error("Missing required configuration: {key}")]
    Missing { key: String },

    #[error("Invalid configuration for {key}: {message}")]
    Invalid { key: String, message: String },

    #[error("Configuration loading failed: {0}")]
    Load(#[from] config::ConfigError),
}

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
