//! Transport-level error types.
//!
//! Failures of the event stream before a terminal event arrived. Values are
//! `Clone` so they can travel over the runtime's message channel.

use std::fmt;

/// Event stream failed before `done`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    /// Could not open the stream at all.
    ConnectionFailed { url: String, message: String },

    /// The stream endpoint answered with a non-success status.
    HttpStatus { status: u16, message: String },

    /// The byte stream broke mid-run.
    Interrupted { message: String },

    /// The stream closed cleanly but no terminal event was delivered.
    EndedWithoutCompletion,

    /// An event frame could not be decoded.
    Decode { event_type: String, message: String },

    /// No data arrived within the allowed window.
    Timeout { duration_secs: u64 },
}

impl TransportError {
    /// Check if this error is likely transient and can be retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::ConnectionFailed { .. }
            | TransportError::Interrupted { .. }
            | TransportError::EndedWithoutCompletion
            | TransportError::Timeout { .. } => true,
            TransportError::HttpStatus { status, .. } => *status == 429 || *status >= 500,
            TransportError::Decode { .. } => false,
        }
    }

    /// Get a short error code for logging and notices.
    pub fn error_code(&self) -> &'static str {
        match self {
            TransportError::ConnectionFailed { .. } => "connection_failed",
            TransportError::HttpStatus { .. } => "http_status",
            TransportError::Interrupted { .. } => "stream_interrupted",
            TransportError::EndedWithoutCompletion => "stream_ended",
            TransportError::Decode { .. } => "decode_failed",
            TransportError::Timeout { .. } => "stream_timeout",
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            TransportError::ConnectionFailed { .. } => {
                "Could not reach the assistant. Check your connection.".to_string()
            }
            TransportError::HttpStatus { status, .. } => {
                format!("The assistant returned an error (HTTP {}).", status)
            }
            TransportError::Interrupted { .. } => {
                "The connection dropped before the response finished.".to_string()
            }
            TransportError::EndedWithoutCompletion => {
                "The response ended unexpectedly.".to_string()
            }
            TransportError::Decode { event_type, .. } => {
                format!("Received an unreadable update ({}).", event_type)
            }
            TransportError::Timeout { duration_secs } => {
                format!("No response for {} seconds.", duration_secs)
            }
        }
    }
}

impl fmt::Display for TransportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportError::ConnectionFailed { url, message } => {
                write!(f, "Connection to {} failed: {}", url, message)
            }
            TransportError::HttpStatus { status, message } => {
                write!(f, "HTTP {}: {}", status, message)
            }
            TransportError::Interrupted { message } => {
                write!(f, "Stream interrupted: {}", message)
            }
            TransportError::EndedWithoutCompletion => {
                write!(f, "Stream ended without a terminal event")
            }
            TransportError::Decode {
                event_type,
                message,
            } => write!(f, "Failed to decode '{}' event: {}", event_type, message),
            TransportError::Timeout { duration_secs } => {
                write!(f, "Stream timed out after {}s", duration_secs)
            }
        }
    }
}

impl std::error::Error for TransportError {}
