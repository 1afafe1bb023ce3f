//! SSE line and parse error types

use crate::error::TransportError;

/// One classified line of an SSE stream
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseLine {
    /// `event: <type>`
    Event(String),
    /// `data: <payload>`
    Data(String),
    /// Blank line, ends the current event
    Empty,
    /// `: comment`, or any line we do not understand
    Comment(String),
}

/// SSE parsing errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SseParseError {
    /// Payload was not valid JSON, or did not match the event shape
    InvalidJson { event_type: String, source: String },
    /// Event had a type but no data
    MissingData { event_type: String },
}

impl std::fmt::Display for SseParseError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SseParseError::InvalidJson { event_type, source } => {
                write!(f, "Invalid JSON for event '{}': {}", event_type, source)
            }
            SseParseError::MissingData { event_type } => {
                write!(f, "Missing data for event type: {}", event_type)
            }
        }
    }
}

impl std::error::Error for SseParseError {}

impl From<SseParseError> for TransportError {
    fn from(err: SseParseError) -> Self {
        match err {
            SseParseError::InvalidJson { event_type, source } => TransportError::Decode {
                event_type,
                message: source,
            },
            SseParseError::MissingData { event_type } => TransportError::Decode {
                event_type,
                message: "missing data".to_string(),
            },
        }
    }
}
