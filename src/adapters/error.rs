//! Errors raised inside the HTTP adapters before they are mapped onto the
//! runtime's transport and store errors.

use thiserror::Error;

use crate::error::{StoreError, TransportError};
use crate::sse::SseParseError;

#[derive(Debug, Error)]
pub enum HttpAdapterError {
    /// Request could not be sent or the body could not be read
    #[error("HTTP error: {0}")]
    Request(#[from] reqwest::Error),

    /// Server answered with a non-success status
    #[error("Server error ({status}): {message}")]
    Status { status: u16, message: String },

    /// Response body did not match the expected shape
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Event stream framing or payload was invalid
    #[error("SSE parse error: {0}")]
    Sse(#[from] SseParseError),

    /// No bytes arrived for this many seconds
    #[error("No data for {0} seconds")]
    Idle(u64),
}

impl HttpAdapterError {
    /// Map onto the transport taxonomy, `url` naming the endpoint and
    /// `timeout_secs` the request timeout in force
    pub fn into_transport(self, url: &str, timeout_secs: u64) -> TransportError {
        match self {
            HttpAdapterError::Request(err) if err.is_timeout() => TransportError::Timeout {
                duration_secs: timeout_secs,
            },
            HttpAdapterError::Request(err) if err.is_connect() => TransportError::ConnectionFailed {
                url: url.to_string(),
                message: err.to_string(),
            },
            HttpAdapterError::Request(err) => TransportError::Interrupted {
                message: err.to_string(),
            },
            HttpAdapterError::Status { status, message } => {
                TransportError::HttpStatus { status, message }
            }
            HttpAdapterError::Json(err) => TransportError::Decode {
                event_type: String::new(),
                message: err.to_string(),
            },
            HttpAdapterError::Sse(err) => err.into(),
            HttpAdapterError::Idle(secs) => TransportError::Timeout {
                duration_secs: secs,
            },
        }
    }

    /// Map onto the store taxonomy, `thread_id` naming the target (if any)
    pub fn into_store(self, thread_id: Option<&str>) -> StoreError {
        match self {
            HttpAdapterError::Request(err) if err.is_decode() => StoreError::Decode {
                message: err.to_string(),
            },
            HttpAdapterError::Request(err) => StoreError::Unavailable {
                message: err.to_string(),
            },
            HttpAdapterError::Status { status, message } => match thread_id {
                Some(id) if status == 404 => StoreError::NotFound {
                    thread_id: id.to_string(),
                },
                _ => StoreError::Rejected { status, message },
            },
            HttpAdapterError::Json(err) => StoreError::Decode {
                message: err.to_string(),
            },
            HttpAdapterError::Sse(err) => StoreError::Decode {
                message: err.to_string(),
            },
            HttpAdapterError::Idle(secs) => StoreError::Unavailable {
                message: format!("no data for {} seconds", secs),
            },
        }
    }
}
