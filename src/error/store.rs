//! Persistence gateway errors.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// The thread does not exist (deleted elsewhere, or never persisted).
    NotFound { thread_id: String },

    /// The gateway could not be reached.
    Unavailable { message: String },

    /// The gateway refused the operation.
    Rejected { status: u16, message: String },

    /// The gateway answered with something we could not decode.
    Decode { message: String },
}

impl StoreError {
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Unavailable { .. } => true,
            StoreError::Rejected { status, .. } => *status >= 500,
            StoreError::NotFound { .. } | StoreError::Decode { .. } => false,
        }
    }

    pub fn error_code(&self) -> &'static str {
        match self {
            StoreError::NotFound { .. } => "thread_not_found",
            StoreError::Unavailable { .. } => "store_unavailable",
            StoreError::Rejected { .. } => "store_rejected",
            StoreError::Decode { .. } => "store_decode_failed",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            StoreError::NotFound { .. } => "This conversation no longer exists.".to_string(),
            StoreError::Unavailable { .. } => {
                "Conversations are unavailable right now.".to_string()
            }
            StoreError::Rejected { message, .. } => message.clone(),
            StoreError::Decode { .. } => "Conversations could not be read.".to_string(),
        }
    }
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::NotFound { thread_id } => write!(f, "Thread {} not found", thread_id),
            StoreError::Unavailable { message } => write!(f, "Store unavailable: {}", message),
            StoreError::Rejected { status, message } => {
                write!(f, "Store rejected request ({}): {}", status, message)
            }
            StoreError::Decode { message } => write!(f, "Store decode error: {}", message),
        }
    }
}

impl std::error::Error for StoreError {}
