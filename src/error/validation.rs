//! Errors raised before a run starts.

use std::fmt;

/// Submission rejected before anything touched the transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    /// Content was empty or whitespace and there were no attachments.
    EmptySubmission,

    /// A run is already streaming for this runtime.
    RunInProgress,

    /// The current thread's history has not finished loading.
    ThreadLoading { thread_id: String },

    /// The attachment's type is not accepted.
    UnsupportedAttachment { name: String },

    /// The attachment could not be read as text.
    UnreadableAttachment { name: String, message: String },

    /// The attachment exceeds the configured size limit.
    AttachmentTooLarge { name: String, size: usize, limit: usize },

    /// There is nothing to retry, or the last failure is not retryable.
    NotRetryable { reason: String },
}

impl ValidationError {
    pub fn error_code(&self) -> &'static str {
        match self {
            ValidationError::EmptySubmission => "empty_submission",
            ValidationError::RunInProgress => "run_in_progress",
            ValidationError::ThreadLoading { .. } => "thread_loading",
            ValidationError::UnsupportedAttachment { .. } => "unsupported_attachment",
            ValidationError::UnreadableAttachment { .. } => "unreadable_attachment",
            ValidationError::AttachmentTooLarge { .. } => "attachment_too_large",
            ValidationError::NotRetryable { .. } => "not_retryable",
        }
    }

    pub fn user_message(&self) -> String {
        match self {
            ValidationError::EmptySubmission => "Type a message first.".to_string(),
            ValidationError::RunInProgress => {
                "Please wait for the current response to complete before sending another message."
                    .to_string()
            }
            ValidationError::ThreadLoading { .. } => {
                "The conversation is still loading.".to_string()
            }
            ValidationError::UnsupportedAttachment { name } => {
                format!("{} is not a supported file type.", name)
            }
            ValidationError::UnreadableAttachment { name, .. } => {
                format!("{} could not be read as text.", name)
            }
            ValidationError::AttachmentTooLarge { name, limit, .. } => {
                format!("{} is larger than the {} byte limit.", name, limit)
            }
            ValidationError::NotRetryable { reason } => reason.clone(),
        }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::UnreadableAttachment { name, message } => {
                write!(f, "Unreadable attachment {}: {}", name, message)
            }
            ValidationError::AttachmentTooLarge { name, size, limit } => {
                write!(f, "Attachment {} is {} bytes (limit {})", name, size, limit)
            }
            other => write!(f, "{}", other.user_message()),
        }
    }
}

impl std::error::Error for ValidationError {}
