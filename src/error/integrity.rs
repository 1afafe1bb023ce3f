//! Protocol violations detected while applying events.
//!
//! These never abort a session: the offending mutation is dropped and the
//! fault is logged (and, for the thread cache, recorded).

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityError {
    /// A tool result referenced a tool call that was never announced.
    UnknownToolCall { tool_call_id: String },

    /// A tool call reused an id already present in the message.
    DuplicateToolCall { tool_call_id: String },

    /// An event carried a run id other than the active run's.
    RunMismatch { expected: String, actual: String },

    /// An event carried a thread id other than the run's thread.
    ThreadMismatch { expected: String, actual: String },

    /// An event targeted a message other than the reply being built.
    MessageMismatch { expected: String, actual: String },

    /// The server confirmed a thread id different from the placeholder's.
    PlaceholderMismatch { placeholder: String, confirmed: String },
}

impl IntegrityError {
    pub fn error_code(&self) -> &'static str {
        match self {
            IntegrityError::UnknownToolCall { .. } => "unknown_tool_call",
            IntegrityError::DuplicateToolCall { .. } => "duplicate_tool_call",
            IntegrityError::RunMismatch { .. } => "run_mismatch",
            IntegrityError::ThreadMismatch { .. } => "thread_mismatch",
            IntegrityError::MessageMismatch { .. } => "message_mismatch",
            IntegrityError::PlaceholderMismatch { .. } => "placeholder_mismatch",
        }
    }
}

impl fmt::Display for IntegrityError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IntegrityError::UnknownToolCall { tool_call_id } => {
                write!(f, "tool result for unknown tool call {}", tool_call_id)
            }
            IntegrityError::DuplicateToolCall { tool_call_id } => {
                write!(f, "duplicate tool call {}", tool_call_id)
            }
            IntegrityError::RunMismatch { expected, actual } => {
                write!(f, "event for run {} while run {} is active", actual, expected)
            }
            IntegrityError::ThreadMismatch { expected, actual } => {
                write!(f, "event for thread {} while run targets {}", actual, expected)
            }
            IntegrityError::MessageMismatch { expected, actual } => {
                write!(f, "event for message {} while building {}", actual, expected)
            }
            IntegrityError::PlaceholderMismatch {
                placeholder,
                confirmed,
            } => write!(
                f,
                "placeholder thread {} confirmed as {}",
                placeholder, confirmed
            ),
        }
    }
}

impl std::error::Error for IntegrityError {}
