//! Error category classification for unified error handling.
//!
//! Categories drive retry eligibility and the hint shown next to a
//! terminal error note.

use std::fmt;

/// High-level categorization of errors for handling decisions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Transport-level failures (connect, reset, timeout).
    /// Generally transient and retryable.
    Network,

    /// Missing or rejected credentials for the model provider.
    /// Never retryable until the user fixes them.
    Auth,

    /// Backend/provider-side failures (overload, rate limits, 5xx).
    /// Generally transient and retryable after delay.
    Server,

    /// Protocol violations the client detected (unknown ids, mismatched runs).
    /// Not retryable - indicates a bug on one side of the wire.
    Client,

    /// User action required (empty input, bad attachment, invalid request).
    User,

    /// Persistence gateway failures.
    Storage,

    /// The user stopped the run.
    Cancelled,
}

impl ErrorCategory {
    /// Returns true if errors in this category are generally transient
    /// and the operation can be retried.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ErrorCategory::Network | ErrorCategory::Server)
    }

    /// Returns a short label for the category suitable for logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "network",
            ErrorCategory::Auth => "auth",
            ErrorCategory::Server => "server",
            ErrorCategory::Client => "client",
            ErrorCategory::User => "user",
            ErrorCategory::Storage => "storage",
            ErrorCategory::Cancelled => "cancelled",
        }
    }

    /// Returns suggested recovery actions for this category.
    pub fn recovery_hint(&self) -> &'static str {
        match self {
            ErrorCategory::Network => "Check your connection and try again",
            ErrorCategory::Auth => "Add or update the provider credentials in settings",
            ErrorCategory::Server => "The assistant is busy. Please try again shortly",
            ErrorCategory::Client => "This may be a bug. Please report it if it persists",
            ErrorCategory::User => "Please check your input and try again",
            ErrorCategory::Storage => "Your conversations could not be synced. Try again later",
            ErrorCategory::Cancelled => "",
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_retryable() {
        assert!(ErrorCategory::Network.is_retryable());
        assert!(ErrorCategory::Server.is_retryable());
        assert!(!ErrorCategory::Auth.is_retryable());
        assert!(!ErrorCategory::Client.is_retryable());
        assert!(!ErrorCategory::User.is_retryable());
        assert!(!ErrorCategory::Storage.is_retryable());
        assert!(!ErrorCategory::Cancelled.is_retryable());
    }

    #[test]
    fn test_category_display() {
        assert_eq!(format!("{}", ErrorCategory::Network), "network");
        assert_eq!(format!("{}", ErrorCategory::Storage), "storage");
    }

    #[test]
    fn test_category_recovery_hint() {
        assert!(ErrorCategory::Auth.recovery_hint().contains("credentials"));
        assert!(ErrorCategory::Cancelled.recovery_hint().is_empty());
    }
}
