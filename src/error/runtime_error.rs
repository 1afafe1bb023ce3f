//! Unified error type for the session runtime.

use std::fmt;

use super::category::ErrorCategory;
use super::integrity::IntegrityError;
use super::provider::ProviderError;
use super::store::StoreError;
use super::transport::TransportError;
use super::validation::ValidationError;

/// Unified error type for the session runtime.
///
/// Transport and provider failures end up as a terminal note on the
/// assistant message; validation failures are returned from `submit`;
/// integrity faults are logged and the mutation dropped.
#[derive(Debug, Clone, PartialEq)]
pub enum RuntimeError {
    /// Stream failed before a terminal event.
    Transport(TransportError),

    /// Structured error reported by the backend.
    Provider(ProviderError),

    /// Rejected before a run started.
    Validation(ValidationError),

    /// Event stream violated the protocol.
    Integrity(IntegrityError),

    /// The user stopped the run.
    CancelledByUser,

    /// Persistence gateway failure.
    Store(StoreError),
}

impl RuntimeError {
    /// Get the category of this error.
    pub fn category(&self) -> ErrorCategory {
        match self {
            RuntimeError::Transport(err) => match err {
                TransportError::HttpStatus { status, .. } if *status >= 500 || *status == 429 => {
                    ErrorCategory::Server
                }
                TransportError::HttpStatus { status: 401, .. }
                | TransportError::HttpStatus { status: 403, .. } => ErrorCategory::Auth,
                TransportError::HttpStatus { .. } | TransportError::Decode { .. } => {
                    ErrorCategory::Client
                }
                _ => ErrorCategory::Network,
            },
            RuntimeError::Provider(err) => err.category(),
            RuntimeError::Validation(_) => ErrorCategory::User,
            RuntimeError::Integrity(_) => ErrorCategory::Client,
            RuntimeError::CancelledByUser => ErrorCategory::Cancelled,
            RuntimeError::Store(_) => ErrorCategory::Storage,
        }
    }

    /// Check if the failed run may be retried by the user.
    pub fn is_retryable(&self) -> bool {
        match self {
            RuntimeError::Transport(err) => err.is_retryable(),
            RuntimeError::Provider(err) => err.is_retryable(),
            RuntimeError::Store(err) => err.is_retryable(),
            RuntimeError::Validation(_)
            | RuntimeError::Integrity(_)
            | RuntimeError::CancelledByUser => false,
        }
    }

    /// Get a short error code for logging.
    pub fn error_code(&self) -> String {
        match self {
            RuntimeError::Transport(err) => err.error_code().to_string(),
            RuntimeError::Provider(err) => err.code.clone(),
            RuntimeError::Validation(err) => err.error_code().to_string(),
            RuntimeError::Integrity(err) => err.error_code().to_string(),
            RuntimeError::CancelledByUser => "cancelled".to_string(),
            RuntimeError::Store(err) => err.error_code().to_string(),
        }
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self {
            RuntimeError::Transport(err) => err.user_message(),
            RuntimeError::Provider(err) => err.user_message(),
            RuntimeError::Validation(err) => err.user_message(),
            RuntimeError::Integrity(_) => "Received an inconsistent update.".to_string(),
            RuntimeError::CancelledByUser => "Response stopped.".to_string(),
            RuntimeError::Store(err) => err.user_message(),
        }
    }

    /// Get the recovery hint for this error.
    pub fn recovery_hint(&self) -> &'static str {
        self.category().recovery_hint()
    }
}

impl fmt::Display for RuntimeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RuntimeError::Transport(err) => write!(f, "{}", err),
            RuntimeError::Provider(err) => write!(f, "{}", err),
            RuntimeError::Validation(err) => write!(f, "{}", err),
            RuntimeError::Integrity(err) => write!(f, "Integrity fault: {}", err),
            RuntimeError::CancelledByUser => write!(f, "Cancelled by user"),
            RuntimeError::Store(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for RuntimeError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RuntimeError::Transport(err) => Some(err),
            RuntimeError::Provider(err) => Some(err),
            RuntimeError::Validation(err) => Some(err),
            RuntimeError::Integrity(err) => Some(err),
            RuntimeError::CancelledByUser => None,
            RuntimeError::Store(err) => Some(err),
        }
    }
}

// ============================================================================
// From implementations for automatic error conversion
// ============================================================================

impl From<TransportError> for RuntimeError {
    fn from(err: TransportError) -> Self {
        RuntimeError::Transport(err)
    }
}

impl From<ProviderError> for RuntimeError {
    fn from(err: ProviderError) -> Self {
        RuntimeError::Provider(err)
    }
}

impl From<ValidationError> for RuntimeError {
    fn from(err: ValidationError) -> Self {
        RuntimeError::Validation(err)
    }
}

impl From<IntegrityError> for RuntimeError {
    fn from(err: IntegrityError) -> Self {
        RuntimeError::Integrity(err)
    }
}

impl From<StoreError> for RuntimeError {
    fn from(err: StoreError) -> Self {
        RuntimeError::Store(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_transport_categories() {
        let lost: RuntimeError = TransportError::Interrupted {
            message: "reset".to_string(),
        }
        .into();
        assert_eq!(lost.category(), ErrorCategory::Network);

        let unauthorized: RuntimeError = TransportError::HttpStatus {
            status: 401,
            message: "no".to_string(),
        }
        .into();
        assert_eq!(unauthorized.category(), ErrorCategory::Auth);

        let overloaded: RuntimeError = TransportError::HttpStatus {
            status: 503,
            message: "busy".to_string(),
        }
        .into();
        assert_eq!(overloaded.category(), ErrorCategory::Server);
    }

    #[test]
    fn test_provider_missing_credentials_not_retryable() {
        let err: RuntimeError = ProviderError::new("missing_credentials", "no key").into();
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
        assert_eq!(err.error_code(), "missing_credentials");
    }

    #[test]
    fn test_cancelled_by_user() {
        let err = RuntimeError::CancelledByUser;
        assert_eq!(err.category(), ErrorCategory::Cancelled);
        assert!(!err.is_retryable());
        assert!(err.source().is_none());
    }

    #[test]
    fn test_validation_never_retryable() {
        let err: RuntimeError = ValidationError::EmptySubmission.into();
        assert_eq!(err.category(), ErrorCategory::User);
        assert!(!err.is_retryable());
        assert!(err.source().is_some());
    }

    #[test]
    fn test_integrity_display() {
        let err: RuntimeError = IntegrityError::UnknownToolCall {
            tool_call_id: "tc9".to_string(),
        }
        .into();
        assert!(err.to_string().contains("tc9"));
        assert_eq!(err.error_code(), "unknown_tool_call");
    }
}
