//! Error handling for the session runtime.
//!
//! - **Error Categories**: high-level classification for retry and hints
//! - **Domain-specific Errors**: transport, provider, validation, integrity, store
//! - **Unified Error Type**: `RuntimeError` consolidates them
//! - **Result Type Alias**: `RuntimeResult<T>`
//!
//! # Error Categories
//!
//! | Category | Description | Retryable |
//! |----------|-------------|-----------|
//! | Network | Stream connect/reset/timeout | Yes |
//! | Server | Provider overload, rate limits, 5xx | Yes |
//! | Auth | Missing or rejected credentials | No |
//! | Client | Protocol violations | No |
//! | User | Input or request problems | No |
//! | Storage | Persistence gateway | No |
//! | Cancelled | Stopped by the user | No |

mod category;
mod integrity;
mod provider;
mod result;
mod runtime_error;
mod store;
mod transport;
mod validation;

pub use category::ErrorCategory;
pub use integrity::IntegrityError;
pub use provider::{ProviderError, ProviderErrorKind};
pub use result::RuntimeResult;
pub use runtime_error::RuntimeError;
pub use store::StoreError;
pub use transport::TransportError;
pub use validation::ValidationError;

#[cfg(test)]
mod integration_tests {
    use super::*;

    /// Every error kind can be categorized, coded and explained.
    #[test]
    fn test_error_unification() {
        let errors: Vec<RuntimeError> = vec![
            TransportError::EndedWithoutCompletion.into(),
            ProviderError::new("overloaded", "busy").into(),
            ValidationError::RunInProgress.into(),
            IntegrityError::DuplicateToolCall {
                tool_call_id: "tc1".to_string(),
            }
            .into(),
            RuntimeError::CancelledByUser,
            StoreError::Unavailable {
                message: "down".to_string(),
            }
            .into(),
        ];

        for err in errors {
            assert!(!err.error_code().is_empty());
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }

    #[test]
    fn test_retry_logic() {
        let retryable: Vec<RuntimeError> = vec![
            TransportError::Interrupted {
                message: "reset".to_string(),
            }
            .into(),
            ProviderError::new("rate_limited", "slow").into(),
            StoreError::Unavailable {
                message: "down".to_string(),
            }
            .into(),
        ];
        for err in retryable {
            assert!(err.is_retryable(), "Expected {:?} to be retryable", err);
        }

        let non_retryable: Vec<RuntimeError> = vec![
            ProviderError::new("missing_credentials", "no key").into(),
            ProviderError::new("context_length_exceeded", "too long").into(),
            RuntimeError::CancelledByUser,
        ];
        for err in non_retryable {
            assert!(!err.is_retryable(), "Expected {:?} to not be retryable", err);
        }
    }
}
