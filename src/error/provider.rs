//! Structured errors reported by the model backend.

use std::fmt;

use super::category::ErrorCategory;

/// Classification of a provider error code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderErrorKind {
    RateLimited,
    Overloaded,
    Timeout,
    MissingCredentials,
    InvalidCredentials,
    InvalidRequest,
    ContextLengthExceeded,
    ContentFiltered,
    Unknown,
}

impl ProviderErrorKind {
    /// Map a backend error code onto a kind. Unknown codes are treated as
    /// non-retryable so the runtime never loops on something it cannot read.
    pub fn from_code(code: &str) -> Self {
        match code.to_ascii_lowercase().as_str() {
            "rate_limited" | "rate_limit_exceeded" | "too_many_requests" => {
                ProviderErrorKind::RateLimited
            }
            "overloaded" | "server_overloaded" | "service_unavailable" | "upstream_error" => {
                ProviderErrorKind::Overloaded
            }
            "timeout" | "provider_timeout" => ProviderErrorKind::Timeout,
            "missing_credentials" | "missing_api_key" | "no_api_key" => {
                ProviderErrorKind::MissingCredentials
            }
            "invalid_credentials" | "invalid_api_key" | "unauthorized" => {
                ProviderErrorKind::InvalidCredentials
            }
            "invalid_request" | "bad_request" | "model_not_found" => {
                ProviderErrorKind::InvalidRequest
            }
            "context_length_exceeded" | "context_too_long" => {
                ProviderErrorKind::ContextLengthExceeded
            }
            "content_filtered" | "content_policy" => ProviderErrorKind::ContentFiltered,
            _ => ProviderErrorKind::Unknown,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            ProviderErrorKind::RateLimited
            | ProviderErrorKind::Overloaded
            | ProviderErrorKind::Timeout => ErrorCategory::Server,
            ProviderErrorKind::MissingCredentials | ProviderErrorKind::InvalidCredentials => {
                ErrorCategory::Auth
            }
            ProviderErrorKind::InvalidRequest
            | ProviderErrorKind::ContextLengthExceeded
            | ProviderErrorKind::ContentFiltered => ErrorCategory::User,
            ProviderErrorKind::Unknown => ErrorCategory::Client,
        }
    }
}

/// Error event reported by the backend for a run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderError {
    pub code: String,
    pub message: String,
}

impl ProviderError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ProviderErrorKind {
        ProviderErrorKind::from_code(&self.code)
    }

    pub fn category(&self) -> ErrorCategory {
        self.kind().category()
    }

    /// Check if the user may retry the run as-is.
    pub fn is_retryable(&self) -> bool {
        self.category().is_retryable()
    }

    /// Get a user-friendly error message.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ProviderErrorKind::RateLimited => {
                "The model provider is rate limiting requests. Try again in a moment.".to_string()
            }
            ProviderErrorKind::Overloaded => "The model provider is overloaded.".to_string(),
            ProviderErrorKind::Timeout => "The model provider took too long to respond.".to_string(),
            ProviderErrorKind::MissingCredentials => {
                "No API key is configured for this provider.".to_string()
            }
            ProviderErrorKind::InvalidCredentials => {
                "The configured API key was rejected.".to_string()
            }
            ProviderErrorKind::ContextLengthExceeded => {
                "This conversation is too long for the selected model.".to_string()
            }
            ProviderErrorKind::ContentFiltered => {
                "The response was blocked by the provider's content policy.".to_string()
            }
            ProviderErrorKind::InvalidRequest | ProviderErrorKind::Unknown => {
                self.message.clone()
            }
        }
    }
}

impl fmt::Display for ProviderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Provider error [{}]: {}", self.code, self.message)
    }
}

impl std::error::Error for ProviderError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_credentials_not_retryable() {
        let err = ProviderError::new("missing_credentials", "no key for openai");
        assert_eq!(err.kind(), ProviderErrorKind::MissingCredentials);
        assert_eq!(err.category(), ErrorCategory::Auth);
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_rate_limit_retryable() {
        let err = ProviderError::new("RATE_LIMITED", "slow down");
        assert_eq!(err.kind(), ProviderErrorKind::RateLimited);
        assert!(err.is_retryable());
    }

    #[test]
    fn test_unknown_code_not_retryable() {
        let err = ProviderError::new("something_new", "mystery");
        assert_eq!(err.kind(), ProviderErrorKind::Unknown);
        assert!(!err.is_retryable());
        assert_eq!(err.user_message(), "mystery");
    }
}
