//! Result type alias for runtime operations.

use super::runtime_error::RuntimeError;

/// Type alias for Results using RuntimeError.
///
/// # Example
///
/// ```ignore
/// use threadline::error::RuntimeResult;
///
/// fn submit(runtime: &mut SessionRuntime, text: &str) -> RuntimeResult<RunHandle> {
///     runtime.submit(text, Vec::new())
/// }
/// ```
pub type RuntimeResult<T> = Result<T, RuntimeError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    #[test]
    fn test_question_mark_converts_domain_errors() {
        fn validate(content: &str) -> RuntimeResult<usize> {
            if content.trim().is_empty() {
                Err::<(), _>(ValidationError::EmptySubmission)?;
            }
            Ok(content.len())
        }

        assert_eq!(validate("hi").unwrap(), 2);
        assert!(matches!(
            validate("  "),
            Err(RuntimeError::Validation(ValidationError::EmptySubmission))
        ));
    }
}
