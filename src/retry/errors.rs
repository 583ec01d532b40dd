use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Classification of an operation failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Network,
    Validation,
    Timeout,
    Unknown,
}

impl ErrorKind {
    /// Kinds the executor is willing to try again
    pub const RETRYABLE: [ErrorKind; 2] = [ErrorKind::Network, ErrorKind::Timeout];

    pub fn is_retryable(self) -> bool {
        Self::RETRYABLE.contains(&self)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::Network => "network",
            ErrorKind::Validation => "validation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Unknown => "unknown",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A classified workflow failure
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind} error: {message}")]
pub struct WorkflowError {
    kind: ErrorKind,
    message: String,
    retryable: bool,
}

impl WorkflowError {
    /// New error flagged retryable. The flag alone does not make it retried;
    /// see [`WorkflowError::should_retry`].
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            retryable: true,
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Network, message)
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Timeout, message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, message).with_retryable(false)
    }

    /// Wrap a failure that carries no classification
    pub fn unclassified(error: impl fmt::Display) -> Self {
        Self::new(ErrorKind::Unknown, error.to_string())
    }

    pub fn with_retryable(mut self, retryable: bool) -> Self {
        self.retryable = retryable;
        self
    }

    pub fn kind(&self) -> ErrorKind {
        self.kind
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    /// The flag set at construction
    pub fn is_flagged_retryable(&self) -> bool {
        self.retryable
    }

    /// Retried only when flagged retryable AND of a retryable kind.
    /// Validation and unknown errors are never retried.
    pub fn should_retry(&self) -> bool {
        self.retryable && self.kind.is_retryable()
    }
}

impl From<anyhow::Error> for WorkflowError {
    fn from(error: anyhow::Error) -> Self {
        match error.downcast::<WorkflowError>() {
            Ok(classified) => classified,
            Err(other) => WorkflowError::unclassified(format!("{other:#}")),
        }
    }
}

// Foreign errors carry no classification of their own
impl From<std::io::Error> for WorkflowError {
    fn from(error: std::io::Error) -> Self {
        WorkflowError::unclassified(error)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validation_never_retried_even_when_flagged() {
        let error = WorkflowError::new(ErrorKind::Validation, "bad amount").with_retryable(true);
        assert!(error.is_flagged_retryable());
        assert!(!error.should_retry());
    }

    #[test]
    fn test_flag_gates_retryable_kinds() {
        assert!(WorkflowError::network("reset").should_retry());
        assert!(WorkflowError::timeout("slow").should_retry());
        assert!(!WorkflowError::network("reset").with_retryable(false).should_retry());
        assert!(!WorkflowError::unclassified("boom").should_retry());
    }

    #[test]
    fn test_anyhow_conversion_keeps_classification() {
        let classified: WorkflowError =
            anyhow::Error::new(WorkflowError::timeout("gateway")).into();
        assert_eq!(classified.kind(), ErrorKind::Timeout);

        let wrapped: WorkflowError = anyhow::anyhow!("disk full").into();
        assert_eq!(wrapped.kind(), ErrorKind::Unknown);
        assert_eq!(wrapped.message(), "disk full");
    }

    #[test]
    fn test_io_errors_are_unknown_and_not_retried() {
        let refused: WorkflowError =
            std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused").into();
        assert_eq!(refused.kind(), ErrorKind::Unknown);
        assert_eq!(refused.message(), "refused");
        assert!(!refused.should_retry());

        let timed_out: WorkflowError =
            std::io::Error::new(std::io::ErrorKind::TimedOut, "slow").into();
        assert_eq!(timed_out.kind(), ErrorKind::Unknown);
    }

    #[test]
    fn test_display_format() {
        assert_eq!(
            WorkflowError::network("connection reset").to_string(),
            "network error: connection reset"
        );
    }
}
