//! Custom error types for the common library
//!
//! This module defines the error raised by every backend the access layer
//! talks to, whatever the transport.

use std::time::Duration;
use thiserror::Error;

/// Custom error type for backend operations
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackendError {
    /// The backend could not be reached
    #[error("Backend transport error: {0}")]
    Transport(String),

    /// The backend did not answer in time
    #[error("Backend request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend answered with an unexpected status
    #[error("Backend returned status {status}: {message}")]
    Status { status: u16, message: String },

    /// The requested record does not exist on the backend
    #[error("Backend record not found: {0}")]
    NotFound(String),

    /// The backend payload could not be decoded
    #[error("Backend payload could not be decoded: {0}")]
    Decode(String),

    /// Configuration error
    #[error("Backend configuration error: {0}")]
    Configuration(String),
}

impl BackendError {
    /// Whether repeating the same request may succeed.
    ///
    /// Transport failures, timeouts and 5xx answers are retried; everything
    /// else is a definitive answer from the backend.
    pub fn is_retryable(&self) -> bool {
        match self {
            BackendError::Transport(_) | BackendError::Timeout(_) => true,
            BackendError::Status { status, .. } => *status >= 500,
            BackendError::NotFound(_)
            | BackendError::Decode(_)
            | BackendError::Configuration(_) => false,
        }
    }
}

/// Type alias for Result with BackendError
pub type BackendResult<T> = Result<T, BackendError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        assert!(BackendError::Transport("connection reset".into()).is_retryable());
        assert!(BackendError::Timeout(Duration::from_millis(10)).is_retryable());
        assert!(
            BackendError::Status {
                status: 503,
                message: "unavailable".into()
            }
            .is_retryable()
        );
        assert!(
            !BackendError::Status {
                status: 403,
                message: "forbidden".into()
            }
            .is_retryable()
        );
        assert!(!BackendError::NotFound("staff-1".into()).is_retryable());
        assert!(!BackendError::Decode("eof".into()).is_retryable());
    }
}
