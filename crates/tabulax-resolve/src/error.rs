//! Error types for external value resolution.

use std::time::Duration;

use thiserror::Error;

/// Errors raised by a [`ValueResolver`](crate::ValueResolver).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[non_exhaustive]
pub enum ResolveError {
    /// No answer arrived within the configured timeout.
    #[error("resolver timed out after {0:?}")]
    Timeout(Duration),

    /// The service answered with a non-success status.
    #[error("resolver returned HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Connection or I/O failure.
    #[error("transport error: {0}")]
    Transport(String),

    /// The response could not be decoded or was empty.
    #[error("invalid resolver response: {0}")]
    InvalidResponse(String),

    /// The resolver refused to map this value.
    #[error("resolver rejected value: {0}")]
    Rejected(String),

    /// No resolver is configured.
    #[error("resolver not configured: {0}")]
    NotConfigured(String),
}

impl ResolveError {
    /// Returns whether a retry might succeed.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout(_) | Self::Transport(_) => true,
            Self::Status { status, .. } => *status == 429 || *status >= 500,
            Self::InvalidResponse(_) | Self::Rejected(_) | Self::NotConfigured(_) => false,
        }
    }
}

/// Result type alias for resolver operations.
pub type Result<T> = std::result::Result<T, ResolveError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable() {
        assert!(ResolveError::Timeout(Duration::from_secs(1)).is_retryable());
        assert!(ResolveError::Transport("reset".to_string()).is_retryable());
        assert!(
            ResolveError::Status {
                status: 503,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            ResolveError::Status {
                status: 429,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(
            !ResolveError::Status {
                status: 400,
                body: String::new()
            }
            .is_retryable()
        );
        assert!(!ResolveError::Rejected("x".to_string()).is_retryable());
        assert!(!ResolveError::NotConfigured("url".to_string()).is_retryable());
    }
}
