//! Error types for the Gator engine
//!
//! Follows a small, closed taxonomy:
//! - `thiserror` for ergonomic error definitions
//! - domain-specific variants for actionable handling by the API layer
//! - retryability classification so the caller owns the retry policy
//!
//! Missing signals (no collaborative data, no graph edges) and empty results
//! are never errors; they are ordinary successful outcomes.

use std::borrow::Cow;
use thiserror::Error;

/// Result type alias for engine operations
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the Gator engine
#[derive(Debug, Error)]
pub enum Error {
    /// Rejected request: bad input, nothing was mutated
    #[error("Invalid request: {message}")]
    Validation { message: Cow<'static, str> },

    #[error("Entity not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// Backing store read/write failure. Retryable; the engine itself
    /// performs no retries and never commits a partial multi-key update.
    #[error("Storage error: {message}")]
    Storage {
        message: Cow<'static, str>,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidConfig {
        key: &'static str,
        message: Cow<'static, str>,
    },

    #[error("Operation timed out after {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a not found error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Create a storage error
    pub fn storage(message: impl Into<Cow<'static, str>>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// Create a storage error with source
    pub fn storage_with_source(
        message: impl Into<Cow<'static, str>>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self::Storage {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Returns true if this error is retryable by the caller
    pub fn is_retryable(&self) -> bool {
        matches!(self, Error::Storage { .. } | Error::Timeout { .. })
    }

    /// Get error code for API responses
    pub fn error_code(&self) -> &'static str {
        match self {
            Error::Validation { .. } => "BAD_REQUEST",
            Error::NotFound { .. } => "NOT_FOUND",
            Error::Storage { .. } => "STORAGE_ERROR",
            Error::InvalidConfig { .. } => "CONFIG_ERROR",
            Error::Timeout { .. } => "TIMEOUT",
            Error::Json(_) => "SERIALIZATION_ERROR",
            Error::Other(_) => "INTERNAL_ERROR",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_retryable() {
        assert!(Error::storage("connection refused").is_retryable());
        assert!(Error::Timeout { timeout_ms: 500 }.is_retryable());
        assert!(!Error::validation("bad interaction type").is_retryable());
        assert!(!Error::not_found("content", "123").is_retryable());
    }

    #[test]
    fn test_error_codes() {
        assert_eq!(Error::validation("x").error_code(), "BAD_REQUEST");
        assert_eq!(Error::not_found("user", "u1").error_code(), "NOT_FOUND");
        assert_eq!(Error::storage("down").error_code(), "STORAGE_ERROR");
    }
}
