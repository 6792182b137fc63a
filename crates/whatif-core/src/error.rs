//! Error types for the scenario pipeline
//!
//! Provides error handling for:
//! - Request validation
//! - Completion service failures
//! - Unrecoverable completion text
//! - Fallback exhaustion
//! - Scenario persistence

use crate::types::ScenarioId;
use std::path::PathBuf;

/// Number of raw completion characters kept for diagnostics
pub const EXCERPT_LEN: usize = 200;

/// Main pipeline error type
#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    /// Empty or missing user input
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Completion service down, timed out, or refused the request
    #[error("completion service unavailable: {0}")]
    CompletionUnavailable(#[from] CompletionError),

    /// Completion service answered but no structured object could be recovered
    #[error("malformed completion ({reason}): {excerpt}")]
    MalformedCompletion {
        /// What went wrong during recovery
        reason: String,
        /// Leading characters of the raw completion
        excerpt: String,
    },

    /// No fallback scenario matches the input
    #[error("no fallback scenario matches input: \"{user_input}\"")]
    NoFallbackMatch { user_input: String },

    /// Scenario id lookup miss
    #[error("scenario not found: {0}")]
    NotFound(ScenarioId),

    /// Persistence failure
    #[error("store error: {0}")]
    Store(StoreError),
}

impl ScenarioError {
    /// Create malformed-completion error from the raw text
    pub fn malformed(reason: impl Into<String>, raw: &str) -> Self {
        Self::MalformedCompletion {
            reason: reason.into(),
            excerpt: raw.chars().take(EXCERPT_LEN).collect(),
        }
    }

    /// Check if the caller sent something unusable
    #[inline]
    #[must_use]
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidInput(_) | Self::NotFound(_) | Self::NoFallbackMatch { .. }
        )
    }

    /// Check if the error stems from the completion service being unreachable
    #[inline]
    #[must_use]
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::CompletionUnavailable(_))
    }
}

impl From<StoreError> for ScenarioError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => Self::NotFound(id),
            other => Self::Store(other),
        }
    }
}

/// Completion service errors
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    /// Service not configured or unreachable
    #[error("unavailable: {0}")]
    Unavailable(String),

    /// Call exceeded its deadline
    #[error("timed out after {duration_secs}s")]
    Timeout { duration_secs: u64 },

    /// Provider returned an error status
    #[error("provider returned {status}: {message}")]
    Provider { status: u16, message: String },

    /// Provider answered without any text
    #[error("empty response")]
    EmptyResponse,
}

/// Scenario store errors
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No record with this id
    #[error("scenario not found: {0}")]
    NotFound(ScenarioId),

    /// IO error on the backing file
    #[error("io error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Stored table could not be encoded or decoded
    #[error("serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl StoreError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Result type alias for pipeline operations
pub type ScenarioResult<T> = Result<T, ScenarioError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn malformed_truncates_excerpt() {
        let raw = "x".repeat(500);
        let err = ScenarioError::malformed("no object", &raw);
        match err {
            ScenarioError::MalformedCompletion { excerpt, reason } => {
                assert_eq!(excerpt.len(), EXCERPT_LEN);
                assert_eq!(reason, "no object");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn no_fallback_names_input() {
        let err = ScenarioError::NoFallbackMatch {
            user_input: "What if cats ruled?".to_string(),
        };
        assert!(err.to_string().contains("What if cats ruled?"));
        assert!(err.is_client_error());
    }

    #[test]
    fn store_not_found_maps_to_not_found() {
        let err: ScenarioError = StoreError::NotFound(ScenarioId(7)).into();
        assert!(matches!(err, ScenarioError::NotFound(ScenarioId(7))));
    }

    #[test]
    fn completion_errors_are_unavailable() {
        let err: ScenarioError = CompletionError::Timeout { duration_secs: 30 }.into();
        assert!(err.is_unavailable());
        assert!(!err.is_client_error());
        assert!(err.to_string().contains("timed out after 30s"));
    }
}
