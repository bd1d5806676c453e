//! Error types for the ensemble client.
//!
//! The taxonomy is deliberately closed: every failure the crate can produce
//! maps onto one of these variants, so callers match on states instead of
//! scraping log output.

use thiserror::Error;

/// Result type alias for the ensemble client.
pub type Result<T> = std::result::Result<T, EnsembleError>;

/// Main error type for the ensemble client.
#[derive(Debug, Error)]
pub enum EnsembleError {
    /// A required configuration value was absent.
    #[error("missing configuration: {0}")]
    ConfigurationMissing(&'static str),

    /// A remote agent definition could not be fetched during initialization.
    #[error("failed to fetch agent {agent_id}: {reason}")]
    AgentFetchFailed { agent_id: String, reason: String },

    /// Fewer agent IDs were supplied than the configured minimum.
    #[error("at least {required} agents are required, got {actual}")]
    MinimumAgentCountNotMet { required: usize, actual: usize },

    /// An operation was attempted before a successful `initialize`.
    #[error("orchestration service not initialized")]
    NotInitialized,

    /// A delegated remote call failed.
    #[error("remote call failed during {operation}: {source}")]
    RemoteCallFailed {
        operation: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Cleanup ran to completion but one or more steps failed.
    #[error("cleanup completed with {} failed step(s)", .failures.len())]
    CleanupPartialFailure { failures: Vec<String> },

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),
}

impl EnsembleError {
    /// Wrap a transport-level failure with the name of the delegated operation.
    pub fn remote(
        operation: &'static str,
        source: impl Into<Box<dyn std::error::Error + Send + Sync>>,
    ) -> Self {
        Self::RemoteCallFailed {
            operation,
            source: source.into(),
        }
    }
}
