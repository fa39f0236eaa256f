//! Error types for the performance layer

use std::time::Duration;

use cadence_common::{CommonError, ErrorClassification, ErrorSeverity};
use thiserror::Error;

/// Result alias used throughout `cadence-core`
pub type PerfResult<T> = Result<T, PerfError>;

/// Errors raised by the store, optimizer and manager
///
/// `Clone` so that a single batch failure can be delivered to every caller
/// queued in that batch.
#[derive(Debug, Clone, Error)]
pub enum PerfError {
    /// The injected query executor reported a failure
    #[error("Query failed: {0}")]
    Query(String),

    /// A batch was torn down before it delivered results
    #[error("Batch '{batch_key}' was dropped before completion")]
    BatchDropped { batch_key: String },

    #[error(transparent)]
    Common(#[from] CommonError),
}

impl PerfError {
    /// Convenience constructor for executor failures
    pub fn query<S: Into<String>>(message: S) -> Self {
        Self::Query(message.into())
    }
}

impl From<serde_json::Error> for PerfError {
    fn from(err: serde_json::Error) -> Self {
        Self::Common(err.into())
    }
}

impl ErrorClassification for PerfError {
    fn is_retryable(&self) -> bool {
        match self {
            Self::Query(_) => false,
            Self::BatchDropped { .. } => true,
            Self::Common(e) => e.is_retryable(),
        }
    }

    fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Query(_) => ErrorSeverity::Error,
            Self::BatchDropped { .. } => ErrorSeverity::Warning,
            Self::Common(e) => e.severity(),
        }
    }

    fn is_critical(&self) -> bool {
        match self {
            Self::Common(e) => e.is_critical(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::Common(e) => e.retry_after(),
            _ => None,
        }
    }
}
