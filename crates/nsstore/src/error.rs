//! Error types for namespaced store operations.

use thiserror::Error;

/// Errors that can occur in namespaced store operations.
///
/// Public accessors only ever return [`StoreError::InvalidArgument`]. The
/// read and write variants describe failures that are recovered internally
/// and reported through `tracing`.
#[derive(Debug, Error)]
pub enum StoreError {
    /// A required argument was missing or malformed.
    #[error("invalid argument: {reason}")]
    InvalidArgument { reason: String },

    /// The root entry could not be read or decoded into an object.
    #[error("failed to read {key}: {reason}")]
    Read { key: String, reason: String },

    /// The root entry could not be encoded or stored.
    #[error("failed to write {key}: {reason}")]
    Write { key: String, reason: String },
}

impl StoreError {
    pub(crate) fn invalid(reason: impl Into<String>) -> Self {
        Self::InvalidArgument {
            reason: reason.into(),
        }
    }
}

/// Convenience type alias for store operations.
pub type StoreResult<T> = std::result::Result<T, StoreError>;
