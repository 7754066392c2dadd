use std::path::PathBuf;

/// Errors from storage engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The write would push the origin past its capacity.
    #[error("quota exceeded writing {key}: {required} units required, quota is {quota}")]
    QuotaExceeded {
        key: String,
        required: usize,
        quota: usize,
    },

    /// I/O error from a persistent backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Encoding the backing file failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The backing file exists but does not hold a string map.
    #[error("corrupt storage file {path}: {reason}")]
    Corrupt { path: PathBuf, reason: String },

    /// An internal lock was poisoned by a panicking writer.
    #[error("lock poisoned: {0}")]
    Poisoned(String),
}

/// Result alias for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
