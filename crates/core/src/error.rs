use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for skillrun-core
pub type Result<T> = std::result::Result<T, Error>;

/// Core error types for the skillrun orchestration runtime
///
/// Only startup-level failures surface through this type. Per-skill scan problems and
/// failed command executions are reported as ordinary values, never as `Err`.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error for file operations
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// Parse/serialization errors
    #[error("parse error: {0}")]
    Parse(String),

    /// Skill discovery errors
    #[error("skill error: {0}")]
    Skill(String),

    /// Process execution setup errors
    #[error("execution error: {0}")]
    Execution(String),

    /// Errors raised by the driving model
    #[error("model error: {0}")]
    Model(String),

    /// Skill root exists but could not be opened
    #[error("skill root is not readable: {path}: {reason}")]
    UnreadableRoot { path: PathBuf, reason: String },

    /// Generic errors
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create an unreadable-root error from an I/O failure
    pub fn unreadable_root(path: impl Into<PathBuf>, err: &std::io::Error) -> Self {
        Self::UnreadableRoot { path: path.into(), reason: err.to_string() }
    }
}
