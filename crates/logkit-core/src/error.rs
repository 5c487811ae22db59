//! Error types for logkit

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while building a logger or generating identifiers.
///
/// Emitting a record never returns one of these; only configuration,
/// construction and identifier generation do.
#[derive(Error, Debug)]
pub enum LogError {
    /// The log directory (or one of its parents) could not be created
    #[error("failed to create log directory {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A file sink could not be opened for appending
    #[error("failed to open log sink {sink}: {source}")]
    OpenSink {
        sink: String,
        #[source]
        source: std::io::Error,
    },

    /// Time zone name is not a known IANA zone
    #[error("unknown time zone: {0}")]
    TimeZone(String),

    /// Invalid configuration value
    #[error("invalid configuration: {0}")]
    Config(String),

    /// The secure random source failed
    #[error("secure random source failed: {0}")]
    Random(#[from] getrandom::Error),

    /// A global tracing subscriber is already installed
    #[error("a global tracing subscriber is already installed")]
    AlreadyInitialized,
}

impl LogError {
    /// True for failures caused by the deployment environment (filesystem)
    /// rather than by the configuration handed to the logger.
    pub fn is_environment(&self) -> bool {
        matches!(self, LogError::CreateDir { .. } | LogError::OpenSink { .. })
    }
}

/// Result type alias for logkit operations
pub type Result<T> = std::result::Result<T, LogError>;
