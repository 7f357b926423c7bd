//! Context error types

use thiserror::Error;

/// Failures while starting a test server.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The listener could not be bound.
    #[error("failed to bind test server on {host}: {source}")]
    Bind {
        /// Interface that was requested.
        host: String,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The bound address could not be turned into a base URL.
    #[error("invalid server address: {0}")]
    Address(String),

    /// The HTTP client could not be created.
    #[error("failed to create HTTP client: {0}")]
    Client(String),
}

/// Result type alias for context operations.
pub type ContextResult<T> = Result<T, ContextError>;
