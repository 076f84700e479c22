//! Error types for the Riverdale service.

use thiserror::Error;

/// Main error type for Riverdale operations.
#[derive(Error, Debug)]
pub enum RiverdaleError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// A caller broke the contract of an operation (empty key, zero quota, ...)
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Record store errors
    #[error("Record store error: {0}")]
    Store(String),

    /// HTTP server errors
    #[error("Server error: {0}")]
    Server(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<::config::ConfigError> for RiverdaleError {
    fn from(err: ::config::ConfigError) -> Self {
        RiverdaleError::Config(err.to_string())
    }
}

/// Result type alias for Riverdale operations.
pub type Result<T> = std::result::Result<T, RiverdaleError>;
