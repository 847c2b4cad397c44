//! Error types for Dailies core operations.
//!
//! Errors are descriptive at the core level; the CLI layer maps these
//! to user-friendly messages and exit codes.

use thiserror::Error;

/// Result type alias for Dailies operations.
pub type Result<T> = std::result::Result<T, DailiesError>;

/// Core error type for Dailies operations.
#[derive(Debug, Error)]
pub enum DailiesError {
    /// Entity type and category combination is not allowed
    #[error("Invalid category/type: {0}")]
    InvalidCategoryOrType(String),

    /// Entity configuration cannot be used for completion accounting
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Data validation error
    #[error("Validation error: {0}")]
    Validation(String),

    /// Event belongs to a time window that has already closed
    #[error("Window closed: {0}")]
    WindowClosed(String),

    /// Storage backend error
    #[error("Storage error: {0}")]
    Storage(String),

    /// Resource not found (or not owned by the caller)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid user input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<std::io::Error> for DailiesError {
    fn from(err: std::io::Error) -> Self {
        DailiesError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for DailiesError {
    fn from(err: serde_json::Error) -> Self {
        DailiesError::Validation(err.to_string())
    }
}

impl From<rusqlite::Error> for DailiesError {
    fn from(err: rusqlite::Error) -> Self {
        DailiesError::Storage(format!("SQLite error: {}", err))
    }
}
