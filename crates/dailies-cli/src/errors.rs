//! CLI error types for structured error handling.
//!
//! Typed errors map to specific exit codes; core errors are mapped by kind.

use std::fmt;

use dailies_core::DailiesError;

use crate::constants::exit_codes;

/// CLI-specific errors with associated exit codes.
#[derive(Debug)]
pub enum CliError {
    /// Resource not found (config, database, entity, event)
    NotFound { message: String, hint: String },

    /// Invalid user input
    InvalidInput(String),

    /// Integrity check failed
    IntegrityFailed(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::NotFound { message, hint } => write!(f, "{}\n{}", message, hint),
            CliError::InvalidInput(message) | CliError::IntegrityFailed(message) => {
                write!(f, "{}", message)
            }
        }
    }
}

impl std::error::Error for CliError {}

impl CliError {
    /// Create a NotFound error with message and hint.
    pub fn not_found(message: impl Into<String>, hint: impl Into<String>) -> Self {
        CliError::NotFound {
            message: message.into(),
            hint: hint.into(),
        }
    }

    /// Create an InvalidInput error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        CliError::InvalidInput(message.into())
    }

    pub fn integrity_failed(message: impl Into<String>) -> Self {
        CliError::IntegrityFailed(message.into())
    }

    /// Get the exit code for this error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CliError::NotFound { .. } => exit_codes::NOT_FOUND,
            CliError::InvalidInput(_) => exit_codes::INVALID_INPUT,
            CliError::IntegrityFailed(_) => exit_codes::INTEGRITY_FAILED,
        }
    }
}

/// Pick the process exit code for an error returned by a command handler.
pub fn exit_code_for(err: &anyhow::Error) -> i32 {
    if let Some(cli_error) = err.downcast_ref::<CliError>() {
        return cli_error.exit_code();
    }
    match err.downcast_ref::<DailiesError>() {
        Some(DailiesError::NotFound(_)) => exit_codes::NOT_FOUND,
        Some(
            DailiesError::InvalidInput(_)
            | DailiesError::Validation(_)
            | DailiesError::InvalidCategoryOrType(_)
            | DailiesError::WindowClosed(_),
        ) => exit_codes::INVALID_INPUT,
        _ => exit_codes::FAILURE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_codes_follow_error_kind() {
        let err = anyhow::Error::new(DailiesError::NotFound("Entity not found".to_string()));
        assert_eq!(exit_code_for(&err), exit_codes::NOT_FOUND);

        let err = anyhow::Error::new(DailiesError::WindowClosed("closed".to_string()));
        assert_eq!(exit_code_for(&err), exit_codes::INVALID_INPUT);

        let err = anyhow::Error::new(DailiesError::Storage("disk".to_string()));
        assert_eq!(exit_code_for(&err), exit_codes::FAILURE);

        let err = anyhow::Error::new(CliError::invalid_input("bad flag"));
        assert_eq!(exit_code_for(&err), exit_codes::INVALID_INPUT);

        assert_eq!(exit_code_for(&anyhow::anyhow!("boom")), exit_codes::FAILURE);
    }

    #[test]
    fn test_hint_is_rendered_on_its_own_line() {
        let err = CliError::not_found("No database found", "Run:\n  dailies init");
        assert_eq!(err.to_string(), "No database found\nRun:\n  dailies init");
    }
}
