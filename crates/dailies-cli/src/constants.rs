//! Constants used throughout the CLI.

/// Exit codes for the CLI.
///
/// These follow common Unix conventions:
/// - 0: Success
/// - 1: General error
/// - 2: Misuse of shell command (reserved by shells and clap)
/// - 3+: Application-specific errors
pub mod exit_codes {
    /// General failure not covered by a specific code.
    pub const FAILURE: i32 = 1;

    /// Resource not found (config, database, entity, event).
    pub const NOT_FOUND: i32 = 3;

    /// Invalid user input or arguments.
    pub const INVALID_INPUT: i32 = 4;

    /// Integrity check failed.
    pub const INTEGRITY_FAILED: i32 = 6;
}

/// Owner token used when no config supplies one.
pub const DEFAULT_OWNER_TOKEN: &str = "local";

/// Default number of events shown by `dailies events`.
pub const DEFAULT_EVENT_LIMIT: usize = 20;
