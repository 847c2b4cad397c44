//! Path resolution for config and database files.

use std::path::{Path, PathBuf};

use crate::cli::Cli;
use crate::config::{default_config_path, read_config, DailiesConfig};
use crate::errors::CliError;

/// Resolve the config file path, checking DAILIES_CONFIG env var first.
pub fn resolve_config_path() -> anyhow::Result<PathBuf> {
    if let Ok(value) = std::env::var("DAILIES_CONFIG") {
        if !value.trim().is_empty() {
            return Ok(PathBuf::from(value));
        }
    }
    default_config_path()
}

/// Load the config file if it exists.
pub fn load_config() -> anyhow::Result<Option<DailiesConfig>> {
    let config_path = resolve_config_path()?;
    if !config_path.exists() {
        return Ok(None);
    }
    read_config(&config_path).map(Some)
}

/// Resolve the database path from CLI args or config.
pub fn resolve_database_path(
    cli: &Cli,
    config: Option<&DailiesConfig>,
) -> anyhow::Result<PathBuf> {
    if let Some(path) = cli.db.as_ref() {
        return Ok(PathBuf::from(path));
    }

    match config {
        Some(config) => Ok(PathBuf::from(&config.database.path)),
        None => {
            let config_path = resolve_config_path()?;
            Err(CliError::not_found(missing_config_message(&config_path), init_hint()).into())
        }
    }
}

/// Error message when the database file is missing.
pub fn missing_database_message(path: &Path) -> String {
    format!("No database found at {}", path.display())
}

/// Error message when the config file is missing.
pub fn missing_config_message(config_path: &Path) -> String {
    format!("No config found at {}", config_path.display())
}

pub fn init_hint() -> &'static str {
    "\nRun:\n  dailies init\n\nOr specify a database path:\n  DAILIES_DB=/path/to/dailies.db dailies init"
}
