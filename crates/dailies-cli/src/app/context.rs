//! Application context for the Dailies CLI.
//!
//! Provides a unified context that combines CLI arguments with
//! lazily-loaded configuration.

use once_cell::unsync::OnceCell;

use dailies_core::storage::{SqliteStorage, Storage, User};

use crate::cli::Cli;
use crate::config::DailiesConfig;
use crate::constants::DEFAULT_OWNER_TOKEN;
use crate::errors::CliError;

use super::resolver::{init_hint, load_config, missing_database_message, resolve_database_path};

/// Application context that bundles CLI args with the config file.
///
/// This avoids repeatedly loading config and threading multiple parameters
/// through handler functions.
pub struct AppContext<'a> {
    cli: &'a Cli,
    config: OnceCell<Option<DailiesConfig>>,
}

impl<'a> AppContext<'a> {
    /// Create a new application context from CLI arguments.
    pub fn new(cli: &'a Cli) -> Self {
        Self {
            cli,
            config: OnceCell::new(),
        }
    }

    /// Check if quiet mode is enabled.
    pub fn quiet(&self) -> bool {
        self.cli.quiet
    }

    /// Get the config file contents, loading them lazily if needed.
    pub fn config(&self) -> anyhow::Result<Option<&DailiesConfig>> {
        Ok(self.config.get_or_try_init(load_config)?.as_ref())
    }

    /// Open the database and resolve the owner all commands act for.
    pub fn open_storage(&self) -> anyhow::Result<(SqliteStorage, User)> {
        let config = self.config()?;
        let path = resolve_database_path(self.cli, config)?;
        if !path.exists() {
            return Err(CliError::not_found(missing_database_message(&path), init_hint()).into());
        }

        let mut storage = SqliteStorage::open(&path)?;
        let (token, name) = match config {
            Some(config) => (config.owner.token.as_str(), config.owner.name.as_deref()),
            None => (DEFAULT_OWNER_TOKEN, None),
        };
        let owner = storage.ensure_user(token, name)?;
        tracing::debug!(path = %path.display(), owner_id = %owner.id, "opened database");
        Ok((storage, owner))
    }
}
