use std::path::PathBuf;

use uuid::Uuid;

use dailies_core::storage::{SqliteStorage, Storage};

use crate::app::{resolve_config_path, AppContext};
use crate::cli::{Cli, InitArgs};
use crate::config::{default_database_path, write_config, DailiesConfig};
use crate::errors::CliError;

pub fn handle_init(cli: &Cli, ctx: &AppContext<'_>, args: &InitArgs) -> anyhow::Result<()> {
    let config_path = match args.config_path.as_ref() {
        Some(path) => PathBuf::from(path),
        None => resolve_config_path()?,
    };
    if config_path.exists() && !args.force {
        return Err(CliError::invalid_input(format!(
            "Config already exists at {}\nHint: Pass --force to overwrite it.",
            config_path.display()
        ))
        .into());
    }

    let database_path = match args.path.as_ref().or(cli.db.as_ref()) {
        Some(path) => PathBuf::from(path),
        None => default_database_path()?,
    };
    if let Some(parent) = database_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| {
                anyhow::anyhow!(
                    "Failed to create database directory {}: {}",
                    parent.display(),
                    e
                )
            })?;
        }
    }

    let reused = database_path.exists();
    let mut storage = if reused {
        SqliteStorage::open(&database_path)?
    } else {
        SqliteStorage::create(&database_path)?
    };

    let token = match args.token.as_ref() {
        Some(token) => token.trim().to_string(),
        None => format!("local|{}", Uuid::new_v4()),
    };
    let owner = storage.ensure_user(&token, args.owner.as_deref())?;

    let config = DailiesConfig::new(database_path.clone(), token, args.owner.clone());
    write_config(&config_path, &config)?;
    tracing::info!(config = %config_path.display(), "wrote config");

    if !ctx.quiet() {
        if reused {
            println!("Using existing database at {}", database_path.display());
        } else {
            println!("Created database at {}", database_path.display());
        }
        println!("Config written to {}", config_path.display());
        println!("Owner: {} ({})", owner.name, owner.id);
    }
    Ok(())
}
