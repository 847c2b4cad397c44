use clap::{Args, Parser, Subcommand};
use clap_complete::Shell;

use dailies_core::VERSION;

/// Dailies - completion tracking for daily and weekly habits
#[derive(Parser)]
#[command(name = "dailies")]
#[command(author, version = VERSION, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to the database file
    #[arg(long, global = true, env = "DAILIES_DB")]
    pub db: Option<String>,

    #[command(subcommand)]
    pub command: Commands,

    /// Quiet mode (minimal output)
    #[arg(short, long, global = true)]
    pub quiet: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Create a new database and config
    Init(InitArgs),

    /// Manage tracked entities
    Entity {
        #[command(subcommand)]
        command: EntityCommands,
    },

    /// Log progress for an entity in its current window
    Log(LogArgs),

    /// Show event history for an entity
    Events(EventsArgs),

    /// Show completion for the current windows
    Status(StatusArgs),

    /// Check database integrity
    Check,

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for the `init` command
#[derive(Args)]
pub struct InitArgs {
    /// Path where the database will be created
    #[arg(value_name = "PATH")]
    pub path: Option<String>,

    /// Display name for the owner
    #[arg(long)]
    pub owner: Option<String>,

    /// Identity token for the owner (generated if omitted)
    #[arg(long)]
    pub token: Option<String>,

    /// Config path override
    #[arg(long)]
    pub config_path: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Subcommand)]
pub enum EntityCommands {
    /// Add a new entity
    Add(EntityAddArgs),

    /// List entities
    List(EntityListArgs),

    /// Show a single entity
    Show {
        /// Entity ID, ID prefix, or name
        #[arg(value_name = "ENTITY")]
        entity: String,

        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Change an entity's mutable attributes
    Edit(EntityEditArgs),
}

/// Arguments for `entity add`
#[derive(Args)]
pub struct EntityAddArgs {
    /// Entity name
    #[arg(value_name = "NAME")]
    pub name: String,

    /// Category (exercise, learning, care, thinking, tidying)
    #[arg(long)]
    pub category: String,

    /// Entity type (workout, flashCards, genericCompletion)
    #[arg(long = "type", value_name = "TYPE")]
    pub entity_type: String,

    /// Count toward full category completion
    #[arg(long)]
    pub required: bool,

    /// Reset interval (daily, weekly)
    #[arg(long, default_value = "daily")]
    pub interval: String,

    /// Completions needed per window (genericCompletion)
    #[arg(long)]
    pub required_completions: Option<u32>,

    /// Workout field to record (repeatable)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,
}

/// Arguments for `entity list`
#[derive(Args)]
pub struct EntityListArgs {
    /// Filter by entity type
    #[arg(long = "type", value_name = "TYPE")]
    pub entity_type: Option<String>,

    /// Filter by category
    #[arg(long)]
    pub category: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

/// Arguments for `entity edit`
#[derive(Args)]
pub struct EntityEditArgs {
    /// Entity ID, ID prefix, or name
    #[arg(value_name = "ENTITY")]
    pub entity: String,

    /// New name
    #[arg(long)]
    pub name: Option<String>,

    /// Mark as required
    #[arg(long, conflicts_with = "optional")]
    pub required: bool,

    /// Mark as optional
    #[arg(long)]
    pub optional: bool,

    /// Reset interval (daily, weekly); fixed once events are logged
    #[arg(long)]
    pub interval: Option<String>,

    /// Completions needed per window
    #[arg(long, conflicts_with = "clear_required_completions")]
    pub required_completions: Option<u32>,

    /// Remove the required completion count
    #[arg(long)]
    pub clear_required_completions: bool,

    /// Replace the recorded workout fields (repeatable)
    #[arg(long = "field", value_name = "FIELD")]
    pub fields: Vec<String>,

    /// Rejected unless it matches the current category
    #[arg(long, hide = true)]
    pub category: Option<String>,

    /// Rejected unless it matches the current type
    #[arg(long = "type", value_name = "TYPE", hide = true)]
    pub entity_type: Option<String>,
}

/// Arguments for the `log` command
#[derive(Args)]
pub struct LogArgs {
    /// Entity ID, ID prefix, or name
    #[arg(value_name = "ENTITY")]
    pub entity: String,

    /// Completion count (genericCompletion; default adds one)
    #[arg(long)]
    pub completions: Option<u32>,

    /// Cards reviewed (flashCards)
    #[arg(long)]
    pub reviewed: Option<u32>,

    /// Cards answered correctly (flashCards)
    #[arg(long)]
    pub correct: Option<u32>,

    /// Weight (workout)
    #[arg(long)]
    pub weight: Option<f64>,

    /// Repetitions (workout)
    #[arg(long)]
    pub reps: Option<u32>,

    /// Sets (workout)
    #[arg(long)]
    pub sets: Option<u32>,

    /// Distance (workout)
    #[arg(long)]
    pub distance: Option<f64>,

    /// Duration in seconds (workout)
    #[arg(long)]
    pub duration: Option<u32>,

    /// Log into a past window instead (ISO-8601 or YYYY-MM-DD)
    #[arg(long)]
    pub at: Option<String>,
}

/// Arguments for the `events` command
#[derive(Args)]
#[command(args_conflicts_with_subcommands = true)]
pub struct EventsArgs {
    #[command(subcommand)]
    pub command: Option<EventsCommands>,

    /// Entity ID, ID prefix, or name
    #[arg(value_name = "ENTITY")]
    pub entity: Option<String>,

    /// Limit number of results
    #[arg(long)]
    pub limit: Option<usize>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum EventsCommands {
    /// Delete an event from a window that is still open
    Delete {
        /// Event ID
        #[arg(value_name = "EVENT_ID")]
        id: String,
    },
}

/// Arguments for the `status` command
#[derive(Args)]
pub struct StatusArgs {
    /// Only show one category
    #[arg(long)]
    pub category: Option<String>,

    /// Compute status at another time (ISO-8601 or YYYY-MM-DD)
    #[arg(long)]
    pub at: Option<String>,

    /// Output as JSON
    #[arg(long)]
    pub json: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_events_accepts_entity_or_delete() {
        let cli = Cli::try_parse_from(["dailies", "events", "water", "--json"]).unwrap();
        match cli.command {
            Commands::Events(args) => {
                assert_eq!(args.entity.as_deref(), Some("water"));
                assert!(args.json);
                assert!(args.command.is_none());
            }
            _ => panic!("expected events"),
        }

        let cli = Cli::try_parse_from(["dailies", "events", "delete", "abc"]).unwrap();
        match cli.command {
            Commands::Events(args) => {
                assert!(matches!(args.command, Some(EventsCommands::Delete { .. })));
            }
            _ => panic!("expected events"),
        }
    }
}
