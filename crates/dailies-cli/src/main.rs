//! Dailies CLI - completion tracking for daily and weekly habits
//!
//! This is the command-line interface for Dailies. It provides a user-friendly
//! interface to the core library functionality.

mod app;
mod cli;
mod commands;
mod config;
mod constants;
mod errors;
mod helpers;
mod output;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::app::AppContext;
use crate::cli::{Cli, Commands};
use crate::commands::{entities, events, init, maintenance, misc, status};
use crate::errors::exit_code_for;

fn main() {
    init_tracing();

    let cli = Cli::parse();
    if let Err(err) = run(&cli) {
        eprintln!("Error: {}", err);
        std::process::exit(exit_code_for(&err));
    }
}

fn init_tracing() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("DAILIES_LOG")
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false),
        )
        .init();
}

fn run(cli: &Cli) -> anyhow::Result<()> {
    let ctx = AppContext::new(cli);
    match &cli.command {
        Commands::Init(args) => init::handle_init(cli, &ctx, args),
        Commands::Entity { command } => entities::handle_entity(&ctx, command),
        Commands::Log(args) => events::handle_log(&ctx, args),
        Commands::Events(args) => events::handle_events(&ctx, args),
        Commands::Status(args) => status::handle_status(&ctx, args),
        Commands::Check => maintenance::handle_check(&ctx),
        Commands::Completions { shell } => misc::handle_completions(*shell),
    }
}
