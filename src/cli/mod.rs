//! Command-line interface for deploy memory.

pub mod commands;
pub mod output;
pub mod types;

pub use types::{Cli, Commands};

use anyhow::{Context, Result};
use console::style;
use std::path::Path;

use crate::domain::models::Config;
use crate::infrastructure::config::ConfigLoader;

/// Load configuration from an explicit file, or from the project layers.
pub fn load_config(path: Option<&Path>) -> Result<Config> {
    match path {
        Some(path) => ConfigLoader::load_from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display())),
        None => ConfigLoader::load().context("Failed to load configuration"),
    }
}

/// Run one parsed command against a loaded configuration.
pub async fn dispatch(command: Commands, config: &Config, json: bool) -> Result<()> {
    match command {
        Commands::Stack(args) => commands::stack::execute(args, config, json).await,
        Commands::Parse(args) => commands::parse::execute(args, config, json).await,
        Commands::History(args) => commands::history::execute(args, config, json).await,
        Commands::Stats(args) => commands::stats::execute(args, config, json).await,
        Commands::Playbook(args) => commands::playbook::execute(args, config, json).await,
        Commands::Rules(args) => commands::rules::execute(args, config, json).await,
        Commands::Prune(args) => commands::prune::execute(args, config, json).await,
    }
}

/// Print a command error and exit with status 1.
pub fn handle_error(err: anyhow::Error, json: bool) -> ! {
    if json {
        let chain: Vec<String> = err.chain().map(ToString::to_string).collect();
        let body = serde_json::json!({ "error": err.to_string(), "causes": &chain[1..] });
        println!("{}", serde_json::to_string_pretty(&body).unwrap_or_default());
    } else {
        eprintln!("{} {err:#}", style("Error:").red().bold());
    }
    std::process::exit(1)
}
