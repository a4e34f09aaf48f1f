//! CLI type definitions
//!
//! This module contains clap command structures that define the CLI interface.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::commands::{
    history::HistoryArgs, parse::ParseArgs, playbook::PlaybookArgs, prune::PruneArgs,
    rules::RulesArgs, stack::StackArgs, stats::StatsArgs,
};

#[derive(Parser, Debug)]
#[command(name = "deploy-memory")]
#[command(about = "Fingerprint, classify and remember deployment failures", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,

    /// Load configuration from this file instead of .deploy-memory/
    #[arg(short, long, global = true, env = "DEPLOY_MEMORY_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a stack's recent events
    Stack(StackArgs),

    /// Analyze deployment console output from a file or stdin
    Parse(ParseArgs),

    /// Show stored events for a fingerprint
    History(HistoryArgs),

    /// Show aggregate statistics for a fingerprint
    Stats(StatsArgs),

    /// Show the playbook for a playbook id or error class
    Playbook(PlaybookArgs),

    /// List the classification rules in precedence order
    Rules(RulesArgs),

    /// Delete expired events
    Prune(PruneArgs),
}
