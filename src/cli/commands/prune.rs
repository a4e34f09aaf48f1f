use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::Config;

use super::open_store;

#[derive(Args, Debug)]
pub struct PruneArgs {}

#[derive(Debug, Serialize)]
pub struct PruneOutput {
    pub removed: u64,
}

impl CommandOutput for PruneOutput {
    fn to_human(&self) -> String {
        match self.removed {
            0 => "No expired events.".to_string(),
            1 => "Removed 1 expired event.".to_string(),
            n => format!("Removed {n} expired events."),
        }
    }
}

pub async fn execute(_args: PruneArgs, config: &Config, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let removed = store
        .prune_expired()
        .await
        .context("Failed to prune expired events")?;

    output(&PruneOutput { removed }, json);
    Ok(())
}
