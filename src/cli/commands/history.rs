use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, DeployMemoryEvent};

use super::open_store;

#[derive(Args, Debug)]
pub struct HistoryArgs {
    /// Fingerprint id (16 hex characters)
    pub fingerprint_id: String,

    /// Maximum number of events to show
    #[arg(short, long)]
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct HistoryOutput {
    pub fingerprint_id: String,
    pub events: Vec<DeployMemoryEvent>,
}

impl CommandOutput for HistoryOutput {
    fn to_human(&self) -> String {
        if self.events.is_empty() {
            return format!("No events recorded for {}.", self.fingerprint_id);
        }

        let mut lines = vec![format!("Events for {}:", self.fingerprint_id)];
        lines.push(TableFormatter::new().format_events(&self.events));
        lines.push(format!(
            "\nShowing {} event{}",
            self.events.len(),
            if self.events.len() == 1 { "" } else { "s" }
        ));
        lines.join("\n")
    }
}

pub async fn execute(args: HistoryArgs, config: &Config, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let limit = args.limit.unwrap_or(config.memory.default_query_limit);

    let events = store
        .query_by_fingerprint(&args.fingerprint_id, limit)
        .await
        .context("Failed to query deploy memory")?;

    output(
        &HistoryOutput {
            fingerprint_id: args.fingerprint_id,
            events,
        },
        json,
    );
    Ok(())
}
