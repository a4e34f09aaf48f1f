use anyhow::{Context, Result};
use clap::Args;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, EventStats};

use super::open_store;

#[derive(Args, Debug)]
pub struct StatsArgs {
    /// Fingerprint id (16 hex characters)
    pub fingerprint_id: String,
}

impl CommandOutput for EventStats {
    fn to_human(&self) -> String {
        if self.total_occurrences == 0 {
            return format!("No events recorded for {}.", self.fingerprint_id);
        }

        [
            format!("Fingerprint:        {}", self.fingerprint_id),
            format!("Occurrences:        {}", self.total_occurrences),
            format!("First seen:         {}", self.first_seen.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Last seen:          {}", self.last_seen.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("Average confidence: {:.2}", self.average_confidence),
        ]
        .join("\n")
    }
}

pub async fn execute(args: StatsArgs, config: &Config, json: bool) -> Result<()> {
    let store = open_store(config).await?;
    let stats = store
        .get_event_stats(&args.fingerprint_id)
        .await
        .context("Failed to compute event stats")?;

    output(&stats, json);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_stats_human_output() {
        let stats = EventStats::empty("0123456789abcdef");
        assert_eq!(stats.to_human(), "No events recorded for 0123456789abcdef.");
    }
}
