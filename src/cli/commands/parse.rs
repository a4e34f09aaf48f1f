use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

use crate::cli::output::output;
use crate::domain::models::Config;

use super::{dry_run_service, event_source, recording_service};

#[derive(Args, Debug)]
pub struct ParseArgs {
    /// Console output file; reads stdin when omitted
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Stack name to record, overriding the one found in the output
    #[arg(short, long)]
    pub stack: Option<String>,

    /// Classify without recording the event
    #[arg(long)]
    pub no_store: bool,
}

pub async fn execute(args: ParseArgs, config: &Config, json: bool) -> Result<()> {
    let text = read_input(args.file.as_ref()).await?;
    let source = event_source(config);

    let analysis = if args.no_store {
        dry_run_service(source, config)
            .analyze_console(&text, args.stack)
            .await
    } else {
        recording_service(source, config)
            .await?
            .analyze_console(&text, args.stack)
            .await
    };

    output(&analysis, json);
    Ok(())
}

async fn read_input(file: Option<&PathBuf>) -> Result<String> {
    match file {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display())),
        None => {
            let mut text = String::new();
            tokio::io::stdin()
                .read_to_string(&mut text)
                .await
                .context("Failed to read console output from stdin")?;
            Ok(text)
        }
    }
}
