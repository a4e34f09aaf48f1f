use anyhow::{Context, Result};
use clap::Args;

use crate::adapters::stack_events::AwsCliStackEventSource;
use crate::cli::output::output;
use crate::cli::output::progress::{create_spinner, ProgressBarExt};
use crate::domain::models::Config;
use crate::domain::ports::DeployMemoryRepository;
use crate::services::{DeployMemoryService, FailureAnalysis};

use super::{dry_run_service, event_source, recording_service};

#[derive(Args, Debug)]
pub struct StackArgs {
    /// Stack name or id
    pub stack_name: String,

    /// Number of recent stack events to inspect
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Classify without recording the event
    #[arg(long)]
    pub no_store: bool,
}

pub async fn execute(args: StackArgs, config: &Config, json: bool) -> Result<()> {
    let source = event_source(config);

    let analysis = if args.no_store {
        analyze(dry_run_service(source, config), &args, json).await?
    } else {
        analyze(recording_service(source, config).await?, &args, json).await?
    };

    output(&analysis, json);
    Ok(())
}

async fn analyze<R: DeployMemoryRepository>(
    service: DeployMemoryService<AwsCliStackEventSource, R>,
    args: &StackArgs,
    json: bool,
) -> Result<FailureAnalysis> {
    let service = match args.limit {
        Some(limit) => service.with_event_window(limit),
        None => service,
    };

    let spinner = create_spinner(format!("Reading events for {}", args.stack_name), json);
    match service.analyze_stack(&args.stack_name).await {
        Ok(analysis) => {
            spinner.finish_success(format!(
                "Collected {} signal(s) from {}",
                analysis.signals.len(),
                args.stack_name
            ));
            Ok(analysis)
        }
        Err(e) => {
            spinner.finish_error(format!("Could not read {}", args.stack_name));
            Err(e).with_context(|| format!("Failed to analyze stack {}", args.stack_name))
        }
    }
}
