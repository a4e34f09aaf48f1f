//! Deploy memory CLI entry point.

use clap::Parser;

use deploy_memory::cli::{self, Cli};
use deploy_memory::infrastructure::logging::{LogConfig, LoggerImpl};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match cli::load_config(cli.config.as_deref()) {
        Ok(config) => config,
        Err(err) => cli::handle_error(err, cli.json),
    };

    let _logger = match LogConfig::try_from(&config.logging).and_then(|c| LoggerImpl::init(&c)) {
        Ok(logger) => logger,
        Err(err) => cli::handle_error(err, cli.json),
    };

    if let Err(err) = cli::dispatch(cli.command, &config, cli.json).await {
        cli::handle_error(err, cli.json);
    }
}
