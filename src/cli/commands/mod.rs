//! CLI command implementations.

pub mod history;
pub mod parse;
pub mod playbook;
pub mod prune;
pub mod rules;
pub mod stack;
pub mod stats;

use anyhow::{Context, Result};
use chrono::Duration;
use std::sync::Arc;

use crate::adapters::sqlite::{initialize_database, SqliteDeployMemoryRepository};
use crate::adapters::stack_events::{AwsCliConfig, AwsCliStackEventSource};
use crate::domain::models::Config;
use crate::domain::ports::{DeployMemoryRepository, NullDeployMemoryRepository, StackEventSource};
use crate::services::{DeployMemoryService, DeployMemoryStore};

/// Open the configured database and wrap its event table in a repository.
pub async fn open_repository(config: &Config) -> Result<Arc<SqliteDeployMemoryRepository>> {
    let pool = initialize_database(&config.database)
        .await
        .with_context(|| format!("Failed to open database at {}", config.database.path))?;
    let repository = SqliteDeployMemoryRepository::new(pool, &config.database.table_name)
        .context("Failed to create deploy memory repository")?;
    Ok(Arc::new(repository))
}

/// Store with retention and stats window from configuration.
pub async fn open_store(config: &Config) -> Result<DeployMemoryStore<SqliteDeployMemoryRepository>> {
    let repository = open_repository(config).await?;
    Ok(DeployMemoryStore::new(repository)
        .with_retention(Duration::days(i64::from(config.memory.retention_days)))
        .with_stats_window(config.memory.stats_window))
}

pub(crate) fn event_source(config: &Config) -> Arc<AwsCliStackEventSource> {
    Arc::new(AwsCliStackEventSource::new(AwsCliConfig::from(&config.collector)))
}

/// Service that records every analysis in the configured database.
pub(crate) async fn recording_service<S: StackEventSource>(
    source: Arc<S>,
    config: &Config,
) -> Result<DeployMemoryService<S, SqliteDeployMemoryRepository>> {
    let repository = open_repository(config).await?;
    Ok(configure(DeployMemoryService::new(source, repository, config.collector.region.clone()), config))
}

/// Service that touches no storage at all.
pub(crate) fn dry_run_service<S: StackEventSource>(
    source: Arc<S>,
    config: &Config,
) -> DeployMemoryService<S, NullDeployMemoryRepository> {
    let repository = Arc::new(NullDeployMemoryRepository::new());
    configure(DeployMemoryService::new(source, repository, config.collector.region.clone()), config)
        .with_persistence(false)
}

fn configure<S, R>(service: DeployMemoryService<S, R>, config: &Config) -> DeployMemoryService<S, R>
where
    S: StackEventSource,
    R: DeployMemoryRepository,
{
    service
        .with_memory_config(&config.memory)
        .with_event_window(config.collector.event_window as usize)
}
