//! Time-partitioned deploy memory.
//!
//! Thin policy layer over a [`DeployMemoryRepository`]: stamps retention on
//! write, bounds reads, and folds history into [`EventStats`]. Repository
//! errors pass through unchanged.

use chrono::{Duration, Utc};
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{DeployMemoryEvent, EventStats, DEFAULT_RETENTION_DAYS};
use crate::domain::ports::DeployMemoryRepository;

/// Maximum number of events folded into stats.
pub const DEFAULT_STATS_WINDOW: u32 = 1000;

pub struct DeployMemoryStore<R: DeployMemoryRepository> {
    repository: Arc<R>,
    retention: Duration,
    stats_window: u32,
}

impl<R: DeployMemoryRepository> DeployMemoryStore<R> {
    pub fn new(repository: Arc<R>) -> Self {
        Self {
            repository,
            retention: Duration::days(DEFAULT_RETENTION_DAYS),
            stats_window: DEFAULT_STATS_WINDOW,
        }
    }

    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_stats_window(mut self, window: u32) -> Self {
        self.stats_window = window;
        self
    }

    /// Append an event, expiring `retention` after now.
    pub async fn put_event(&self, event: DeployMemoryEvent) -> DomainResult<DeployMemoryEvent> {
        let event = event.with_retention(Utc::now(), self.retention);
        self.repository.insert(&event).await?;
        tracing::debug!(
            fingerprint_id = %event.fingerprint_id,
            event_id = %event.id,
            sort_key = %event.sort_key(),
            "Stored deploy memory event"
        );
        Ok(event)
    }

    /// Unexpired events for a fingerprint, newest first.
    pub async fn query_by_fingerprint(
        &self,
        fingerprint_id: &str,
        limit: u32,
    ) -> DomainResult<Vec<DeployMemoryEvent>> {
        self.repository
            .list_by_fingerprint(fingerprint_id, limit, Utc::now())
            .await
    }

    pub async fn get_latest_event(&self, fingerprint_id: &str) -> DomainResult<Option<DeployMemoryEvent>> {
        let mut events = self.query_by_fingerprint(fingerprint_id, 1).await?;
        Ok(events.pop())
    }

    /// Aggregate up to the stats window of recent events.
    ///
    /// A fingerprint with no history yields zeroed stats stamped with now.
    pub async fn get_event_stats(&self, fingerprint_id: &str) -> DomainResult<EventStats> {
        let events = self
            .query_by_fingerprint(fingerprint_id, self.stats_window)
            .await?;
        Ok(EventStats::from_events(fingerprint_id, &events))
    }

    /// Physically delete expired events.
    pub async fn prune_expired(&self) -> DomainResult<u64> {
        let removed = self.repository.prune_expired(Utc::now()).await?;
        if removed > 0 {
            tracing::info!(removed, "Pruned expired deploy memory events");
        }
        Ok(removed)
    }
}
