use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::DeployMemoryEvent;

/// Repository trait for deploy memory event storage
///
/// Storage is append-only and partitioned by fingerprint:
/// - Events are never updated once inserted
/// - Reads return only events whose expiry is after `now`
/// - Expired events are removed by [`prune_expired`](Self::prune_expired)
#[async_trait]
pub trait DeployMemoryRepository: Send + Sync {
    /// Append an event. The event must already carry its expiry.
    async fn insert(&self, event: &DeployMemoryEvent) -> DomainResult<()>;

    /// Events for one fingerprint, newest first, at most `limit`.
    async fn list_by_fingerprint(
        &self,
        fingerprint_id: &str,
        limit: u32,
        now: DateTime<Utc>,
    ) -> DomainResult<Vec<DeployMemoryEvent>>;

    /// Delete every event that expired at or before `now`.
    ///
    /// Returns the number of events removed.
    async fn prune_expired(&self, now: DateTime<Utc>) -> DomainResult<u64>;
}
