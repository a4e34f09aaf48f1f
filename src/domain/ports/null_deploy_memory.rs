//! Null deploy memory repository implementation.
//!
//! Used when a caller wants recommendations without recording history,
//! e.g. dry runs from the command line.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::DeployMemoryRepository;
use crate::domain::errors::DomainResult;
use crate::domain::models::DeployMemoryEvent;

/// A no-op repository that stores nothing.
#[derive(Debug, Clone, Default)]
pub struct NullDeployMemoryRepository;

impl NullDeployMemoryRepository {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DeployMemoryRepository for NullDeployMemoryRepository {
    async fn insert(&self, _event: &DeployMemoryEvent) -> DomainResult<()> {
        Ok(())
    }

    async fn list_by_fingerprint(
        &self,
        _fingerprint_id: &str,
        _limit: u32,
        _now: DateTime<Utc>,
    ) -> DomainResult<Vec<DeployMemoryEvent>> {
        Ok(Vec::new())
    }

    async fn prune_expired(&self, _now: DateTime<Utc>) -> DomainResult<u64> {
        Ok(0)
    }
}
