//! Persisted deploy memory events and their aggregate statistics.

use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use super::classification::{ErrorClass, FailureClassification};
use super::signal::FailureSignal;

/// Default retention for stored events.
pub const DEFAULT_RETENTION_DAYS: i64 = 90;

/// Prefix of every partition key.
pub const PARTITION_PREFIX: &str = "FP#";

/// One classified failure, as remembered by the store.
///
/// Events are written once and never mutated; they only disappear when their
/// expiry passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployMemoryEvent {
    /// Unique identifier
    pub id: Uuid,
    pub fingerprint_id: String,
    pub error_class: ErrorClass,
    pub service: String,
    pub confidence: f64,
    pub tokens: BTreeSet<String>,
    /// Signals the classification was computed from
    pub raw_signals: Vec<FailureSignal>,
    pub stack_name: Option<String>,
    pub region: String,
    /// When the failure was classified
    pub timestamp: DateTime<Utc>,
    /// Set by the store at write time
    pub expires_at: Option<DateTime<Utc>>,
}

impl DeployMemoryEvent {
    pub fn from_classification(
        classification: &FailureClassification,
        raw_signals: Vec<FailureSignal>,
        stack_name: Option<String>,
        region: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            fingerprint_id: classification.fingerprint_id.clone(),
            error_class: classification.error_class,
            service: classification.service.clone(),
            confidence: classification.confidence,
            tokens: classification.tokens.clone(),
            raw_signals,
            stack_name,
            region: region.into(),
            timestamp: Utc::now(),
            expires_at: None,
        }
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Partition key shared by every event with this fingerprint.
    pub fn partition_key(&self) -> String {
        partition_key(&self.fingerprint_id)
    }

    /// Time-ordered sort key, unique per event.
    ///
    /// Fixed-width UTC timestamps make lexicographic order chronological.
    pub fn sort_key(&self) -> String {
        format!(
            "{}#{}",
            self.timestamp.to_rfc3339_opts(SecondsFormat::Micros, true),
            self.id
        )
    }

    /// Stamp the expiry relative to `written_at`.
    pub fn with_retention(mut self, written_at: DateTime<Utc>, retention: Duration) -> Self {
        self.expires_at = Some(written_at + retention);
        self
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.is_some_and(|at| at <= now)
    }
}

pub fn partition_key(fingerprint_id: &str) -> String {
    format!("{PARTITION_PREFIX}{fingerprint_id}")
}

/// Aggregate history for one fingerprint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventStats {
    pub fingerprint_id: String,
    pub total_occurrences: u64,
    pub first_seen: DateTime<Utc>,
    pub last_seen: DateTime<Utc>,
    pub average_confidence: f64,
}

impl EventStats {
    /// Zeroed stats for a fingerprint that has never been seen.
    pub fn empty(fingerprint_id: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            fingerprint_id: fingerprint_id.into(),
            total_occurrences: 0,
            first_seen: now,
            last_seen: now,
            average_confidence: 0.0,
        }
    }

    pub fn from_events(fingerprint_id: impl Into<String>, events: &[DeployMemoryEvent]) -> Self {
        let fingerprint_id = fingerprint_id.into();
        let (Some(first), Some(last)) = (
            events.iter().map(|e| e.timestamp).min(),
            events.iter().map(|e| e.timestamp).max(),
        ) else {
            return Self::empty(fingerprint_id);
        };

        let total = events.len();
        let confidence_sum: f64 = events.iter().map(|e| e.confidence).sum();

        Self {
            fingerprint_id,
            total_occurrences: total as u64,
            first_seen: first,
            last_seen: last,
            average_confidence: confidence_sum / total as f64,
        }
    }
}
