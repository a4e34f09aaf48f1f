//! End-to-end failure analysis: collect, classify, recommend, remember.
//!
//! Collection errors abort the analysis. Storage errors do not: the
//! recommendation is already computed by then, so a failed write is reported
//! in [`PersistenceOutcome`] next to it.

use chrono::Duration;
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::domain::errors::DomainResult;
use crate::domain::models::{
    DeployMemoryEvent, DeployMemoryRecommendation, FailureClassification, FailureSignal, MemoryConfig,
};
use crate::domain::ports::{DeployMemoryRepository, StackEventSource};
use crate::services::console_parser::parse_console_output;
use crate::services::failure_classifier::FailureClassifier;
use crate::services::memory_store::DeployMemoryStore;
use crate::services::playbook_registry::PlaybookRegistry;
use crate::services::signal_collector::{SignalCollector, DEFAULT_EVENT_WINDOW};

/// What happened to the audit record of one analysis.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PersistenceOutcome {
    Stored { event_id: Uuid },
    Skipped,
    Failed { error: String },
}

impl PersistenceOutcome {
    pub fn is_stored(&self) -> bool {
        matches!(self, Self::Stored { .. })
    }
}

/// Output of one classify-and-resolve cycle.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FailureAnalysis {
    pub stack_name: Option<String>,
    pub signals: Vec<FailureSignal>,
    pub classification: FailureClassification,
    pub recommendation: DeployMemoryRecommendation,
    pub persistence: PersistenceOutcome,
}

pub struct DeployMemoryService<S: StackEventSource, R: DeployMemoryRepository> {
    collector: SignalCollector<S>,
    store: DeployMemoryStore<R>,
    classifier: FailureClassifier,
    playbooks: PlaybookRegistry,
    region: String,
    event_window: usize,
    persist: bool,
}

impl<S: StackEventSource, R: DeployMemoryRepository> DeployMemoryService<S, R> {
    pub fn new(source: Arc<S>, repository: Arc<R>, region: impl Into<String>) -> Self {
        Self {
            collector: SignalCollector::new(source),
            store: DeployMemoryStore::new(repository),
            classifier: FailureClassifier::builtin().clone(),
            playbooks: PlaybookRegistry::builtin().clone(),
            region: region.into(),
            event_window: DEFAULT_EVENT_WINDOW,
            persist: true,
        }
    }

    pub fn with_memory_config(mut self, config: &MemoryConfig) -> Self {
        self.store = self
            .store
            .with_retention(Duration::days(i64::from(config.retention_days)))
            .with_stats_window(config.stats_window);
        self
    }

    pub fn with_event_window(mut self, window: usize) -> Self {
        self.event_window = window;
        self
    }

    pub fn with_classifier(mut self, classifier: FailureClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    pub fn with_playbooks(mut self, playbooks: PlaybookRegistry) -> Self {
        self.playbooks = playbooks;
        self
    }

    /// Disable event storage; analyses report [`PersistenceOutcome::Skipped`].
    pub fn with_persistence(mut self, persist: bool) -> Self {
        self.persist = persist;
        self
    }

    pub fn store(&self) -> &DeployMemoryStore<R> {
        &self.store
    }

    pub fn playbooks(&self) -> &PlaybookRegistry {
        &self.playbooks
    }

    /// Analyze a stack from its structured event feed.
    pub async fn analyze_stack(&self, stack_name: &str) -> DomainResult<FailureAnalysis> {
        let collected = self
            .collector
            .collect_from_stack(stack_name, self.event_window)
            .await?;
        Ok(self
            .analyze_signals(collected.signals, Some(collected.stack.stack_name))
            .await)
    }

    /// Analyze console output. Falls back to the last stack the output named.
    pub async fn analyze_console(&self, text: &str, stack_name: Option<String>) -> FailureAnalysis {
        let parsed = parse_console_output(text);
        let stack_name = stack_name.or(parsed.last_stack);
        self.analyze_signals(parsed.signals, stack_name).await
    }

    /// Classify, recommend and record an already collected signal set.
    pub async fn analyze_signals(
        &self,
        signals: Vec<FailureSignal>,
        stack_name: Option<String>,
    ) -> FailureAnalysis {
        let classification = self.classifier.classify(&signals);
        let recommendation = self.playbooks.recommend(&classification);
        tracing::info!(
            fingerprint_id = %classification.fingerprint_id,
            error_class = %classification.error_class,
            confidence = classification.confidence,
            action = %recommendation.proposed_factory_action,
            stack_name = stack_name.as_deref().unwrap_or(""),
            "Classified deployment failure"
        );

        let persistence = if self.persist {
            let event = DeployMemoryEvent::from_classification(
                &classification,
                signals.clone(),
                stack_name.clone(),
                &self.region,
            );
            match self.store.put_event(event).await {
                Ok(stored) => PersistenceOutcome::Stored { event_id: stored.id },
                Err(e) => {
                    tracing::warn!(
                        fingerprint_id = %classification.fingerprint_id,
                        error = %e,
                        "Failed to store deploy memory event"
                    );
                    PersistenceOutcome::Failed { error: e.to_string() }
                }
            }
        } else {
            PersistenceOutcome::Skipped
        };

        FailureAnalysis {
            stack_name,
            signals,
            classification,
            recommendation,
            persistence,
        }
    }
}
