//! Structured signal collection from the orchestration engine.

use serde::Serialize;
use std::sync::Arc;

use crate::domain::errors::DomainResult;
use crate::domain::models::{FailureSignal, StackDescription};
use crate::domain::ports::StackEventSource;

/// Default number of recent events inspected per collection.
pub const DEFAULT_EVENT_WINDOW: usize = 50;

/// Result of one collection call.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectedSignals {
    pub stack: StackDescription,
    /// Failure signals, newest first
    pub signals: Vec<FailureSignal>,
}

pub struct SignalCollector<S: StackEventSource> {
    source: Arc<S>,
}

impl<S: StackEventSource> SignalCollector<S> {
    pub fn new(source: Arc<S>) -> Self {
        Self { source }
    }

    /// Fetch stack state and the `limit` most recent events, keeping only
    /// failure events that carry a reason.
    ///
    /// Missing stacks and denied credentials are returned as errors; nothing
    /// here retries.
    pub async fn collect_from_stack(
        &self,
        stack_name: &str,
        limit: usize,
    ) -> DomainResult<CollectedSignals> {
        let stack = self.source.describe_stack(stack_name).await?;
        tracing::info!(
            stack_name = %stack.stack_name,
            stack_status = %stack.stack_status,
            "Described stack"
        );

        let events = self.source.recent_events(stack_name, limit).await?;
        let signals: Vec<FailureSignal> = events.iter().filter_map(|e| e.to_signal()).collect();
        tracing::debug!(
            stack_name = %stack.stack_name,
            events = events.len(),
            signals = signals.len(),
            "Collected failure signals"
        );

        Ok(CollectedSignals { stack, signals })
    }
}
