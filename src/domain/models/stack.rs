//! Stack state and events as reported by the orchestration engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::signal::{is_failure_status, FailureSignal};

/// Current state of a stack.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackDescription {
    pub stack_name: String,
    pub stack_id: Option<String>,
    pub stack_status: String,
    pub stack_status_reason: Option<String>,
}

/// One entry of a stack's event feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StackEvent {
    pub stack_name: String,
    pub logical_id: String,
    pub physical_id: Option<String>,
    pub resource_type: String,
    pub resource_status: String,
    pub status_reason: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl StackEvent {
    /// Convert into a signal when the event is a failure with a reason.
    ///
    /// Events without a failure status, or whose reason is blank, carry
    /// nothing to classify and yield `None`.
    pub fn to_signal(&self) -> Option<FailureSignal> {
        if !is_failure_status(&self.resource_status) {
            return None;
        }
        let reason = self.status_reason.as_deref().map(str::trim).unwrap_or_default();
        if reason.is_empty() {
            return None;
        }

        let mut signal = FailureSignal::new(&self.resource_type, &self.logical_id, reason)
            .with_status(&self.resource_status)
            .with_stack(&self.stack_name)
            .at(self.timestamp);
        if let Some(physical_id) = self.physical_id.as_deref().filter(|id| !id.is_empty()) {
            signal = signal.with_physical_id(physical_id);
        }
        Some(signal)
    }
}
