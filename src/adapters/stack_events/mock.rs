//! In-memory stack event source for tests and dry runs.

use async_trait::async_trait;
use std::collections::HashMap;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{StackDescription, StackEvent};
use crate::domain::ports::StackEventSource;

#[derive(Debug, Clone)]
struct MockStack {
    description: StackDescription,
    events: Vec<StackEvent>,
}

/// Fixture-backed [`StackEventSource`].
///
/// Unknown stacks yield `StackNotFound`; stacks registered with
/// [`deny`](Self::deny) yield `AccessDenied`.
#[derive(Debug, Clone, Default)]
pub struct MockStackEventSource {
    stacks: HashMap<String, MockStack>,
    denied: Vec<String>,
}

impl MockStackEventSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_stack(
        mut self,
        stack_name: impl Into<String>,
        status: impl Into<String>,
        events: Vec<StackEvent>,
    ) -> Self {
        let stack_name = stack_name.into();
        let description = StackDescription {
            stack_name: stack_name.clone(),
            stack_id: None,
            stack_status: status.into(),
            stack_status_reason: None,
        };
        self.stacks.insert(stack_name, MockStack { description, events });
        self
    }

    pub fn deny(mut self, stack_name: impl Into<String>) -> Self {
        self.denied.push(stack_name.into());
        self
    }

    fn lookup(&self, stack_name: &str) -> DomainResult<&MockStack> {
        if self.denied.iter().any(|s| s == stack_name) {
            return Err(DomainError::AccessDenied {
                stack: stack_name.to_string(),
                message: "mock access denied".to_string(),
            });
        }
        self.stacks
            .get(stack_name)
            .ok_or_else(|| DomainError::StackNotFound(stack_name.to_string()))
    }
}

#[async_trait]
impl StackEventSource for MockStackEventSource {
    async fn describe_stack(&self, stack_name: &str) -> DomainResult<StackDescription> {
        Ok(self.lookup(stack_name)?.description.clone())
    }

    async fn recent_events(&self, stack_name: &str, limit: usize) -> DomainResult<Vec<StackEvent>> {
        let mut events = self.lookup(stack_name)?.events.clone();
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}
