use async_trait::async_trait;

use crate::domain::errors::DomainResult;
use crate::domain::models::{StackDescription, StackEvent};

/// Read access to the orchestration engine's stack state and event feed.
///
/// Implementations must report a missing stack as
/// [`DomainError::StackNotFound`](crate::domain::errors::DomainError::StackNotFound)
/// and denied credentials as
/// [`DomainError::AccessDenied`](crate::domain::errors::DomainError::AccessDenied).
/// They never retry.
#[async_trait]
pub trait StackEventSource: Send + Sync {
    /// Fetch the current state of a stack.
    async fn describe_stack(&self, stack_name: &str) -> DomainResult<StackDescription>;

    /// Fetch up to `limit` of the stack's most recent events, newest first.
    async fn recent_events(&self, stack_name: &str, limit: usize) -> DomainResult<Vec<StackEvent>>;
}
