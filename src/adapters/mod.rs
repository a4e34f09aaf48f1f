//! Adapters for external systems: event storage and the stack event feed.

pub mod sqlite;
pub mod stack_events;
