//! Port trait definitions (Hexagonal Architecture)
//!
//! This module defines async trait interfaces that infrastructure adapters must implement:
//! - StackEventSource: stack state and event feed of the orchestration engine
//! - DeployMemoryRepository: append-only event persistence
//!
//! These traits keep classification and recommendation independent of any
//! specific engine or storage backend.

pub mod deploy_memory_repository;
pub mod null_deploy_memory;
pub mod stack_event_source;

pub use deploy_memory_repository::DeployMemoryRepository;
pub use null_deploy_memory::NullDeployMemoryRepository;
pub use stack_event_source::StackEventSource;
