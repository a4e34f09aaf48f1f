//! Deploy Memory - deployment failure fingerprinting and remediation memory
//!
//! Deploy memory turns the failure signals of an infrastructure deployment
//! into a stable fingerprint, a failure category, and a recommended next
//! action, and remembers every occurrence so recurring failures can be
//! recognized.
//!
//! # Architecture
//!
//! This crate follows Hexagonal Architecture principles:
//!
//! - **Domain Layer** (`domain`): Models, errors, and port traits
//! - **Service Layer** (`services`): Parsing, classification, playbooks, and storage policy
//! - **Adapters** (`adapters`): `SQLite` persistence and stack event sources
//! - **Infrastructure Layer** (`infrastructure`): Configuration and logging
//! - **CLI Layer** (`cli`): Command-line interface
//!
//! # Example
//!
//! ```
//! use deploy_memory::domain::models::{ErrorClass, FactoryAction, FailureSignal};
//! use deploy_memory::services::{classify, recommend};
//!
//! let signals = vec![FailureSignal::new(
//!     "AWS::CertificateManager::Certificate",
//!     "SiteCert",
//!     "DNS validation is pending for the certificate",
//! )];
//! let classification = classify(&signals);
//! assert_eq!(classification.error_class, ErrorClass::AcmDnsValidationPending);
//!
//! let recommendation = recommend(&classification);
//! assert_eq!(recommendation.proposed_factory_action, FactoryAction::WaitAndRetry);
//! ```

pub mod adapters;
pub mod cli;
pub mod domain;
pub mod infrastructure;
pub mod services;

// Re-export commonly used types for convenience
pub use domain::errors::{DomainError, DomainResult};
pub use domain::models::{
    Config, DeployMemoryEvent, DeployMemoryRecommendation, ErrorClass, EventStats, FactoryAction,
    FailureClassification, FailureSignal, Playbook,
};
pub use domain::ports::{DeployMemoryRepository, NullDeployMemoryRepository, StackEventSource};
pub use infrastructure::config::{ConfigError, ConfigLoader};
pub use services::{
    classify, get_playbook, parse_console_output, recommend, resolve_action, DeployMemoryService,
    DeployMemoryStore, FailureAnalysis, FailureClassifier, PersistenceOutcome, PlaybookRegistry,
};
