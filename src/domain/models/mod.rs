pub mod classification;
pub mod config;
pub mod event;
pub mod playbook;
pub mod signal;
pub mod stack;

pub use classification::{ErrorClass, FailureClassification};
pub use config::{CollectorConfig, Config, DatabaseConfig, LoggingConfig, MemoryConfig};
pub use event::{DeployMemoryEvent, EventStats, DEFAULT_RETENTION_DAYS};
pub use playbook::{DeployMemoryRecommendation, FactoryAction, Playbook};
pub use signal::{is_failure_status, FailureSignal, STACK_RESOURCE_TYPE};
pub use stack::{StackDescription, StackEvent};
