pub mod console_parser;
pub mod deploy_memory_service;
pub mod failure_classifier;
pub mod memory_store;
pub mod playbook_registry;
pub mod signal_collector;
pub mod template;

pub use console_parser::{parse_console_output, ConsoleParse};
pub use deploy_memory_service::{DeployMemoryService, FailureAnalysis, PersistenceOutcome};
pub use failure_classifier::{classify, default_rules, ClassificationRule, FailureClassifier};
pub use memory_store::DeployMemoryStore;
pub use playbook_registry::{
    get_playbook, recommend, resolve_action, PlaybookRegistry, CONFIDENCE_THRESHOLD,
};
pub use signal_collector::{CollectedSignals, SignalCollector};
pub use template::{fingerprint, normalize_template, FINGERPRINT_HEX_LEN};
