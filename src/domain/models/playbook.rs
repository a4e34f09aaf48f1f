//! Remediation playbooks and recommendations.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::classification::ErrorClass;

/// What the surrounding automation should do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FactoryAction {
    /// Back off and retry the deployment
    WaitAndRetry,
    /// Escalate through a tracked ticket
    OpenIssue,
    /// Page a human; automation must stop
    HumanRequired,
}

impl FactoryAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::WaitAndRetry => "WAIT_AND_RETRY",
            Self::OpenIssue => "OPEN_ISSUE",
            Self::HumanRequired => "HUMAN_REQUIRED",
        }
    }

    /// Whether the action authorizes an automatic retry.
    pub fn allows_retry(&self) -> bool {
        matches!(self, Self::WaitAndRetry)
    }
}

impl fmt::Display for FactoryAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Static remediation guidance for one failure category.
///
/// Guardrails are documentation for the caller; nothing in this crate
/// enforces them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Playbook {
    /// Playbook identifier; may be a stable slug or a pinned fingerprint
    pub fingerprint_id: &'static str,
    pub error_class: ErrorClass,
    /// Markdown remediation steps
    pub steps: &'static str,
    pub proposed_factory_action: FactoryAction,
    pub guardrails: &'static [&'static str],
}

/// Externally visible output of one classify-and-resolve cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeployMemoryRecommendation {
    pub fingerprint_id: String,
    pub proposed_factory_action: FactoryAction,
    pub recommended_steps: String,
    pub confidence: f64,
    pub error_class: ErrorClass,
    pub guardrails: Vec<String>,
}
