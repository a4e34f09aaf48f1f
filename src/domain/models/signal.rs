//! Failure signal domain model.
//!
//! A signal is one discrete observation of a failed operation. It is produced
//! either from the orchestration engine's structured event feed or from parsed
//! console output, and consumed immediately by the classifier.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Resource type used when a signal is attributed to a whole stack.
pub const STACK_RESOURCE_TYPE: &str = "AWS::CloudFormation::Stack";

/// One normalized observation of a failed operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailureSignal {
    /// Resource type, e.g. `AWS::CertificateManager::Certificate`
    pub resource_type: String,
    /// Logical identifier within the template
    pub logical_id: String,
    /// Free-text status reason reported for the failure
    pub status_reason: String,
    /// When the failure was observed
    pub timestamp: DateTime<Utc>,
    /// Physical identifier, if the resource was ever created
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub physical_id: Option<String>,
    /// Raw status string, e.g. `CREATE_FAILED`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_status: Option<String>,
    /// Owning stack name
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_name: Option<String>,
}

impl FailureSignal {
    /// Create a signal stamped with the current time.
    pub fn new(
        resource_type: impl Into<String>,
        logical_id: impl Into<String>,
        status_reason: impl Into<String>,
    ) -> Self {
        Self {
            resource_type: resource_type.into(),
            logical_id: logical_id.into(),
            status_reason: status_reason.into(),
            timestamp: Utc::now(),
            physical_id: None,
            resource_status: None,
            stack_name: None,
        }
    }

    /// Signal attributed to the stack itself rather than a resource in it.
    pub fn for_stack(stack_name: impl Into<String>, status_reason: impl Into<String>) -> Self {
        let stack_name = stack_name.into();
        Self::new(STACK_RESOURCE_TYPE, stack_name.clone(), status_reason).with_stack(stack_name)
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.resource_status = Some(status.into());
        self
    }

    pub fn with_stack(mut self, stack_name: impl Into<String>) -> Self {
        self.stack_name = Some(stack_name.into());
        self
    }

    pub fn with_physical_id(mut self, physical_id: impl Into<String>) -> Self {
        self.physical_id = Some(physical_id.into());
        self
    }

    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }
}

/// Whether a raw resource status denotes a failure worth classifying.
///
/// Failed and rollback states qualify, as does `DELETE_IN_PROGRESS`, which the
/// engine emits while tearing down resources after a failed create.
pub fn is_failure_status(status: &str) -> bool {
    let status = status.to_ascii_uppercase();
    status.ends_with("_FAILED") || status.contains("ROLLBACK") || status == "DELETE_IN_PROGRESS"
}
