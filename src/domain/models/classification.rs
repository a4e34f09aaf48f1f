//! Error classes and classification results.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Closed set of failure categories.
///
/// The set is append-only: existing names end up in stored events and
/// partition keys, so variants are never renamed or removed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorClass {
    CfnUpdateRollbackFailed,
    CfnRollbackComplete,
    CfnRollbackInProgress,
    CfnStackInProgress,
    AcmDnsValidationPending,
    CdkBootstrapRequired,
    IamPermissionDenied,
    ApiThrottling,
    ServiceQuotaExceeded,
    CloudfrontCnameConflict,
    Route53RecordConflict,
    ResourceAlreadyExists,
    ResourceNotFound,
    ResourceStabilizationTimeout,
    TemplateValidationError,
    LambdaInvalidConfiguration,
    ServiceInternalFailure,
    Unknown,
}

impl ErrorClass {
    /// Every class, in declaration order.
    pub const ALL: [Self; 18] = [
        Self::CfnUpdateRollbackFailed,
        Self::CfnRollbackComplete,
        Self::CfnRollbackInProgress,
        Self::CfnStackInProgress,
        Self::AcmDnsValidationPending,
        Self::CdkBootstrapRequired,
        Self::IamPermissionDenied,
        Self::ApiThrottling,
        Self::ServiceQuotaExceeded,
        Self::CloudfrontCnameConflict,
        Self::Route53RecordConflict,
        Self::ResourceAlreadyExists,
        Self::ResourceNotFound,
        Self::ResourceStabilizationTimeout,
        Self::TemplateValidationError,
        Self::LambdaInvalidConfiguration,
        Self::ServiceInternalFailure,
        Self::Unknown,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::CfnUpdateRollbackFailed => "CFN_UPDATE_ROLLBACK_FAILED",
            Self::CfnRollbackComplete => "CFN_ROLLBACK_COMPLETE",
            Self::CfnRollbackInProgress => "CFN_ROLLBACK_IN_PROGRESS",
            Self::CfnStackInProgress => "CFN_STACK_IN_PROGRESS",
            Self::AcmDnsValidationPending => "ACM_DNS_VALIDATION_PENDING",
            Self::CdkBootstrapRequired => "CDK_BOOTSTRAP_REQUIRED",
            Self::IamPermissionDenied => "IAM_PERMISSION_DENIED",
            Self::ApiThrottling => "API_THROTTLING",
            Self::ServiceQuotaExceeded => "SERVICE_QUOTA_EXCEEDED",
            Self::CloudfrontCnameConflict => "CLOUDFRONT_CNAME_CONFLICT",
            Self::Route53RecordConflict => "ROUTE53_RECORD_CONFLICT",
            Self::ResourceAlreadyExists => "RESOURCE_ALREADY_EXISTS",
            Self::ResourceNotFound => "RESOURCE_NOT_FOUND",
            Self::ResourceStabilizationTimeout => "RESOURCE_STABILIZATION_TIMEOUT",
            Self::TemplateValidationError => "TEMPLATE_VALIDATION_ERROR",
            Self::LambdaInvalidConfiguration => "LAMBDA_INVALID_CONFIGURATION",
            Self::ServiceInternalFailure => "SERVICE_INTERNAL_FAILURE",
            Self::Unknown => "UNKNOWN",
        }
    }

    /// Case-insensitive parse of a class name.
    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Option<Self> {
        let wanted = s.trim();
        Self::ALL
            .into_iter()
            .find(|class| class.as_str().eq_ignore_ascii_case(wanted))
    }
}

impl fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of classifying a burst of failure signals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureClassification {
    /// Stable fingerprint (16 lowercase hex characters)
    pub fingerprint_id: String,
    /// Matched failure category
    pub error_class: ErrorClass,
    /// Owning service of the matched rule, or the first signal's resource type
    pub service: String,
    /// Confidence in `[0, 1]`
    pub confidence: f64,
    /// Descriptive keywords
    pub tokens: BTreeSet<String>,
}

impl FailureClassification {
    pub fn is_unknown(&self) -> bool {
        self.error_class == ErrorClass::Unknown
    }
}
