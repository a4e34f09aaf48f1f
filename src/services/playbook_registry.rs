//! Playbook registry and confidence-gated action resolution.
//!
//! Lookup is total: an identifier that names neither a playbook nor an error
//! class resolves to the `UNKNOWN` playbook.

use std::sync::LazyLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{
    DeployMemoryRecommendation, ErrorClass, FactoryAction, FailureClassification, Playbook,
};

/// Below this confidence the resolver never authorizes automation.
pub const CONFIDENCE_THRESHOLD: f64 = 0.6;

/// The built-in playbook table.
pub const DEFAULT_PLAYBOOKS: &[Playbook] = &[
    Playbook {
        fingerprint_id: "cfn-update-rollback-failed",
        error_class: ErrorClass::CfnUpdateRollbackFailed,
        steps: "## Stack stuck in UPDATE_ROLLBACK_FAILED\n\
                1. Inspect the stack events for the resource that failed to roll back.\n\
                2. Fix or manually delete the offending resource out of band.\n\
                3. Run `aws cloudformation continue-update-rollback`, skipping resources that cannot recover.\n\
                4. Redeploy once the stack reaches UPDATE_ROLLBACK_COMPLETE.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &[
            "Never delete the stack automatically",
            "Only skip resources that were confirmed unrecoverable",
        ],
    },
    Playbook {
        fingerprint_id: "cfn-rollback-complete",
        error_class: ErrorClass::CfnRollbackComplete,
        steps: "## Stack in ROLLBACK_COMPLETE\n\
                1. The initial creation failed; the stack cannot be updated.\n\
                2. Read the first `CREATE_FAILED` event to find the root cause and fix it.\n\
                3. Delete the stack, then deploy again.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &[
            "Confirm the stack holds no retained data before deleting it",
            "Do not redeploy until the root cause is fixed",
        ],
    },
    Playbook {
        fingerprint_id: "cfn-rollback-in-progress",
        error_class: ErrorClass::CfnRollbackInProgress,
        steps: "## Rollback in progress\n\
                1. Wait for the rollback to finish.\n\
                2. Review the events that triggered it before retrying.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 3 retries",
            "Minimum 5 minute cooldown between retries",
            "Never cancel a rollback",
        ],
    },
    Playbook {
        fingerprint_id: "cfn-stack-in-progress",
        error_class: ErrorClass::CfnStackInProgress,
        steps: "## Stack operation already in progress\n\
                1. Another deployment holds the stack.\n\
                2. Wait for it to reach a terminal state, then retry.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 5 retries",
            "Minimum 2 minute cooldown between retries",
            "Never cancel another operation's update",
        ],
    },
    Playbook {
        fingerprint_id: "acm-dns-validation-pending",
        error_class: ErrorClass::AcmDnsValidationPending,
        steps: "## ACM certificate awaiting DNS validation\n\
                1. Confirm the validation CNAME exists in the hosted zone.\n\
                2. Wait for DNS propagation; validation usually completes within 30 minutes.\n\
                3. Retry the deployment.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 3 retries",
            "Minimum 10 minute cooldown between retries",
            "Escalate if still pending after 72 hours",
        ],
    },
    Playbook {
        fingerprint_id: "cdk-bootstrap-required",
        error_class: ErrorClass::CdkBootstrapRequired,
        steps: "## CDK environment not bootstrapped\n\
                1. Run `cdk bootstrap aws://<account>/<region>` with administrator credentials.\n\
                2. Verify the CDKToolkit stack and its SSM version parameter exist.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &["Bootstrap requires elevated credentials; never run it from automation"],
    },
    Playbook {
        fingerprint_id: "iam-permission-denied",
        error_class: ErrorClass::IamPermissionDenied,
        steps: "## Permission denied\n\
                1. Identify the principal and action from the error message.\n\
                2. Grant the minimum missing permission to the deployment role.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &[
            "Never retry without a policy change",
            "Do not grant wildcard permissions",
        ],
    },
    Playbook {
        fingerprint_id: "api-throttling",
        error_class: ErrorClass::ApiThrottling,
        steps: "## API throttling\n\
                1. Back off exponentially.\n\
                2. Retry the deployment.\n\
                3. If throttling persists, reduce deployment concurrency.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 5 retries",
            "Exponential backoff starting at 30 seconds",
        ],
    },
    Playbook {
        fingerprint_id: "service-quota-exceeded",
        error_class: ErrorClass::ServiceQuotaExceeded,
        steps: "## Service quota exceeded\n\
                1. Identify the quota from the error message.\n\
                2. Clean up unused resources or request a quota increase.\n\
                3. Redeploy once the increase is approved.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &["Retries cannot succeed until the quota changes"],
    },
    Playbook {
        fingerprint_id: "cloudfront-cname-conflict",
        error_class: ErrorClass::CloudfrontCnameConflict,
        steps: "## CloudFront alternate domain already in use\n\
                1. Find the distribution that owns the alias.\n\
                2. Remove the alias there or move it with an associate-alias request.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::HumanRequired,
        guardrails: &["Never detach an alias from a distribution serving production traffic without approval"],
    },
    Playbook {
        fingerprint_id: "route53-record-conflict",
        error_class: ErrorClass::Route53RecordConflict,
        steps: "## Route 53 record already exists\n\
                1. Check whether the existing record is managed by another stack.\n\
                2. Delete the stale record or import it into this stack.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Never delete DNS records that resolve production traffic automatically"],
    },
    Playbook {
        fingerprint_id: "resource-already-exists",
        error_class: ErrorClass::ResourceAlreadyExists,
        steps: "## Resource already exists\n\
                1. Find the resource with the conflicting physical name.\n\
                2. Import it into the stack, rename it, or delete it if orphaned.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Never delete a resource that may hold data without a backup"],
    },
    Playbook {
        fingerprint_id: "resource-not-found",
        error_class: ErrorClass::ResourceNotFound,
        steps: "## Referenced resource not found\n\
                1. Check the identifier, account and region the template references.\n\
                2. Create the missing dependency or fix the reference.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Maximum 1 retry, in case of eventual consistency"],
    },
    Playbook {
        fingerprint_id: "resource-stabilization-timeout",
        error_class: ErrorClass::ResourceStabilizationTimeout,
        steps: "## Resource did not stabilize\n\
                1. Check the resource's own health signals (ECS tasks, health checks, logs).\n\
                2. Retry once transient causes are ruled out.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 2 retries",
            "Minimum 10 minute cooldown between retries",
        ],
    },
    Playbook {
        fingerprint_id: "template-validation-error",
        error_class: ErrorClass::TemplateValidationError,
        steps: "## Template validation failed\n\
                1. Synthesize locally and validate the template.\n\
                2. Fix the reported property or dependency.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Never retry an unchanged template"],
    },
    Playbook {
        fingerprint_id: "lambda-invalid-configuration",
        error_class: ErrorClass::LambdaInvalidConfiguration,
        steps: "## Lambda configuration rejected\n\
                1. Check the runtime, package size and handler settings.\n\
                2. Fix the function definition.\n\
                3. Redeploy.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Never retry an unchanged function definition"],
    },
    Playbook {
        fingerprint_id: "service-internal-failure",
        error_class: ErrorClass::ServiceInternalFailure,
        steps: "## Service internal failure\n\
                1. Check the service health dashboard for the region.\n\
                2. Retry after a cooldown.",
        proposed_factory_action: FactoryAction::WaitAndRetry,
        guardrails: &[
            "Maximum 3 retries",
            "Minimum 5 minute cooldown between retries",
        ],
    },
    Playbook {
        fingerprint_id: "unknown",
        error_class: ErrorClass::Unknown,
        steps: "## Unclassified failure\n\
                1. Read the raw stack events and console output.\n\
                2. Open an issue with the fingerprint so recurrences are grouped.",
        proposed_factory_action: FactoryAction::OpenIssue,
        guardrails: &["Never retry an unclassified failure automatically"],
    },
];

/// Immutable playbook table with total lookup.
#[derive(Debug, Clone)]
pub struct PlaybookRegistry {
    playbooks: Vec<Playbook>,
    unknown: usize,
}

static BUILTIN: LazyLock<PlaybookRegistry> = LazyLock::new(|| {
    PlaybookRegistry::new(DEFAULT_PLAYBOOKS.to_vec()).expect("built-in playbooks include UNKNOWN")
});

impl PlaybookRegistry {
    /// Build a registry. The table must contain an `UNKNOWN` playbook.
    pub fn new(playbooks: Vec<Playbook>) -> DomainResult<Self> {
        let unknown = playbooks
            .iter()
            .position(|p| p.error_class == ErrorClass::Unknown)
            .ok_or_else(|| {
                DomainError::ValidationFailed("playbook registry has no UNKNOWN entry".to_string())
            })?;
        Ok(Self { playbooks, unknown })
    }

    /// Shared registry over [`DEFAULT_PLAYBOOKS`].
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    pub fn playbooks(&self) -> &[Playbook] {
        &self.playbooks
    }

    /// Look up by playbook id, then by error class, then fall back to `UNKNOWN`.
    pub fn get_playbook(&self, id_or_error_class: &str) -> &Playbook {
        if let Some(p) = self
            .playbooks
            .iter()
            .find(|p| p.fingerprint_id == id_or_error_class)
        {
            return p;
        }
        ErrorClass::from_str(id_or_error_class)
            .and_then(|class| self.playbooks.iter().find(|p| p.error_class == class))
            .unwrap_or(&self.playbooks[self.unknown])
    }

    pub fn playbook_for(&self, error_class: ErrorClass) -> &Playbook {
        self.get_playbook(error_class.as_str())
    }

    /// Confidence-gated action: below [`CONFIDENCE_THRESHOLD`] always `OPEN_ISSUE`.
    ///
    /// A NaN confidence never clears the gate.
    pub fn resolve_action(&self, error_class: ErrorClass, confidence: f64) -> FactoryAction {
        if confidence.is_nan() || confidence < CONFIDENCE_THRESHOLD {
            return FactoryAction::OpenIssue;
        }
        self.playbook_for(error_class).proposed_factory_action
    }

    /// Combine playbook and resolved action for a classification.
    pub fn recommend(&self, classification: &FailureClassification) -> DeployMemoryRecommendation {
        let playbook = self.playbook_for(classification.error_class);
        let action = self.resolve_action(classification.error_class, classification.confidence);
        if action != playbook.proposed_factory_action {
            tracing::debug!(
                fingerprint_id = %classification.fingerprint_id,
                confidence = classification.confidence,
                playbook_action = %playbook.proposed_factory_action,
                "Low confidence, escalating instead of playbook action"
            );
        }
        DeployMemoryRecommendation {
            fingerprint_id: classification.fingerprint_id.clone(),
            proposed_factory_action: action,
            recommended_steps: playbook.steps.to_string(),
            confidence: classification.confidence,
            error_class: classification.error_class,
            guardrails: playbook.guardrails.iter().map(|g| (*g).to_string()).collect(),
        }
    }
}

/// [`PlaybookRegistry::get_playbook`] on the built-in registry.
pub fn get_playbook(id_or_error_class: &str) -> &'static Playbook {
    PlaybookRegistry::builtin().get_playbook(id_or_error_class)
}

/// [`PlaybookRegistry::resolve_action`] on the built-in registry.
pub fn resolve_action(error_class: ErrorClass, confidence: f64) -> FactoryAction {
    PlaybookRegistry::builtin().resolve_action(error_class, confidence)
}

/// [`PlaybookRegistry::recommend`] on the built-in registry.
pub fn recommend(classification: &FailureClassification) -> DeployMemoryRecommendation {
    PlaybookRegistry::builtin().recommend(classification)
}
