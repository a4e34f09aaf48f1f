//! Rule-based failure classification.
//!
//! The classifier joins the status reasons of a signal burst into one
//! matching surface and walks an ordered rule table; the first rule with any
//! matching pattern wins. Order is part of the contract: several rules have
//! patterns that are textual supersets of later rules (rollback states contain
//! `in_progress`, Route 53 conflicts contain `already exists`), so the more
//! specific rule must come first. `tests::test_rule_order_*` pin every such
//! overlap.

use regex::{Regex, RegexBuilder};
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{ErrorClass, FailureClassification, FailureSignal};
use crate::services::template::{fingerprint, normalize_template};

/// Service reported when there is nothing to classify.
pub const UNKNOWN_SERVICE: &str = "Unknown";

/// Confidence for an empty signal set.
pub const EMPTY_INPUT_CONFIDENCE: f64 = 0.0;

/// Confidence when signals exist but no rule matches.
pub const NO_MATCH_CONFIDENCE: f64 = 0.5;

/// Tokens reported when no rule matches.
pub const NO_MATCH_TOKENS: [&str; 2] = ["unknown", "error"];

/// One entry of the rule table.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationRule {
    pub error_class: ErrorClass,
    /// Owning service, part of the fingerprint
    pub service: &'static str,
    /// Case-insensitive regular expressions, tried in order
    pub patterns: &'static [&'static str],
    pub confidence: f64,
    pub tokens: &'static [&'static str],
}

/// The built-in rule table, in precedence order.
pub const DEFAULT_RULES: &[ClassificationRule] = &[
    ClassificationRule {
        error_class: ErrorClass::CfnUpdateRollbackFailed,
        service: "CloudFormation",
        patterns: &["update_rollback_failed", "rollback_failed", "continueupdaterollback", "continue-update-rollback"],
        confidence: 0.95,
        tokens: &["cloudformation", "stack", "rollback", "failed"],
    },
    ClassificationRule {
        error_class: ErrorClass::CfnRollbackComplete,
        service: "CloudFormation",
        patterns: &[r"\brollback_complete\b"],
        confidence: 0.9,
        tokens: &["cloudformation", "stack", "rollback", "complete"],
    },
    // must precede the generic in-progress rule
    ClassificationRule {
        error_class: ErrorClass::CfnRollbackInProgress,
        service: "CloudFormation",
        patterns: &[
            "update_rollback_in_progress",
            "update_rollback_complete_cleanup_in_progress",
            "rollback_in_progress",
            "update_rollback_complete",
        ],
        confidence: 0.85,
        tokens: &["cloudformation", "stack", "rollback", "in_progress"],
    },
    ClassificationRule {
        error_class: ErrorClass::CfnStackInProgress,
        service: "CloudFormation",
        patterns: &[
            "update_in_progress",
            "create_in_progress",
            "delete_in_progress",
            "cleanup_in_progress",
            "in_progress",
        ],
        confidence: 0.8,
        tokens: &["cloudformation", "stack", "in_progress", "busy"],
    },
    ClassificationRule {
        error_class: ErrorClass::AcmDnsValidationPending,
        service: "ACM",
        patterns: &[
            "dns validation is pending",
            "pending_validation",
            "pending validation",
            "waiting for dns validation",
        ],
        confidence: 0.9,
        tokens: &["acm", "certificate", "dns", "validation", "pending"],
    },
    // SSM reads of the bootstrap version parameter fail with an authorization
    // message; they belong here, not under IAM
    ClassificationRule {
        error_class: ErrorClass::CdkBootstrapRequired,
        service: "CDK",
        patterns: &[
            "has not been bootstrapped",
            "cdk bootstrap",
            "/cdk-bootstrap/",
            "cdktoolkit",
            "toolkit stack must be deployed",
        ],
        confidence: 0.9,
        tokens: &["cdk", "bootstrap", "toolkit"],
    },
    // "requestlimitexceeded" contains "limitexceeded"
    ClassificationRule {
        error_class: ErrorClass::ApiThrottling,
        service: "AWS",
        patterns: &[
            "throttling",
            "rate exceeded",
            "toomanyrequestsexception",
            "too many requests",
            "requestlimitexceeded",
        ],
        confidence: 0.9,
        tokens: &["api", "throttling", "rate_limit"],
    },
    ClassificationRule {
        error_class: ErrorClass::ServiceQuotaExceeded,
        service: "ServiceQuotas",
        patterns: &[
            "servicequotaexceeded",
            "limitexceeded",
            "limit exceeded",
            "quota exceeded",
            "maximum number of",
        ],
        confidence: 0.85,
        tokens: &["quota", "limit"],
    },
    ClassificationRule {
        error_class: ErrorClass::IamPermissionDenied,
        service: "IAM",
        patterns: &[
            "accessdenied",
            "access denied",
            "not authorized to perform",
            "unauthorizedoperation",
            "is not authorized",
        ],
        confidence: 0.9,
        tokens: &["iam", "permission", "access_denied"],
    },
    ClassificationRule {
        error_class: ErrorClass::CloudfrontCnameConflict,
        service: "CloudFront",
        patterns: &["cnamealreadyexists", "cnames you provided are already associated"],
        confidence: 0.9,
        tokens: &["cloudfront", "cname", "conflict"],
    },
    // Route 53 conflicts read "... but it already exists"
    ClassificationRule {
        error_class: ErrorClass::Route53RecordConflict,
        service: "Route53",
        patterns: &["tried to create resource record set", "invalidchangebatch"],
        confidence: 0.85,
        tokens: &["route53", "dns", "record", "conflict"],
    },
    ClassificationRule {
        error_class: ErrorClass::ResourceAlreadyExists,
        service: "CloudFormation",
        patterns: &["already exists", "alreadyexistsexception"],
        confidence: 0.85,
        tokens: &["resource", "already_exists", "conflict"],
    },
    ClassificationRule {
        error_class: ErrorClass::LambdaInvalidConfiguration,
        service: "Lambda",
        patterns: &[
            "unzipped size must be smaller",
            "codestorageexceededexception",
            "the runtime parameter of",
            r"lambda function .* invalid",
        ],
        confidence: 0.8,
        tokens: &["lambda", "configuration", "invalid"],
    },
    // "ValidationError ... does not exist" is a missing resource, not a
    // template problem
    ClassificationRule {
        error_class: ErrorClass::ResourceNotFound,
        service: "CloudFormation",
        patterns: &[
            "resourcenotfoundexception",
            "nosuchentity",
            "nosuchbucket",
            "does not exist",
            "not found",
        ],
        confidence: 0.75,
        tokens: &["resource", "not_found"],
    },
    ClassificationRule {
        error_class: ErrorClass::TemplateValidationError,
        service: "CloudFormation",
        patterns: &[
            "template format error",
            "template error",
            "validationerror",
            "unresolved resource dependencies",
            "circular dependency",
        ],
        confidence: 0.8,
        tokens: &["template", "validation"],
    },
    ClassificationRule {
        error_class: ErrorClass::ResourceStabilizationTimeout,
        service: "CloudFormation",
        patterns: &["did not stabilize", "failed to stabilize", "exceeded the timeout", "timed out", "timeout"],
        confidence: 0.7,
        tokens: &["timeout", "stabilization"],
    },
    ClassificationRule {
        error_class: ErrorClass::ServiceInternalFailure,
        service: "AWS",
        patterns: &[
            "internal failure",
            "internalfailure",
            "internal error",
            "internalerror",
            "service unavailable",
            "serviceunavailable",
        ],
        confidence: 0.6,
        tokens: &["internal", "service", "transient"],
    },
];

/// The built-in rule table, in precedence order.
pub fn default_rules() -> &'static [ClassificationRule] {
    DEFAULT_RULES
}

#[derive(Clone)]
struct CompiledRule {
    rule: ClassificationRule,
    matcher: Regex,
}

/// Classifier over an ordered rule table.
///
/// Compiled once and immutable afterwards, so a single instance can be
/// shared across threads without coordination. Cloning shares the compiled
/// patterns.
#[derive(Clone)]
pub struct FailureClassifier {
    rules: Vec<CompiledRule>,
}

static BUILTIN: LazyLock<FailureClassifier> = LazyLock::new(|| {
    FailureClassifier::new(DEFAULT_RULES.to_vec()).expect("built-in classification rules compile")
});

impl FailureClassifier {
    /// Compile a rule table. Rules keep the order given.
    pub fn new(rules: Vec<ClassificationRule>) -> DomainResult<Self> {
        let rules = rules
            .into_iter()
            .map(|rule| {
                if !(0.0..=1.0).contains(&rule.confidence) {
                    return Err(DomainError::ValidationFailed(format!(
                        "rule {} has confidence {} outside [0, 1]",
                        rule.error_class, rule.confidence
                    )));
                }
                if rule.patterns.is_empty() {
                    return Err(DomainError::ValidationFailed(format!(
                        "rule {} has no patterns",
                        rule.error_class
                    )));
                }
                let alternation = rule
                    .patterns
                    .iter()
                    .map(|p| format!("(?:{p})"))
                    .collect::<Vec<_>>()
                    .join("|");
                let matcher = RegexBuilder::new(&alternation)
                    .case_insensitive(true)
                    .build()
                    .map_err(|e| {
                        DomainError::ValidationFailed(format!(
                            "rule {} has an invalid pattern: {e}",
                            rule.error_class
                        ))
                    })?;
                Ok(CompiledRule { rule, matcher })
            })
            .collect::<DomainResult<Vec<_>>>()?;

        Ok(Self { rules })
    }

    /// Shared classifier over [`DEFAULT_RULES`].
    pub fn builtin() -> &'static Self {
        &BUILTIN
    }

    /// Rules in precedence order.
    pub fn rules(&self) -> impl Iterator<Item = &ClassificationRule> {
        self.rules.iter().map(|c| &c.rule)
    }

    /// First rule matching `text`, if any.
    pub fn match_rule(&self, text: &str) -> Option<&ClassificationRule> {
        let surface = text.to_lowercase();
        self.rules
            .iter()
            .find(|c| c.matcher.is_match(&surface))
            .map(|c| &c.rule)
    }

    /// Classify a burst of signals.
    ///
    /// Never fails: no signals yields `UNKNOWN` at confidence 0.0, and signals
    /// that match no rule yield `UNKNOWN` at 0.5.
    pub fn classify(&self, signals: &[FailureSignal]) -> FailureClassification {
        let Some(first) = signals.first() else {
            return FailureClassification {
                fingerprint_id: fingerprint(ErrorClass::Unknown, UNKNOWN_SERVICE, ""),
                error_class: ErrorClass::Unknown,
                service: UNKNOWN_SERVICE.to_string(),
                confidence: EMPTY_INPUT_CONFIDENCE,
                tokens: BTreeSet::new(),
            };
        };

        let combined = signals
            .iter()
            .map(|s| s.status_reason.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        if let Some(rule) = self.match_rule(&combined) {
            let template = normalize_template(&combined);
            let classification = FailureClassification {
                fingerprint_id: fingerprint(rule.error_class, rule.service, &template),
                error_class: rule.error_class,
                service: rule.service.to_string(),
                confidence: rule.confidence,
                tokens: rule.tokens.iter().map(|t| (*t).to_string()).collect(),
            };
            tracing::debug!(
                fingerprint_id = %classification.fingerprint_id,
                error_class = %classification.error_class,
                confidence = classification.confidence,
                signals = signals.len(),
                "Classified failure signals"
            );
            return classification;
        }

        let template = normalize_template(&first.status_reason);
        tracing::debug!(
            resource_type = %first.resource_type,
            signals = signals.len(),
            "No classification rule matched"
        );
        FailureClassification {
            fingerprint_id: fingerprint(ErrorClass::Unknown, &first.resource_type, &template),
            error_class: ErrorClass::Unknown,
            service: first.resource_type.clone(),
            confidence: NO_MATCH_CONFIDENCE,
            tokens: NO_MATCH_TOKENS.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

/// Classify with the built-in rule table.
pub fn classify(signals: &[FailureSignal]) -> FailureClassification {
    FailureClassifier::builtin().classify(signals)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signal(reason: &str) -> FailureSignal {
        FailureSignal::new("AWS::Lambda::Function", "Handler", reason)
    }

    fn class_of(reason: &str) -> ErrorClass {
        classify(&[signal(reason)]).error_class
    }

    fn position(class: ErrorClass) -> usize {
        DEFAULT_RULES
            .iter()
            .position(|r| r.error_class == class)
            .unwrap()
    }

    #[test]
    fn test_empty_input() {
        let c = classify(&[]);
        assert_eq!(c.error_class, ErrorClass::Unknown);
        assert_eq!(c.confidence, 0.0);
        assert!(c.tokens.is_empty());
        assert_eq!(c.service, "Unknown");
        assert_eq!(c.fingerprint_id, fingerprint(ErrorClass::Unknown, "Unknown", ""));
    }

    #[test]
    fn test_no_match_fallback() {
        let signals = vec![
            FailureSignal::new("Custom::Widget", "Widget", "the flux capacitor overheated"),
            FailureSignal::new("AWS::S3::Bucket", "Bucket", "also weird"),
        ];
        let c = classify(&signals);
        assert_eq!(c.error_class, ErrorClass::Unknown);
        assert_eq!(c.confidence, 0.5);
        assert_eq!(c.service, "Custom::Widget");
        let expected: BTreeSet<String> = ["unknown", "error"].iter().map(|s| s.to_string()).collect();
        assert_eq!(c.tokens, expected);
        assert_eq!(
            c.fingerprint_id,
            fingerprint(ErrorClass::Unknown, "Custom::Widget", "the flux capacitor overheated")
        );
    }

    #[test]
    fn test_acm_dns_validation() {
        let c = classify(&[FailureSignal::new(
            "Certificate",
            "SiteCert",
            "DNS validation is pending for this certificate",
        )]);
        assert_eq!(c.error_class, ErrorClass::AcmDnsValidationPending);
        assert_eq!(c.confidence, 0.9);
        assert_eq!(c.service, "ACM");
        assert!(c.tokens.contains("dns"));
    }

    #[test]
    fn test_rule_order_rollback_before_in_progress() {
        assert!(position(ErrorClass::CfnRollbackInProgress) < position(ErrorClass::CfnStackInProgress));
        assert_eq!(
            class_of("Stack is in UPDATE_ROLLBACK_IN_PROGRESS state; IN_PROGRESS operations pending"),
            ErrorClass::CfnRollbackInProgress
        );
        assert_eq!(
            class_of("Stack:arn:aws:cloudformation:us-east-1:1:stack/Web/x is in UPDATE_IN_PROGRESS state"),
            ErrorClass::CfnStackInProgress
        );
    }

    #[test]
    fn test_rule_order_rollback_states() {
        assert!(position(ErrorClass::CfnUpdateRollbackFailed) < position(ErrorClass::CfnRollbackInProgress));
        assert_eq!(class_of("is in UPDATE_ROLLBACK_FAILED state"), ErrorClass::CfnUpdateRollbackFailed);
        assert_eq!(
            class_of("Stack is in ROLLBACK_COMPLETE state and can not be updated."),
            ErrorClass::CfnRollbackComplete
        );
        assert_eq!(class_of("UPDATE_ROLLBACK_COMPLETE"), ErrorClass::CfnRollbackInProgress);
    }

    #[test]
    fn test_rule_order_throttling_before_quota() {
        assert!(position(ErrorClass::ApiThrottling) < position(ErrorClass::ServiceQuotaExceeded));
        assert_eq!(class_of("RequestLimitExceeded: slow down"), ErrorClass::ApiThrottling);
        assert_eq!(class_of("LimitExceededException: too many VPCs"), ErrorClass::ServiceQuotaExceeded);
    }

    #[test]
    fn test_rule_order_record_conflict_before_already_exists() {
        assert!(position(ErrorClass::Route53RecordConflict) < position(ErrorClass::ResourceAlreadyExists));
        assert_eq!(
            class_of("[Tried to create resource record set [name='api.example.com.', type='A'] but it already exists]"),
            ErrorClass::Route53RecordConflict
        );
        assert_eq!(class_of("my-bucket already exists"), ErrorClass::ResourceAlreadyExists);
    }

    #[test]
    fn test_rule_order_bootstrap_before_iam() {
        assert!(position(ErrorClass::CdkBootstrapRequired) < position(ErrorClass::IamPermissionDenied));
        assert_eq!(
            class_of("User is not authorized to perform: ssm:GetParameter on resource: /cdk-bootstrap/hnb659fds/version"),
            ErrorClass::CdkBootstrapRequired
        );
        assert_eq!(
            class_of("User: arn:aws:iam::1:user/x is not authorized to perform: iam:CreateRole"),
            ErrorClass::IamPermissionDenied
        );
    }

    #[test]
    fn test_rule_order_not_found_before_validation() {
        assert!(position(ErrorClass::ResourceNotFound) < position(ErrorClass::TemplateValidationError));
        assert_eq!(
            class_of("An error occurred (ValidationError) when calling the DescribeStacks operation: Stack with id Web does not exist"),
            ErrorClass::ResourceNotFound
        );
        assert_eq!(class_of("Template format error: unsupported structure"), ErrorClass::TemplateValidationError);
    }

    #[test]
    fn test_multi_signal_burst_is_one_surface() {
        let signals = vec![signal("Resource creation cancelled"), signal("Rate exceeded")];
        assert_eq!(classify(&signals).error_class, ErrorClass::ApiThrottling);
    }

    #[test]
    fn test_determinism_across_volatile_details() {
        let a = classify(&[signal(
            "Rate exceeded (Service: Lambda, Status Code: 429, Request ID: 6a1f8b7e-0d3c-4a5e-9b2f-1c2d3e4f5a6b) at 2024-03-01T10:00:00Z",
        )]);
        let b = classify(&[signal(
            "Rate exceeded (Service: Lambda, Status Code: 429, Request ID: 0b9e7c6d-5a4f-4e3d-8c2b-a1f0e9d8c7b6) at 2025-11-20T23:59:59.123Z",
        )]);
        assert_eq!(a.fingerprint_id, b.fingerprint_id);
    }

    #[test]
    fn test_different_templates_differ() {
        let a = classify(&[signal("Rate exceeded for CreateFunction")]);
        let b = classify(&[signal("Rate exceeded for UpdateAlias")]);
        assert_eq!(a.error_class, b.error_class);
        assert_ne!(a.fingerprint_id, b.fingerprint_id);
    }

    #[test]
    fn test_custom_rule_table() {
        let classifier = FailureClassifier::new(vec![ClassificationRule {
            error_class: ErrorClass::ServiceInternalFailure,
            service: "Test",
            patterns: &["flux capacitor"],
            confidence: 0.3,
            tokens: &["flux"],
        }])
        .unwrap();
        let c = classifier.classify(&[signal("The FLUX CAPACITOR overheated")]);
        assert_eq!(c.error_class, ErrorClass::ServiceInternalFailure);
        assert_eq!(c.service, "Test");
        assert_eq!(c.confidence, 0.3);
        assert_eq!(classifier.rules().count(), 1);
    }

    #[test]
    fn test_invalid_rules_rejected() {
        let bad_pattern = ClassificationRule {
            error_class: ErrorClass::Unknown,
            service: "Test",
            patterns: &["(unclosed"],
            confidence: 0.5,
            tokens: &[],
        };
        assert!(matches!(
            FailureClassifier::new(vec![bad_pattern.clone()]),
            Err(DomainError::ValidationFailed(_))
        ));
        let bad_confidence = ClassificationRule {
            patterns: &["ok"],
            confidence: 1.5,
            ..bad_pattern
        };
        assert!(FailureClassifier::new(vec![bad_confidence]).is_err());
    }

    #[test]
    fn test_builtin_rules_are_well_formed() {
        for rule in DEFAULT_RULES {
            assert!((0.0..=1.0).contains(&rule.confidence));
            assert!(!rule.tokens.is_empty());
            assert_ne!(rule.error_class, ErrorClass::Unknown);
        }
        assert_eq!(FailureClassifier::builtin().rules().count(), DEFAULT_RULES.len());
    }
}
