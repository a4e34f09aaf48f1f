//! End-to-end classification and recommendation tests.

mod common;

use deploy_memory::domain::models::{ErrorClass, FactoryAction, FailureClassification};
use deploy_memory::services::{
    classify, get_playbook, recommend, resolve_action, FailureClassifier, CONFIDENCE_THRESHOLD,
    FINGERPRINT_HEX_LEN,
};
use deploy_memory::FailureSignal;

use common::{acm_signals, iam_signals, signal};

#[test]
fn test_acm_pending_waits_and_retries() {
    let classification = classify(&acm_signals());
    assert_eq!(classification.error_class, ErrorClass::AcmDnsValidationPending);
    assert_eq!(classification.service, "ACM");
    assert!((classification.confidence - 0.9).abs() < f64::EPSILON);
    assert_eq!(classification.fingerprint_id.len(), FINGERPRINT_HEX_LEN);

    let recommendation = recommend(&classification);
    assert_eq!(recommendation.proposed_factory_action, FactoryAction::WaitAndRetry);
    assert_eq!(recommendation.fingerprint_id, classification.fingerprint_id);
    assert_eq!(recommendation.error_class, ErrorClass::AcmDnsValidationPending);
    assert!(!recommendation.guardrails.is_empty());
}

#[test]
fn test_acm_pending_low_confidence_opens_issue() {
    let classification = FailureClassification {
        confidence: 0.4,
        ..classify(&acm_signals())
    };
    let recommendation = recommend(&classification);
    assert_eq!(recommendation.proposed_factory_action, FactoryAction::OpenIssue);
    assert_eq!(recommendation.error_class, ErrorClass::AcmDnsValidationPending);
    assert!((recommendation.confidence - 0.4).abs() < f64::EPSILON);
}

#[test]
fn test_confidence_gate_applies_to_every_class() {
    for class in ErrorClass::ALL {
        assert_eq!(
            resolve_action(class, CONFIDENCE_THRESHOLD - 0.01),
            FactoryAction::OpenIssue,
            "{class} below threshold"
        );
        assert_eq!(
            resolve_action(class, CONFIDENCE_THRESHOLD),
            get_playbook(class.as_str()).proposed_factory_action,
            "{class} at threshold"
        );
    }
}

#[test]
fn test_update_rollback_in_progress_is_a_rollback() {
    let signals = vec![FailureSignal::for_stack(
        "WebStack",
        "Stack:arn:aws:cloudformation:us-east-1:123456789012:stack/WebStack/abc is in UPDATE_ROLLBACK_IN_PROGRESS state and can not be updated.",
    )];
    assert_eq!(classify(&signals).error_class, ErrorClass::CfnRollbackInProgress);
}

#[test]
fn test_iam_denied_needs_a_human() {
    let classification = classify(&iam_signals());
    assert_eq!(classification.error_class, ErrorClass::IamPermissionDenied);
    assert_eq!(
        recommend(&classification).proposed_factory_action,
        FactoryAction::HumanRequired
    );
}

#[test]
fn test_no_match_falls_back_to_first_resource_type() {
    let signals = vec![
        signal("AWS::Custom::Thing", "Widget", "the flux capacitor overheated"),
        signal("AWS::S3::Bucket", "Assets", "something else entirely"),
    ];
    let classification = classify(&signals);
    assert_eq!(classification.error_class, ErrorClass::Unknown);
    assert_eq!(classification.service, "AWS::Custom::Thing");
    assert!((classification.confidence - 0.5).abs() < f64::EPSILON);
    assert!(classification.tokens.contains("unknown"));
    assert!(classification.tokens.contains("error"));

    // 0.5 is below the gate, so unknown failures always open an issue
    assert_eq!(
        recommend(&classification).proposed_factory_action,
        FactoryAction::OpenIssue
    );
}

#[test]
fn test_empty_burst() {
    let classification = classify(&[]);
    assert_eq!(classification.error_class, ErrorClass::Unknown);
    assert_eq!(classification.confidence, 0.0);
    assert!(classification.tokens.is_empty());
}

#[test]
fn test_same_failure_in_two_accounts_shares_a_fingerprint() {
    let first = vec![signal(
        "AWS::S3::Bucket",
        "Assets",
        "assets-bucket-2024-03-01T10:15:00Z already exists in stack arn:aws:cloudformation:us-east-1:111111111111:stack/WebStack/6c1f0c10-1b2a-11ef-9e2b-0a1b2c3d4e5f",
    )];
    let second = vec![signal(
        "AWS::S3::Bucket",
        "Assets",
        "assets-bucket-2025-11-30T23:59:59Z already exists in stack arn:aws:cloudformation:eu-west-1:222222222222:stack/WebStack/0f9e8d7c-6b5a-4c3d-2e1f-0a9b8c7d6e5f",
    )];
    let a = classify(&first);
    let b = classify(&second);
    assert_eq!(a.error_class, ErrorClass::ResourceAlreadyExists);
    assert_eq!(a.fingerprint_id, b.fingerprint_id);
}

#[test]
fn test_builtin_matches_free_function() {
    let signals = iam_signals();
    assert_eq!(FailureClassifier::builtin().classify(&signals), classify(&signals));
}
