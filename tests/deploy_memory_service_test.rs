//! End-to-end analysis through the service: mock stack feed, real SQLite store.

mod common;

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use deploy_memory::adapters::stack_events::MockStackEventSource;
use deploy_memory::domain::models::{DeployMemoryEvent, ErrorClass, FactoryAction};
use deploy_memory::{
    DeployMemoryRepository, DeployMemoryService, DomainError, DomainResult,
    NullDeployMemoryRepository, PersistenceOutcome,
};

use common::{complete_event, failed_event, setup_repository};

/// Repository whose writes always fail.
struct FailingRepository;

#[async_trait]
impl DeployMemoryRepository for FailingRepository {
    async fn insert(&self, _event: &DeployMemoryEvent) -> DomainResult<()> {
        Err(DomainError::DatabaseError("disk I/O error".to_string()))
    }

    async fn list_by_fingerprint(
        &self,
        _fingerprint_id: &str,
        _limit: u32,
        _now: DateTime<Utc>,
    ) -> DomainResult<Vec<DeployMemoryEvent>> {
        Err(DomainError::DatabaseError("disk I/O error".to_string()))
    }

    async fn prune_expired(&self, _now: DateTime<Utc>) -> DomainResult<u64> {
        Err(DomainError::DatabaseError("disk I/O error".to_string()))
    }
}

fn web_stack() -> MockStackEventSource {
    let now = Utc::now();
    MockStackEventSource::new().with_stack(
        "WebStack",
        "ROLLBACK_COMPLETE",
        vec![
            complete_event("WebStack", "Logs", 10),
            failed_event(
                "WebStack",
                "Assets",
                "web-assets-prod already exists",
                now - Duration::minutes(5),
            ),
            failed_event("WebStack", "Pending", "", now - Duration::minutes(4)),
        ],
    )
}

#[tokio::test]
async fn test_analyze_stack_records_event() {
    common::setup_test_logging();
    let repository = setup_repository().await;
    let service = DeployMemoryService::new(Arc::new(web_stack()), repository, "eu-west-1");

    let analysis = service.analyze_stack("WebStack").await.expect("analysis failed");

    assert_eq!(analysis.stack_name.as_deref(), Some("WebStack"));
    // blank reasons and successful events carry no signal
    assert_eq!(analysis.signals.len(), 1);
    assert_eq!(analysis.signals[0].logical_id, "Assets");
    assert_eq!(analysis.classification.error_class, ErrorClass::ResourceAlreadyExists);
    assert_eq!(
        analysis.recommendation.fingerprint_id,
        analysis.classification.fingerprint_id
    );

    let PersistenceOutcome::Stored { event_id } = analysis.persistence else {
        panic!("expected stored event, got {:?}", analysis.persistence);
    };
    let latest = service
        .store()
        .get_latest_event(&analysis.classification.fingerprint_id)
        .await
        .unwrap()
        .expect("event stored");
    assert_eq!(latest.id, event_id);
    assert_eq!(latest.region, "eu-west-1");
    assert_eq!(latest.stack_name.as_deref(), Some("WebStack"));
    assert_eq!(latest.raw_signals, analysis.signals);
}

#[tokio::test]
async fn test_repeated_failures_accumulate() {
    let repository = setup_repository().await;
    let service = DeployMemoryService::new(Arc::new(web_stack()), repository, "us-east-1");

    let first = service.analyze_stack("WebStack").await.unwrap();
    let second = service.analyze_stack("WebStack").await.unwrap();
    assert_eq!(first.classification.fingerprint_id, second.classification.fingerprint_id);

    let stats = service
        .store()
        .get_event_stats(&first.classification.fingerprint_id)
        .await
        .unwrap();
    assert_eq!(stats.total_occurrences, 2);
}

#[tokio::test]
async fn test_store_failure_keeps_recommendation() {
    let service =
        DeployMemoryService::new(Arc::new(web_stack()), Arc::new(FailingRepository), "us-east-1");

    let analysis = service.analyze_stack("WebStack").await.expect("analysis must succeed");

    assert_eq!(analysis.classification.error_class, ErrorClass::ResourceAlreadyExists);
    assert_eq!(
        analysis.recommendation.proposed_factory_action,
        service
            .playbooks()
            .resolve_action(ErrorClass::ResourceAlreadyExists, analysis.classification.confidence)
    );
    match analysis.persistence {
        PersistenceOutcome::Failed { error } => assert!(error.contains("disk I/O error")),
        other => panic!("expected failed persistence, got {other:?}"),
    }
}

#[tokio::test]
async fn test_missing_stack_is_an_error() {
    let service = DeployMemoryService::new(
        Arc::new(web_stack()),
        Arc::new(NullDeployMemoryRepository::new()),
        "us-east-1",
    );
    let err = service.analyze_stack("NoSuchStack").await.unwrap_err();
    assert!(matches!(err, DomainError::StackNotFound(ref name) if name == "NoSuchStack"));
    assert!(err.is_upstream());
}

#[tokio::test]
async fn test_access_denied_is_an_error() {
    let source = web_stack().deny("WebStack");
    let service = DeployMemoryService::new(
        Arc::new(source),
        Arc::new(NullDeployMemoryRepository::new()),
        "us-east-1",
    );
    let err = service.analyze_stack("WebStack").await.unwrap_err();
    assert!(matches!(err, DomainError::AccessDenied { .. }));
}

#[tokio::test]
async fn test_persistence_disabled_skips_store() {
    let repository = setup_repository().await;
    let service = DeployMemoryService::new(Arc::new(web_stack()), repository, "us-east-1")
        .with_persistence(false);

    let analysis = service.analyze_stack("WebStack").await.unwrap();
    assert_eq!(analysis.persistence, PersistenceOutcome::Skipped);
    assert!(service
        .store()
        .get_latest_event(&analysis.classification.fingerprint_id)
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_console_analysis_uses_last_stack() {
    let repository = setup_repository().await;
    let service = DeployMemoryService::new(
        Arc::new(MockStackEventSource::new()),
        repository,
        "us-east-1",
    );
    let text = "ApiStack: deploying... [1/1]\n\
                ApiStack | 3/9 | 10:01:02 AM | CREATE_FAILED        | AWS::Lambda::Function | Handler (Handler1A2B) Resource handler returned message: \"Rate exceeded\"\n\
                ❌  ApiStack failed: Error: The stack named ApiStack failed creation";

    let analysis = service.analyze_console(text, None).await;
    assert_eq!(analysis.stack_name.as_deref(), Some("ApiStack"));
    assert_eq!(analysis.classification.error_class, ErrorClass::ApiThrottling);
    assert_eq!(analysis.recommendation.proposed_factory_action, FactoryAction::WaitAndRetry);
    assert!(analysis.persistence.is_stored());

    let explicit = service.analyze_console(text, Some("Override".to_string())).await;
    assert_eq!(explicit.stack_name.as_deref(), Some("Override"));
}

#[tokio::test]
async fn test_empty_console_output_is_unknown_and_still_recorded() {
    let repository = setup_repository().await;
    let service = DeployMemoryService::new(
        Arc::new(MockStackEventSource::new()),
        repository,
        "us-east-1",
    );
    let analysis = service.analyze_console("Bundling assets...\nDone", None).await;
    assert!(analysis.signals.is_empty());
    assert_eq!(analysis.classification.error_class, ErrorClass::Unknown);
    assert_eq!(analysis.recommendation.proposed_factory_action, FactoryAction::OpenIssue);
    assert!(analysis.persistence.is_stored());
}
