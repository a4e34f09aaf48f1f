//! Common test utilities for integration tests
//!
//! Shared fixtures for signals, stack events, and a migrated in-memory
//! event table.

#![allow(dead_code)]

use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;

use deploy_memory::adapters::sqlite::{create_migrated_test_pool, SqliteDeployMemoryRepository};
use deploy_memory::domain::models::{StackEvent, STACK_RESOURCE_TYPE};
use deploy_memory::FailureSignal;

pub const TEST_TABLE: &str = "deploy_memory_events";

/// Repository over a fresh in-memory database.
pub async fn setup_repository() -> Arc<SqliteDeployMemoryRepository> {
    let pool = create_migrated_test_pool(TEST_TABLE)
        .await
        .expect("failed to create migrated test pool");
    Arc::new(SqliteDeployMemoryRepository::new(pool, TEST_TABLE).expect("valid table name"))
}

/// Setup test logging
///
/// Initializes tracing subscriber for test output.
pub fn setup_test_logging() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}

pub fn signal(resource_type: &str, logical_id: &str, reason: &str) -> FailureSignal {
    FailureSignal::new(resource_type, logical_id, reason).with_status("CREATE_FAILED")
}

pub fn acm_signals() -> Vec<FailureSignal> {
    vec![signal(
        "AWS::CertificateManager::Certificate",
        "SiteCertificate",
        "Resource handler returned message: DNS validation is pending for certificate arn:aws:acm:us-east-1:123456789012:certificate/8f3a2b1c-4d5e-6f70-8192-a3b4c5d6e7f8",
    )]
}

pub fn iam_signals() -> Vec<FailureSignal> {
    vec![signal(
        "AWS::Lambda::Function",
        "ApiHandler",
        "User: arn:aws:iam::123456789012:user/deployer is not authorized to perform: iam:PassRole on resource arn:aws:iam::123456789012:role/api-handler",
    )]
}

/// A failed resource event at `at`.
pub fn failed_event(stack: &str, logical_id: &str, reason: &str, at: DateTime<Utc>) -> StackEvent {
    StackEvent {
        stack_name: stack.to_string(),
        logical_id: logical_id.to_string(),
        physical_id: None,
        resource_type: "AWS::S3::Bucket".to_string(),
        resource_status: "CREATE_FAILED".to_string(),
        status_reason: Some(reason.to_string()),
        timestamp: at,
    }
}

/// A successful resource event `minutes_ago` before now.
pub fn complete_event(stack: &str, logical_id: &str, minutes_ago: i64) -> StackEvent {
    StackEvent {
        stack_name: stack.to_string(),
        logical_id: logical_id.to_string(),
        physical_id: Some(format!("{logical_id}-physical")),
        resource_type: STACK_RESOURCE_TYPE.to_string(),
        resource_status: "CREATE_COMPLETE".to_string(),
        status_reason: None,
        timestamp: Utc::now() - Duration::minutes(minutes_ago),
    }
}
