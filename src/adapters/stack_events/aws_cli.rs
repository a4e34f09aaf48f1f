//! Stack event source backed by the `aws` command-line client.
//!
//! Runs `aws cloudformation describe-stacks` and `describe-stack-events` with
//! JSON output and maps the client's error text onto domain errors.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::process::Stdio;
use tokio::process::Command;

use crate::domain::errors::{DomainError, DomainResult};
use crate::domain::models::{CollectorConfig, StackDescription, StackEvent};
use crate::domain::ports::StackEventSource;

/// Configuration for the AWS CLI event source.
#[derive(Debug, Clone)]
pub struct AwsCliConfig {
    /// Path to the aws CLI binary
    pub binary_path: String,
    pub region: String,
    /// Named credentials profile
    pub profile: Option<String>,
}

impl Default for AwsCliConfig {
    fn default() -> Self {
        Self::from(&CollectorConfig::default())
    }
}

impl From<&CollectorConfig> for AwsCliConfig {
    fn from(config: &CollectorConfig) -> Self {
        Self {
            binary_path: config.aws_cli_path.clone(),
            region: config.region.clone(),
            profile: config.profile.clone(),
        }
    }
}

pub struct AwsCliStackEventSource {
    config: AwsCliConfig,
}

impl AwsCliStackEventSource {
    pub fn new(config: AwsCliConfig) -> Self {
        Self { config }
    }

    fn base_command(&self, operation: &str, stack_name: &str) -> Command {
        let mut cmd = Command::new(&self.config.binary_path);
        cmd.arg("cloudformation")
            .arg(operation)
            .arg("--stack-name")
            .arg(stack_name)
            .arg("--region")
            .arg(&self.config.region)
            .arg("--output")
            .arg("json")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        if let Some(profile) = &self.config.profile {
            cmd.arg("--profile").arg(profile);
        }
        cmd
    }

    async fn run(&self, mut cmd: Command, stack_name: &str) -> DomainResult<Vec<u8>> {
        tracing::debug!(
            stack_name,
            region = %self.config.region,
            binary = %self.config.binary_path,
            "Invoking aws cli"
        );
        let output = cmd.output().await.map_err(|e| {
            DomainError::UpstreamFailed(format!("failed to run {}: {e}", self.config.binary_path))
        })?;

        if output.status.success() {
            Ok(output.stdout)
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(map_cli_error(stack_name, stderr.trim()))
        }
    }
}

#[async_trait]
impl StackEventSource for AwsCliStackEventSource {
    async fn describe_stack(&self, stack_name: &str) -> DomainResult<StackDescription> {
        let cmd = self.base_command("describe-stacks", stack_name);
        let stdout = self.run(cmd, stack_name).await?;
        parse_describe_stacks(stack_name, &stdout)
    }

    async fn recent_events(&self, stack_name: &str, limit: usize) -> DomainResult<Vec<StackEvent>> {
        let mut cmd = self.base_command("describe-stack-events", stack_name);
        cmd.arg("--max-items").arg(limit.to_string());
        let stdout = self.run(cmd, stack_name).await?;
        let mut events = parse_stack_events(&stdout)?;
        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}

/// Map the client's stderr to a domain error.
pub fn map_cli_error(stack_name: &str, stderr: &str) -> DomainError {
    let lower = stderr.to_lowercase();
    if lower.contains("does not exist") {
        DomainError::StackNotFound(stack_name.to_string())
    } else if lower.contains("accessdenied")
        || lower.contains("access denied")
        || lower.contains("not authorized")
        || lower.contains("expiredtoken")
        || lower.contains("unable to locate credentials")
    {
        DomainError::AccessDenied {
            stack: stack_name.to_string(),
            message: stderr.to_string(),
        }
    } else {
        DomainError::UpstreamFailed(stderr.to_string())
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStacksOutput {
    #[serde(default)]
    stacks: Vec<StackRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackRecord {
    stack_name: String,
    stack_id: Option<String>,
    stack_status: String,
    stack_status_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeStackEventsOutput {
    #[serde(default)]
    stack_events: Vec<StackEventRecord>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct StackEventRecord {
    stack_name: String,
    logical_resource_id: String,
    physical_resource_id: Option<String>,
    resource_type: String,
    resource_status: String,
    resource_status_reason: Option<String>,
    timestamp: DateTime<Utc>,
}

pub fn parse_describe_stacks(stack_name: &str, json: &[u8]) -> DomainResult<StackDescription> {
    let output: DescribeStacksOutput = serde_json::from_slice(json)?;
    let stack = output
        .stacks
        .into_iter()
        .next()
        .ok_or_else(|| DomainError::StackNotFound(stack_name.to_string()))?;
    Ok(StackDescription {
        stack_name: stack.stack_name,
        stack_id: stack.stack_id,
        stack_status: stack.stack_status,
        stack_status_reason: stack.stack_status_reason,
    })
}

pub fn parse_stack_events(json: &[u8]) -> DomainResult<Vec<StackEvent>> {
    let output: DescribeStackEventsOutput = serde_json::from_slice(json)?;
    Ok(output
        .stack_events
        .into_iter()
        .map(|e| StackEvent {
            stack_name: e.stack_name,
            logical_id: e.logical_resource_id,
            physical_id: e.physical_resource_id,
            resource_type: e.resource_type,
            resource_status: e.resource_status,
            status_reason: e.resource_status_reason,
            timestamp: e.timestamp,
        })
        .collect())
}
