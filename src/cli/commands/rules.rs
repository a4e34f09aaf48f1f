use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput, TableFormatter};
use crate::domain::models::{Config, ErrorClass};
use crate::services::{ClassificationRule, FailureClassifier};

#[derive(Args, Debug)]
pub struct RulesArgs {
    /// Show only rules producing this error class
    #[arg(short = 'C', long)]
    pub class: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct RuleRow {
    pub position: usize,
    #[serde(flatten)]
    pub rule: &'static ClassificationRule,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct RulesOutput(pub Vec<RuleRow>);

impl CommandOutput for RulesOutput {
    fn to_human(&self) -> String {
        if self.0.is_empty() {
            return "No matching rules.".to_string();
        }
        let rules: Vec<_> = self.0.iter().map(|row| (row.position, row.rule)).collect();
        TableFormatter::new().format_rules(&rules)
    }
}

pub async fn execute(args: RulesArgs, _config: &Config, json: bool) -> Result<()> {
    let class = match args.class.as_deref() {
        Some(name) => Some(
            ErrorClass::from_str(name).ok_or_else(|| anyhow::anyhow!("Unknown error class: {name}"))?,
        ),
        None => None,
    };

    output(&RulesOutput(rule_rows(class)), json);
    Ok(())
}

/// Built-in rules in precedence order, optionally narrowed to one class.
fn rule_rows(class: Option<ErrorClass>) -> Vec<RuleRow> {
    FailureClassifier::builtin()
        .rules()
        .enumerate()
        .filter(|(_, rule)| class.map_or(true, |c| rule.error_class == c))
        .map(|(i, rule)| RuleRow { position: i + 1, rule })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rule_rows_keep_precedence_positions() {
        let all = rule_rows(None);
        assert_eq!(all[0].position, 1);
        assert_eq!(all[0].rule.error_class, ErrorClass::CfnUpdateRollbackFailed);

        let throttling = rule_rows(Some(ErrorClass::ApiThrottling));
        assert_eq!(throttling.len(), 1);
        assert!(throttling[0].position > 1);
    }

    #[test]
    fn test_rules_json_is_flat() {
        let value = RulesOutput(rule_rows(Some(ErrorClass::ApiThrottling))).to_json();
        assert_eq!(value[0]["error_class"], "API_THROTTLING");
        assert!(value[0]["position"].is_number());
    }
}
