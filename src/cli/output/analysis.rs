//! Human rendering of a failure analysis.

use console::style;

use crate::services::{FailureAnalysis, PersistenceOutcome};

use super::{CommandOutput, TableFormatter};

impl CommandOutput for FailureAnalysis {
    fn to_human(&self) -> String {
        let formatter = TableFormatter::new();
        let rec = &self.recommendation;
        let mut lines = Vec::new();

        if let Some(stack) = &self.stack_name {
            lines.push(format!("Stack:        {stack}"));
        }
        lines.push(format!("Fingerprint:  {}", style(&rec.fingerprint_id).bold()));
        lines.push(format!(
            "Error class:  {} ({})",
            rec.error_class, self.classification.service
        ));
        lines.push(format!("Confidence:   {:.2}", rec.confidence));
        if self.classification.is_unknown() {
            lines.push(format!("{}", style("No classification rule matched").yellow()));
        }

        let mut action_table = comfy_table::Table::new();
        action_table.load_preset(comfy_table::presets::NOTHING);
        action_table.add_row(vec![
            comfy_table::Cell::new("Action:"),
            formatter.action_cell(rec.proposed_factory_action),
        ]);
        lines.push(action_table.to_string().trim().to_string());
        if rec.proposed_factory_action.allows_retry() {
            lines.push(format!(
                "{}",
                style("Retry is safe once the guardrails below hold.").green()
            ));
        }

        if self.signals.is_empty() {
            lines.push(String::new());
            lines.push("No failure signals found.".to_string());
        } else {
            lines.push(String::new());
            lines.push(format!("Signals ({}):", self.signals.len()));
            lines.push(formatter.format_signals(&self.signals));
        }

        lines.push(String::new());
        lines.push(rec.recommended_steps.clone());

        if !rec.guardrails.is_empty() {
            lines.push(String::new());
            lines.push("Guardrails:".to_string());
            lines.extend(rec.guardrails.iter().map(|g| format!("  - {g}")));
        }

        lines.push(String::new());
        lines.push(match &self.persistence {
            PersistenceOutcome::Stored { event_id } => format!("Stored event {event_id}"),
            PersistenceOutcome::Skipped => "Event not stored".to_string(),
            PersistenceOutcome::Failed { error } => {
                format!("{} {error}", style("Failed to store event:").yellow())
            }
        });

        lines.join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::models::FailureSignal;
    use crate::services::{classify, recommend};

    fn analysis(reason: &str) -> FailureAnalysis {
        let signals = vec![FailureSignal::for_stack("WebStack", reason)];
        let classification = classify(&signals);
        FailureAnalysis {
            stack_name: Some("WebStack".to_string()),
            recommendation: recommend(&classification),
            classification,
            signals,
            persistence: PersistenceOutcome::Skipped,
        }
    }

    #[test]
    fn test_retryable_analysis_says_so() {
        let human = analysis("DNS validation is pending for the certificate").to_human();
        assert!(human.contains("Retry is safe"));
        assert!(!human.contains("No classification rule matched"));
        assert!(human.contains("Event not stored"));
    }

    #[test]
    fn test_unknown_analysis_is_flagged() {
        let human = analysis("the flux capacitor overheated").to_human();
        assert!(human.contains("No classification rule matched"));
        assert!(!human.contains("Retry is safe"));
    }
}
