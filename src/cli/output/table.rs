//! Table output formatting for CLI commands
//!
//! Renders signals, stored events and the rule table with comfy-table.
//! Colors are dropped when `NO_COLOR` is set or the terminal is dumb.

use comfy_table::{presets, Attribute, Cell, Color, ContentArrangement, Table};
use std::env;

use crate::domain::models::{DeployMemoryEvent, FactoryAction, FailureSignal};
use crate::services::failure_classifier::ClassificationRule;

use super::truncate;

/// Table formatter for CLI output
pub struct TableFormatter {
    use_colors: bool,
    max_width: Option<u16>,
}

impl TableFormatter {
    pub fn new() -> Self {
        Self {
            use_colors: supports_color(),
            max_width: None,
        }
    }

    pub fn with_config(use_colors: bool, max_width: Option<u16>) -> Self {
        Self {
            use_colors,
            max_width,
        }
    }

    pub fn format_signals(&self, signals: &[FailureSignal]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Resource Type", "Logical ID", "Status", "Reason"]));

        for signal in signals {
            table.add_row(vec![
                Cell::new(&signal.resource_type),
                Cell::new(&signal.logical_id),
                Cell::new(signal.resource_status.as_deref().unwrap_or("-")),
                Cell::new(truncate(&signal.status_reason, 80)),
            ]);
        }

        table.to_string()
    }

    pub fn format_events(&self, events: &[DeployMemoryEvent]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["Time", "Error Class", "Confidence", "Stack", "Region", "Signals"]));

        for event in events {
            table.add_row(vec![
                Cell::new(event.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
                Cell::new(event.error_class.as_str()),
                Cell::new(format!("{:.2}", event.confidence)),
                Cell::new(event.stack_name.as_deref().unwrap_or("-")),
                Cell::new(&event.region),
                Cell::new(event.raw_signals.len()),
            ]);
        }

        table.to_string()
    }

    /// Rules with their 1-based precedence positions.
    pub fn format_rules(&self, rules: &[(usize, &ClassificationRule)]) -> String {
        let mut table = self.create_base_table();
        table.set_header(header(&["#", "Error Class", "Service", "Confidence", "Patterns"]));

        for (position, rule) in rules {
            table.add_row(vec![
                Cell::new(position),
                Cell::new(rule.error_class.as_str()),
                Cell::new(rule.service),
                Cell::new(format!("{:.2}", rule.confidence)),
                Cell::new(truncate(&rule.patterns.join(", "), 60)),
            ]);
        }

        table.to_string()
    }

    /// A cell for a factory action, colored by severity.
    pub fn action_cell(&self, action: FactoryAction) -> Cell {
        let cell = Cell::new(action.as_str()).add_attribute(Attribute::Bold);
        if self.use_colors {
            cell.fg(action_color(action))
        } else {
            cell
        }
    }

    fn create_base_table(&self) -> Table {
        let mut table = Table::new();

        table
            .load_preset(presets::UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic);

        if let Some(width) = self.max_width {
            table.set_width(width);
        }

        table
    }
}

impl Default for TableFormatter {
    fn default() -> Self {
        Self::new()
    }
}

fn header(titles: &[&str]) -> Vec<Cell> {
    titles
        .iter()
        .map(|t| Cell::new(t).add_attribute(Attribute::Bold))
        .collect()
}

/// Check if color output is supported
pub fn supports_color() -> bool {
    if env::var("NO_COLOR").is_ok() {
        return false;
    }
    !matches!(env::var("TERM").as_deref(), Ok("dumb"))
}

fn action_color(action: FactoryAction) -> Color {
    match action {
        FactoryAction::WaitAndRetry => Color::Yellow,
        FactoryAction::OpenIssue => Color::Cyan,
        FactoryAction::HumanRequired => Color::Red,
    }
}
