use anyhow::Result;
use clap::Args;
use serde::Serialize;

use crate::cli::output::{output, CommandOutput};
use crate::domain::models::{Config, Playbook};
use crate::services::PlaybookRegistry;

#[derive(Args, Debug)]
pub struct PlaybookArgs {
    /// Playbook id or error class, e.g. ACM_DNS_VALIDATION_PENDING; unknown keys show the fallback playbook
    pub key: Option<String>,

    /// List every playbook instead of showing one
    #[arg(short, long, conflicts_with = "key")]
    pub all: bool,
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PlaybookOutput(pub Playbook);

impl CommandOutput for PlaybookOutput {
    fn to_human(&self) -> String {
        let playbook = &self.0;
        let mut lines = vec![
            format!("Playbook:     {}", playbook.fingerprint_id),
            format!("Error class:  {}", playbook.error_class),
            format!("Action:       {}", playbook.proposed_factory_action),
            String::new(),
            playbook.steps.to_string(),
        ];
        if !playbook.guardrails.is_empty() {
            lines.push(String::new());
            lines.push("Guardrails:".to_string());
            lines.extend(playbook.guardrails.iter().map(|g| format!("  - {g}")));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Serialize)]
#[serde(transparent)]
pub struct PlaybookListOutput(pub Vec<Playbook>);

impl CommandOutput for PlaybookListOutput {
    fn to_human(&self) -> String {
        self.0
            .iter()
            .map(|p| format!("{:<34} {:<34} {}", p.fingerprint_id, p.error_class.as_str(), p.proposed_factory_action))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

pub async fn execute(args: PlaybookArgs, _config: &Config, json: bool) -> Result<()> {
    let registry = PlaybookRegistry::builtin();

    match args.key {
        Some(key) if !args.all => output(&PlaybookOutput(registry.get_playbook(&key).clone()), json),
        _ => output(&PlaybookListOutput(registry.playbooks().to_vec()), json),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_playbook_output_includes_steps_and_guardrails() {
        let playbook = PlaybookRegistry::builtin().get_playbook("ACM_DNS_VALIDATION_PENDING").clone();
        let rendered = PlaybookOutput(playbook.clone()).to_human();
        assert!(rendered.contains(playbook.fingerprint_id));
        assert!(rendered.contains("WAIT_AND_RETRY"));
        for guardrail in playbook.guardrails {
            assert!(rendered.contains(guardrail));
        }
    }

    #[test]
    fn test_unknown_key_renders_fallback() {
        let playbook = PlaybookRegistry::builtin().get_playbook("no-such-playbook").clone();
        let rendered = PlaybookOutput(playbook).to_human();
        assert!(rendered.contains("UNKNOWN"));
    }
}
