//! Free-text signal extraction from deployment console output.
//!
//! A fallback for when the structured event feed is unavailable. The parser
//! is a single left fold over lines carrying a [`ParseContext`]: the stack the
//! output is currently about and the last generic error message seen. Each
//! line is offered to the matchers below in order and the first one that
//! emits wins:
//!
//! 1. rollback status lines
//! 2. stack-level failure lines
//! 3. resource-level `*_FAILED` lines, which consume the pending error
//! 4. generic `Error:` / `❌` lines, kept as pending context and emitted at
//!    once when they name no resource type
//! 5. known AWS exception names
//!
//! Matchers see each line without its `<stack> | n/m | hh:mm:ss AM |`
//! progress prefix, so the reason carries no clock time or counter.
//!
//! Parsing never fails. Unrecognized output yields no signals.

use regex::Regex;
use serde::Serialize;
use std::sync::LazyLock;

use crate::domain::models::{FailureSignal, STACK_RESOURCE_TYPE};

/// Logical id for stack-level signals when no stack name has been seen yet.
pub const UNATTRIBUTED_LOGICAL_ID: &str = "Console";

/// Exception names emitted as signals wherever they appear.
pub const KNOWN_EXCEPTIONS: &[&str] = &[
    "ResourceNotFoundException",
    "AccessDeniedException",
    "ThrottlingException",
    "TooManyRequestsException",
    "LimitExceededException",
    "ServiceQuotaExceededException",
    "ValidationException",
    "AlreadyExistsException",
    "ResourceConflictException",
    "CNAMEAlreadyExists",
    "InvalidChangeBatch",
    "ServiceUnavailableException",
    "InternalFailure",
];

static PROGRESS_PREFIX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\s*([A-Za-z][\w-]*)\s*\|\s*\d+/\d+").unwrap());

static PROGRESS_COLUMNS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*[A-Za-z][\w-]*\s*\|\s*\d+/\d+\s*\|(?:\s*\d{1,2}:\d{2}:\d{2}(?:\s*[AP]M)?\s*\|)?\s*")
        .unwrap()
});

static STACK_ACTIVITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\W*([A-Za-z][\w-]*)\s*:\s*(?:deploying|creating|updating|destroying|publishing)\b")
        .unwrap()
});

static ROLLBACK_STATUS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b((?:UPDATE_)?ROLLBACK_(?:IN_PROGRESS|COMPLETE_CLEANUP_IN_PROGRESS|COMPLETE|FAILED))\b")
        .unwrap()
});

static STACK_FAILURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:❌\s*([A-Za-z][\w-]*)\s+failed\b|\bstack\s+(?:named\s+)?([A-Za-z][\w-]*)\s+failed\b)")
        .unwrap()
});

static RESOURCE_FAILURE_STATUS_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"\b(?P<status>(?:CREATE|UPDATE|DELETE)_FAILED)\s*\|?\s*(?P<rtype>(?:AWS|Custom)::[\w:-]+)\s*\|?\s*(?P<logical>[^\s|()]+)(?:\s*\((?P<physical>[^)]*)\))?\s*(?P<reason>.*)$",
    )
    .unwrap()
});

static RESOURCE_FAILURE_ID_FIRST: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?P<logical>[A-Za-z][\w-]*)\s+(?:\((?P<physical>[^)]*)\)\s+)?(?P<rtype>(?:AWS|Custom)::[\w:-]+)\s+(?P<status>(?:CREATE|UPDATE|DELETE)_FAILED)\s*(?P<reason>.*)$",
    )
    .unwrap()
});

static GENERIC_ERROR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*(?:❌\s*(?:error\s*:\s*)?|\[?(?:error|fatal)\]?\s*:\s*)(?P<message>.+)$").unwrap()
});

static KNOWN_EXCEPTION: LazyLock<Regex> = LazyLock::new(|| {
    let names = KNOWN_EXCEPTIONS.join("|");
    Regex::new(&format!(r"\b(?:{names})\b")).unwrap()
});

/// Signals recovered from console output.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ConsoleParse {
    pub signals: Vec<FailureSignal>,
    /// Last stack name the output mentioned
    pub last_stack: Option<String>,
}

/// Fold state threaded through the lines.
#[derive(Debug, Default)]
struct ParseContext {
    current_stack: Option<String>,
    pending_error: Option<String>,
    signals: Vec<FailureSignal>,
}

impl ParseContext {
    fn step(mut self, line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return self;
        }
        self.track_stack(line);
        let line = strip_progress_columns(line);

        let emitted = self.match_rollback(line)
            || self.match_stack_failure(line)
            || self.match_resource_failure(line)
            || self.match_generic_error(line);
        if !emitted {
            self.match_known_exception(line);
        }
        self
    }

    fn track_stack(&mut self, line: &str) {
        let seen = PROGRESS_PREFIX
            .captures(line)
            .or_else(|| STACK_ACTIVITY.captures(line))
            .and_then(|caps| caps.get(1))
            .map(|m| m.as_str())
            .filter(|name| !is_error_marker(name));
        if let Some(name) = seen {
            self.current_stack = Some(name.to_string());
        }
    }

    fn stack_signal(&self, reason: &str) -> FailureSignal {
        match &self.current_stack {
            Some(stack) => FailureSignal::for_stack(stack, reason),
            None => FailureSignal::new(STACK_RESOURCE_TYPE, UNATTRIBUTED_LOGICAL_ID, reason),
        }
    }

    fn match_rollback(&mut self, line: &str) -> bool {
        let Some(status) = ROLLBACK_STATUS.captures(line).and_then(|c| c.get(1)) else {
            return false;
        };
        if let Some(stack) = stack_failure_name(line) {
            self.current_stack = Some(stack);
        }
        let signal = self.stack_signal(line).with_status(status.as_str());
        self.signals.push(signal);
        true
    }

    fn match_stack_failure(&mut self, line: &str) -> bool {
        let Some(stack) = stack_failure_name(line) else {
            return false;
        };
        self.current_stack = Some(stack);
        let reason = match self.pending_error.take() {
            Some(pending) if !line.contains(&pending) => format!("{line} {pending}"),
            _ => line.to_string(),
        };
        let signal = self.stack_signal(&reason);
        self.signals.push(signal);
        true
    }

    fn match_resource_failure(&mut self, line: &str) -> bool {
        let Some(caps) = RESOURCE_FAILURE_STATUS_FIRST
            .captures(line)
            .or_else(|| RESOURCE_FAILURE_ID_FIRST.captures(line))
        else {
            return false;
        };

        let status = &caps["status"];
        let reason = caps["reason"].trim().trim_start_matches('|').trim();
        let pending = self.pending_error.take();
        let reason = if !reason.is_empty() {
            reason.to_string()
        } else if let Some(pending) = pending {
            pending
        } else {
            status.to_string()
        };

        let mut signal = FailureSignal::new(&caps["rtype"], &caps["logical"], reason).with_status(status);
        if let Some(physical) = caps.name("physical").map(|m| m.as_str().trim()).filter(|p| !p.is_empty()) {
            signal = signal.with_physical_id(physical);
        }
        if let Some(stack) = &self.current_stack {
            signal = signal.with_stack(stack);
        }
        self.signals.push(signal);
        true
    }

    fn match_generic_error(&mut self, line: &str) -> bool {
        let Some(message) = GENERIC_ERROR.captures(line).map(|c| c["message"].trim().to_string()) else {
            return false;
        };
        if message.is_empty() {
            return false;
        }
        if message.contains("AWS::") {
            // a following resource line will carry it
            self.pending_error = Some(message);
            return true;
        }
        let signal = self.stack_signal(&message);
        self.signals.push(signal);
        true
    }

    fn match_known_exception(&mut self, line: &str) {
        if KNOWN_EXCEPTION.is_match(line) {
            let signal = self.stack_signal(line);
            self.signals.push(signal);
        }
    }
}

fn strip_progress_columns(line: &str) -> &str {
    PROGRESS_COLUMNS
        .find(line)
        .map_or(line, |m| &line[m.end()..])
}

fn stack_failure_name(line: &str) -> Option<String> {
    let caps = STACK_FAILURE.captures(line)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .map(|m| m.as_str())
        .filter(|name| !is_error_marker(name))
        .map(str::to_string)
}

fn is_error_marker(word: &str) -> bool {
    ["error", "fatal", "deployment", "the"]
        .iter()
        .any(|w| word.eq_ignore_ascii_case(w))
}

/// Extract failure signals from console output.
pub fn parse_console_output(text: &str) -> ConsoleParse {
    let ctx = text.lines().fold(ParseContext::default(), ParseContext::step);
    tracing::debug!(
        signals = ctx.signals.len(),
        stack_name = ctx.current_stack.as_deref().unwrap_or(""),
        "Parsed console output"
    );
    ConsoleParse {
        signals: ctx.signals,
        last_stack: ctx.current_stack,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::classify;

    #[test]
    fn test_empty_and_noise() {
        assert!(parse_console_output("").signals.is_empty());
        let parsed = parse_console_output("Bundling asset...\n✅  WebStack\n\nDone in 3s");
        assert!(parsed.signals.is_empty());
    }

    #[test]
    fn test_resource_failure_line() {
        let text = "WebStack: deploying... [1/1]\n\
                    WebStack | 2/5 | 10:01:02 AM | CREATE_FAILED        | AWS::Lambda::Function | Handler (HandlerABC123) Resource handler returned message: \"Rate exceeded\"";
        let parsed = parse_console_output(text);
        assert_eq!(parsed.signals.len(), 1);
        let s = &parsed.signals[0];
        assert_eq!(s.resource_type, "AWS::Lambda::Function");
        assert_eq!(s.logical_id, "Handler");
        assert_eq!(s.physical_id.as_deref(), Some("HandlerABC123"));
        assert_eq!(s.resource_status.as_deref(), Some("CREATE_FAILED"));
        assert_eq!(s.stack_name.as_deref(), Some("WebStack"));
        assert!(s.status_reason.contains("Rate exceeded"));
        assert_eq!(parsed.last_stack.as_deref(), Some("WebStack"));
    }

    #[test]
    fn test_id_first_resource_line() {
        let parsed = parse_console_output("SiteCert AWS::CertificateManager::Certificate CREATE_FAILED DNS validation is pending");
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(parsed.signals[0].logical_id, "SiteCert");
        assert_eq!(parsed.signals[0].status_reason, "DNS validation is pending");
    }

    #[test]
    fn test_resource_line_consumes_pending_error() {
        let text = "Error: creating AWS::S3::Bucket failed: my-bucket already exists\n\
                    Assets AWS::S3::Bucket CREATE_FAILED";
        let parsed = parse_console_output(text);
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(
            parsed.signals[0].status_reason,
            "creating AWS::S3::Bucket failed: my-bucket already exists"
        );
    }

    #[test]
    fn test_generic_error_without_resource_is_emitted() {
        let parsed = parse_console_output("Error: This stack uses assets, so the toolkit stack must be deployed");
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(parsed.signals[0].resource_type, STACK_RESOURCE_TYPE);
        assert_eq!(parsed.signals[0].logical_id, UNATTRIBUTED_LOGICAL_ID);
        assert!(parsed.signals[0].stack_name.is_none());
    }

    #[test]
    fn test_rollback_before_in_progress() {
        let parsed = parse_console_output("WebStack | 4/5 | 10:02:00 AM | UPDATE_ROLLBACK_IN_PROGRESS | AWS::CloudFormation::Stack | WebStack");
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(
            parsed.signals[0].resource_status.as_deref(),
            Some("UPDATE_ROLLBACK_IN_PROGRESS")
        );
        assert_eq!(parsed.signals[0].stack_name.as_deref(), Some("WebStack"));
    }

    #[test]
    fn test_progress_columns_do_not_reach_the_reason() {
        let fingerprint = |text: &str| classify(&parse_console_output(text).signals).fingerprint_id;

        let first = parse_console_output(
            "WebStack | 4/5 | 10:02:00 AM | UPDATE_ROLLBACK_IN_PROGRESS | AWS::CloudFormation::Stack | WebStack",
        );
        assert!(first.signals[0].status_reason.starts_with("UPDATE_ROLLBACK_IN_PROGRESS"));
        assert_eq!(
            fingerprint("WebStack | 4/5 | 10:02:00 AM | UPDATE_ROLLBACK_IN_PROGRESS | AWS::CloudFormation::Stack | WebStack"),
            fingerprint("WebStack | 3/5 | 11:47:13 PM | UPDATE_ROLLBACK_IN_PROGRESS | AWS::CloudFormation::Stack | WebStack")
        );

        let parsed = parse_console_output("WebStack | 1/9 | 9:00:01 AM | ThrottlingException: slow down");
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(parsed.signals[0].status_reason, "ThrottlingException: slow down");
        assert_eq!(
            fingerprint("WebStack | 1/9 | 9:00:01 AM | ThrottlingException: slow down"),
            fingerprint("WebStack | 7/9 | 4:13:59 PM | ThrottlingException: slow down")
        );
    }

    #[test]
    fn test_emitted_error_is_not_carried_forward() {
        let parsed = parse_console_output("Error: Rate exceeded\nHandler AWS::Lambda::Function CREATE_FAILED");
        assert_eq!(parsed.signals.len(), 2);
        assert_eq!(parsed.signals[0].status_reason, "Rate exceeded");
        assert_eq!(parsed.signals[1].logical_id, "Handler");
        assert_eq!(parsed.signals[1].status_reason, "CREATE_FAILED");
    }

    #[test]
    fn test_stack_failure_line() {
        let parsed = parse_console_output("❌  ApiStack failed: Error: something broke");
        assert_eq!(parsed.signals.len(), 1);
        assert_eq!(parsed.signals[0].stack_name.as_deref(), Some("ApiStack"));
        assert_eq!(parsed.last_stack.as_deref(), Some("ApiStack"));
    }

    #[test]
    fn test_known_exception_anywhere() {
        let parsed = parse_console_output("  at handler (index.js:10) ThrottlingException: slow down");
        assert_eq!(parsed.signals.len(), 1);
        assert!(parsed.signals[0].status_reason.contains("ThrottlingException"));
    }

    #[test]
    fn test_error_prefix_not_taken_as_stack() {
        let parsed = parse_console_output("Error: deploying failed");
        assert_eq!(parsed.last_stack, None);
    }
}
