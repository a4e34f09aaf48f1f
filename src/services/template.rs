//! Template normalization and fingerprinting.
//!
//! Error text is full of volatile detail: timestamps, request ids, ARNs,
//! sizes. Normalization replaces each class of volatile substring with a fixed
//! placeholder so that repeated occurrences of the same failure hash to the
//! same fingerprint.
//!
//! Substitutions run globally, one class at a time, in this order:
//!
//! 1. ISO-8601 and 10–13 digit epoch timestamps → `<TIMESTAMP>`
//! 2. UUIDs → `<UUID>`
//! 3. ARNs → `<ARN>`
//! 4. uppercase alphanumeric tokens of 20+ characters → `<ID>`
//! 5. `<word>Stack` identifiers → `<STACK>`
//! 6. `<number> <unit>` time and byte quantities → `<VALUE>`
//! 7. whitespace runs collapsed to one space, ends trimmed
//!
//! The order matters. Account ids inside ARNs are 12 digits and are consumed
//! by step 1, so the ARN pattern accepts any account field. Epochs and
//! quantities joined to a hyphen are left alone: those are UUID groups and
//! availability-zone suffixes such as `us-east-1b`.

use regex::Regex;
use sha2::{Digest, Sha256};
use std::sync::LazyLock;

use crate::domain::models::ErrorClass;

/// Length of every fingerprint, in hex characters.
///
/// Storage partition keys embed fingerprints byte for byte; changing this
/// orphans all stored history.
pub const FINGERPRINT_HEX_LEN: usize = 16;

/// Separator between the hashed fields.
pub const FINGERPRINT_DELIMITER: &str = "|";

static ISO_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d{4}-\d{2}-\d{2}[T ]\d{2}:\d{2}:\d{2}(?:\.\d+)?(?:Z|[+-]\d{2}:?\d{2})?")
        .unwrap()
});

static EPOCH_TIMESTAMP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{10,13}\b").unwrap());

static UUID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b[0-9a-f]{8}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{4}-[0-9a-f]{12}\b").unwrap()
});

static ARN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)\barn:[\w.-]+:[\w.-]*:[\w.-]*:[^:\s]*:[^\s"',;()\[\]]+"#).unwrap()
});

static LONG_ID: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b[A-Z0-9]{20,}\b").unwrap());

static STACK_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Za-z0-9][A-Za-z0-9_-]*Stack\b").unwrap());

static QUANTITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)\b\d+(?:\.\d+)?\s*(?:milliseconds?|ms|seconds?|secs?|s|minutes?|mins?|m|hours?|hrs?|h|days?|d|bytes?|b|kib|mib|gib|tib|kb|mb|gb|tb)\b",
    )
    .unwrap()
});

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Replace volatile substrings of `text` with fixed placeholders.
pub fn normalize_template(text: &str) -> String {
    let text = ISO_TIMESTAMP.replace_all(text, "<TIMESTAMP>");
    let text = replace_unhyphenated(&EPOCH_TIMESTAMP, &text, "<TIMESTAMP>");
    let text = UUID.replace_all(&text, "<UUID>");
    let text = ARN.replace_all(&text, "<ARN>");
    let text = LONG_ID.replace_all(&text, "<ID>");
    let text = STACK_NAME.replace_all(&text, "<STACK>");
    let text = replace_unhyphenated(&QUANTITY, &text, "<VALUE>");
    WHITESPACE.replace_all(&text, " ").trim().to_string()
}

fn replace_unhyphenated(pattern: &Regex, text: &str, placeholder: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last = 0;
    for m in pattern.find_iter(text) {
        if text[..m.start()].ends_with('-') || text[m.end()..].starts_with('-') {
            continue;
        }
        out.push_str(&text[last..m.start()]);
        out.push_str(placeholder);
        last = m.end();
    }
    out.push_str(&text[last..]);
    out
}

/// Digest `(error_class, service, template)` into a fixed-length fingerprint.
///
/// SHA-256 over the three fields joined by [`FINGERPRINT_DELIMITER`],
/// lowercase hex, truncated to [`FINGERPRINT_HEX_LEN`] characters.
pub fn fingerprint(error_class: ErrorClass, service: &str, template: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(error_class.as_str().as_bytes());
    hasher.update(FINGERPRINT_DELIMITER.as_bytes());
    hasher.update(service.as_bytes());
    hasher.update(FINGERPRINT_DELIMITER.as_bytes());
    hasher.update(template.as_bytes());
    let digest = hasher.finalize();
    hex::encode(&digest[..FINGERPRINT_HEX_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timestamps() {
        assert_eq!(
            normalize_template("failed at 2024-03-01T12:34:56.789Z and 2024-03-01 12:00:00+02:00"),
            "failed at <TIMESTAMP> and <TIMESTAMP>"
        );
        assert_eq!(normalize_template("epoch 1709296496 / 1709296496123"), "epoch <TIMESTAMP> / <TIMESTAMP>");
        // too short for an epoch
        assert_eq!(normalize_template("n 123456789"), "n 123456789");
    }

    #[test]
    fn test_uuid() {
        assert_eq!(
            normalize_template("Request ID: 3F2504E0-4F89-11D3-9A0C-0305E82C3301."),
            "Request ID: <UUID>."
        );
        // all-digit final group
        assert_eq!(
            normalize_template("id 00000000-0000-0000-0000-000000000000"),
            "id <UUID>"
        );
    }

    #[test]
    fn test_arn_with_account_id() {
        assert_eq!(
            normalize_template(
                "User: arn:aws:sts::123456789012:assumed-role/deploy/session is not authorized"
            ),
            "User: <ARN> is not authorized"
        );
        assert_eq!(normalize_template("bucket arn:aws:s3:::my-bucket, gone"), "bucket <ARN>, gone");
    }

    #[test]
    fn test_long_ids() {
        assert_eq!(
            normalize_template("hosted zone Z0123456789ABCDEFGHIJ not ready"),
            "hosted zone <ID> not ready"
        );
        assert_eq!(normalize_template("code ABC123"), "code ABC123");
    }

    #[test]
    fn test_stack_names() {
        assert_eq!(
            normalize_template("MyAppStack failed, see prod-WebStack"),
            "<STACK> failed, see <STACK>"
        );
        assert_eq!(
            normalize_template("AWS::CloudFormation::Stack Stack"),
            "AWS::CloudFormation::Stack Stack"
        );
    }

    #[test]
    fn test_quantities() {
        assert_eq!(
            normalize_template("timed out after 30 minutes using 512 MB and 1.5s"),
            "timed out after <VALUE> using <VALUE> and <VALUE>"
        );
        assert_eq!(normalize_template("2 buckets"), "2 buckets");
        assert_eq!(
            normalize_template("subnet in us-east-1b and us-east-1a after 5 s"),
            "subnet in us-east-1b and us-east-1a after <VALUE>"
        );
    }

    #[test]
    fn test_whitespace() {
        assert_eq!(normalize_template("  a \n\t b  "), "a b");
    }

    #[test]
    fn test_fingerprint_shape() {
        let fp = fingerprint(ErrorClass::Unknown, "Unknown", "");
        assert_eq!(fp.len(), FINGERPRINT_HEX_LEN);
        assert!(fp.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(fp, fingerprint(ErrorClass::Unknown, "Unknown", ""));
    }

    #[test]
    fn test_fingerprint_depends_on_every_field() {
        let base = fingerprint(ErrorClass::ApiThrottling, "AWS", "rate exceeded");
        assert_ne!(base, fingerprint(ErrorClass::ServiceQuotaExceeded, "AWS", "rate exceeded"));
        assert_ne!(base, fingerprint(ErrorClass::ApiThrottling, "Lambda", "rate exceeded"));
        assert_ne!(base, fingerprint(ErrorClass::ApiThrottling, "AWS", "rate exceeded!"));
    }
}
