//! Scrubbing of secrets and personal data from user-facing messages

use once_cell::sync::Lazy;
use regex::Regex;

/// Longest message kept before truncation
pub const MAX_MESSAGE_CHARS: usize = 2000;

static PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    vec![
        (Regex::new(r"sk-[A-Za-z0-9_-]{20,}").unwrap(), "sk-REDACTED"),
        (
            Regex::new(r"(?i)api[_-]?key\s*[:=]?\s*[A-Za-z0-9_-]{12,}").unwrap(),
            "api_key=REDACTED",
        ),
        (
            Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").unwrap(),
            "email@redacted",
        ),
        // Only `+`-prefixed numbers; bare digit runs stay readable
        (
            Regex::new(r"\+\d{1,3}(?:[ -]?\d){6,14}\b").unwrap(),
            "PHONE_REDACTED",
        ),
    ]
});

/// Redact API keys, e-mail addresses and `+`-prefixed phone numbers; cap the length
pub fn scrub_message(message: &str) -> String {
    let mut s: String = if message.chars().count() > MAX_MESSAGE_CHARS {
        message.chars().take(MAX_MESSAGE_CHARS).collect()
    } else {
        message.to_string()
    };
    for (re, rep) in PATTERNS.iter() {
        s = re.replace_all(&s, *rep).into_owned();
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_redacts_api_key() {
        let scrubbed =
            scrub_message("Incorrect API key provided: sk-abcdefghijklmnopqrstuvwxyz123456.");
        assert!(!scrubbed.contains("abcdefghijklmnop"));
        assert!(scrubbed.contains("sk-REDACTED"));
    }

    #[test]
    fn test_redacts_email() {
        let scrubbed = scrub_message("contact buyer@example.com for access");
        assert_eq!(scrubbed, "contact email@redacted for access");
    }

    #[test]
    fn test_redacts_international_phone_numbers() {
        assert_eq!(
            scrub_message("call +49 171 2345678 or +1-555-123-4567"),
            "call PHONE_REDACTED or PHONE_REDACTED"
        );
    }

    #[test]
    fn test_keeps_order_numbers_and_offsets() {
        let reason = "order 12345678901 at byte offset 1234567890";
        assert_eq!(scrub_message(reason), reason);
        let reason = "invalid xref entry 0000012345 65535 n";
        assert_eq!(scrub_message(reason), reason);
    }

    #[test]
    fn test_keeps_plain_reason() {
        assert_eq!(scrub_message("connection refused"), "connection refused");
    }

    #[test]
    fn test_truncates_long_messages() {
        let long = "x".repeat(MAX_MESSAGE_CHARS + 50);
        assert_eq!(scrub_message(&long).chars().count(), MAX_MESSAGE_CHARS);
    }
}
