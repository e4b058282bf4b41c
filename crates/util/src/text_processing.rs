//! # Text Processing Utilities
//!
//! Label derivation, file-stem sanitizing, column padding, and redaction of
//! secret-looking values before they reach the logs.

use heck::ToTitleCase;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

const REDACTED: &str = "[REDACTED]";

/// Turns an identifier such as `window_size` into a label (`Window Size`).
pub fn title_label(identifier: &str) -> String {
    identifier.to_title_case()
}

/// Makes a string safe to use as a file stem.
///
/// Characters outside `[A-Za-z0-9_-]` become `_`, surrounding underscores are
/// trimmed, and an empty outcome yields `fallback`.
pub fn sanitize_file_stem(raw: &str, fallback: &str) -> String {
    let safe: String = raw
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '-' || ch == '_' { ch } else { '_' })
        .collect();
    let trimmed = safe.trim_matches('_');
    if trimmed.is_empty() { fallback.to_string() } else { trimmed.to_string() }
}

/// Display width of `text` in terminal columns.
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Pads `text` with spaces up to `width` columns.
pub fn pad_to_width(text: &str, width: usize) -> String {
    let current = display_width(text);
    if current >= width {
        return text.to_string();
    }
    format!("{}{}", text, " ".repeat(width - current))
}

/// Truncates `text` to at most `width` columns, marking the cut with `…`.
pub fn truncate_to_width(text: &str, width: usize) -> String {
    if display_width(text) <= width {
        return text.to_string();
    }
    if width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > width - 1 {
            break;
        }
        used += ch_width;
        out.push(ch);
    }
    out.push('…');
    out
}

fn sensitive_key_pattern() -> &'static Regex {
    static PATTERN: Lazy<Regex> =
        Lazy::new(|| Regex::new(r"(?i)(password|passwd|secret|token|api[_-]?key|credential|private[_-]?key)").unwrap());
    &PATTERN
}

fn redact_patterns() -> &'static Vec<Regex> {
    static PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
        vec![
            Regex::new(r"(?i)(authorization:\s+)([^\s]+(?:\s+[^\s]+)*)").unwrap(),
            Regex::new(r"(?i)((?:^|\b)Bearer\s+)([A-Za-z0-9\-._~+/]+=*)").unwrap(),
            Regex::new(r"(?i)([A-Z0-9_]*?(?:KEY|TOKEN|SECRET|PASSWORD)=)([^\s]+)").unwrap(),
            Regex::new(r"(?i)((?:postgres|postgresql|mysql|redis|amqp)://[^:\s]+:)([^@\s]+)(@)").unwrap(),
        ]
    });
    &PATTERNS
}

/// Redacts values that look like secrets in a string.
///
/// ```rust
/// use renderflow_util::redact_sensitive;
///
/// assert_eq!(redact_sensitive("API_KEY=abc123"), "API_KEY=[REDACTED]");
/// ```
pub fn redact_sensitive(input: &str) -> String {
    let mut redacted = input.to_string();
    for pattern in redact_patterns().iter() {
        redacted = pattern
            .replace_all(&redacted, |captures: &regex::Captures| {
                let prefix = captures.get(1).map(|m| m.as_str()).unwrap_or("");
                let suffix = captures.get(3).map(|m| m.as_str()).unwrap_or("");
                format!("{prefix}{REDACTED}{suffix}")
            })
            .to_string();
    }
    redacted
}

/// Whether a parameter key names something that should never be logged.
pub fn is_sensitive_key(key: &str) -> bool {
    sensitive_key_pattern().is_match(key)
}

/// Recursively redacts a JSON value: sensitive keys lose their value and
/// every string goes through [`redact_sensitive`].
pub fn redact_json(value: &Value) -> Value {
    match value {
        Value::String(text) => Value::String(redact_sensitive(text)),
        Value::Array(items) => Value::Array(items.iter().map(redact_json).collect()),
        Value::Object(map) => {
            let mut out = serde_json::Map::new();
            for (key, item) in map {
                let redacted = if is_sensitive_key(key) && !item.is_null() {
                    Value::String(REDACTED.to_string())
                } else {
                    redact_json(item)
                };
                out.insert(key.clone(), redacted);
            }
            Value::Object(out)
        }
        other => other.clone(),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn title_label_from_snake_case() {
        assert_eq!(title_label("window_size"), "Window Size");
        assert_eq!(title_label("crsd_file"), "Crsd File");
    }

    #[test]
    fn sanitize_replaces_and_trims() {
        assert_eq!(sanitize_file_stem("Range / Doppler", "figure_1"), "Range___Doppler");
        assert_eq!(sanitize_file_stem("__!!__", "figure_3"), "figure_3");
        assert_eq!(sanitize_file_stem("fig-1_a", "x"), "fig-1_a");
    }

    #[test]
    fn truncation_respects_display_width() {
        assert_eq!(truncate_to_width("abcdef", 4), "abc…");
        assert_eq!(truncate_to_width("abc", 4), "abc");
        assert_eq!(pad_to_width("ab", 4), "ab  ");
    }

    #[test]
    fn redacts_sensitive_keys_and_inline_secrets() {
        let redacted = redact_json(&json!({
            "api_key": "abc",
            "note": "Authorization: Bearer xyz",
            "count": 3
        }));
        assert_eq!(redacted["api_key"], json!("[REDACTED]"));
        assert!(!redacted["note"].as_str().unwrap().contains("xyz"));
        assert_eq!(redacted["count"], json!(3));
    }
}
