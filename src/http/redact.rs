//! Credential redaction for anything that ends up in a log line

use regex::Regex;
use std::sync::LazyLock;

/// Query parameter names whose values are never logged
pub const SENSITIVE_PARAMS: &[&str] = &[
    "access_token",
    "api_key",
    "client_secret",
    "key",
    "oauth_signature",
    "oauth_token",
    "password",
    "token",
];

/// Matches `name=value` pairs for sensitive names inside URLs and free text
static SENSITIVE_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    let names = SENSITIVE_PARAMS.join("|");
    Regex::new(&format!(r#"(?i)(\b(?:{names})=)[^&\s"']+"#)).unwrap()
});

/// Matches `"name": "value"` members for sensitive names inside JSON bodies
static SENSITIVE_FIELD: LazyLock<Regex> = LazyLock::new(|| {
    let names = SENSITIVE_PARAMS.join("|");
    Regex::new(&format!(r#"(?i)("(?:{names})"\s*:\s*")(?:[^"\\]|\\.)*"#)).unwrap()
});

/// Replacement for redacted values
pub const REDACTED: &str = "REDACTED";

/// Mask credential values in a URL, a JSON body or any other text
pub fn redact_text(text: &str) -> String {
    let replacement = format!("${{1}}{REDACTED}");
    let text = SENSITIVE_PAIR.replace_all(text, replacement.as_str());
    SENSITIVE_FIELD
        .replace_all(&text, replacement.as_str())
        .into_owned()
}
