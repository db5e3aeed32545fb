use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use crate::models::Status;

/// Placeholder reported for executions that did not fail.
pub const NO_ERRORS: &str = "No Errors";

static ANSI_ESCAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-9;]*[a-zA-Z]").expect("valid ANSI pattern"));

/// `at fn (file:line:col)`
static FRAME_LOCATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"at (?:.*?)\((.*?):(\d+):(\d+)\)").expect("valid frame pattern")
});

/// `at file:line`
static SIMPLE_LOCATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"at (.*?):(\d+)").expect("valid location pattern"));

/// Strip ANSI color/escape sequences from a string.
pub fn strip_ansi(s: &str) -> String {
    ANSI_ESCAPE.replace_all(s, "").into_owned()
}

/// Convert any newline convention to CRLF.
pub fn to_crlf(s: &str) -> String {
    s.replace("\r\n", "\n").replace('\n', "\r\n")
}

/// Produce a readable message from a raised failure.
///
/// The failure may arrive double-encoded (a JSON string holding the object, or
/// a `message` that is itself an encoded error); each layer is unwrapped once.
/// Anything unexpected degrades to the raw failure text.
pub fn normalize(error: &Value) -> String {
    match extract_message(error) {
        Some(message) => to_crlf(&strip_ansi(&message)),
        None => raw_text(error),
    }
}

/// Error text for a finished execution: `None` unless it failed with a failure attached.
pub fn describe(status: Status, error: Option<&Value>) -> Option<String> {
    match (status, error) {
        (Status::Failed, Some(error)) if !error.is_null() => Some(normalize(error)),
        _ => None,
    }
}

/// Error text with the "no failure" sentinel filled in.
pub fn summary(error: Option<&str>) -> &str {
    error.unwrap_or(NO_ERRORS)
}

/// Source location `(file, line)` mentioned in an error message, if any.
pub fn location(message: &str) -> Option<(String, u32)> {
    let caps = FRAME_LOCATION
        .captures(message)
        .or_else(|| SIMPLE_LOCATION.captures(message))?;
    let file = caps.get(1)?.as_str().to_string();
    let line = caps.get(2)?.as_str().parse().ok()?;
    Some((file, line))
}

fn extract_message(error: &Value) -> Option<String> {
    let decoded;
    let error = match error {
        Value::String(s) => {
            decoded = serde_json::from_str::<Value>(s).ok()?;
            &decoded
        }
        other => other,
    };

    let message = error.get("message")?.as_str()?;
    match serde_json::from_str::<Value>(message) {
        Ok(inner) => match inner.get("message").and_then(Value::as_str) {
            Some(inner_message) => Some(inner_message.to_string()),
            None => Some(message.to_string()),
        },
        Err(_) => Some(message.to_string()),
    }
}

fn raw_text(error: &Value) -> String {
    match error {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
