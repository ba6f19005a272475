#![forbid(unsafe_code)]

//! Response body formatting.

use serde_json::Value;

/// Pretty-print `body` when it is JSON.
///
/// Objects keep their key order and are indented by two spaces. Anything
/// that does not parse, and the literal `null`, is returned unchanged.
#[must_use]
pub fn format_body(body: &str) -> String {
    match serde_json::from_str::<Value>(body) {
        Ok(Value::Null) | Err(_) => body.to_owned(),
        Ok(value) => serde_json::to_string_pretty(&value).unwrap_or_else(|_| body.to_owned()),
    }
}

/// Format each item with [`format_body`] and join them with newlines.
///
/// Used for filter output, where the host returns one document per match.
#[must_use]
pub fn format_bodies<I>(items: I) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    items
        .into_iter()
        .map(|item| format_body(item.as_ref()))
        .collect::<Vec<_>>()
        .join("\n")
}
