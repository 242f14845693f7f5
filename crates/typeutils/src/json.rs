//! Normalized JSON string attributes.
//!
//! Some attributes (`params`, `filters`, `analysis_config`, ...) hold JSON
//! documents as strings. Two strings are the same value when they decode to
//! the same document, regardless of whitespace or key order.

use elasticstack_diagnostics::{AttributePath, Diagnostics};
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::value::Value;

/// Decodes a JSON string attribute into `T`.
///
/// Null and unknown yield `None` silently; malformed JSON appends an
/// attribute error.
pub fn json_string_as<T: DeserializeOwned>(
    value: &Value<String>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<T> {
    let raw = value.known()?;
    match serde_json::from_str(raw) {
        Ok(decoded) => Some(decoded),
        Err(err) => {
            diags.add_attribute_error(path.clone(), "Invalid JSON", err.to_string());
            None
        }
    }
}

/// Encodes `value` as a normalized (compact, key-sorted) JSON string.
pub fn json_string_from<T: Serialize>(
    value: &T,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Value<String> {
    let encoded = serde_json::to_value(value).and_then(|v| serde_json::to_string(&v));
    match encoded {
        Ok(s) => Value::Known(s),
        Err(err) => {
            diags.add_attribute_error(path.clone(), "Unable to encode JSON", err.to_string());
            Value::Null
        }
    }
}

/// True if both strings decode to the same JSON document.
#[must_use]
pub fn json_semantically_equal(a: &str, b: &str) -> bool {
    match (
        serde_json::from_str::<serde_json::Value>(a),
        serde_json::from_str::<serde_json::Value>(b),
    ) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}

/// Picks the state value for a JSON attribute after a read.
///
/// Keeps the prior string when it is semantically equal to what the server
/// returned, so formatting differences never show up as a diff.
pub fn preserve_json_formatting(prior: &Value<String>, fresh: Value<String>) -> Value<String> {
    match (prior.known_str(), fresh.known_str()) {
        (Some(old), Some(new)) if json_semantically_equal(old, new) => prior.clone(),
        _ => fresh,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invalid_json_is_attribute_error() {
        let mut diags = Diagnostics::new();
        let out: Option<serde_json::Value> = json_string_as(
            &Value::from("{not json"),
            &AttributePath::root("params"),
            &mut diags,
        );

        assert!(out.is_none());
        let path = diags.errors().next().and_then(|d| d.path.clone());
        assert_eq!(path, Some(AttributePath::root("params")));
    }

    #[test]
    fn test_unknown_is_silent() {
        let mut diags = Diagnostics::new();
        let out: Option<serde_json::Value> =
            json_string_as(&Value::Unknown, &AttributePath::root("filters"), &mut diags);
        assert!(out.is_none());
        assert!(diags.is_empty());
    }

    #[test]
    fn test_normalized_encoding_sorts_keys() {
        let mut diags = Diagnostics::new();
        let encoded = json_string_from(
            &json!({"b": 1, "a": {"y": true, "x": null}}),
            &AttributePath::root("params"),
            &mut diags,
        );
        assert_eq!(encoded.known_str(), Some(r#"{"a":{"x":null,"y":true},"b":1}"#));
    }

    #[test]
    fn test_preserve_formatting() {
        let prior = Value::from("{ \"a\": 1 }");
        let kept = preserve_json_formatting(&prior, Value::from(r#"{"a":1}"#));
        assert_eq!(kept, prior);

        let changed = preserve_json_formatting(&prior, Value::from(r#"{"a":2}"#));
        assert_eq!(changed.known_str(), Some(r#"{"a":2}"#));
    }
}
