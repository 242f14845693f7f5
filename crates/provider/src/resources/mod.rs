//! Resource implementations.

pub mod elasticsearch_ml_anomaly_detection_job;
pub mod elasticsearch_script;
pub mod security_detection_rule;

use elasticstack_clients::CompositeId;
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::Value;

/// Parses the composite `id` attribute of a state.
pub(crate) fn parse_id(id: &Value<String>, diags: &mut Diagnostics) -> Option<CompositeId> {
    let Some(raw) = id.known() else {
        diags.add_attribute_error(
            AttributePath::root("id"),
            "Missing resource ID",
            "the resource ID is not known; the state may be corrupt",
        );
        return None;
    };
    CompositeId::from_str_diags(raw, diags)
}

/// Appends a client error as an error diagnostic.
pub(crate) fn client_error(diags: &mut Diagnostics, summary: &str, err: &elasticstack_clients::Error) {
    diags.append(err.to_diagnostics(summary));
}

/// Reads a required string attribute.
pub(crate) fn required_string(
    value: &Value<String>,
    name: &str,
    diags: &mut Diagnostics,
) -> Option<String> {
    let known = value.known_cloned();
    if known.is_none() {
        diags.add_attribute_error(
            AttributePath::root(name),
            "Missing required attribute",
            format!("{name} must be set to a known value"),
        );
    }
    known
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        let mut diags = Diagnostics::new();
        let id = parse_id(&Value::from("c1/s1"), &mut diags).unwrap();
        assert_eq!(id.resource_id, "s1");

        assert!(parse_id(&Value::Unknown, &mut diags).is_none());
        assert!(parse_id(&Value::from("bad"), &mut diags).is_none());
        assert_eq!(diags.error_count(), 2);
    }
}
