//! Property-based tests for known/unknown gating.
//!
//! Contracts:
//! - Null and unknown inputs never produce a value
//! - Unknown list elements never make it into a decoded vector
//! - Decoding a known list of strings is lossless

use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{AttrValue, Tristate, Value, json_string_as, list_type_as};
use proptest::prelude::*;

fn tristate_string() -> impl Strategy<Value = Value<String>> {
    prop_oneof![
        Just(Value::Null),
        Just(Value::Unknown),
        "[a-z]{0,12}".prop_map(Value::Known),
    ]
}

fn element_strategy() -> impl Strategy<Value = Option<String>> {
    prop::option::of("[a-z0-9._-]{1,16}")
}

proptest! {
    /// Contract: only known values are ever handed to a payload builder.
    #[test]
    fn scalar_gating(value in tristate_string()) {
        prop_assert_eq!(value.known().is_some(), value.is_known());

        let mut diags = Diagnostics::new();
        let decoded: Option<serde_json::Value> =
            json_string_as(&value, &AttributePath::root("params"), &mut diags);
        if !value.is_known() {
            prop_assert!(decoded.is_none());
            prop_assert!(diags.is_empty());
        }
    }

    /// Contract: unknown elements are dropped, known ones kept in order.
    #[test]
    fn list_gating(elements in prop::collection::vec(element_strategy(), 0..10)) {
        let list = AttrValue::list(elements.iter().map(|e| match e {
            Some(s) => AttrValue::String(s.clone()),
            None => AttrValue::Unknown,
        }));
        let expected: Vec<String> = elements.iter().flatten().cloned().collect();

        let mut diags = Diagnostics::new();
        let decoded = list_type_as::<String>(&list, &AttributePath::root("index"), &mut diags);

        prop_assert_eq!(decoded, Some(expected));
        let unknowns = elements.iter().filter(|e| e.is_none()).count();
        prop_assert_eq!(diags.error_count(), unknowns);
    }

    /// Contract: a null or unknown list never decodes to a vector.
    #[test]
    fn whole_list_gating(unknown in any::<bool>()) {
        let list = if unknown { AttrValue::Unknown } else { AttrValue::Null };
        let mut diags = Diagnostics::new();
        prop_assert_eq!(list_type_as::<String>(&list, &AttributePath::root("tags"), &mut diags), None);
        prop_assert!(diags.is_empty());
    }
}
