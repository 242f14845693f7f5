//! Plan-time helpers.

use elasticstack_diagnostics::AttributePath;
use elasticstack_typeutils::AttrValue;

/// Attributes whose change forces a destroy-and-create.
///
/// A listed attribute triggers replacement when a prior state exists and
/// the planned value differs from it. Planned unknowns count as a change.
/// Nothing is replaced on create, when the prior state is null.
#[must_use]
pub fn requires_replace(
    attributes: &[&str],
    prior: &AttrValue,
    planned: &AttrValue,
) -> Vec<AttributePath> {
    if matches!(prior, AttrValue::Null | AttrValue::Unknown) {
        return Vec::new();
    }
    attributes
        .iter()
        .filter(|name| {
            let before = prior.get(name).unwrap_or(&AttrValue::Null);
            let after = planned.get(name).unwrap_or(&AttrValue::Null);
            before != after
        })
        .map(|name| AttributePath::root(*name))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obj(script_id: AttrValue, source: &str) -> AttrValue {
        AttrValue::object([
            ("script_id", script_id),
            ("source", AttrValue::String(source.to_string())),
        ])
    }

    #[test]
    fn test_no_replace_on_create() {
        let planned = obj(AttrValue::String("s1".into()), "1+1");
        assert!(requires_replace(&["script_id"], &AttrValue::Null, &planned).is_empty());
    }

    #[test]
    fn test_replace_on_listed_change_only() {
        let prior = obj(AttrValue::String("s1".into()), "1+1");
        let planned = obj(AttrValue::String("s2".into()), "2+2");
        let paths = requires_replace(&["script_id"], &prior, &planned);
        assert_eq!(paths, vec![AttributePath::root("script_id")]);
    }

    #[test]
    fn test_unknown_plan_counts_as_change() {
        let prior = obj(AttrValue::String("s1".into()), "1+1");
        let planned = obj(AttrValue::Unknown, "1+1");
        assert_eq!(requires_replace(&["script_id"], &prior, &planned).len(), 1);
    }
}
