//! Dynamic attribute values.
//!
//! Lists, maps and nested objects in a resource model are held as
//! [`AttrValue`] and decoded on demand by the helpers in
//! [`crate::convert`]. Like [`crate::Value`], every shape can be null or
//! unknown in addition to holding data.

use std::collections::BTreeMap;

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::value::Tristate;

/// A dynamically typed Terraform attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum AttrValue {
    /// Explicitly absent
    Null,
    /// Not yet computed
    Unknown,
    /// Boolean
    Bool(bool),
    /// Integer number
    Int64(i64),
    /// Floating point number
    Float64(f64),
    /// String
    String(String),
    /// Homogeneous list
    List(Vec<AttrValue>),
    /// String-keyed map with homogeneous values
    Map(BTreeMap<String, AttrValue>),
    /// Object with a fixed set of named attributes
    Object(BTreeMap<String, AttrValue>),
}

impl AttrValue {
    /// Builds an object from `(name, value)` pairs.
    pub fn object<K: Into<String>>(fields: impl IntoIterator<Item = (K, AttrValue)>) -> Self {
        Self::Object(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a list.
    pub fn list(items: impl IntoIterator<Item = AttrValue>) -> Self {
        Self::List(items.into_iter().collect())
    }

    /// Name of the value's shape, used in conversion diagnostics.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Unknown => "unknown",
            Self::Bool(_) => "bool",
            Self::Int64(_) => "int64",
            Self::Float64(_) => "float64",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Object(_) => "object",
        }
    }

    /// Attribute of an object (or entry of a map) by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&AttrValue> {
        match self {
            Self::Object(fields) | Self::Map(fields) => fields.get(name),
            _ => None,
        }
    }

    /// Replaces unknown with null, recursively.
    #[must_use]
    pub fn or_null(self) -> Self {
        match self {
            Self::Unknown => Self::Null,
            Self::List(items) => Self::List(items.into_iter().map(Self::or_null).collect()),
            Self::Map(fields) => {
                Self::Map(fields.into_iter().map(|(k, v)| (k, v.or_null())).collect())
            }
            Self::Object(fields) => {
                Self::Object(fields.into_iter().map(|(k, v)| (k, v.or_null())).collect())
            }
            other => other,
        }
    }

    /// True if this value or anything nested in it is unknown.
    #[must_use]
    pub fn contains_unknown(&self) -> bool {
        match self {
            Self::Unknown => true,
            Self::List(items) => items.iter().any(Self::contains_unknown),
            Self::Map(fields) | Self::Object(fields) => {
                fields.values().any(Self::contains_unknown)
            }
            _ => false,
        }
    }
}

impl Default for AttrValue {
    fn default() -> Self {
        Self::Null
    }
}

impl Tristate for AttrValue {
    fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl From<serde_json::Value> for AttrValue {
    fn from(value: serde_json::Value) -> Self {
        match value {
            serde_json::Value::Null => Self::Null,
            serde_json::Value::Bool(b) => Self::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int64(i),
                None => Self::Float64(n.as_f64().unwrap_or_default()),
            },
            serde_json::Value::String(s) => Self::String(s),
            serde_json::Value::Array(items) => {
                Self::List(items.into_iter().map(Self::from).collect())
            }
            serde_json::Value::Object(fields) => {
                Self::Object(fields.into_iter().map(|(k, v)| (k, Self::from(v))).collect())
            }
        }
    }
}

impl Serialize for AttrValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Unknown => Err(S::Error::custom(
                "unknown values cannot be written to state",
            )),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Int64(i) => serializer.serialize_i64(*i),
            Self::Float64(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::List(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Self::Map(fields) | Self::Object(fields) => {
                let mut map = serializer.serialize_map(Some(fields.len()))?;
                for (k, v) in fields {
                    map.serialize_entry(k, v)?;
                }
                map.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for AttrValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let value = AttrValue::from(json!({
            "field": ["host.name", "user.name"],
            "value": 10,
            "ratio": 0.5
        }));

        assert_eq!(value.kind(), "object");
        assert_eq!(value.get("value"), Some(&AttrValue::Int64(10)));
        assert_eq!(value.get("ratio"), Some(&AttrValue::Float64(0.5)));
        assert_eq!(
            value.get("field").map(AttrValue::kind),
            Some("list")
        );
    }

    #[test]
    fn test_or_null_is_recursive() {
        let value = AttrValue::object([
            ("duration", AttrValue::Unknown),
            ("group_by", AttrValue::list([AttrValue::Unknown])),
        ]);
        assert!(value.contains_unknown());

        let cleared = value.or_null();
        assert!(!cleared.contains_unknown());
        assert_eq!(cleared.get("duration"), Some(&AttrValue::Null));
    }

    #[test]
    fn test_unknown_cannot_serialize() {
        let value = AttrValue::list([AttrValue::String("a".into()), AttrValue::Unknown]);
        assert!(serde_json::to_string(&value).is_err());
    }
}
