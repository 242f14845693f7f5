//! Three-valued scalar attribute state.

use serde::de::{Deserialize, Deserializer};
use serde::ser::{Error as _, Serialize, Serializer};

/// A Terraform attribute value: known, null, or unknown.
///
/// Unknown only occurs during plan and stands for "computed later". It must
/// never reach an outgoing API payload, and it cannot be serialized into
/// state.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Value<T> {
    /// Explicitly absent
    Null,
    /// Not yet computed
    Unknown,
    /// A concrete value
    Known(T),
}

/// Common view over anything carrying Terraform's three-valued state.
pub trait Tristate {
    /// True for null.
    fn is_null(&self) -> bool;

    /// True for unknown.
    fn is_unknown(&self) -> bool;

    /// True iff neither null nor unknown.
    fn is_known(&self) -> bool {
        !self.is_null() && !self.is_unknown()
    }
}

/// Returns true iff `value` is neither null nor unknown.
pub fn is_known(value: &impl Tristate) -> bool {
    value.is_known()
}

impl<T> Value<T> {
    /// Wraps an option: `None` becomes null.
    pub fn from_option(value: Option<T>) -> Self {
        match value {
            Some(v) => Self::Known(v),
            None => Self::Null,
        }
    }

    /// Borrowed known value.
    pub fn known(&self) -> Option<&T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Owned known value.
    pub fn into_known(self) -> Option<T> {
        match self {
            Self::Known(v) => Some(v),
            _ => None,
        }
    }

    /// Converts `&Value<T>` to `Value<&T>`.
    pub fn as_ref(&self) -> Value<&T> {
        match self {
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
            Self::Known(v) => Value::Known(v),
        }
    }

    /// Maps the known value, preserving null and unknown.
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Value<U> {
        match self {
            Self::Null => Value::Null,
            Self::Unknown => Value::Unknown,
            Self::Known(v) => Value::Known(f(v)),
        }
    }

    /// Replaces unknown with null, the state every read must leave behind.
    #[must_use]
    pub fn or_null(self) -> Self {
        match self {
            Self::Unknown => Self::Null,
            other => other,
        }
    }
}

impl<T: Clone> Value<T> {
    /// Cloned known value.
    pub fn known_cloned(&self) -> Option<T> {
        self.known().cloned()
    }
}

impl Value<String> {
    /// Borrowed known string.
    pub fn known_str(&self) -> Option<&str> {
        self.known().map(String::as_str)
    }
}

impl<T> Tristate for Value<T> {
    fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown)
    }
}

impl<T> Default for Value<T> {
    fn default() -> Self {
        Self::Null
    }
}

impl<T> From<Option<T>> for Value<T> {
    fn from(value: Option<T>) -> Self {
        Self::from_option(value)
    }
}

impl From<&str> for Value<String> {
    fn from(value: &str) -> Self {
        Self::Known(value.to_string())
    }
}

impl From<String> for Value<String> {
    fn from(value: String) -> Self {
        Self::Known(value)
    }
}

impl From<bool> for Value<bool> {
    fn from(value: bool) -> Self {
        Self::Known(value)
    }
}

impl From<i64> for Value<i64> {
    fn from(value: i64) -> Self {
        Self::Known(value)
    }
}

impl<T: Serialize> Serialize for Value<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Known(v) => v.serialize(serializer),
            Self::Null => serializer.serialize_none(),
            Self::Unknown => Err(S::Error::custom(
                "unknown values cannot be written to state",
            )),
        }
    }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Value<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Option::<T>::deserialize(deserializer).map(Self::from_option)
    }
}
