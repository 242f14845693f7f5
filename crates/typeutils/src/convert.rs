//! Conversions between attribute values and native Rust values.
//!
//! Every helper is gated on [`Tristate::is_known`]: null and unknown inputs
//! short-circuit to `None` without producing diagnostics, so an unknown
//! value never ends up in an outgoing payload. Element-level failures are
//! reported with their full attribute path and skip only that element.

use std::collections::BTreeMap;

use elasticstack_diagnostics::{AttributePath, Diagnostic, Diagnostics};

use crate::attr::AttrValue;
use crate::value::{Tristate, Value};

/// Summary used for every shape mismatch.
pub const CONVERSION_ERROR: &str = "Value Conversion Error";

fn mismatch(expected: &str, actual: &AttrValue, path: &AttributePath) -> Diagnostic {
    Diagnostic::error(
        CONVERSION_ERROR,
        format!("expected {expected}, got {}", actual.kind()),
    )
    .with_path(path.clone())
}

/// Decoding from a dynamic attribute value.
pub trait FromAttr: Sized {
    /// Decodes `value`, appending a path-scoped diagnostic on mismatch.
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics)
    -> Option<Self>;
}

/// Encoding into a dynamic attribute value.
pub trait IntoAttr {
    /// Converts into an attribute value.
    fn into_attr(self) -> AttrValue;
}

impl FromAttr for String {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::String(s) => Some(s.clone()),
            other => {
                diags.push(mismatch("string", other, path));
                None
            }
        }
    }
}

impl FromAttr for bool {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Bool(b) => Some(*b),
            other => {
                diags.push(mismatch("bool", other, path));
                None
            }
        }
    }
}

impl FromAttr for i64 {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Int64(i) => Some(*i),
            other => {
                diags.push(mismatch("int64", other, path));
                None
            }
        }
    }
}

impl FromAttr for f64 {
    #[allow(clippy::cast_precision_loss)]
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Float64(f) => Some(*f),
            AttrValue::Int64(i) => Some(*i as f64),
            other => {
                diags.push(mismatch("float64", other, path));
                None
            }
        }
    }
}

impl FromAttr for AttrValue {
    fn from_attr(value: &AttrValue, _path: &AttributePath, _diags: &mut Diagnostics) -> Option<Self> {
        Some(value.clone())
    }
}

impl<T: FromAttr> FromAttr for Value<T> {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Null => Some(Self::Null),
            AttrValue::Unknown => Some(Self::Unknown),
            other => T::from_attr(other, path, diags).map(Value::Known),
        }
    }
}

impl<T: FromAttr> FromAttr for Vec<T> {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::List(_) => list_type_as(value, path, diags),
            other => {
                diags.push(mismatch("list", other, path));
                None
            }
        }
    }
}

impl<T: FromAttr> FromAttr for BTreeMap<String, T> {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Map(_) | AttrValue::Object(_) => map_type_as(value, path, diags),
            other => {
                diags.push(mismatch("map", other, path));
                None
            }
        }
    }
}

impl IntoAttr for AttrValue {
    fn into_attr(self) -> AttrValue {
        self
    }
}

impl IntoAttr for String {
    fn into_attr(self) -> AttrValue {
        AttrValue::String(self)
    }
}

impl IntoAttr for &str {
    fn into_attr(self) -> AttrValue {
        AttrValue::String(self.to_string())
    }
}

impl IntoAttr for bool {
    fn into_attr(self) -> AttrValue {
        AttrValue::Bool(self)
    }
}

impl IntoAttr for i64 {
    fn into_attr(self) -> AttrValue {
        AttrValue::Int64(self)
    }
}

impl IntoAttr for f64 {
    fn into_attr(self) -> AttrValue {
        AttrValue::Float64(self)
    }
}

impl<T: IntoAttr> IntoAttr for Value<T> {
    fn into_attr(self) -> AttrValue {
        match self {
            Self::Null => AttrValue::Null,
            Self::Unknown => AttrValue::Unknown,
            Self::Known(v) => v.into_attr(),
        }
    }
}

impl<T: IntoAttr> IntoAttr for Option<T> {
    fn into_attr(self) -> AttrValue {
        self.map_or(AttrValue::Null, IntoAttr::into_attr)
    }
}

impl<T: IntoAttr> IntoAttr for Vec<T> {
    fn into_attr(self) -> AttrValue {
        AttrValue::List(self.into_iter().map(IntoAttr::into_attr).collect())
    }
}

impl<T: IntoAttr> IntoAttr for BTreeMap<String, T> {
    fn into_attr(self) -> AttrValue {
        AttrValue::Map(self.into_iter().map(|(k, v)| (k, v.into_attr())).collect())
    }
}

/// Field-by-field reader for nested object models.
///
/// ```rust
/// use elasticstack_diagnostics::{AttributePath, Diagnostics};
/// use elasticstack_typeutils::{AttrValue, FromAttr, ObjectReader, Value};
///
/// struct Cardinality {
///     field: Value<String>,
///     value: Value<i64>,
/// }
///
/// impl FromAttr for Cardinality {
///     fn from_attr(v: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
///         let obj = ObjectReader::new(v, path, diags)?;
///         Some(Self {
///             field: obj.field("field", diags),
///             value: obj.field("value", diags),
///         })
///     }
/// }
/// ```
pub struct ObjectReader<'a> {
    attrs: &'a BTreeMap<String, AttrValue>,
    path: AttributePath,
}

impl<'a> ObjectReader<'a> {
    /// Opens an object value; appends a diagnostic if `value` is not one.
    pub fn new(value: &'a AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        match value {
            AttrValue::Object(attrs) | AttrValue::Map(attrs) => Some(Self {
                attrs,
                path: path.clone(),
            }),
            other => {
                diags.push(mismatch("object", other, path));
                None
            }
        }
    }

    /// Reads one attribute. Missing attributes and mismatches yield the
    /// default (null); mismatches also append a diagnostic.
    pub fn field<T: FromAttr + Default>(&self, name: &str, diags: &mut Diagnostics) -> T {
        let path = self.path.at_name(name);
        self.attrs
            .get(name)
            .and_then(|value| T::from_attr(value, &path, diags))
            .unwrap_or_default()
    }

    /// Path of the object being read.
    #[must_use]
    pub fn path(&self) -> &AttributePath {
        &self.path
    }
}

/// Decodes a homogeneous list.
///
/// Null and unknown lists yield `None`; a known empty list yields
/// `Some(vec![])`. Elements that fail to decode are reported and skipped.
pub fn list_type_as<T: FromAttr>(
    list: &AttrValue,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<Vec<T>> {
    match list {
        AttrValue::Null | AttrValue::Unknown => None,
        AttrValue::List(items) => Some(
            items
                .iter()
                .enumerate()
                .filter_map(|(i, item)| T::from_attr(item, &path.at_list_index(i), diags))
                .collect(),
        ),
        other => {
            diags.push(mismatch("list", other, path));
            None
        }
    }
}

/// Decodes a string-keyed map.
pub fn map_type_as<T: FromAttr>(
    map: &AttrValue,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<BTreeMap<String, T>> {
    match map {
        AttrValue::Null | AttrValue::Unknown => None,
        AttrValue::Map(entries) | AttrValue::Object(entries) => Some(
            entries
                .iter()
                .filter_map(|(k, v)| {
                    T::from_attr(v, &path.at_map_key(k.clone()), diags).map(|t| (k.clone(), t))
                })
                .collect(),
        ),
        other => {
            diags.push(mismatch("map", other, path));
            None
        }
    }
}

/// Decodes a single object into its model.
pub fn object_type_as<M: FromAttr>(
    object: &AttrValue,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<M> {
    if !object.is_known() {
        return None;
    }
    M::from_attr(object, path, diags)
}

/// Decodes a single object and maps it through `transform`.
///
/// Null and unknown objects short-circuit without calling `transform`.
pub fn object_type_to_struct<M, T>(
    object: &AttrValue,
    path: &AttributePath,
    diags: &mut Diagnostics,
    transform: impl FnOnce(M, &AttributePath, &mut Diagnostics) -> Option<T>,
) -> Option<T>
where
    M: FromAttr,
{
    let model = object_type_as::<M>(object, path, diags)?;
    transform(model, path, diags)
}

/// Decodes a list of objects and maps every element through `transform`.
///
/// `transform` receives the element's own path. An element whose decode or
/// transform fails is dropped; its siblings are still converted, so one pass
/// reports every problem.
pub fn list_type_to_slice<M, T>(
    list: &AttrValue,
    path: &AttributePath,
    diags: &mut Diagnostics,
    mut transform: impl FnMut(M, &AttributePath, &mut Diagnostics) -> Option<T>,
) -> Option<Vec<T>>
where
    M: FromAttr,
{
    match list {
        AttrValue::Null | AttrValue::Unknown => None,
        AttrValue::List(items) => {
            let mut out = Vec::with_capacity(items.len());
            for (i, item) in items.iter().enumerate() {
                let item_path = path.at_list_index(i);
                if let Some(model) = M::from_attr(item, &item_path, diags)
                    && let Some(converted) = transform(model, &item_path, diags)
                {
                    out.push(converted);
                }
            }
            Some(out)
        }
        other => {
            diags.push(mismatch("list", other, path));
            None
        }
    }
}

/// Builds a list value; `None` becomes null, an empty vector an empty list.
pub fn slice_to_list_value<T: IntoAttr>(items: Option<Vec<T>>) -> AttrValue {
    items.map_or(AttrValue::Null, IntoAttr::into_attr)
}

/// Builds a list value; both `None` and an empty vector become null.
///
/// Used when the API reports an unset list as `[]`.
pub fn non_empty_list_value<T: IntoAttr>(items: Option<Vec<T>>) -> AttrValue {
    match items {
        Some(items) if !items.is_empty() => items.into_attr(),
        _ => AttrValue::Null,
    }
}
