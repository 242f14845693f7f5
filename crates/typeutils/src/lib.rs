//! # elasticstack-typeutils
//!
//! Bridges Terraform's three-valued attribute model (known / null /
//! unknown) and plain Rust values.
//!
//! - [`Value<T>`]: a scalar attribute
//! - [`AttrValue`]: a dynamically typed list, map or object attribute
//! - [`convert`]: list/map/object decoders with path-scoped diagnostics
//! - [`json`]: normalized JSON string attributes
//! - [`duration`]: Kibana `"5m"` style durations
//!
//! Everything that builds an API payload goes through these helpers, which
//! only ever emit known values.

pub mod attr;
pub mod convert;
pub mod duration;
pub mod json;
pub mod value;

pub use attr::AttrValue;
pub use convert::{
    FromAttr, IntoAttr, ObjectReader, list_type_as, list_type_to_slice, map_type_as,
    non_empty_list_value, object_type_as, object_type_to_struct, slice_to_list_value,
};
pub use duration::{DurationParseError, DurationUnit, KibanaDuration};
pub use json::{json_semantically_equal, json_string_as, json_string_from, preserve_json_formatting};
pub use value::{Tristate, Value, is_known};
