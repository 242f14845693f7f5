//! Elasticsearch API calls, grouped by feature.

pub mod ml;
pub mod script;
