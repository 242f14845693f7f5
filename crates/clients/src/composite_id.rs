//! Two-part resource identifiers.
//!
//! Every resource stores its Terraform `id` as `<scope>/<resource_id>`,
//! where scope is the cluster UUID for Elasticsearch resources and the space
//! ID for Kibana resources. The format is part of the state file contract.

use std::fmt;
use std::str::FromStr;

use elasticstack_diagnostics::{AttributePath, Diagnostics};

use crate::error::Error;

/// A parsed `<scope>/<resource_id>` identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CompositeId {
    /// Cluster UUID or Kibana space ID
    pub cluster_id: String,
    /// API-assigned or user-chosen resource ID
    pub resource_id: String,
}

impl CompositeId {
    /// Creates an ID from its parts.
    #[must_use]
    pub fn new(cluster_id: impl Into<String>, resource_id: impl Into<String>) -> Self {
        Self {
            cluster_id: cluster_id.into(),
            resource_id: resource_id.into(),
        }
    }

    /// Parses an ID, reporting failures as an attribute error on `id`.
    pub fn from_str_diags(s: &str, diags: &mut Diagnostics) -> Option<Self> {
        match s.parse::<Self>() {
            Ok(id) => Some(id),
            Err(err) => {
                diags.add_attribute_error(
                    AttributePath::root("id"),
                    "Wrong resource ID",
                    err.to_string(),
                );
                None
            }
        }
    }
}

impl FromStr for CompositeId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut parts = s.split('/');
        match (parts.next(), parts.next(), parts.next()) {
            (Some(scope), Some(resource), None) if !scope.is_empty() && !resource.is_empty() => {
                Ok(Self::new(scope, resource))
            }
            _ => Err(Error::InvalidCompositeId { id: s.to_string() }),
        }
    }
}

impl fmt::Display for CompositeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.cluster_id, self.resource_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse() {
        let id: Result<CompositeId, _> = "0a1b2c/my-script".parse();
        assert_eq!(id.ok(), Some(CompositeId::new("0a1b2c", "my-script")));
    }

    #[test]
    fn test_rejects_wrong_shapes() {
        for input in ["abc", "a/b/c", "/b", "a/", ""] {
            assert!(input.parse::<CompositeId>().is_err(), "{input:?} should be rejected");
        }
    }

    #[test]
    fn test_diags_variant() {
        let mut diags = Diagnostics::new();
        assert!(CompositeId::from_str_diags("no-slash", &mut diags).is_none());
        assert_eq!(diags.error_count(), 1);

        let id = CompositeId::from_str_diags("default/6f0f7b1c", &mut diags);
        assert_eq!(id.map(|i| i.to_string()).as_deref(), Some("default/6f0f7b1c"));
    }
}
