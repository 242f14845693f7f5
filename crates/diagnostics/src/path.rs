//! Attribute paths.
//!
//! A path addresses a single value inside a resource's attribute tree, e.g.
//! `threat[2].technique[0].subtechnique[1].id`. Diagnostics carry a path so
//! Terraform can point the user at the offending attribute.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One step of an [`AttributePath`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    /// A named attribute of an object or resource.
    Attribute(String),
    /// A list element.
    Index(usize),
    /// A map element.
    Key(String),
}

/// Location of a value within a resource's attributes.
///
/// Paths are immutable; each `at_*` method returns a new, longer path.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttributePath {
    steps: Vec<PathStep>,
}

impl AttributePath {
    /// The empty path, addressing the resource itself.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }

    /// A path with a single top-level attribute.
    #[must_use]
    pub fn root(name: impl Into<String>) -> Self {
        Self {
            steps: vec![PathStep::Attribute(name.into())],
        }
    }

    /// Appends an attribute name.
    #[must_use]
    pub fn at_name(&self, name: impl Into<String>) -> Self {
        self.with_step(PathStep::Attribute(name.into()))
    }

    /// Appends a list index.
    #[must_use]
    pub fn at_list_index(&self, index: usize) -> Self {
        self.with_step(PathStep::Index(index))
    }

    /// Appends a map key.
    #[must_use]
    pub fn at_map_key(&self, key: impl Into<String>) -> Self {
        self.with_step(PathStep::Key(key.into()))
    }

    /// The individual steps, outermost first.
    #[must_use]
    pub fn steps(&self) -> &[PathStep] {
        &self.steps
    }

    /// Returns true for the empty path.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    fn with_step(&self, step: PathStep) -> Self {
        let mut steps = Vec::with_capacity(self.steps.len() + 1);
        steps.extend_from_slice(&self.steps);
        steps.push(step);
        Self { steps }
    }
}

impl fmt::Display for AttributePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            match step {
                PathStep::Attribute(name) if i == 0 => write!(f, "{name}")?,
                PathStep::Attribute(name) => write!(f, ".{name}")?,
                PathStep::Index(index) => write!(f, "[{index}]")?,
                PathStep::Key(key) => write!(f, "[\"{key}\"]")?,
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nested_path_display() {
        let path = AttributePath::root("threat")
            .at_list_index(2)
            .at_name("technique")
            .at_list_index(0)
            .at_name("subtechnique")
            .at_list_index(1)
            .at_name("id");

        assert_eq!(path.to_string(), "threat[2].technique[0].subtechnique[1].id");
        assert_eq!(path.steps().len(), 7);
    }

    #[test]
    fn test_map_key_display() {
        let path = AttributePath::root("params").at_map_key("message");
        assert_eq!(path.to_string(), "params[\"message\"]");
    }

    #[test]
    fn test_paths_are_not_shared() {
        let base = AttributePath::root("actions");
        let first = base.at_list_index(0);
        let second = base.at_list_index(1);

        assert_eq!(base.to_string(), "actions");
        assert_ne!(first, second);
        assert!(AttributePath::empty().is_empty());
    }
}
