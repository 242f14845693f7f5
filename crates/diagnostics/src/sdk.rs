//! Legacy SDK-style diagnostics.
//!
//! A plain ordered list of severity/summary/detail entries. Unlike the
//! framework collection it keeps duplicates, and its severity enum has an
//! explicit numeric encoding matching the legacy wire values
//! (`0` = error, `1` = warning).

use serde::{Deserialize, Serialize};

use crate::path::AttributePath;

/// Legacy severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    /// Error
    Error,
    /// Warning
    Warning,
}

impl From<i32> for Severity {
    fn from(value: i32) -> Self {
        if value == 0 { Self::Error } else { Self::Warning }
    }
}

impl From<Severity> for i32 {
    fn from(value: Severity) -> Self {
        match value {
            Severity::Error => 0,
            Severity::Warning => 1,
        }
    }
}

/// A legacy diagnostic entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Severity level
    pub severity: Severity,

    /// Summary message
    pub summary: String,

    /// Detailed message
    pub detail: String,

    /// Attribute path (if applicable)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attribute_path: Option<AttributePath>,
}

/// Ordered list of legacy diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics(Vec<Diagnostic>);

impl Diagnostics {
    /// Creates an empty list.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Single error entry, the legacy `diag.Errorf` shape.
    #[must_use]
    pub fn error(summary: impl Into<String>, detail: impl Into<String>) -> Self {
        Self(vec![Diagnostic {
            severity: Severity::Error,
            summary: summary.into(),
            detail: detail.into(),
            attribute_path: None,
        }])
    }

    /// Single error entry whose summary is the error's message.
    #[must_use]
    pub fn from_error(err: &dyn std::error::Error) -> Self {
        Self::error(err.to_string(), "")
    }

    /// Appends an entry.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.0.push(diagnostic);
    }

    /// Returns true if any entry has error severity.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.0.iter().any(|d| d.severity == Severity::Error)
    }

    /// Iterates over entries in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.0.iter()
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns true when the list is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.0.extend(iter);
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_severity_wire_values() {
        assert_eq!(Severity::from(0), Severity::Error);
        assert_eq!(Severity::from(1), Severity::Warning);
        assert_eq!(i32::from(Severity::Warning), 1);
    }

    #[test]
    fn test_keeps_duplicates() {
        let mut diags = Diagnostics::error("boom", "");
        diags.extend(Diagnostics::error("boom", ""));

        assert_eq!(diags.len(), 2);
        assert!(diags.has_error());
    }
}
