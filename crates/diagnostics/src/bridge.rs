//! Translation between legacy and framework diagnostics.
//!
//! Error maps to error; every other severity maps to warning. Summary,
//! detail and attribute path pass through unchanged.

use crate::error::DiagnosticsError;
use crate::framework::{self, Severity};
use crate::sdk;

/// Converts legacy diagnostics into the framework collection.
#[must_use]
pub fn framework_diags_from_sdk(diags: &sdk::Diagnostics) -> framework::Diagnostics {
    let mut out = framework::Diagnostics::new();
    for diag in diags {
        out.push(framework::Diagnostic {
            severity: match diag.severity {
                sdk::Severity::Error => Severity::Error,
                sdk::Severity::Warning => Severity::Warning,
            },
            summary: diag.summary.clone(),
            detail: diag.detail.clone(),
            path: diag.attribute_path.clone(),
        });
    }
    out
}

/// Converts framework diagnostics into the legacy list.
#[must_use]
pub fn sdk_diags_from_framework(diags: &framework::Diagnostics) -> sdk::Diagnostics {
    diags
        .iter()
        .map(|diag| sdk::Diagnostic {
            severity: match diag.severity {
                Severity::Error => sdk::Severity::Error,
                Severity::Warning => sdk::Severity::Warning,
            },
            summary: diag.summary.clone(),
            detail: diag.detail.clone(),
            attribute_path: diag.path.clone(),
        })
        .collect()
}

/// Collapses legacy diagnostics to their first error.
///
/// # Errors
///
/// Returns the first error-severity entry; warnings alone are `Ok`.
pub fn sdk_diags_as_error(diags: &sdk::Diagnostics) -> Result<(), DiagnosticsError> {
    match diags.iter().find(|d| d.severity == sdk::Severity::Error) {
        Some(diag) => Err(DiagnosticsError {
            summary: diag.summary.clone(),
            detail: diag.detail.clone(),
        }),
        None => Ok(()),
    }
}

/// Collapses framework diagnostics to their first error.
///
/// # Errors
///
/// Returns the first error-severity entry; warnings alone are `Ok`.
pub fn fw_diags_as_error(diags: &framework::Diagnostics) -> Result<(), DiagnosticsError> {
    match diags.errors().next() {
        Some(diag) => Err(DiagnosticsError {
            summary: diag.summary.clone(),
            detail: diag.detail.clone(),
        }),
        None => Ok(()),
    }
}

impl From<&sdk::Diagnostics> for framework::Diagnostics {
    fn from(diags: &sdk::Diagnostics) -> Self {
        framework_diags_from_sdk(diags)
    }
}

impl From<&framework::Diagnostics> for sdk::Diagnostics {
    fn from(diags: &framework::Diagnostics) -> Self {
        sdk_diags_from_framework(diags)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::path::AttributePath;

    #[test]
    fn test_error_stays_error() {
        let legacy = sdk::Diagnostics::error("Unable to create script", "400 Bad Request");
        let fw = framework_diags_from_sdk(&legacy);

        assert_eq!(fw.error_count(), 1);
        let back = sdk_diags_from_framework(&fw);
        assert_eq!(back, legacy);
    }

    #[test]
    fn test_warning_stays_warning_with_path() {
        let mut fw = framework::Diagnostics::new();
        fw.add_attribute_warning(AttributePath::root("index"), "Ignored", "esql rules have no index");

        let legacy = sdk_diags_from_framework(&fw);
        let entry = legacy.iter().next().cloned();
        assert_eq!(entry.as_ref().map(|d| d.severity), Some(sdk::Severity::Warning));
        assert_eq!(
            entry.and_then(|d| d.attribute_path),
            Some(AttributePath::root("index"))
        );
    }

    #[test]
    fn test_as_error_picks_first_error() {
        let mut fw = framework::Diagnostics::new();
        fw.add_warning("just a warning", "");
        fw.add_error("first", "one");
        fw.add_error("second", "two");

        let err = fw_diags_as_error(&fw).err();
        assert_eq!(
            err,
            Some(DiagnosticsError {
                summary: "first".to_string(),
                detail: "one".to_string(),
            })
        );
    }

    #[test]
    fn test_as_error_ok_for_warnings() {
        let mut fw = framework::Diagnostics::new();
        fw.add_warning("just a warning", "");
        assert!(fw_diags_as_error(&fw).is_ok());
        assert!(sdk_diags_as_error(&sdk_diags_from_framework(&fw)).is_ok());
    }
}
