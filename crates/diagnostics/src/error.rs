//! Single-error view of a diagnostics collection.

use miette::Diagnostic;
use thiserror::Error;

/// The first error entry of a diagnostics collection, as a Rust error.
///
/// Used by call sites that need one `Result` instead of a collection, such
/// as server version checks and tests.
#[derive(Error, Debug, Diagnostic, Clone, PartialEq, Eq)]
#[error("{summary}: {detail}")]
#[diagnostic(code(elasticstack_diagnostics::error))]
pub struct DiagnosticsError {
    /// Summary of the first error entry
    pub summary: String,

    /// Detail of the first error entry
    pub detail: String,
}
