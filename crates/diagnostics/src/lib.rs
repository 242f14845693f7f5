//! # elasticstack-diagnostics
//!
//! Terraform's structured error/warning unit, in the two shapes the provider
//! deals with:
//!
//! - [`Diagnostics`]: the framework-style append-only collection returned by
//!   every resource operation
//! - [`sdk::Diagnostics`]: the legacy SDK-style ordered list
//!
//! plus the bridge between them, HTTP response checks, and a collapse to a
//! single [`DiagnosticsError`] for call sites that want a `Result`.
//!
//! Diagnostics are accumulative and non-fatal by construction. The control
//! flow idiom is:
//!
//! ```rust
//! use elasticstack_diagnostics::Diagnostics;
//!
//! fn step(diags: &mut Diagnostics) {
//!     diags.add_error("Unable to parse composite ID", "expected <scope>/<id>");
//! }
//!
//! let mut diags = Diagnostics::new();
//! step(&mut diags);
//! if diags.has_error() {
//!     return;
//! }
//! ```

pub mod bridge;
pub mod error;
pub mod framework;
pub mod http;
pub mod path;
pub mod sdk;

pub use bridge::{
    framework_diags_from_sdk, fw_diags_as_error, sdk_diags_as_error, sdk_diags_from_framework,
};
pub use error::DiagnosticsError;
pub use framework::{Diagnostic, Diagnostics, Severity};
pub use http::{HttpResponse, check_error, check_http_error, check_http_status};
pub use path::{AttributePath, PathStep};
