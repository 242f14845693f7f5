//! Error types for provider setup.

use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Result type alias using the provider error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised outside of resource operations.
#[derive(Error, Debug, MietteDiagnostic)]
pub enum Error {
    /// Provider configuration failed validation.
    #[error("Provider configuration is invalid: {summary}")]
    #[diagnostic(
        code(elasticstack_provider::invalid_config),
        help("Check the provider block and the ELASTICSEARCH_* / KIBANA_* environment variables")
    )]
    InvalidConfig {
        /// First error summary
        summary: String,
    },

    /// Client construction failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Client(#[from] elasticstack_clients::Error),

    /// Tracing could not be initialized.
    #[error("Failed to initialize logging: {message}")]
    #[diagnostic(code(elasticstack_provider::logging))]
    Logging {
        /// Error message
        message: String,
    },
}
