//! Error types for the API clients.

use elasticstack_diagnostics::{Diagnostic, Diagnostics};
use miette::Diagnostic as MietteDiagnostic;
use thiserror::Error;

/// Result type alias using the client error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while talking to Elasticsearch or Kibana.
#[derive(Error, Debug, MietteDiagnostic)]
pub enum Error {
    /// No Elasticsearch endpoint was configured.
    #[error("Elasticsearch client is not configured")]
    #[diagnostic(
        code(elasticstack_clients::elasticsearch_not_configured),
        help("Set `elasticsearch.endpoints` in the provider block or ELASTICSEARCH_ENDPOINTS")
    )]
    ElasticsearchNotConfigured,

    /// No Kibana endpoint was configured.
    #[error("Kibana client is not configured")]
    #[diagnostic(
        code(elasticstack_clients::kibana_not_configured),
        help("Set `kibana.endpoints` in the provider block or KIBANA_ENDPOINT")
    )]
    KibanaNotConfigured,

    /// Invalid provider configuration.
    #[error("Invalid provider configuration: {message}")]
    #[diagnostic(code(elasticstack_clients::invalid_config))]
    InvalidConfig {
        /// Error message
        message: String,
    },

    /// Invalid endpoint URL.
    #[error("Invalid endpoint {endpoint:?}: {message}")]
    #[diagnostic(code(elasticstack_clients::invalid_endpoint))]
    InvalidEndpoint {
        /// The rejected endpoint
        endpoint: String,
        /// Parse error
        message: String,
    },

    /// Composite ID does not have the `<scope>/<id>` shape.
    #[error("Wrong resource ID format: {id:?}, expected <cluster_uuid|space_id>/<resource_id>")]
    #[diagnostic(code(elasticstack_clients::invalid_composite_id))]
    InvalidCompositeId {
        /// The rejected ID
        id: String,
    },

    /// Server version string could not be parsed.
    #[error("Unable to parse server version {version:?}: {source}")]
    #[diagnostic(code(elasticstack_clients::invalid_version))]
    InvalidVersion {
        /// Reported version
        version: String,
        /// Parse error
        source: semver::Error,
    },

    /// The server answered with a failure status.
    #[error("{method} {url} failed with status {status}")]
    #[diagnostic(code(elasticstack_clients::api_error))]
    Api {
        /// HTTP method
        method: String,
        /// Request URL
        url: String,
        /// Response status
        status: u16,
        /// Response body
        body: String,
    },

    /// HTTP transport error.
    #[error("HTTP request failed: {0}")]
    #[diagnostic(code(elasticstack_clients::http_error))]
    Http(#[from] reqwest::Error),

    /// Response body did not match the expected shape.
    #[error("Unable to decode response body: {0}")]
    #[diagnostic(code(elasticstack_clients::decode_error))]
    Decode(#[from] serde_json::Error),
}

impl Error {
    /// Converts into a single error diagnostic with the given summary.
    ///
    /// API errors carry the raw response body as detail.
    #[must_use]
    pub fn to_diagnostics(&self, summary: &str) -> Diagnostics {
        let detail = match self {
            Self::Api { body, .. } if !body.is_empty() => body.clone(),
            other => other.to_string(),
        };
        Diagnostic::error(summary, detail).into()
    }
}
