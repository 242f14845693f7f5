//! Tracing setup for the provider process.
//!
//! Terraform captures provider stderr, so every layer writes there. The
//! filter comes from `TF_LOG`, the format from `TF_LOG_FORMAT`.

use std::io;
use std::sync::OnceLock;

use tracing_subscriber::{filter::EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;

use crate::error::{Error, Result};

/// Filter directive variable.
pub const ENV_TF_LOG: &str = "TF_LOG";
/// Output format variable; `json` selects JSON lines.
pub const ENV_TF_LOG_FORMAT: &str = "TF_LOG_FORMAT";

const DEFAULT_FILTER: &str = "warn";

/// Log line format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    /// Single-line human-readable output
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

/// Resolved logging settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// `EnvFilter` directive
    pub filter: String,
    /// Output format
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: DEFAULT_FILTER.to_string(),
            format: LogFormat::Compact,
        }
    }
}

impl LoggingConfig {
    /// Reads `TF_LOG` and `TF_LOG_FORMAT`.
    ///
    /// Terraform's own levels (`TRACE`, `DEBUG`, ...) are valid filter
    /// directives once lowercased; `OFF` maps to `off`.
    #[must_use]
    pub fn from_env() -> Self {
        let filter = std::env::var(ENV_TF_LOG)
            .ok()
            .map(|raw| raw.trim().to_ascii_lowercase())
            .filter(|raw| !raw.is_empty())
            .unwrap_or_else(|| DEFAULT_FILTER.to_string());
        let format = match std::env::var(ENV_TF_LOG_FORMAT) {
            Ok(raw) if raw.eq_ignore_ascii_case("json") => LogFormat::Json,
            _ => LogFormat::Compact,
        };
        Self { filter, format }
    }
}

static INVOCATION_ID: OnceLock<Uuid> = OnceLock::new();

/// ID attached to every log line of this provider process.
pub fn invocation_id() -> Uuid {
    *INVOCATION_ID.get_or_init(Uuid::new_v4)
}

/// Installs the global subscriber.
///
/// # Errors
///
/// Returns [`Error::Logging`] if the filter is invalid or a subscriber is
/// already installed.
pub fn init(config: &LoggingConfig) -> Result<()> {
    let env_filter = EnvFilter::try_new(&config.filter).map_err(|e| Error::Logging {
        message: format!("invalid filter {:?}: {e}", config.filter),
    })?;
    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = match config.format {
        LogFormat::Compact => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_writer(io::stderr)
                    .with_target(true),
            )
            .try_init(),
        LogFormat::Json => registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(io::stderr)
                    .with_current_span(true)
                    .with_span_list(true),
            )
            .try_init(),
    };
    installed.map_err(|e| Error::Logging {
        message: e.to_string(),
    })?;

    tracing::info!(
        invocation_id = %invocation_id(),
        version = env!("CARGO_PKG_VERSION"),
        format = ?config.format,
        "Tracing initialized for elasticstack provider"
    );
    Ok(())
}
