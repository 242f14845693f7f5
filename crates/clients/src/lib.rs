//! # elasticstack-clients
//!
//! HTTP access to Elasticsearch and Kibana for the elasticstack provider.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Feature modules                                         │
//! │  elasticsearch::{script, ml}   kibana::detection_rules   │
//! ├──────────────────────────────────────────────────────────┤
//! │  ApiClient                                               │
//! │  (cluster info, composite IDs, server versions)          │
//! ├──────────────────────────────────────────────────────────┤
//! │  Endpoint transport                                      │
//! │  (auth headers, debug logging, secret redaction)         │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use elasticstack_clients::{ApiClient, ProviderConfig};
//! use elasticstack_clients::elasticsearch::script;
//!
//! let config = ProviderConfig::default().with_env_overrides();
//! let client = ApiClient::from_config(&config)?;
//! let stored = script::get_script(&client, "my-script").await?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod api_client;
pub mod composite_id;
pub mod config;
pub mod elasticsearch;
pub mod error;
pub mod kibana;
pub mod redaction;
pub mod transport;
pub mod version;

pub use api_client::{ApiClient, ClusterInfo, KIBANA_XSRF_HEADER};
pub use composite_id::CompositeId;
pub use config::{AuthMethod, ElasticsearchConfig, KibanaConfig, ProviderConfig};
pub use error::{Error, Result};
pub use redaction::Redactor;
pub use transport::{ApiResponse, Endpoint};
pub use version::{MinVersionEnforceable, ServerVersion};
