//! # elasticstack-provider
//!
//! Terraform resources for Elasticsearch and Kibana.
//!
//! - [`Provider`]: resolved configuration, the lazily built API client and
//!   the resource table
//! - [`Resource`]: typed CRUD per resource; [`DynResource`] adapts it to
//!   dynamic attribute values
//! - [`resources`]: stored scripts, ML anomaly detection jobs and security
//!   detection rules
//! - [`logging`]: `TF_LOG` driven tracing setup
//!
//! ## Example
//!
//! ```ignore
//! use elasticstack_clients::ProviderConfig;
//! use elasticstack_provider::{Provider, logging};
//!
//! logging::init(&logging::LoggingConfig::from_env())?;
//! let provider = Provider::new(ProviderConfig::default());
//! let client = provider.client().await?;
//! let script = provider.resource("elasticstack_elasticsearch_script").unwrap();
//! let response = script.read(&client, &state).await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod error;
pub mod events;
pub mod logging;
pub mod plan;
pub mod provider;
pub mod resource;
pub mod resources;

pub use error::{Error, Result};
pub use provider::{PROVIDER_NAME, Provider};
pub use resource::{DynResource, Resource, Response};
