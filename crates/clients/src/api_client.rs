//! The shared API client handed to every resource.

use std::sync::Arc;

use serde::Deserialize;
use tracing::instrument;

use crate::composite_id::CompositeId;
use crate::config::ProviderConfig;
use crate::error::{Error, Result};
use crate::redaction::Redactor;
use crate::transport::Endpoint;
use crate::version::ServerVersion;

/// Header Kibana requires on mutating requests.
pub const KIBANA_XSRF_HEADER: &str = "kbn-xsrf";

/// `GET /` response.
#[derive(Debug, Clone, Deserialize)]
pub struct ClusterInfo {
    /// Node name
    #[serde(default)]
    pub name: String,
    /// Cluster name
    #[serde(default)]
    pub cluster_name: String,
    /// Cluster UUID, the scope of every Elasticsearch composite ID
    pub cluster_uuid: String,
    /// Version block
    pub version: VersionInfo,
}

/// Version block shared by `GET /` and Kibana `GET /api/status`.
#[derive(Debug, Clone, Deserialize)]
pub struct VersionInfo {
    /// Version number such as `8.16.1`
    pub number: String,
}

#[derive(Debug, Deserialize)]
struct KibanaStatus {
    version: VersionInfo,
}

/// Elasticsearch and Kibana endpoints configured for the provider.
///
/// Either side may be absent; asking for an unconfigured side fails with
/// [`Error::ElasticsearchNotConfigured`] or [`Error::KibanaNotConfigured`].
#[derive(Debug, Clone)]
pub struct ApiClient {
    elasticsearch: Option<Endpoint>,
    kibana: Option<Endpoint>,
}

impl ApiClient {
    /// Builds the client from a resolved provider configuration.
    ///
    /// Every configured secret is registered with the transport redactor.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidEndpoint`] for malformed endpoints.
    pub fn from_config(config: &ProviderConfig) -> Result<Self> {
        let redactor = Arc::new(Redactor::new(config.secret_values()));

        let elasticsearch = config
            .elasticsearch
            .endpoints
            .first()
            .map(|base| {
                Endpoint::new(
                    base,
                    config.elasticsearch.auth(),
                    config.elasticsearch.insecure,
                    Arc::clone(&redactor),
                )
            })
            .transpose()?;

        let kibana = config
            .kibana
            .endpoints
            .first()
            .map(|base| {
                Endpoint::new(
                    base,
                    config.kibana.auth(),
                    config.kibana.insecure,
                    Arc::clone(&redactor),
                )
                .map(|endpoint| endpoint.with_header(KIBANA_XSRF_HEADER, "true"))
            })
            .transpose()?;

        tracing::debug!(
            elasticsearch = elasticsearch.as_ref().map(|e| e.base().as_str()),
            kibana = kibana.as_ref().map(|e| e.base().as_str()),
            secrets = redactor.secret_count(),
            "Configured API client"
        );

        Ok(Self {
            elasticsearch,
            kibana,
        })
    }

    /// Assembles a client from prebuilt endpoints.
    #[must_use]
    pub const fn from_endpoints(elasticsearch: Option<Endpoint>, kibana: Option<Endpoint>) -> Self {
        Self {
            elasticsearch,
            kibana,
        }
    }

    /// The Elasticsearch endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ElasticsearchNotConfigured`] if none was configured.
    pub fn elasticsearch(&self) -> Result<&Endpoint> {
        self.elasticsearch
            .as_ref()
            .ok_or(Error::ElasticsearchNotConfigured)
    }

    /// The Kibana endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::KibanaNotConfigured`] if none was configured.
    pub fn kibana(&self) -> Result<&Endpoint> {
        self.kibana.as_ref().ok_or(Error::KibanaNotConfigured)
    }

    /// `GET /` on Elasticsearch.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, failure statuses and malformed bodies.
    #[instrument(skip(self))]
    pub async fn cluster_info(&self) -> Result<ClusterInfo> {
        let es = self.elasticsearch()?;
        let url = es.url::<&str>(&[])?;
        es.get(url).await?.error_for_status()?.json()
    }

    /// Builds a composite ID scoped to the cluster UUID.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::cluster_info`].
    pub async fn id(&self, resource_id: &str) -> Result<CompositeId> {
        let info = self.cluster_info().await?;
        Ok(CompositeId::new(info.cluster_uuid, resource_id))
    }

    /// The Elasticsearch server version.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::cluster_info`]; also fails on unparsable versions.
    pub async fn server_version(&self) -> Result<ServerVersion> {
        let info = self.cluster_info().await?;
        ServerVersion::parse(&info.version.number)
    }

    /// The Kibana server version from `GET /api/status`.
    ///
    /// # Errors
    ///
    /// Fails on transport errors, failure statuses and malformed bodies.
    #[instrument(skip(self))]
    pub async fn kibana_version(&self) -> Result<ServerVersion> {
        let kibana = self.kibana()?;
        let url = kibana.url(&["api", "status"])?;
        let status: KibanaStatus = kibana.get(url).await?.error_for_status()?.json()?;
        ServerVersion::parse(&status.version.number)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::version::MinVersionEnforceable;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_for(es: Option<&str>, kibana: Option<&str>) -> ProviderConfig {
        let mut config = ProviderConfig::default();
        config.elasticsearch.endpoints = es.into_iter().map(String::from).collect();
        config.kibana.endpoints = kibana.into_iter().map(String::from).collect();
        config
    }

    #[test]
    fn test_unconfigured_sides() {
        let client = ApiClient::from_config(&ProviderConfig::default()).unwrap();
        assert!(matches!(client.elasticsearch(), Err(Error::ElasticsearchNotConfigured)));
        assert!(matches!(client.kibana(), Err(Error::KibanaNotConfigured)));
    }

    #[tokio::test]
    async fn test_cluster_id_and_version() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "node-1",
                "cluster_name": "docker-cluster",
                "cluster_uuid": "0a1b2c3d",
                "version": { "number": "8.15.2" }
            })))
            .mount(&server)
            .await;

        let client = ApiClient::from_config(&config_for(Some(&server.uri()), None)).unwrap();
        let id = client.id("s1").await.unwrap();
        assert_eq!(id.to_string(), "0a1b2c3d/s1");

        let version = client.server_version().await.unwrap();
        assert!(!version.enforce_min_version(&semver::Version::new(8, 16, 0)));
    }

    #[tokio::test]
    async fn test_kibana_version_sends_xsrf_header() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/status"))
            .and(header(KIBANA_XSRF_HEADER, "true"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "name": "kibana",
                "version": { "number": "8.16.0", "build_snapshot": false }
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = ApiClient::from_config(&config_for(None, Some(&server.uri()))).unwrap();
        let version = client.kibana_version().await.unwrap();
        assert_eq!(version.to_string(), "8.16.0");
    }

    #[tokio::test]
    async fn test_api_error_carries_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(ResponseTemplate::new(401).set_body_string("missing authentication"))
            .mount(&server)
            .await;

        let client = ApiClient::from_config(&config_for(Some(&server.uri()), None)).unwrap();
        let err = client.cluster_info().await.unwrap_err();
        let diags = err.to_diagnostics("Unable to get cluster info");
        assert_eq!(diags.error_count(), 1);
        assert_eq!(diags.iter().next().map(|d| d.detail.as_str()), Some("missing authentication"));
    }
}
