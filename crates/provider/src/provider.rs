//! The provider: configuration, the shared API client and the resource table.

use std::sync::Arc;

use tokio::sync::OnceCell;

use elasticstack_clients::{ApiClient, ProviderConfig};
use elasticstack_diagnostics::Diagnostics;

use crate::resource::DynResource;
use crate::resources::{
    elasticsearch_ml_anomaly_detection_job::MlAnomalyDetectionJobResource,
    elasticsearch_script::ScriptResource,
    security_detection_rule::{SecurityDetectionRuleResource, registry_conflicts},
};

/// Provider name used in resource type prefixes.
pub const PROVIDER_NAME: &str = "elasticstack";

/// The configured provider.
///
/// The API client is built on first use and shared read-only by every
/// resource afterwards.
pub struct Provider {
    config: ProviderConfig,
    client: OnceCell<Arc<ApiClient>>,
    resources: Vec<Box<dyn DynResource>>,
}

impl std::fmt::Debug for Provider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Provider")
            .field("config", &self.config)
            .field("client_initialized", &self.client.initialized())
            .field(
                "resources",
                &self.resources.iter().map(|r| r.type_name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl Provider {
    /// Creates a provider from the provider block, with environment
    /// overrides applied.
    #[must_use]
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_resolved_config(config.with_env_overrides())
    }

    /// Creates a provider from an already resolved configuration.
    #[must_use]
    pub fn with_resolved_config(config: ProviderConfig) -> Self {
        for conflict in registry_conflicts() {
            tracing::error!(conflict = %conflict, "Detection rule processor registry is inconsistent");
        }
        Self {
            config,
            client: OnceCell::new(),
            resources: default_resources(),
        }
    }

    /// Creates a provider around a prebuilt client.
    #[must_use]
    pub fn with_client(client: ApiClient) -> Self {
        let provider = Self::with_resolved_config(ProviderConfig::default());
        // A fresh cell cannot be initialized yet
        let _ = provider.client.set(Arc::new(client));
        provider
    }

    /// Validates the configuration.
    #[must_use]
    pub fn validate(&self) -> Diagnostics {
        self.config.validate()
    }

    /// The resolved configuration.
    #[must_use]
    pub const fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// The shared API client, built on first call.
    ///
    /// # Errors
    ///
    /// Returns the validation or construction diagnostics.
    pub async fn client(&self) -> Result<Arc<ApiClient>, Diagnostics> {
        self.client
            .get_or_try_init(|| async {
                let diags = self.config.validate();
                if diags.has_error() {
                    return Err(diags);
                }
                ApiClient::from_config(&self.config)
                    .map(Arc::new)
                    .map_err(|err| err.to_diagnostics("Unable to create API client"))
            })
            .await
            .cloned()
    }

    /// Every resource the provider serves.
    pub fn resources(&self) -> impl Iterator<Item = &dyn DynResource> {
        self.resources.iter().map(|r| &**r)
    }

    /// Looks up a resource by type name.
    #[must_use]
    pub fn resource(&self, type_name: &str) -> Option<&dyn DynResource> {
        self.resources().find(|r| r.type_name() == type_name)
    }
}

fn default_resources() -> Vec<Box<dyn DynResource>> {
    vec![
        Box::new(ScriptResource),
        Box::new(MlAnomalyDetectionJobResource),
        Box::new(SecurityDetectionRuleResource),
    ]
}
