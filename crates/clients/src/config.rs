//! Provider configuration.
//!
//! The provider block is deserialized into [`ProviderConfig`], then
//! environment variables are layered on top. Environment values win over
//! the block, matching the behavior users expect from `TF_VAR`-style setups
//! in CI.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use elasticstack_diagnostics::{AttributePath, Diagnostics};

/// Elasticsearch endpoints, comma separated
pub const ENV_ES_ENDPOINTS: &str = "ELASTICSEARCH_ENDPOINTS";
/// Elasticsearch basic auth username
pub const ENV_ES_USERNAME: &str = "ELASTICSEARCH_USERNAME";
/// Elasticsearch basic auth password
pub const ENV_ES_PASSWORD: &str = "ELASTICSEARCH_PASSWORD";
/// Elasticsearch API key
pub const ENV_ES_API_KEY: &str = "ELASTICSEARCH_API_KEY";
/// Elasticsearch bearer token
pub const ENV_ES_BEARER_TOKEN: &str = "ELASTICSEARCH_BEARER_TOKEN";
/// Skip TLS verification for Elasticsearch
pub const ENV_ES_INSECURE: &str = "ELASTICSEARCH_INSECURE";
/// Kibana endpoint
pub const ENV_KIBANA_ENDPOINT: &str = "KIBANA_ENDPOINT";
/// Kibana basic auth username
pub const ENV_KIBANA_USERNAME: &str = "KIBANA_USERNAME";
/// Kibana basic auth password
pub const ENV_KIBANA_PASSWORD: &str = "KIBANA_PASSWORD";
/// Kibana API key
pub const ENV_KIBANA_API_KEY: &str = "KIBANA_API_KEY";
/// Skip TLS verification for Kibana
pub const ENV_KIBANA_INSECURE: &str = "KIBANA_INSECURE";

/// The `provider "elasticstack"` block.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Elasticsearch connection settings
    pub elasticsearch: ElasticsearchConfig,
    /// Kibana connection settings
    pub kibana: KibanaConfig,
}

/// Elasticsearch connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct ElasticsearchConfig {
    /// Cluster endpoints; the first one is used
    pub endpoints: Vec<String>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Base64 encoded API key
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// Bearer token
    #[serde(deserialize_with = "deserialize_secret")]
    pub bearer_token: Option<SecretString>,
    /// Disable certificate verification
    pub insecure: bool,
}

/// Kibana connection settings.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct KibanaConfig {
    /// Kibana endpoints; the first one is used
    pub endpoints: Vec<String>,
    /// Basic auth username
    pub username: Option<String>,
    /// Basic auth password
    #[serde(deserialize_with = "deserialize_secret")]
    pub password: Option<SecretString>,
    /// Base64 encoded API key
    #[serde(deserialize_with = "deserialize_secret")]
    pub api_key: Option<SecretString>,
    /// Disable certificate verification
    pub insecure: bool,
}

/// How a client authenticates against one endpoint.
#[derive(Debug, Clone, Default)]
pub enum AuthMethod {
    /// Anonymous access
    #[default]
    None,
    /// HTTP basic auth
    Basic {
        /// Username
        username: String,
        /// Password
        password: SecretString,
    },
    /// `Authorization: ApiKey ...`
    ApiKey(SecretString),
    /// `Authorization: Bearer ...`
    Bearer(SecretString),
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<Option<SecretString>, D::Error>
where
    D: Deserializer<'de>,
{
    let value: Option<String> = Option::deserialize(deserializer)?;
    Ok(value.filter(|s| !s.is_empty()).map(SecretString::from))
}

fn parse_bool_env(name: &str, raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" => Some(true),
        "0" | "false" | "no" => Some(false),
        _ => {
            tracing::warn!(variable = name, value = raw, "Ignoring non-boolean environment value");
            None
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

fn validate_endpoints(endpoints: &[String], attribute: &str, diags: &mut Diagnostics) {
    for (index, endpoint) in endpoints.iter().enumerate() {
        let path = AttributePath::root(attribute)
            .at_name("endpoints")
            .at_list_index(index);
        match reqwest::Url::parse(endpoint) {
            Ok(url) if matches!(url.scheme(), "http" | "https") => {}
            Ok(url) => diags.add_attribute_error(
                path,
                "Invalid endpoint",
                format!("{endpoint:?} uses unsupported scheme {:?}", url.scheme()),
            ),
            Err(err) => diags.add_attribute_error(
                path,
                "Invalid endpoint",
                format!("{endpoint:?} is not a valid URL: {err}"),
            ),
        }
    }
}

fn validate_credentials(
    username: Option<&String>,
    password: Option<&SecretString>,
    api_key: Option<&SecretString>,
    bearer_token: Option<&SecretString>,
    attribute: &str,
    diags: &mut Diagnostics,
) {
    let root = AttributePath::root(attribute);
    if api_key.is_some() && (username.is_some() || password.is_some()) {
        diags.add_attribute_error(
            root.at_name("api_key"),
            "Conflicting credentials",
            "api_key cannot be combined with username/password",
        );
    }
    if bearer_token.is_some() && (api_key.is_some() || username.is_some()) {
        diags.add_attribute_error(
            root.at_name("bearer_token"),
            "Conflicting credentials",
            "bearer_token cannot be combined with api_key or username/password",
        );
    }
    if username.is_some() != password.is_some() {
        diags.add_attribute_error(
            root.at_name("username"),
            "Incomplete credentials",
            "username and password must be set together",
        );
    }
}

impl ProviderConfig {
    /// Applies environment overrides from the process environment.
    #[must_use]
    pub fn with_env_overrides(self) -> Self {
        self.with_env_overrides_from(|name| std::env::var(name).ok())
    }

    /// Applies environment overrides from an arbitrary lookup.
    ///
    /// After the overrides, Kibana inherits the Elasticsearch credentials
    /// when it has none of its own.
    #[must_use]
    pub fn with_env_overrides_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let env = |name: &str| non_empty(lookup(name));

        let es = &mut self.elasticsearch;
        if let Some(endpoints) = env(ENV_ES_ENDPOINTS) {
            es.endpoints = endpoints
                .split(',')
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(String::from)
                .collect();
        }
        if let Some(username) = env(ENV_ES_USERNAME) {
            es.username = Some(username);
        }
        if let Some(password) = env(ENV_ES_PASSWORD) {
            es.password = Some(SecretString::from(password));
        }
        if let Some(api_key) = env(ENV_ES_API_KEY) {
            es.api_key = Some(SecretString::from(api_key));
        }
        if let Some(token) = env(ENV_ES_BEARER_TOKEN) {
            es.bearer_token = Some(SecretString::from(token));
        }
        if let Some(insecure) =
            env(ENV_ES_INSECURE).and_then(|raw| parse_bool_env(ENV_ES_INSECURE, &raw))
        {
            es.insecure = insecure;
        }

        let kb = &mut self.kibana;
        if let Some(endpoint) = env(ENV_KIBANA_ENDPOINT) {
            kb.endpoints = vec![endpoint.trim().to_string()];
        }
        if let Some(username) = env(ENV_KIBANA_USERNAME) {
            kb.username = Some(username);
        }
        if let Some(password) = env(ENV_KIBANA_PASSWORD) {
            kb.password = Some(SecretString::from(password));
        }
        if let Some(api_key) = env(ENV_KIBANA_API_KEY) {
            kb.api_key = Some(SecretString::from(api_key));
        }
        if let Some(insecure) =
            env(ENV_KIBANA_INSECURE).and_then(|raw| parse_bool_env(ENV_KIBANA_INSECURE, &raw))
        {
            kb.insecure = insecure;
        }

        self.kibana.inherit_credentials(&self.elasticsearch);
        self
    }

    /// Checks endpoints and credential combinations.
    #[must_use]
    pub fn validate(&self) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let es = &self.elasticsearch;
        validate_endpoints(&es.endpoints, "elasticsearch", &mut diags);
        validate_credentials(
            es.username.as_ref(),
            es.password.as_ref(),
            es.api_key.as_ref(),
            es.bearer_token.as_ref(),
            "elasticsearch",
            &mut diags,
        );
        let kb = &self.kibana;
        validate_endpoints(&kb.endpoints, "kibana", &mut diags);
        validate_credentials(
            kb.username.as_ref(),
            kb.password.as_ref(),
            kb.api_key.as_ref(),
            None,
            "kibana",
            &mut diags,
        );
        diags
    }

    /// Every configured secret value, for log redaction.
    #[must_use]
    pub fn secret_values(&self) -> Vec<String> {
        let es = &self.elasticsearch;
        let kb = &self.kibana;
        [
            es.password.as_ref(),
            es.api_key.as_ref(),
            es.bearer_token.as_ref(),
            kb.password.as_ref(),
            kb.api_key.as_ref(),
        ]
        .into_iter()
        .flatten()
        .map(|s| s.expose_secret().to_string())
        .collect()
    }
}

impl ElasticsearchConfig {
    /// Resolves the configured credentials into one auth method.
    ///
    /// Precedence is API key, then bearer token, then basic auth.
    #[must_use]
    pub fn auth(&self) -> AuthMethod {
        if let Some(key) = &self.api_key {
            return AuthMethod::ApiKey(key.clone());
        }
        if let Some(token) = &self.bearer_token {
            return AuthMethod::Bearer(token.clone());
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => AuthMethod::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => AuthMethod::None,
        }
    }
}

impl KibanaConfig {
    fn has_credentials(&self) -> bool {
        self.username.is_some() || self.password.is_some() || self.api_key.is_some()
    }

    fn inherit_credentials(&mut self, es: &ElasticsearchConfig) {
        if self.has_credentials() {
            return;
        }
        self.username.clone_from(&es.username);
        self.password.clone_from(&es.password);
        self.api_key.clone_from(&es.api_key);
    }

    /// Resolves the configured credentials into one auth method.
    #[must_use]
    pub fn auth(&self) -> AuthMethod {
        if let Some(key) = &self.api_key {
            return AuthMethod::ApiKey(key.clone());
        }
        match (&self.username, &self.password) {
            (Some(username), Some(password)) => AuthMethod::Basic {
                username: username.clone(),
                password: password.clone(),
            },
            _ => AuthMethod::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_VARS: [&str; 11] = [
        ENV_ES_ENDPOINTS,
        ENV_ES_USERNAME,
        ENV_ES_PASSWORD,
        ENV_ES_API_KEY,
        ENV_ES_BEARER_TOKEN,
        ENV_ES_INSECURE,
        ENV_KIBANA_ENDPOINT,
        ENV_KIBANA_USERNAME,
        ENV_KIBANA_PASSWORD,
        ENV_KIBANA_API_KEY,
        ENV_KIBANA_INSECURE,
    ];

    fn unset_all() -> Vec<(&'static str, Option<&'static str>)> {
        ALL_VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    fn test_deserialize_block() {
        let config: ProviderConfig = serde_json::from_value(serde_json::json!({
            "elasticsearch": {
                "endpoints": ["https://es.example.com:9200"],
                "username": "elastic",
                "password": "changeme"
            }
        }))
        .unwrap();
        assert_eq!(config.elasticsearch.endpoints, vec!["https://es.example.com:9200"]);
        assert!(matches!(config.elasticsearch.auth(), AuthMethod::Basic { .. }));
        assert!(config.kibana.endpoints.is_empty());
    }

    #[test]
    fn test_env_overrides_block() {
        let mut vars = unset_all();
        vars.push((ENV_ES_ENDPOINTS, Some("http://a:9200, http://b:9200")));
        vars.push((ENV_ES_API_KEY, Some("ZW52LWtleQ==")));
        vars.push((ENV_ES_INSECURE, Some("true")));
        temp_env::with_vars(vars, || {
            let mut config = ProviderConfig::default();
            config.elasticsearch.endpoints = vec!["http://block:9200".to_string()];
            let config = config.with_env_overrides();

            assert_eq!(
                config.elasticsearch.endpoints,
                vec!["http://a:9200", "http://b:9200"]
            );
            assert!(config.elasticsearch.insecure);
            match config.elasticsearch.auth() {
                AuthMethod::ApiKey(key) => assert_eq!(key.expose_secret(), "ZW52LWtleQ=="),
                other => panic!("unexpected auth {other:?}"),
            }
        });
    }

    #[test]
    fn test_kibana_inherits_es_credentials() {
        let mut vars = unset_all();
        vars.push((ENV_ES_USERNAME, Some("elastic")));
        vars.push((ENV_ES_PASSWORD, Some("changeme")));
        vars.push((ENV_KIBANA_ENDPOINT, Some("http://localhost:5601")));
        temp_env::with_vars(vars, || {
            let config = ProviderConfig::default().with_env_overrides();
            assert_eq!(config.kibana.endpoints, vec!["http://localhost:5601"]);
            match config.kibana.auth() {
                AuthMethod::Basic { username, password } => {
                    assert_eq!(username, "elastic");
                    assert_eq!(password.expose_secret(), "changeme");
                }
                other => panic!("unexpected auth {other:?}"),
            }
        });
    }

    #[test]
    fn test_kibana_keeps_own_credentials() {
        let config = ProviderConfig::default().with_env_overrides_from(|name| match name {
            ENV_ES_USERNAME => Some("elastic".into()),
            ENV_ES_PASSWORD => Some("changeme".into()),
            ENV_KIBANA_API_KEY => Some("a2liYW5hLWtleQ==".into()),
            _ => None,
        });
        assert!(matches!(config.kibana.auth(), AuthMethod::ApiKey(_)));
        assert!(config.kibana.username.is_none());
    }

    #[test]
    fn test_invalid_bool_is_ignored() {
        let config = ProviderConfig::default()
            .with_env_overrides_from(|name| (name == ENV_ES_INSECURE).then(|| "maybe".into()));
        assert!(!config.elasticsearch.insecure);
    }

    #[test]
    fn test_validate_conflicting_credentials() {
        let config = ProviderConfig::default().with_env_overrides_from(|name| match name {
            ENV_ES_USERNAME => Some("elastic".into()),
            ENV_ES_PASSWORD => Some("changeme".into()),
            ENV_ES_API_KEY => Some("a2V5LWtleQ==".into()),
            _ => None,
        });
        let diags = config.validate();
        assert!(diags.has_error());
        assert!(diags.errors().any(|d| d.summary == "Conflicting credentials"));
    }

    #[test]
    fn test_validate_bad_endpoint() {
        let mut config = ProviderConfig::default();
        config.elasticsearch.endpoints = vec!["ftp://nope".into(), "not a url".into()];
        let diags = config.validate();
        assert_eq!(diags.error_count(), 2);
    }

    #[test]
    fn test_secret_values() {
        let config = ProviderConfig::default().with_env_overrides_from(|name| match name {
            ENV_ES_USERNAME => Some("elastic".into()),
            ENV_ES_PASSWORD => Some("changeme".into()),
            _ => None,
        });
        // Kibana inherited the password, so it appears twice
        assert_eq!(config.secret_values(), vec!["changeme", "changeme"]);
    }
}
