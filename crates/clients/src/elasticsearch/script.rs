//! Stored scripts: `_scripts/{id}`.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use crate::api_client::ApiClient;
use crate::error::Result;

/// A stored script.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Script {
    /// Script language, `painless` or `mustache`
    pub lang: String,
    /// Script source
    pub source: String,
    /// Default parameters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Serialize)]
struct PutScriptBody<'a> {
    script: &'a Script,
}

#[derive(Deserialize)]
struct GetScriptResponse {
    #[serde(default)]
    found: bool,
    script: Option<Script>,
}

/// Creates or replaces a stored script.
///
/// `context` selects the `_scripts/{id}/{context}` form, which makes
/// Elasticsearch compile the script against that context up front.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client, script))]
pub async fn put_script(
    client: &ApiClient,
    script_id: &str,
    context: Option<&str>,
    script: &Script,
) -> Result<()> {
    let es = client.elasticsearch()?;
    let mut segments = vec!["_scripts", script_id];
    segments.extend(context);
    let url = es.url(&segments)?;
    es.send(Method::PUT, url, Some(&PutScriptBody { script }))
        .await?
        .error_for_status()?;
    Ok(())
}

/// Fetches a stored script; `None` when it does not exist.
///
/// # Errors
///
/// Fails on transport errors, non-404 failure statuses and malformed bodies.
#[instrument(skip(client))]
pub async fn get_script(client: &ApiClient, script_id: &str) -> Result<Option<Script>> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_scripts", script_id])?;
    let response = es.get(url).await?;
    if response.is_not_found() {
        return Ok(None);
    }
    let body: GetScriptResponse = response.error_for_status()?.json()?;
    Ok(body.script.filter(|_| body.found))
}

/// Deletes a stored script.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client))]
pub async fn delete_script(client: &ApiClient, script_id: &str) -> Result<()> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_scripts", script_id])?;
    es.delete(url).await?.error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use serde_json::json;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> ApiClient {
        let mut config = ProviderConfig::default();
        config.elasticsearch.endpoints = vec![server.uri()];
        ApiClient::from_config(&config).unwrap()
    }

    #[tokio::test]
    async fn test_put_with_context() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/_scripts/s1/score"))
            .and(body_json(json!({"script": {"lang": "painless", "source": "1+1"}})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"acknowledged": true})))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let script = Script {
            lang: "painless".into(),
            source: "1+1".into(),
            params: None,
        };
        put_script(&client, "s1", Some("score"), &script).await.unwrap();
    }

    #[tokio::test]
    async fn test_get_missing_is_none() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_scripts/gone"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({"_id": "gone", "found": false})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        assert_eq!(get_script(&client, "gone").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_get_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/_scripts/s1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "_id": "s1",
                "found": true,
                "script": {"lang": "painless", "source": "1+1"}
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let script = get_script(&client, "s1").await.unwrap().unwrap();
        assert_eq!(script.lang, "painless");
        assert!(script.params.is_none());
    }
}
