//! Detection engine rules: `/s/{space}/api/detection_engine/rules`.

use reqwest::{Method, Url};
use tracing::instrument;

use crate::api_client::ApiClient;
use crate::error::Result;
use crate::kibana::models::{RawRuleResponse, RulePayload};
use crate::kibana::space_segments;
use crate::transport::Endpoint;

fn rules_url(kibana: &Endpoint, space_id: &str, id: Option<&str>) -> Result<Url> {
    let mut segments = space_segments(space_id);
    segments.extend(["api", "detection_engine", "rules"]);
    let mut url = kibana.url(&segments)?;
    if let Some(id) = id {
        url.query_pairs_mut().append_pair("id", id);
    }
    Ok(url)
}

/// Creates a rule in `space_id`.
///
/// # Errors
///
/// Fails on transport errors, failure statuses and non-JSON bodies.
#[instrument(skip(client, payload), fields(rule_type = payload.rule_type()))]
pub async fn create_rule(
    client: &ApiClient,
    space_id: &str,
    payload: &RulePayload,
) -> Result<RawRuleResponse> {
    let kibana = client.kibana()?;
    let url = rules_url(kibana, space_id, None)?;
    kibana
        .send(Method::POST, url, Some(payload))
        .await?
        .error_for_status()?
        .json()
}

/// Fetches a rule by UUID; `None` when it does not exist.
///
/// # Errors
///
/// Fails on transport errors, non-404 failure statuses and non-JSON bodies.
#[instrument(skip(client))]
pub async fn get_rule(client: &ApiClient, space_id: &str, id: &str) -> Result<Option<RawRuleResponse>> {
    let kibana = client.kibana()?;
    let url = rules_url(kibana, space_id, Some(id))?;
    let response = kibana.get(url).await?;
    if response.is_not_found() {
        return Ok(None);
    }
    response.error_for_status()?.json().map(Some)
}

/// Replaces a rule. The payload must carry the rule `id`.
///
/// # Errors
///
/// Fails on transport errors, failure statuses and non-JSON bodies.
#[instrument(skip(client, payload), fields(rule_type = payload.rule_type()))]
pub async fn update_rule(
    client: &ApiClient,
    space_id: &str,
    payload: &RulePayload,
) -> Result<RawRuleResponse> {
    let kibana = client.kibana()?;
    let url = rules_url(kibana, space_id, None)?;
    kibana
        .send(Method::PUT, url, Some(payload))
        .await?
        .error_for_status()?
        .json()
}

/// Deletes a rule by UUID.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client))]
pub async fn delete_rule(client: &ApiClient, space_id: &str, id: &str) -> Result<()> {
    let kibana = client.kibana()?;
    let url = rules_url(kibana, space_id, Some(id))?;
    kibana.delete(url).await?.error_for_status()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderConfig;
    use crate::kibana::models::{EsqlRuleFields, RuleProps, RuleSeverity, SharedRuleParams};
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> ApiClient {
        let mut config = ProviderConfig::default();
        config.kibana.endpoints = vec![server.uri()];
        ApiClient::from_config(&config).unwrap()
    }

    fn esql_payload() -> RulePayload {
        RulePayload::Esql(RuleProps::new(
            SharedRuleParams {
                name: "Rare process".into(),
                description: "ES|QL".into(),
                risk_score: 21,
                severity: RuleSeverity::Low,
                ..SharedRuleParams::default()
            },
            EsqlRuleFields {
                query: "FROM logs-* | STATS c = COUNT(*) BY process.name".into(),
                language: Some("esql".into()),
                alert_suppression: None,
            },
        ))
    }

    #[tokio::test]
    async fn test_create_in_custom_space() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/s/security/api/detection_engine/rules"))
            .and(header("kbn-xsrf", "true"))
            .and(body_partial_json(json!({"type": "esql", "language": "esql"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc", "type": "esql"})))
            .expect(1)
            .mount(&server)
            .await;

        let raw = create_rule(&client_for(&server), "security", &esql_payload())
            .await
            .unwrap();
        assert_eq!(raw.id(), Some("abc"));
    }

    #[tokio::test]
    async fn test_get_in_default_space_without_prefix() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/detection_engine/rules"))
            .and(query_param("id", "missing"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "status_code": 404,
                "message": "id: \"missing\" not found"
            })))
            .mount(&server)
            .await;

        let rule = get_rule(&client_for(&server), "default", "missing").await.unwrap();
        assert!(rule.is_none());
    }

    #[tokio::test]
    async fn test_delete_failure_is_api_error() {
        let server = MockServer::start().await;
        Mock::given(method("DELETE"))
            .and(path("/api/detection_engine/rules"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = delete_rule(&client_for(&server), "default", "abc").await.unwrap_err();
        assert!(matches!(err, crate::Error::Api { status: 500, .. }));
    }
}
