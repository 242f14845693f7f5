//! `esql` rules. The query names its own sources, so there are no index
//! patterns, data view or filters.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{EsqlRuleFields, RulePayload, RuleProps, RuleResponse};
use elasticstack_diagnostics::Diagnostics;
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "esql";

/// Processor for `esql` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EsqlRuleProcessor;

impl RuleProcessor for EsqlRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::Esql(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let query = common::required(&model.query, "query", RULE_TYPE, diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, query) = (shared?, query?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::Esql(RuleProps::new(
            shared,
            EsqlRuleFields {
                query,
                language: Some(
                    model
                        .language
                        .known_cloned()
                        .unwrap_or_else(|| RULE_TYPE.to_string()),
                ),
                alert_suppression,
            },
        )))
    }

    fn update_from_response(
        &self,
        model: &mut DetectionRuleModel,
        response: RuleResponse,
        diags: &mut Diagnostics,
    ) {
        let body = match response {
            RuleResponse::Esql(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.query = Value::Known(fields.query);
        model.language = Value::from_option(fields.language);
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    #[test]
    fn test_payload_has_no_index_fields() {
        let mut model = base_model(RULE_TYPE);
        model.query = Value::from("FROM logs-* | WHERE event.outcome == \"failure\"");
        model.index = Value::Known(vec!["ignored-*".into()]);
        let mut diags = Diagnostics::new();
        let payload = EsqlRuleProcessor
            .to_create_props(&model, &version("8.16.0"), &mut diags)
            .unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["language"], "esql");
        assert!(body.get("index").is_none());
        assert!(body.get("filters").is_none());
    }

    #[test]
    fn test_response_nulls_index() {
        let response = resolve(json!({"type": "esql", "query": "FROM logs | LIMIT 10", "language": "esql"}));
        let mut model = base_model(RULE_TYPE);
        model.index = Value::Unknown;
        let mut diags = Diagnostics::new();
        EsqlRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert_eq!(model.index, Value::Null);
        assert_eq!(model.query, Value::from("FROM logs | LIMIT 10"));
    }
}
