//! `eql` rules: event sequences in EQL.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{EqlRuleFields, RulePayload, RuleProps, RuleResponse};
use elasticstack_diagnostics::Diagnostics;
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "eql";

/// Processor for `eql` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqlRuleProcessor;

impl RuleProcessor for EqlRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::Eql(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let query = common::required(&model.query, "query", RULE_TYPE, diags);
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, query) = (shared?, query?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::Eql(RuleProps::new(
            shared,
            EqlRuleFields {
                query,
                language: model.language.known_cloned(),
                index: model.index.known_cloned(),
                data_view_id: model.data_view_id.known_cloned(),
                filters,
                tiebreaker_field: model.tiebreaker_field.known_cloned(),
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
            RuleResponse::Eql(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        let prior = common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.query = Value::Known(fields.query);
        model.language = Value::from_option(fields.language);
        model.index = common::string_list_from_api(&prior.index, fields.index);
        model.data_view_id = common::optional_string_from_api(&prior.data_view_id, fields.data_view_id);
        model.filters = common::filters_from_api(&prior.filters, fields.filters, "filters", diags);
        model.tiebreaker_field =
            common::optional_string_from_api(&prior.tiebreaker_field, fields.tiebreaker_field);
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    #[test]
    fn test_query_is_required() {
        let model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        assert!(
            EqlRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        let error = diags.errors().next().unwrap();
        assert_eq!(error.detail, "query is required for eql rules");
    }

    #[test]
    fn test_round_trip_keeps_tiebreaker() {
        let mut model = base_model(RULE_TYPE);
        model.query = Value::from("sequence by host.id [process where true] [network where true]");
        model.tiebreaker_field = Value::from("event.sequence");
        let mut diags = Diagnostics::new();
        let payload = EqlRuleProcessor
            .to_create_props(&model, &version("8.16.0"), &mut diags)
            .unwrap();
        let mut body = serde_json::to_value(&payload).unwrap();
        body["id"] = json!("6f0f7b1c");
        body["language"] = json!("eql");

        let mut read = base_model(RULE_TYPE);
        EqlRuleProcessor.update_from_response(&mut read, resolve(body), &mut diags);
        assert!(!diags.has_error());
        assert_eq!(read.query, model.query);
        assert_eq!(read.tiebreaker_field, model.tiebreaker_field);
        assert_eq!(read.language, Value::from("eql"));
        assert_eq!(read.index, Value::Null);
    }
}
