//! `new_terms` rules: alert on field values not seen in a history window.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{NewTermsRuleFields, RulePayload, RuleProps, RuleResponse};
use elasticstack_diagnostics::Diagnostics;
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "new_terms";

/// Processor for `new_terms` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct NewTermsRuleProcessor;

impl RuleProcessor for NewTermsRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::NewTerms(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let query = common::required(&model.query, "query", RULE_TYPE, diags);
        let new_terms_fields =
            common::required(&model.new_terms_fields, "new_terms_fields", RULE_TYPE, diags);
        let history_window_start = common::required(
            &model.history_window_start,
            "history_window_start",
            RULE_TYPE,
            diags,
        );
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, query, new_terms_fields, history_window_start) =
            (shared?, query?, new_terms_fields?, history_window_start?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::NewTerms(RuleProps::new(
            shared,
            NewTermsRuleFields {
                query,
                language: model.language.known_cloned(),
                new_terms_fields,
                history_window_start,
                index: model.index.known_cloned(),
                data_view_id: model.data_view_id.known_cloned(),
                filters,
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
            RuleResponse::NewTerms(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        let prior = common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.query = Value::Known(fields.query);
        model.language = Value::from_option(fields.language);
        model.new_terms_fields = Value::Known(fields.new_terms_fields);
        model.history_window_start = Value::Known(fields.history_window_start);
        model.index = common::string_list_from_api(&prior.index, fields.index);
        model.data_view_id = common::optional_string_from_api(&prior.data_view_id, fields.data_view_id);
        model.filters = common::filters_from_api(&prior.filters, fields.filters, "filters", diags);
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    #[test]
    fn test_all_required_fields_reported() {
        let model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        assert!(
            NewTermsRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        assert_eq!(diags.error_count(), 3);
    }

    #[test]
    fn test_response_sets_terms() {
        let response = resolve(json!({
            "type": "new_terms",
            "query": "*",
            "language": "kuery",
            "new_terms_fields": ["host.name", "user.name"],
            "history_window_start": "now-7d",
            "index": ["logs-*"]
        }));
        let mut model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        NewTermsRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert_eq!(
            model.new_terms_fields,
            Value::Known(vec!["host.name".to_string(), "user.name".to_string()])
        );
        assert_eq!(model.history_window_start, Value::from("now-7d"));
    }
}
