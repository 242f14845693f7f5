//! `saved_query` rules: run a saved query by ID.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{RulePayload, RuleProps, RuleResponse, SavedQueryRuleFields};
use elasticstack_diagnostics::Diagnostics;
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "saved_query";

/// Processor for `saved_query` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct SavedQueryRuleProcessor;

impl RuleProcessor for SavedQueryRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::SavedQuery(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let saved_id = common::required(&model.saved_id, "saved_id", RULE_TYPE, diags);
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, saved_id) = (shared?, saved_id?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::SavedQuery(RuleProps::new(
            shared,
            SavedQueryRuleFields {
                saved_id,
                query: model.query.known_cloned(),
                language: model.language.known_cloned(),
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
            RuleResponse::SavedQuery(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        let prior = common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.saved_id = Value::Known(fields.saved_id);
        model.query = common::optional_string_from_api(&prior.query, fields.query);
        model.language = Value::from_option(fields.language);
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
    fn test_saved_id_is_required() {
        let model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        assert!(
            SavedQueryRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_update_props_carry_id() {
        let mut model = base_model(RULE_TYPE);
        model.saved_id = Value::from("failed-logins");
        let mut diags = Diagnostics::new();
        let payload = SavedQueryRuleProcessor
            .to_update_props(&model, "6f0f7b1c", &version("8.16.0"), &mut diags)
            .unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["id"], "6f0f7b1c");
        assert_eq!(body["saved_id"], "failed-logins");
        assert_eq!(body["type"], "saved_query");
    }

    #[test]
    fn test_response_sets_saved_id() {
        let response = resolve(json!({"type": "saved_query", "saved_id": "failed-logins", "language": "kuery"}));
        let mut model = base_model(RULE_TYPE);
        model.query = Value::Unknown;
        let mut diags = Diagnostics::new();
        SavedQueryRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert_eq!(model.saved_id, Value::from("failed-logins"));
        assert_eq!(model.query, Value::Null);
    }
}
