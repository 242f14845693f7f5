//! `query` rules: KQL or Lucene over index patterns.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{QueryRuleFields, RulePayload, RuleProps, RuleResponse};
use elasticstack_diagnostics::Diagnostics;
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "query";

/// Processor for `query` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct QueryRuleProcessor;

impl RuleProcessor for QueryRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::Query(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let shared = shared?;
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::Query(RuleProps::new(
            shared,
            QueryRuleFields {
                query: model.query.known_cloned(),
                language: model.language.known_cloned(),
                index: model.index.known_cloned(),
                data_view_id: model.data_view_id.known_cloned(),
                filters,
                saved_id: model.saved_id.known_cloned(),
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
            RuleResponse::Query(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        let prior = common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.query = Value::from_option(fields.query);
        model.language = Value::from_option(fields.language);
        model.index = common::string_list_from_api(&prior.index, fields.index);
        model.data_view_id = common::optional_string_from_api(&prior.data_view_id, fields.data_view_id);
        model.filters = common::filters_from_api(&prior.filters, fields.filters, "filters", diags);
        model.saved_id = common::optional_string_from_api(&prior.saved_id, fields.saved_id);
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}
