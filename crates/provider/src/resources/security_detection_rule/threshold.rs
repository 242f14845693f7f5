//! `threshold` rules: alert when event counts per group cross a value.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{
    OneOrMany, RulePayload, RuleProps, RuleResponse, Threshold, ThresholdCardinality, ThresholdRuleFields,
};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{
    AttrValue, IntoAttr, Tristate, Value, list_type_to_slice, object_type_to_struct,
};

use super::common;
use super::models::{DetectionRuleModel, ThresholdCardinalityModel, ThresholdModel};
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "threshold";

/// Processor for `threshold` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThresholdRuleProcessor;

fn threshold_to_api(
    model: ThresholdModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<Threshold> {
    let value = model.value.known_cloned();
    if value.is_none() {
        diags.add_attribute_error(
            path.at_name("value"),
            "Missing required attribute",
            "value must be set",
        );
    }
    let cardinality = list_type_to_slice(
        &model.cardinality,
        &path.at_name("cardinality"),
        diags,
        |c: ThresholdCardinalityModel, path, diags| match (c.field.known_cloned(), c.value.known_cloned()) {
            (Some(field), Some(value)) => Some(ThresholdCardinality { field, value }),
            _ => {
                diags.add_attribute_error(
                    path.clone(),
                    "Missing required attribute",
                    "cardinality entries need both field and value",
                );
                None
            }
        },
    );
    Some(Threshold {
        field: OneOrMany::from(model.field.known_cloned().unwrap_or_default()),
        value: value?,
        cardinality,
    })
}

fn threshold_from_api(prior: &AttrValue, threshold: Threshold) -> AttrValue {
    let prior_field = match prior.get("field") {
        Some(AttrValue::List(items)) if items.is_empty() => Value::Known(Vec::new()),
        _ => Value::Null,
    };
    ThresholdModel {
        field: common::string_list_from_api(&prior_field, Some(threshold.field.into_vec())),
        value: Value::Known(threshold.value),
        cardinality: threshold.cardinality.map_or(AttrValue::Null, |entries| {
            entries
                .into_iter()
                .map(|c| ThresholdCardinalityModel {
                    field: Value::Known(c.field),
                    value: Value::Known(c.value),
                })
                .collect::<Vec<_>>()
                .into_attr()
        }),
    }
    .into_attr()
}

impl RuleProcessor for ThresholdRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::Threshold(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let query = common::required(&model.query, "query", RULE_TYPE, diags);
        let threshold_path = AttributePath::root("threshold");
        if !model.threshold.is_known() {
            diags.add_attribute_error(
                threshold_path.clone(),
                "Missing required attribute",
                "threshold is required for threshold rules",
            );
        }
        let threshold = object_type_to_struct(&model.threshold, &threshold_path, diags, threshold_to_api);
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let alert_suppression = common::threshold_suppression_to_api(&model.alert_suppression, diags);
        let (shared, query, threshold) = (shared?, query?, threshold?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::Threshold(RuleProps::new(
            shared,
            ThresholdRuleFields {
                query,
                language: model.language.known_cloned(),
                index: model.index.known_cloned(),
                data_view_id: model.data_view_id.known_cloned(),
                filters,
                saved_id: model.saved_id.known_cloned(),
                threshold,
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
            RuleResponse::Threshold(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        let prior = common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.query = Value::Known(fields.query);
        model.language = Value::from_option(fields.language);
        model.index = common::string_list_from_api(&prior.index, fields.index);
        model.data_view_id = common::optional_string_from_api(&prior.data_view_id, fields.data_view_id);
        model.filters = common::filters_from_api(&prior.filters, fields.filters, "filters", diags);
        model.saved_id = common::optional_string_from_api(&prior.saved_id, fields.saved_id);
        model.threshold = threshold_from_api(&prior.threshold, fields.threshold);
        model.alert_suppression = common::threshold_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    fn threshold_model() -> DetectionRuleModel {
        let mut model = base_model(RULE_TYPE);
        model.query = Value::from("event.outcome: failure");
        model.threshold = AttrValue::object([
            ("field", AttrValue::list([AttrValue::String("user.name".into())])),
            ("value", AttrValue::Int64(25)),
            (
                "cardinality",
                AttrValue::list([AttrValue::object([
                    ("field", AttrValue::String("source.ip".into())),
                    ("value", AttrValue::Int64(3)),
                ])]),
            ),
        ]);
        model.alert_suppression = AttrValue::object([("duration", AttrValue::String("1h".into()))]);
        model
    }

    #[test]
    fn test_threshold_payload() {
        let mut diags = Diagnostics::new();
        let payload = ThresholdRuleProcessor
            .to_create_props(&threshold_model(), &version("8.16.0"), &mut diags)
            .unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body["threshold"],
            json!({"field": ["user.name"], "value": 25, "cardinality": [{"field": "source.ip", "value": 3}]})
        );
        assert_eq!(body["alert_suppression"], json!({"duration": {"value": 1, "unit": "h"}}));
    }

    #[test]
    fn test_missing_threshold() {
        let mut model = threshold_model();
        model.threshold = AttrValue::Null;
        let mut diags = Diagnostics::new();
        assert!(
            ThresholdRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_single_field_response() {
        let response = resolve(json!({
            "type": "threshold",
            "query": "event.outcome: failure",
            "language": "kuery",
            "threshold": {"field": "user.name", "value": 25},
            "alert_suppression": {"duration": {"value": 1, "unit": "h"}}
        }));
        let mut model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        ThresholdRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert!(!diags.has_error());
        assert_eq!(
            model.threshold,
            AttrValue::object([
                ("field", AttrValue::list([AttrValue::String("user.name".into())])),
                ("value", AttrValue::Int64(25)),
                ("cardinality", AttrValue::Null),
            ])
        );
        assert_eq!(
            model.alert_suppression.get("duration"),
            Some(&AttrValue::String("1h".into()))
        );
    }
}
