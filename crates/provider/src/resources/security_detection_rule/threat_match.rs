//! `threat_match` rules: source events matched against indicator indices.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{
    RulePayload, RuleProps, RuleResponse, ThreatMappingEntry, ThreatMappingItem, ThreatMatchRuleFields,
};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{AttrValue, IntoAttr, Value, list_type_to_slice};

use super::common;
use super::models::{DetectionRuleModel, ThreatMappingEntryModel, ThreatMappingModel};
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "threat_match";

/// Processor for `threat_match` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreatMatchRuleProcessor;

fn mapping_to_api(
    item: ThreatMappingModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<ThreatMappingItem> {
    let entries = list_type_to_slice(
        &item.entries,
        &path.at_name("entries"),
        diags,
        |entry: ThreatMappingEntryModel, path, diags| {
            let mut field_of = |value: &Value<String>, name: &str| {
                let known = value.known_cloned();
                if known.is_none() {
                    diags.add_attribute_error(
                        path.at_name(name),
                        "Missing required attribute",
                        format!("{name} must be set"),
                    );
                }
                known
            };
            let field = field_of(&entry.field, "field");
            let entry_type = field_of(&entry.entry_type, "type");
            let value = field_of(&entry.value, "value");
            Some(ThreatMappingEntry {
                field: field?,
                entry_type: entry_type?,
                value: value?,
            })
        },
    );
    Some(ThreatMappingItem { entries: entries? })
}

fn mapping_from_api(items: Vec<ThreatMappingItem>) -> AttrValue {
    items
        .into_iter()
        .map(|item| ThreatMappingModel {
            entries: item
                .entries
                .into_iter()
                .map(|entry| ThreatMappingEntryModel {
                    field: Value::Known(entry.field),
                    entry_type: Value::Known(entry.entry_type),
                    value: Value::Known(entry.value),
                })
                .collect::<Vec<_>>()
                .into_attr(),
        })
        .collect::<Vec<_>>()
        .into_attr()
}

impl RuleProcessor for ThreatMatchRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::ThreatMatch(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let query = common::required(&model.query, "query", RULE_TYPE, diags);
        let threat_index = common::required(&model.threat_index, "threat_index", RULE_TYPE, diags);
        let threat_mapping = list_type_to_slice(
            &model.threat_mapping,
            &AttributePath::root("threat_mapping"),
            diags,
            mapping_to_api,
        );
        if !matches!(&model.threat_mapping, AttrValue::List(items) if !items.is_empty()) {
            diags.add_attribute_error(
                AttributePath::root("threat_mapping"),
                "Missing required attribute",
                "threat_mapping is required for threat_match rules",
            );
        }
        let filters = common::filters_to_api(&model.filters, "filters", diags);
        let threat_filters = common::filters_to_api(&model.threat_filters, "threat_filters", diags);
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, query, threat_index, threat_mapping) =
            (shared?, query?, threat_index?, threat_mapping?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::ThreatMatch(RuleProps::new(
            shared,
            ThreatMatchRuleFields {
                query,
                language: model.language.known_cloned(),
                index: model.index.known_cloned(),
                data_view_id: model.data_view_id.known_cloned(),
                filters,
                saved_id: model.saved_id.known_cloned(),
                threat_index,
                threat_mapping,
                threat_query: model.threat_query.known_cloned(),
                threat_indicator_path: model.threat_indicator_path.known_cloned(),
                threat_filters,
                concurrent_searches: model.concurrent_searches.known_cloned(),
                items_per_search: model.items_per_search.known_cloned(),
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
            RuleResponse::ThreatMatch(body) => body,
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
        model.threat_index = Value::Known(fields.threat_index);
        model.threat_mapping = mapping_from_api(fields.threat_mapping);
        model.threat_query = common::optional_string_from_api(&prior.threat_query, fields.threat_query);
        model.threat_indicator_path =
            common::optional_string_from_api(&prior.threat_indicator_path, fields.threat_indicator_path);
        model.threat_filters =
            common::filters_from_api(&prior.threat_filters, fields.threat_filters, "threat_filters", diags);
        model.concurrent_searches = Value::from_option(fields.concurrent_searches);
        model.items_per_search = Value::from_option(fields.items_per_search);
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    fn entry(field: &str, value: &str) -> AttrValue {
        AttrValue::object([
            ("field", AttrValue::String(field.into())),
            ("type", AttrValue::String("mapping".into())),
            ("value", AttrValue::String(value.into())),
        ])
    }

    fn model_with_mapping(entries: Vec<AttrValue>) -> DetectionRuleModel {
        let mut model = base_model(RULE_TYPE);
        model.query = Value::from("destination.ip:*");
        model.threat_index = Value::Known(vec!["logs-ti_*".into()]);
        model.threat_mapping =
            AttrValue::list([AttrValue::object([("entries", AttrValue::List(entries))])]);
        model
    }

    #[test]
    fn test_mapping_payload() {
        let model = model_with_mapping(vec![entry("destination.ip", "threat.indicator.ip")]);
        let mut diags = Diagnostics::new();
        let payload = ThreatMatchRuleProcessor
            .to_create_props(&model, &version("8.16.0"), &mut diags)
            .unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            body["threat_mapping"],
            json!([{"entries": [{"field": "destination.ip", "type": "mapping", "value": "threat.indicator.ip"}]}])
        );
    }

    #[test]
    fn test_bad_entry_reports_its_path() {
        let bad = AttrValue::object([("field", AttrValue::String("source.ip".into()))]);
        let model = model_with_mapping(vec![entry("destination.ip", "threat.indicator.ip"), bad]);
        let mut diags = Diagnostics::new();
        assert!(
            ThreatMatchRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        let paths: Vec<String> = diags
            .errors()
            .filter_map(|d| d.path.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec!["threat_mapping[0].entries[1].type", "threat_mapping[0].entries[1].value"]
        );
    }

    #[test]
    fn test_response_round_trip() {
        let response = resolve(json!({
            "type": "threat_match",
            "query": "destination.ip:*",
            "language": "kuery",
            "threat_index": ["logs-ti_*"],
            "threat_query": "@timestamp >= \"now-30d/d\"",
            "threat_mapping": [{"entries": [{"field": "destination.ip", "type": "mapping", "value": "threat.indicator.ip"}]}],
            "threat_filters": []
        }));
        let expected = model_with_mapping(vec![entry("destination.ip", "threat.indicator.ip")]);
        let mut model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        ThreatMatchRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert!(!diags.has_error());
        assert_eq!(model.threat_mapping, expected.threat_mapping);
        assert_eq!(model.threat_filters, Value::Null);
        assert_eq!(model.concurrent_searches, Value::Null);
    }
}
