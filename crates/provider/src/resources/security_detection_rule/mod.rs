//! `elasticstack_kibana_security_detection_rule`: Kibana security detection
//! rules of every type.
//!
//! The resource itself only sequences HTTP calls. Everything type-specific
//! goes through the [`RuleProcessor`] that claims the rule's `type`.

mod common;
mod eql;
mod esql;
mod machine_learning;
pub mod models;
mod new_terms;
pub mod processor;
mod query;
mod saved_query;
mod threat_match;
mod threshold;

use async_trait::async_trait;
use tracing::instrument;

use elasticstack_clients::kibana::DEFAULT_SPACE;
use elasticstack_clients::kibana::detection_rules;
use elasticstack_clients::kibana::models::RawRuleResponse;
use elasticstack_clients::{ApiClient, CompositeId, MinVersionEnforceable};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{AttrValue, Value};

use super::{client_error, parse_id, required_string};
use crate::resource::{Resource, Response};

pub use common::RESPONSE_ACTIONS_MIN_VERSION;
pub use models::DetectionRuleModel;
pub use processor::{
    REGISTRY, RuleProcessor, UNSUPPORTED_RULE_TYPE, processor_for_response, processor_for_type,
    registry_conflicts,
};

/// Resource type name.
pub const TYPE_NAME: &str = "elasticstack_kibana_security_detection_rule";

/// Detection rule resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecurityDetectionRuleResource;

fn space_id_of(model: &DetectionRuleModel) -> String {
    model
        .space_id
        .known_cloned()
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| DEFAULT_SPACE.to_string())
}

/// Decodes a response through the dispatcher and writes it into `model`.
fn apply_response(model: &mut DetectionRuleModel, raw: &RawRuleResponse, diags: &mut Diagnostics) {
    match processor_for_response(raw) {
        Ok((processor, response)) => {
            let rule_type = response.rule_type();
            processor.update_from_response(model, response, diags);
            model.rule_type = Value::from_option(rule_type.map(str::to_string));
        }
        Err(diagnostic) => diags.push(diagnostic),
    }
}

/// Picks the processor for the planned `type`.
fn planned_processor(
    model: &DetectionRuleModel,
    diags: &mut Diagnostics,
) -> Option<&'static dyn RuleProcessor> {
    let rule_type = required_string(&model.rule_type, "type", diags)?;
    processor::processor_for_type_diags(&rule_type, diags)
}

/// Stands in for the Kibana version when nothing planned is version gated.
struct NoVersionGate;

impl MinVersionEnforceable for NoVersionGate {
    fn enforce_min_version(&self, _min: &semver::Version) -> bool {
        true
    }
}

/// True if the plan sets an attribute that needs a minimum Kibana version.
fn needs_version_gate(model: &DetectionRuleModel) -> bool {
    matches!(&model.response_actions, AttrValue::List(items) if !items.is_empty())
}

/// The version payload builders check against. `GET /api/status` is only
/// called when [`needs_version_gate`] holds.
async fn version_gate(
    client: &ApiClient,
    model: &DetectionRuleModel,
    diags: &mut Diagnostics,
) -> Option<Box<dyn MinVersionEnforceable + Send + Sync>> {
    if !needs_version_gate(model) {
        return Some(Box::new(NoVersionGate));
    }
    match client.kibana_version().await {
        Ok(version) => Some(Box::new(version)),
        Err(err) => {
            client_error(diags, "Unable to get Kibana version", &err);
            None
        }
    }
}

#[async_trait]
impl Resource for SecurityDetectionRuleResource {
    type Model = DetectionRuleModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn requires_replace(&self) -> &'static [&'static str] {
        &["space_id", "type"]
    }

    #[instrument(skip_all, fields(rule_type = ?plan.rule_type))]
    async fn create(&self, client: &ApiClient, mut plan: DetectionRuleModel) -> Response<DetectionRuleModel> {
        let mut diags = Diagnostics::new();
        let Some(processor) = planned_processor(&plan, &mut diags) else {
            return Response::failed(diags);
        };
        let Some(version) = version_gate(client, &plan, &mut diags).await else {
            return Response::failed(diags);
        };
        let Some(payload) = processor.to_create_props(&plan, version.as_ref(), &mut diags) else {
            return Response::failed(diags);
        };

        let space_id = space_id_of(&plan);
        let raw = match detection_rules::create_rule(client, &space_id, &payload).await {
            Ok(raw) => raw,
            Err(err) => {
                client_error(&mut diags, "Unable to create detection rule", &err);
                return Response::failed(diags);
            }
        };
        let Some(uuid) = raw.id() else {
            diags.add_error(
                "Unexpected rule response",
                "Kibana created the rule but returned no id",
            );
            return Response::failed(diags);
        };
        tracing::debug!(space_id = %space_id, id = %uuid, "Created detection rule");

        plan.id = Value::Known(CompositeId::new(space_id.clone(), uuid).to_string());
        plan.space_id = Value::Known(space_id);
        apply_response(&mut plan, &raw, &mut diags);
        Response::with_diagnostics(plan, diags)
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn read(&self, client: &ApiClient, mut state: DetectionRuleModel) -> Response<DetectionRuleModel> {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return Response::failed(diags);
        };
        let raw = match detection_rules::get_rule(client, &id.cluster_id, &id.resource_id).await {
            Ok(Some(raw)) => raw,
            Ok(None) => {
                tracing::warn!(id = %id, "Detection rule not found, removing from state");
                return Response::removed();
            }
            Err(err) => {
                client_error(&mut diags, "Unable to get detection rule", &err);
                return Response::failed(diags);
            }
        };
        state.space_id = Value::Known(id.cluster_id);
        apply_response(&mut state, &raw, &mut diags);
        Response::with_diagnostics(state, diags)
    }

    #[instrument(skip_all, fields(id = ?prior.id))]
    async fn update(
        &self,
        client: &ApiClient,
        mut plan: DetectionRuleModel,
        prior: DetectionRuleModel,
    ) -> Response<DetectionRuleModel> {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&prior.id, &mut diags) else {
            return Response::failed(diags);
        };
        let Some(processor) = planned_processor(&plan, &mut diags) else {
            return Response::failed(diags);
        };
        let Some(version) = version_gate(client, &plan, &mut diags).await else {
            return Response::failed(diags);
        };
        let Some(payload) =
            processor.to_update_props(&plan, &id.resource_id, version.as_ref(), &mut diags)
        else {
            return Response::failed(diags);
        };

        let raw = match detection_rules::update_rule(client, &id.cluster_id, &payload).await {
            Ok(raw) => raw,
            Err(err) => {
                client_error(&mut diags, "Unable to update detection rule", &err);
                return Response::failed(diags);
            }
        };
        plan.id = prior.id;
        plan.space_id = Value::Known(id.cluster_id);
        apply_response(&mut plan, &raw, &mut diags);
        Response::with_diagnostics(plan, diags)
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn delete(&self, client: &ApiClient, state: DetectionRuleModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return diags;
        };
        if let Err(err) = detection_rules::delete_rule(client, &id.cluster_id, &id.resource_id).await {
            client_error(&mut diags, "Unable to delete detection rule", &err);
        }
        diags
    }

    /// Accepts `<space_id>/<uuid>`, or a bare UUID in the default space.
    fn import_state(&self, id: &str) -> Response<DetectionRuleModel> {
        let mut diags = Diagnostics::new();
        let composite = if id.contains('/') {
            parse_id(&Value::from(id), &mut diags)
        } else if uuid::Uuid::parse_str(id).is_ok() {
            Some(CompositeId::new(DEFAULT_SPACE, id))
        } else {
            diags.add_attribute_error(
                AttributePath::root("id"),
                "Invalid import ID",
                format!("expected <space_id>/<rule_uuid> or a rule UUID, got {id:?}"),
            );
            None
        };
        let Some(composite) = composite else {
            return Response::failed(diags);
        };
        Response::ok(DetectionRuleModel {
            id: Value::Known(composite.to_string()),
            space_id: Value::Known(composite.cluster_id),
            ..DetectionRuleModel::default()
        })
    }
}


#[cfg(test)]
mod tests {
    use super::*;
    use test_support::{base_model, version};

    #[test]
    fn test_import_accepts_bare_uuid() {
        let resource = SecurityDetectionRuleResource;
        let response =
            Resource::import_state(&resource, "6f0f7b1c-8a55-4c2e-9d6a-3f1c2b7e4d10");
        let state = response.state.unwrap();
        assert_eq!(
            state.id,
            Value::from("default/6f0f7b1c-8a55-4c2e-9d6a-3f1c2b7e4d10")
        );
        assert_eq!(state.space_id, Value::from("default"));

        let composite = Resource::import_state(&resource, "security/6f0f7b1c").state.unwrap();
        assert_eq!(composite.space_id, Value::from("security"));

        let bad = Resource::import_state(&resource, "not-a-uuid");
        assert!(bad.diagnostics.has_error());
    }

    #[test]
    fn test_bogus_type_single_error() {
        let model = base_model("bogus");
        let mut diags = Diagnostics::new();
        assert!(planned_processor(&model, &mut diags).is_none());
        assert_eq!(diags.len(), 1);
        assert_eq!(diags.errors().next().unwrap().summary, UNSUPPORTED_RULE_TYPE);
    }

    #[test]
    fn test_payload_type_echoes_model_type() {
        use elasticstack_typeutils::AttrValue;

        for rule_type in elasticstack_clients::kibana::models::RULE_TYPES {
            let mut model = base_model(rule_type);
            model.query = Value::from("*");
            model.saved_id = Value::from("saved");
            model.anomaly_threshold = Value::Known(50);
            model.machine_learning_job_id = Value::Known(vec!["job".into()]);
            model.new_terms_fields = Value::Known(vec!["host.name".into()]);
            model.history_window_start = Value::from("now-7d");
            model.threat_index = Value::Known(vec!["ti-*".into()]);
            model.threat_mapping = AttrValue::list([AttrValue::object([(
                "entries",
                AttrValue::list([AttrValue::object([
                    ("field", AttrValue::String("a".into())),
                    ("type", AttrValue::String("mapping".into())),
                    ("value", AttrValue::String("b".into())),
                ])]),
            )])]);
            model.threshold = AttrValue::object([("value", AttrValue::Int64(10))]);

            let mut diags = Diagnostics::new();
            let processor = planned_processor(&model, &mut diags).unwrap();
            let payload = processor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .unwrap_or_else(|| panic!("{rule_type}: {diags:?}"));
            assert_eq!(payload.rule_type(), rule_type);
        }
    }

    #[test]
    fn test_space_defaults() {
        let mut model = base_model("query");
        assert_eq!(space_id_of(&model), "default");
        model.space_id = Value::from("");
        assert_eq!(space_id_of(&model), "default");
        model.space_id = Value::from("security");
        assert_eq!(space_id_of(&model), "security");
    }

    #[test]
    fn test_version_gate_only_for_response_actions() {
        let mut model = base_model("query");
        assert!(!needs_version_gate(&model));
        model.response_actions = AttrValue::List(Vec::new());
        assert!(!needs_version_gate(&model));
        model.response_actions = AttrValue::list([AttrValue::object([(
            "action_type_id",
            AttrValue::String(".osquery".into()),
        )])]);
        assert!(needs_version_gate(&model));
    }
}
