//! `machine_learning` rules: alerts from anomaly detection job results.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{
    MachineLearningRuleFields, OneOrMany, RulePayload, RuleProps, RuleResponse,
};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::Value;

use super::common;
use super::models::DetectionRuleModel;
use super::processor::RuleProcessor;

const RULE_TYPE: &str = "machine_learning";

/// Processor for `machine_learning` rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct MachineLearningRuleProcessor;

impl RuleProcessor for MachineLearningRuleProcessor {
    fn handles_rule_type(&self, rule_type: &str) -> bool {
        rule_type == RULE_TYPE
    }

    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool {
        matches!(response, RuleResponse::MachineLearning(_))
    }

    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        let shared = common::shared_params(model, version, diags);
        let anomaly_threshold =
            common::required(&model.anomaly_threshold, "anomaly_threshold", RULE_TYPE, diags);
        let job_ids = common::required(
            &model.machine_learning_job_id,
            "machine_learning_job_id",
            RULE_TYPE,
            diags,
        );
        if job_ids.as_ref().is_some_and(Vec::is_empty) {
            diags.add_attribute_error(
                AttributePath::root("machine_learning_job_id"),
                "Missing required attribute",
                "machine_learning_job_id must name at least one job",
            );
        }
        let alert_suppression = common::alert_suppression_to_api(&model.alert_suppression, diags);
        let (shared, anomaly_threshold, job_ids) = (shared?, anomaly_threshold?, job_ids?);
        if diags.has_error() {
            return None;
        }
        Some(RulePayload::MachineLearning(RuleProps::new(
            shared,
            MachineLearningRuleFields {
                anomaly_threshold,
                machine_learning_job_id: OneOrMany::from(job_ids),
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
            RuleResponse::MachineLearning(body) => body,
            other => return common::unexpected_response(RULE_TYPE, other.rule_type(), diags),
        };
        common::apply_common(model, &body.meta, body.shared, diags);
        let fields = body.fields;
        model.anomaly_threshold = Value::Known(fields.anomaly_threshold);
        model.machine_learning_job_id = Value::Known(fields.machine_learning_job_id.into_vec());
        model.alert_suppression = common::alert_suppression_from_api(fields.alert_suppression);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::security_detection_rule::test_support::{base_model, resolve, version};
    use serde_json::json;

    #[test]
    fn test_job_ids_sent_as_array() {
        let mut model = base_model(RULE_TYPE);
        model.anomaly_threshold = Value::Known(75);
        model.machine_learning_job_id = Value::Known(vec!["auth_high_count".into()]);
        let mut diags = Diagnostics::new();
        let payload = MachineLearningRuleProcessor
            .to_create_props(&model, &version("8.16.0"), &mut diags)
            .unwrap();
        let body = serde_json::to_value(&payload).unwrap();
        assert_eq!(body["machine_learning_job_id"], json!(["auth_high_count"]));
        assert_eq!(body["anomaly_threshold"], 75);
    }

    #[test]
    fn test_single_job_id_response_becomes_list() {
        let response = resolve(json!({
            "type": "machine_learning",
            "anomaly_threshold": 50,
            "machine_learning_job_id": "auth_high_count"
        }));
        let mut model = base_model(RULE_TYPE);
        let mut diags = Diagnostics::new();
        MachineLearningRuleProcessor.update_from_response(&mut model, response, &mut diags);
        assert_eq!(
            model.machine_learning_job_id,
            Value::Known(vec!["auth_high_count".to_string()])
        );
        assert_eq!(model.query, Value::Null);
    }

    #[test]
    fn test_empty_job_list_rejected() {
        let mut model = base_model(RULE_TYPE);
        model.anomaly_threshold = Value::Known(75);
        model.machine_learning_job_id = Value::Known(vec![]);
        let mut diags = Diagnostics::new();
        assert!(
            MachineLearningRuleProcessor
                .to_create_props(&model, &version("8.16.0"), &mut diags)
                .is_none()
        );
        assert_eq!(diags.error_count(), 1);
    }
}
