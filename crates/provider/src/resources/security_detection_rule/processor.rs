//! Rule processors and the dispatch over them.
//!
//! One processor per rule type converts between the flat model and that
//! type's payload and response variant. [`REGISTRY`] is a fixed table
//! scanned in order; the first processor claiming a type or response wins.

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{RULE_TYPES, RawRuleResponse, RulePayload, RuleResponse};
use elasticstack_diagnostics::{Diagnostic, Diagnostics};

use super::models::DetectionRuleModel;
use super::{
    eql::EqlRuleProcessor, esql::EsqlRuleProcessor, machine_learning::MachineLearningRuleProcessor,
    new_terms::NewTermsRuleProcessor, query::QueryRuleProcessor,
    saved_query::SavedQueryRuleProcessor, threat_match::ThreatMatchRuleProcessor,
    threshold::ThresholdRuleProcessor,
};

/// Summary of the error for a `type` no processor handles.
pub const UNSUPPORTED_RULE_TYPE: &str = "Unsupported rule type";

/// Converts one rule type between the model and the API.
pub trait RuleProcessor: Send + Sync {
    /// True if this processor builds payloads for `rule_type`.
    fn handles_rule_type(&self, rule_type: &str) -> bool;

    /// True if this processor reads `response`.
    fn handles_api_rule_response(&self, response: &RuleResponse) -> bool;

    /// Builds the create payload. Returns `None` after appending errors.
    fn to_create_props(
        &self,
        model: &DetectionRuleModel,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload>;

    /// Builds the update payload for the rule with UUID `id`.
    fn to_update_props(
        &self,
        model: &DetectionRuleModel,
        id: &str,
        version: &dyn MinVersionEnforceable,
        diags: &mut Diagnostics,
    ) -> Option<RulePayload> {
        self.to_create_props(model, version, diags)
            .map(|payload| payload.with_id(id))
    }

    /// Writes a response into the model. Every attribute the response
    /// omits ends up null.
    fn update_from_response(
        &self,
        model: &mut DetectionRuleModel,
        response: RuleResponse,
        diags: &mut Diagnostics,
    );
}

/// Every processor, in dispatch order.
pub static REGISTRY: &[&dyn RuleProcessor] = &[
    &QueryRuleProcessor,
    &SavedQueryRuleProcessor,
    &EqlRuleProcessor,
    &EsqlRuleProcessor,
    &MachineLearningRuleProcessor,
    &NewTermsRuleProcessor,
    &ThreatMatchRuleProcessor,
    &ThresholdRuleProcessor,
];

/// The processor for a configured `type`.
#[must_use]
pub fn processor_for_type(rule_type: &str) -> Option<&'static dyn RuleProcessor> {
    REGISTRY.iter().copied().find(|p| p.handles_rule_type(rule_type))
}

/// Like [`processor_for_type`], reporting a miss as an error diagnostic.
pub fn processor_for_type_diags(
    rule_type: &str,
    diags: &mut Diagnostics,
) -> Option<&'static dyn RuleProcessor> {
    let processor = processor_for_type(rule_type);
    if processor.is_none() {
        diags.push(unsupported_rule_type(rule_type));
    }
    processor
}

fn unsupported_rule_type(rule_type: &str) -> Diagnostic {
    Diagnostic::error(
        UNSUPPORTED_RULE_TYPE,
        format!(
            "rule type {rule_type:?} is not supported; expected one of {}",
            RULE_TYPES.join(", ")
        ),
    )
}

/// Resolves a response body and picks the processor that reads it.
///
/// # Errors
///
/// Fails when the body does not decode as its declared type, or when the
/// type is one no processor handles.
pub fn processor_for_response(
    raw: &RawRuleResponse,
) -> Result<(&'static dyn RuleProcessor, RuleResponse), Diagnostic> {
    let response = RuleResponse::resolve(raw).map_err(|err| {
        Diagnostic::error(
            "Unable to decode rule response",
            format!(
                "the {} rule returned by Kibana does not match its type: {err}",
                raw.rule_type().unwrap_or("untyped")
            ),
        )
    })?;
    let processor = REGISTRY
        .iter()
        .copied()
        .find(|p| p.handles_api_rule_response(&response))
        .ok_or_else(|| unsupported_rule_type(raw.rule_type().unwrap_or("<missing>")))?;
    Ok((processor, response))
}

/// Rule types claimed by no processor or by more than one.
///
/// Empty when the registry is consistent.
#[must_use]
pub fn registry_conflicts() -> Vec<String> {
    RULE_TYPES
        .iter()
        .filter_map(|rule_type| {
            let claims = REGISTRY.iter().filter(|p| p.handles_rule_type(rule_type)).count();
            match claims {
                1 => None,
                0 => Some(format!("{rule_type}: no processor")),
                n => Some(format!("{rule_type}: claimed by {n} processors")),
            }
        })
        .collect()
}
