//! Conversions every rule type shares.
//!
//! [`shared_params`] fills [`SharedRuleParams`] from the model once per
//! payload; [`apply_common`] does the reverse for a response and clears
//! every type-specific attribute so the processor only sets its own.

use std::collections::BTreeMap;
use std::str::FromStr;

use semver::Version;
use serde_json::Value as Json;

use elasticstack_clients::MinVersionEnforceable;
use elasticstack_clients::kibana::models::{
    ActionFrequency, AlertSuppression, EndpointParams, EndpointProcessConfig, InvestigationFields,
    OsqueryParams, OsqueryQuery, ResponseAction, RiskScoreMapping, RuleAction, RuleExceptionList,
    RuleMeta, RuleSeverity, SeverityMapping, SharedRuleParams, Threat, ThreatSubtechnique,
    ThreatTactic, ThreatTechnique, ThresholdAlertSuppression,
};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{
    AttrValue, IntoAttr, KibanaDuration, Value, json_string_as, json_string_from,
    list_type_to_slice, non_empty_list_value, object_type_as, object_type_to_struct,
    preserve_json_formatting,
};

use super::models::{
    ActionFrequencyModel, ActionModel, AlertSuppressionModel, DetectionRuleModel,
    EndpointProcessConfigModel, ExceptionListModel, OsqueryQueryModel, ResponseActionModel,
    ResponseActionParamsModel, RiskScoreMappingModel, SeverityMappingModel, ThreatModel,
    ThreatSubtechniqueModel, ThreatTacticModel, ThreatTechniqueModel,
};

/// First server version accepting `response_actions`.
pub const RESPONSE_ACTIONS_MIN_VERSION: Version = Version::new(8, 16, 0);

const OSQUERY_ACTION: &str = ".osquery";
const ENDPOINT_ACTION: &str = ".endpoint";

/// A rule-level attribute that must be known.
pub(crate) fn required<T: Clone>(
    value: &Value<T>,
    name: &str,
    rule_type: &str,
    diags: &mut Diagnostics,
) -> Option<T> {
    let known = value.known_cloned();
    if known.is_none() {
        diags.add_attribute_error(
            AttributePath::root(name),
            "Missing required attribute",
            format!("{name} is required for {rule_type} rules"),
        );
    }
    known
}

/// A nested attribute that must be known.
fn required_at<T: Clone>(
    value: &Value<T>,
    path: &AttributePath,
    name: &str,
    diags: &mut Diagnostics,
) -> Option<T> {
    let known = value.known_cloned();
    if known.is_none() {
        diags.add_attribute_error(
            path.at_name(name),
            "Missing required attribute",
            format!("{name} must be set"),
        );
    }
    known
}

fn parse_severity(raw: &str, path: AttributePath, diags: &mut Diagnostics) -> Option<RuleSeverity> {
    match RuleSeverity::from_str(raw) {
        Ok(severity) => Some(severity),
        Err(detail) => {
            diags.add_attribute_error(path, "Invalid severity", detail);
            None
        }
    }
}

fn parse_duration(value: &Value<String>, path: AttributePath, diags: &mut Diagnostics) -> Option<KibanaDuration> {
    let raw = value.known_str()?;
    match raw.parse::<KibanaDuration>() {
        Ok(duration) => Some(duration),
        Err(err) => {
            diags.add_attribute_error(path, "Invalid duration", err.to_string());
            None
        }
    }
}

/// Fills the parameters every rule type shares.
///
/// Only known values are copied. `response_actions` are rejected on
/// servers older than [`RESPONSE_ACTIONS_MIN_VERSION`].
pub(crate) fn shared_params(
    model: &DetectionRuleModel,
    version: &dyn MinVersionEnforceable,
    diags: &mut Diagnostics,
) -> Option<SharedRuleParams> {
    let rule_type = model.rule_type.known_str().unwrap_or("detection");
    let name = required(&model.name, "name", rule_type, diags);
    let description = required(&model.description, "description", rule_type, diags);
    let risk_score = required(&model.risk_score, "risk_score", rule_type, diags);
    let severity = required(&model.severity, "severity", rule_type, diags)
        .and_then(|raw| parse_severity(&raw, AttributePath::root("severity"), diags));

    let exceptions_list = list_type_to_slice(
        &model.exceptions_list,
        &AttributePath::root("exceptions_list"),
        diags,
        exception_list_to_api,
    );
    let actions = list_type_to_slice(&model.actions, &AttributePath::root("actions"), diags, action_to_api);
    let response_actions = list_type_to_slice(
        &model.response_actions,
        &AttributePath::root("response_actions"),
        diags,
        response_action_to_api,
    );
    if response_actions.as_ref().is_some_and(|a| !a.is_empty())
        && !version.enforce_min_version(&RESPONSE_ACTIONS_MIN_VERSION)
    {
        diags.add_attribute_error(
            AttributePath::root("response_actions"),
            "Unsupported feature",
            format!("response_actions require server version {RESPONSE_ACTIONS_MIN_VERSION} or later"),
        );
    }
    let threat = list_type_to_slice(&model.threat, &AttributePath::root("threat"), diags, threat_to_api);
    let risk_score_mapping = list_type_to_slice(
        &model.risk_score_mapping,
        &AttributePath::root("risk_score_mapping"),
        diags,
        risk_score_mapping_to_api,
    );
    let severity_mapping = list_type_to_slice(
        &model.severity_mapping,
        &AttributePath::root("severity_mapping"),
        diags,
        severity_mapping_to_api,
    );

    Some(SharedRuleParams {
        name: name?,
        description: description?,
        risk_score: risk_score?,
        severity: severity?,
        rule_id: model.rule_id.known_cloned(),
        enabled: model.enabled.known_cloned(),
        from: model.from.known_cloned(),
        to: model.to.known_cloned(),
        interval: model.interval.known_cloned(),
        tags: model.tags.known_cloned(),
        author: model.author.known_cloned(),
        license: model.license.known_cloned(),
        false_positives: model.false_positives.known_cloned(),
        references: model.references.known_cloned(),
        note: model.note.known_cloned(),
        setup: model.setup.known_cloned(),
        max_signals: model.max_signals.known_cloned(),
        version: model.version.known_cloned(),
        exceptions_list,
        actions,
        response_actions,
        threat,
        timeline_id: model.timeline_id.known_cloned(),
        timeline_title: model.timeline_title.known_cloned(),
        investigation_fields: model
            .investigation_fields
            .known_cloned()
            .map(|field_names| InvestigationFields { field_names }),
        building_block_type: model.building_block_type.known_cloned(),
        namespace: model.namespace.known_cloned(),
        risk_score_mapping,
        severity_mapping,
    })
}

fn exception_list_to_api(
    m: ExceptionListModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<RuleExceptionList> {
    let id = required_at(&m.id, path, "id", diags);
    let list_id = required_at(&m.list_id, path, "list_id", diags);
    let list_type = required_at(&m.list_type, path, "type", diags);
    let namespace_type = required_at(&m.namespace_type, path, "namespace_type", diags);
    Some(RuleExceptionList {
        id: id?,
        list_id: list_id?,
        list_type: list_type?,
        namespace_type: namespace_type?,
    })
}

fn action_to_api(m: ActionModel, path: &AttributePath, diags: &mut Diagnostics) -> Option<RuleAction> {
    let action_type_id = required_at(&m.action_type_id, path, "action_type_id", diags);
    let id = required_at(&m.id, path, "id", diags);
    let params = json_string_as(&m.params, &path.at_name("params"), diags).unwrap_or_default();
    let alerts_filter = json_string_as(&m.alerts_filter, &path.at_name("alerts_filter"), diags);
    let frequency = object_type_to_struct(
        &m.frequency,
        &path.at_name("frequency"),
        diags,
        |f: ActionFrequencyModel, path, diags| {
            let notify_when = required_at(&f.notify_when, path, "notify_when", diags);
            let summary = required_at(&f.summary, path, "summary", diags);
            Some(ActionFrequency {
                notify_when: notify_when?,
                summary: summary?,
                throttle: f.throttle.known_cloned(),
            })
        },
    );
    Some(RuleAction {
        action_type_id: action_type_id?,
        id: id?,
        params,
        group: m.group.known_cloned(),
        uuid: m.uuid.known_cloned(),
        frequency,
        alerts_filter,
    })
}

fn osquery_query_to_api(
    m: OsqueryQueryModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<OsqueryQuery> {
    let id = required_at(&m.id, path, "id", diags);
    let query = required_at(&m.query, path, "query", diags);
    Some(OsqueryQuery {
        id: id?,
        query: query?,
        platform: m.platform.known_cloned(),
        version: m.version.known_cloned(),
        removed: m.removed.known_cloned(),
        snapshot: m.snapshot.known_cloned(),
        ecs_mapping: json_string_as(&m.ecs_mapping, &path.at_name("ecs_mapping"), diags),
    })
}

fn response_action_to_api(
    m: ResponseActionModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<ResponseAction> {
    let action_type_id = required_at(&m.action_type_id, path, "action_type_id", diags)?;
    let params_path = path.at_name("params");
    let params: ResponseActionParamsModel =
        object_type_as(&m.params, &params_path, diags).unwrap_or_default();

    match action_type_id.as_str() {
        OSQUERY_ACTION => Some(ResponseAction::Osquery {
            params: OsqueryParams {
                query: params.query.known_cloned(),
                pack_id: params.pack_id.known_cloned(),
                saved_query_id: params.saved_query_id.known_cloned(),
                timeout: params.timeout.known_cloned(),
                ecs_mapping: json_string_as(&params.ecs_mapping, &params_path.at_name("ecs_mapping"), diags),
                queries: list_type_to_slice(
                    &params.queries,
                    &params_path.at_name("queries"),
                    diags,
                    osquery_query_to_api,
                ),
            },
        }),
        ENDPOINT_ACTION => {
            let command = required_at(&params.command, &params_path, "command", diags)?;
            let config = object_type_to_struct(
                &params.config,
                &params_path.at_name("config"),
                diags,
                |c: EndpointProcessConfigModel, path, diags| {
                    Some(EndpointProcessConfig {
                        field: required_at(&c.field, path, "field", diags)?,
                        overwrite: c.overwrite.known_cloned(),
                    })
                },
            );
            Some(ResponseAction::Endpoint {
                params: EndpointParams {
                    command,
                    comment: params.comment.known_cloned(),
                    config,
                },
            })
        }
        other => {
            diags.add_attribute_error(
                path.at_name("action_type_id"),
                "Invalid response action",
                format!("expected {OSQUERY_ACTION} or {ENDPOINT_ACTION}, got {other:?}"),
            );
            None
        }
    }
}

fn mitre_ref(
    id: &Value<String>,
    name: &Value<String>,
    reference: &Value<String>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<(String, String, String)> {
    let id = required_at(id, path, "id", diags);
    let name = required_at(name, path, "name", diags);
    let reference = required_at(reference, path, "reference", diags);
    Some((id?, name?, reference?))
}

fn threat_to_api(m: ThreatModel, path: &AttributePath, diags: &mut Diagnostics) -> Option<Threat> {
    let framework = required_at(&m.framework, path, "framework", diags);
    let tactic_path = path.at_name("tactic");
    let tactic = object_type_to_struct(&m.tactic, &tactic_path, diags, |t: ThreatTacticModel, path, diags| {
        let (id, name, reference) = mitre_ref(&t.id, &t.name, &t.reference, path, diags)?;
        Some(ThreatTactic { id, name, reference })
    });
    if matches!(m.tactic, AttrValue::Null | AttrValue::Unknown) {
        diags.add_attribute_error(tactic_path, "Missing required attribute", "tactic must be set");
    }
    let technique = list_type_to_slice(&m.technique, &path.at_name("technique"), diags, technique_to_api);
    Some(Threat {
        framework: framework?,
        tactic: tactic?,
        technique,
    })
}

fn technique_to_api(
    m: ThreatTechniqueModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<ThreatTechnique> {
    let parts = mitre_ref(&m.id, &m.name, &m.reference, path, diags);
    let subtechnique = list_type_to_slice(
        &m.subtechnique,
        &path.at_name("subtechnique"),
        diags,
        |s: ThreatSubtechniqueModel, path, diags| {
            let (id, name, reference) = mitre_ref(&s.id, &s.name, &s.reference, path, diags)?;
            Some(ThreatSubtechnique { id, name, reference })
        },
    );
    let (id, name, reference) = parts?;
    Some(ThreatTechnique {
        id,
        name,
        reference,
        subtechnique,
    })
}

fn risk_score_mapping_to_api(
    m: RiskScoreMappingModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<RiskScoreMapping> {
    let field = required_at(&m.field, path, "field", diags);
    let operator = required_at(&m.operator, path, "operator", diags);
    let value = required_at(&m.value, path, "value", diags);
    Some(RiskScoreMapping {
        field: field?,
        operator: operator?,
        value: value?,
        risk_score: m.risk_score.known_cloned(),
    })
}

fn severity_mapping_to_api(
    m: SeverityMappingModel,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Option<SeverityMapping> {
    let field = required_at(&m.field, path, "field", diags);
    let operator = required_at(&m.operator, path, "operator", diags);
    let value = required_at(&m.value, path, "value", diags);
    let severity = required_at(&m.severity, path, "severity", diags)
        .and_then(|raw| parse_severity(&raw, path.at_name("severity"), diags));
    Some(SeverityMapping {
        field: field?,
        operator: operator?,
        value: value?,
        severity: severity?,
    })
}

/// Decodes a JSON array attribute such as `filters`.
pub(crate) fn filters_to_api(value: &Value<String>, name: &str, diags: &mut Diagnostics) -> Option<Vec<Json>> {
    json_string_as(value, &AttributePath::root(name), diags)
}

/// `alert_suppression` for every rule type except threshold.
pub(crate) fn alert_suppression_to_api(value: &AttrValue, diags: &mut Diagnostics) -> Option<AlertSuppression> {
    object_type_to_struct(
        value,
        &AttributePath::root("alert_suppression"),
        diags,
        |m: AlertSuppressionModel, path, diags| {
            Some(AlertSuppression {
                group_by: m.group_by.known_cloned().unwrap_or_default(),
                duration: parse_duration(&m.duration, path.at_name("duration"), diags),
                missing_fields_strategy: m.missing_fields_strategy.known_cloned(),
            })
        },
    )
}

/// `alert_suppression` for threshold rules, which only take a window.
pub(crate) fn threshold_suppression_to_api(
    value: &AttrValue,
    diags: &mut Diagnostics,
) -> Option<ThresholdAlertSuppression> {
    object_type_to_struct(
        value,
        &AttributePath::root("alert_suppression"),
        diags,
        |m: AlertSuppressionModel, path, diags| {
            if m.group_by.known().is_some_and(|g| !g.is_empty()) {
                diags.add_attribute_error(
                    path.at_name("group_by"),
                    "Invalid alert suppression",
                    "threshold rules group by their threshold fields; group_by is not accepted",
                );
            }
            if m.duration.known().is_none() {
                diags.add_attribute_error(
                    path.at_name("duration"),
                    "Missing required attribute",
                    "duration is required for threshold rule alert suppression",
                );
            }
            let duration = parse_duration(&m.duration, path.at_name("duration"), diags)?;
            Some(ThresholdAlertSuppression { duration })
        },
    )
}

/// Reports a response whose variant the processor does not handle.
pub(crate) fn unexpected_response(expected: &str, actual: Option<&str>, diags: &mut Diagnostics) {
    diags.add_error(
        "Unexpected rule response",
        format!(
            "expected a {expected} rule, got {}",
            actual.unwrap_or("an unsupported rule type")
        ),
    );
}

/// A string the API reports as `""` when unset.
pub(crate) fn optional_string_from_api(prior: &Value<String>, fresh: Option<String>) -> Value<String> {
    match fresh {
        Some(s) if s.is_empty() && prior.known_str() != Some("") => Value::Null,
        other => Value::from_option(other),
    }
}

/// A string list the API reports as `[]` when unset.
pub(crate) fn string_list_from_api(prior: &Value<Vec<String>>, fresh: Option<Vec<String>>) -> Value<Vec<String>> {
    match fresh {
        Some(items) if !items.is_empty() => Value::Known(items),
        _ if prior.known().is_some_and(Vec::is_empty) => Value::Known(Vec::new()),
        _ => Value::Null,
    }
}

/// A nested block list the API reports as `[]` when unset.
pub(crate) fn nested_list_from_api<T: IntoAttr>(prior: &AttrValue, fresh: Option<Vec<T>>) -> AttrValue {
    match fresh {
        Some(items) if !items.is_empty() => items.into_attr(),
        _ if matches!(prior, AttrValue::List(items) if items.is_empty()) => AttrValue::List(Vec::new()),
        _ => AttrValue::Null,
    }
}

/// A JSON array attribute; keeps the prior string when equivalent.
pub(crate) fn filters_from_api(
    prior: &Value<String>,
    fresh: Option<Vec<Json>>,
    name: &str,
    diags: &mut Diagnostics,
) -> Value<String> {
    match fresh {
        Some(filters) if !filters.is_empty() => {
            let encoded = json_string_from(&filters, &AttributePath::root(name), diags);
            preserve_json_formatting(prior, encoded)
        }
        _ => {
            let prior_empty = prior
                .known_str()
                .and_then(|raw| serde_json::from_str::<Vec<Json>>(raw).ok())
                .is_some_and(|v| v.is_empty());
            if prior_empty { prior.clone() } else { Value::Null }
        }
    }
}

/// State value of `alert_suppression`.
pub(crate) fn alert_suppression_from_api(fresh: Option<AlertSuppression>) -> AttrValue {
    fresh.map_or(AttrValue::Null, |s| {
        AlertSuppressionModel {
            group_by: if s.group_by.is_empty() {
                Value::Null
            } else {
                Value::Known(s.group_by)
            },
            duration: Value::from_option(s.duration.map(|d| d.to_string())),
            missing_fields_strategy: Value::from_option(s.missing_fields_strategy),
        }
        .into_attr()
    })
}

/// State value of a threshold rule's `alert_suppression`.
pub(crate) fn threshold_suppression_from_api(fresh: Option<ThresholdAlertSuppression>) -> AttrValue {
    fresh.map_or(AttrValue::Null, |s| {
        AlertSuppressionModel {
            group_by: Value::Null,
            duration: Value::Known(s.duration.to_string()),
            missing_fields_strategy: Value::Null,
        }
        .into_attr()
    })
}

fn exception_list_from_api(e: RuleExceptionList) -> ExceptionListModel {
    ExceptionListModel {
        id: Value::Known(e.id),
        list_id: Value::Known(e.list_id),
        list_type: Value::Known(e.list_type),
        namespace_type: Value::Known(e.namespace_type),
    }
}

fn action_from_api(a: RuleAction, diags: &mut Diagnostics) -> ActionModel {
    let path = AttributePath::root("actions");
    ActionModel {
        action_type_id: Value::Known(a.action_type_id),
        id: Value::Known(a.id),
        params: json_string_from(&a.params, &path, diags),
        group: Value::from_option(a.group),
        uuid: Value::from_option(a.uuid),
        alerts_filter: a
            .alerts_filter
            .map_or(Value::Null, |f| json_string_from(&f, &path, diags)),
        frequency: a.frequency.map_or(AttrValue::Null, |f| {
            ActionFrequencyModel {
                notify_when: Value::Known(f.notify_when),
                summary: Value::Known(f.summary),
                throttle: Value::from_option(f.throttle),
            }
            .into_attr()
        }),
    }
}

fn ecs_mapping_from_api(
    mapping: Option<BTreeMap<String, Json>>,
    path: &AttributePath,
    diags: &mut Diagnostics,
) -> Value<String> {
    mapping.map_or(Value::Null, |m| json_string_from(&m, path, diags))
}

fn response_action_from_api(a: ResponseAction, diags: &mut Diagnostics) -> ResponseActionModel {
    let path = AttributePath::root("response_actions");
    match a {
        ResponseAction::Osquery { params } => ResponseActionModel {
            action_type_id: Value::from(OSQUERY_ACTION),
            params: ResponseActionParamsModel {
                query: Value::from_option(params.query),
                pack_id: Value::from_option(params.pack_id),
                saved_query_id: Value::from_option(params.saved_query_id),
                timeout: Value::from_option(params.timeout),
                ecs_mapping: ecs_mapping_from_api(params.ecs_mapping, &path, diags),
                queries: params.queries.map_or(AttrValue::Null, |queries| {
                    queries
                        .into_iter()
                        .map(|q| OsqueryQueryModel {
                            id: Value::Known(q.id),
                            query: Value::Known(q.query),
                            platform: Value::from_option(q.platform),
                            version: Value::from_option(q.version),
                            removed: Value::from_option(q.removed),
                            snapshot: Value::from_option(q.snapshot),
                            ecs_mapping: ecs_mapping_from_api(q.ecs_mapping, &path, diags),
                        })
                        .collect::<Vec<_>>()
                        .into_attr()
                }),
                ..ResponseActionParamsModel::default()
            }
            .into_attr(),
        },
        ResponseAction::Endpoint { params } => ResponseActionModel {
            action_type_id: Value::from(ENDPOINT_ACTION),
            params: ResponseActionParamsModel {
                command: Value::Known(params.command),
                comment: Value::from_option(params.comment),
                config: params.config.map_or(AttrValue::Null, |c| {
                    EndpointProcessConfigModel {
                        field: Value::Known(c.field),
                        overwrite: Value::from_option(c.overwrite),
                    }
                    .into_attr()
                }),
                ..ResponseActionParamsModel::default()
            }
            .into_attr(),
        },
    }
}

fn threat_from_api(t: Threat) -> ThreatModel {
    ThreatModel {
        framework: Value::Known(t.framework),
        tactic: ThreatTacticModel {
            id: Value::Known(t.tactic.id),
            name: Value::Known(t.tactic.name),
            reference: Value::Known(t.tactic.reference),
        }
        .into_attr(),
        technique: non_empty_list_value(t.technique.map(|techniques| {
            techniques
                .into_iter()
                .map(|tech| ThreatTechniqueModel {
                    id: Value::Known(tech.id),
                    name: Value::Known(tech.name),
                    reference: Value::Known(tech.reference),
                    subtechnique: non_empty_list_value(tech.subtechnique.map(|subs| {
                        subs.into_iter()
                            .map(|s| ThreatSubtechniqueModel {
                                id: Value::Known(s.id),
                                name: Value::Known(s.name),
                                reference: Value::Known(s.reference),
                            })
                            .collect::<Vec<_>>()
                    })),
                })
                .collect::<Vec<_>>()
        })),
    }
}

/// Writes the shared parameters and metadata of a response into `model`
/// and nulls every type-specific attribute.
///
/// Returns the model as it was before, for processors that keep prior
/// formatting or empty lists.
pub(crate) fn apply_common(
    model: &mut DetectionRuleModel,
    meta: &RuleMeta,
    shared: SharedRuleParams,
    diags: &mut Diagnostics,
) -> DetectionRuleModel {
    let prior = model.clone();

    model.rule_id = Value::from_option(shared.rule_id);
    model.name = Value::Known(shared.name);
    model.description = Value::Known(shared.description);
    model.risk_score = Value::Known(shared.risk_score);
    model.severity = Value::Known(shared.severity.to_string());
    model.enabled = Value::from_option(shared.enabled);
    model.from = Value::from_option(shared.from);
    model.to = Value::from_option(shared.to);
    model.interval = Value::from_option(shared.interval);
    model.tags = string_list_from_api(&prior.tags, shared.tags);
    model.author = string_list_from_api(&prior.author, shared.author);
    model.license = optional_string_from_api(&prior.license, shared.license);
    model.false_positives = string_list_from_api(&prior.false_positives, shared.false_positives);
    model.references = string_list_from_api(&prior.references, shared.references);
    model.note = optional_string_from_api(&prior.note, shared.note);
    model.setup = optional_string_from_api(&prior.setup, shared.setup);
    model.max_signals = Value::from_option(shared.max_signals);
    model.version = Value::from_option(shared.version);
    model.namespace = optional_string_from_api(&prior.namespace, shared.namespace);
    model.building_block_type =
        optional_string_from_api(&prior.building_block_type, shared.building_block_type);
    model.timeline_id = optional_string_from_api(&prior.timeline_id, shared.timeline_id);
    model.timeline_title = optional_string_from_api(&prior.timeline_title, shared.timeline_title);
    model.investigation_fields = string_list_from_api(
        &prior.investigation_fields,
        shared.investigation_fields.map(|f| f.field_names),
    );

    model.exceptions_list = nested_list_from_api(
        &prior.exceptions_list,
        shared
            .exceptions_list
            .map(|lists| lists.into_iter().map(exception_list_from_api).collect()),
    );
    model.actions = nested_list_from_api(
        &prior.actions,
        shared
            .actions
            .map(|actions| actions.into_iter().map(|a| action_from_api(a, diags)).collect()),
    );
    model.response_actions = nested_list_from_api(
        &prior.response_actions,
        shared
            .response_actions
            .map(|actions| actions.into_iter().map(|a| response_action_from_api(a, diags)).collect()),
    );
    model.threat = nested_list_from_api(
        &prior.threat,
        shared.threat.map(|threats| threats.into_iter().map(threat_from_api).collect()),
    );
    model.risk_score_mapping = nested_list_from_api(
        &prior.risk_score_mapping,
        shared.risk_score_mapping.map(|mappings| {
            mappings
                .into_iter()
                .map(|m| RiskScoreMappingModel {
                    field: Value::Known(m.field),
                    operator: Value::Known(m.operator),
                    value: Value::Known(m.value),
                    risk_score: Value::from_option(m.risk_score),
                })
                .collect()
        }),
    );
    model.severity_mapping = nested_list_from_api(
        &prior.severity_mapping,
        shared.severity_mapping.map(|mappings| {
            mappings
                .into_iter()
                .map(|m| SeverityMappingModel {
                    field: Value::Known(m.field),
                    operator: Value::Known(m.operator),
                    value: Value::Known(m.value),
                    severity: Value::Known(m.severity.to_string()),
                })
                .collect()
        }),
    );

    model.created_at = Value::from_option(meta.created_at.clone());
    model.created_by = Value::from_option(meta.created_by.clone());
    model.updated_at = Value::from_option(meta.updated_at.clone());
    model.updated_by = Value::from_option(meta.updated_by.clone());
    model.revision = Value::from_option(meta.revision);

    reset_type_specific(model);
    prior
}

/// Nulls every attribute that belongs to a single rule type.
fn reset_type_specific(model: &mut DetectionRuleModel) {
    model.query = Value::Null;
    model.language = Value::Null;
    model.index = Value::Null;
    model.data_view_id = Value::Null;
    model.filters = Value::Null;
    model.saved_id = Value::Null;
    model.alert_suppression = AttrValue::Null;
    model.tiebreaker_field = Value::Null;
    model.anomaly_threshold = Value::Null;
    model.machine_learning_job_id = Value::Null;
    model.new_terms_fields = Value::Null;
    model.history_window_start = Value::Null;
    model.threat_index = Value::Null;
    model.threat_query = Value::Null;
    model.threat_indicator_path = Value::Null;
    model.threat_filters = Value::Null;
    model.threat_mapping = AttrValue::Null;
    model.concurrent_searches = Value::Null;
    model.items_per_search = Value::Null;
    model.threshold = AttrValue::Null;
}

#[cfg(test)]
mod tests {
    use super::*;
    use elasticstack_clients::ServerVersion;

    fn version(raw: &str) -> ServerVersion {
        ServerVersion::parse(raw).unwrap()
    }

    fn base_model() -> DetectionRuleModel {
        DetectionRuleModel {
            rule_type: Value::from("query"),
            name: Value::from("Suspicious login"),
            description: Value::from("Detects odd logins"),
            risk_score: Value::Known(47),
            severity: Value::from("medium"),
            ..DetectionRuleModel::default()
        }
    }

    fn osquery_action() -> AttrValue {
        AttrValue::list([AttrValue::object([
            ("action_type_id", AttrValue::String(".osquery".into())),
            (
                "params",
                AttrValue::object([("query", AttrValue::String("select * from uptime".into()))]),
            ),
        ])])
    }

    #[test]
    fn test_shared_params_copies_known_values_only() {
        let mut model = base_model();
        model.enabled = Value::Unknown;
        model.tags = Value::Known(vec!["auth".into()]);
        model.from = Value::Null;

        let mut diags = Diagnostics::new();
        let shared = shared_params(&model, &version("8.15.0"), &mut diags).unwrap();
        assert!(!diags.has_error());
        assert_eq!(shared.severity, RuleSeverity::Medium);
        assert_eq!(shared.enabled, None);
        assert_eq!(shared.from, None);
        assert_eq!(shared.tags, Some(vec!["auth".to_string()]));
    }

    #[test]
    fn test_missing_required_fields_reported_together() {
        let model = DetectionRuleModel {
            rule_type: Value::from("eql"),
            ..DetectionRuleModel::default()
        };
        let mut diags = Diagnostics::new();
        assert!(shared_params(&model, &version("8.16.0"), &mut diags).is_none());
        assert_eq!(diags.error_count(), 4);
    }

    #[test]
    fn test_response_actions_gated_on_version() {
        let mut model = base_model();
        model.response_actions = osquery_action();

        let mut diags = Diagnostics::new();
        let _ = shared_params(&model, &version("8.15.2"), &mut diags);
        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Unsupported feature");

        let mut diags = Diagnostics::new();
        let shared = shared_params(&model, &version("8.16.0"), &mut diags).unwrap();
        assert!(!diags.has_error());
        assert!(matches!(
            shared.response_actions.as_deref(),
            Some([ResponseAction::Osquery { .. }])
        ));
    }

    #[test]
    fn test_nested_threat_errors_are_path_scoped() {
        let mut model = base_model();
        model.threat = AttrValue::list([AttrValue::object([
            ("framework", AttrValue::String("MITRE ATT&CK".into())),
            (
                "tactic",
                AttrValue::object([
                    ("id", AttrValue::String("TA0001".into())),
                    ("name", AttrValue::String("Initial Access".into())),
                    ("reference", AttrValue::String("https://attack.mitre.org/tactics/TA0001/".into())),
                ]),
            ),
            (
                "technique",
                AttrValue::list([AttrValue::object([
                    ("id", AttrValue::String("T1566".into())),
                    ("name", AttrValue::String("Phishing".into())),
                    ("reference", AttrValue::String("https://attack.mitre.org/techniques/T1566/".into())),
                    (
                        "subtechnique",
                        AttrValue::list([AttrValue::object([("name", AttrValue::String("x".into()))])]),
                    ),
                ])]),
            ),
        ])]);

        let mut diags = Diagnostics::new();
        let _ = shared_params(&model, &version("8.16.0"), &mut diags);
        let paths: Vec<String> = diags
            .errors()
            .filter_map(|d| d.path.as_ref().map(ToString::to_string))
            .collect();
        assert_eq!(
            paths,
            vec![
                "threat[0].technique[0].subtechnique[0].id",
                "threat[0].technique[0].subtechnique[0].reference",
            ]
        );
    }

    #[test]
    fn test_string_lists_from_api() {
        assert_eq!(string_list_from_api(&Value::Null, Some(vec![])), Value::Null);
        assert_eq!(
            string_list_from_api(&Value::Known(vec![]), Some(vec![])),
            Value::Known(vec![])
        );
        assert_eq!(
            string_list_from_api(&Value::Unknown, Some(vec!["a".into()])),
            Value::Known(vec!["a".to_string()])
        );
        assert_eq!(optional_string_from_api(&Value::Unknown, Some(String::new())), Value::Null);
    }

    #[test]
    fn test_threshold_suppression_rejects_group_by() {
        let value = AttrValue::object([
            ("group_by", AttrValue::list([AttrValue::String("host.name".into())])),
            ("duration", AttrValue::String("5m".into())),
        ]);
        let mut diags = Diagnostics::new();
        let _ = threshold_suppression_to_api(&value, &mut diags);
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_filters_keep_prior_formatting() {
        let prior = Value::from(r#"[ {"match_all": {}} ]"#);
        let mut diags = Diagnostics::new();
        let fresh = filters_from_api(
            &prior,
            Some(vec![serde_json::json!({"match_all": {}})]),
            "filters",
            &mut diags,
        );
        assert_eq!(fresh, prior);
        assert_eq!(filters_from_api(&Value::Null, Some(vec![]), "filters", &mut diags), Value::Null);
    }

    #[test]
    fn test_apply_common_nulls_type_specific_fields() {
        let mut model = base_model();
        model.query = Value::from("event.outcome: failure");
        model.threshold = AttrValue::object([("value", AttrValue::Int64(3))]);
        let meta = RuleMeta {
            id: "6f0f7b1c".into(),
            revision: Some(2),
            ..RuleMeta::default()
        };
        let shared = SharedRuleParams {
            name: "Suspicious login".into(),
            description: "Detects odd logins".into(),
            risk_score: 47,
            severity: RuleSeverity::Medium,
            enabled: Some(true),
            tags: Some(vec![]),
            ..SharedRuleParams::default()
        };
        let mut diags = Diagnostics::new();
        let prior = apply_common(&mut model, &meta, shared, &mut diags);

        assert_eq!(prior.query, Value::from("event.outcome: failure"));
        assert_eq!(model.query, Value::Null);
        assert_eq!(model.threshold, AttrValue::Null);
        assert_eq!(model.tags, Value::Null);
        assert_eq!(model.enabled, Value::Known(true));
        assert_eq!(model.revision, Value::Known(2));
        assert_eq!(model.actions, AttrValue::Null);
    }
}
