//! Detection engine rule bodies.
//!
//! Create and update share one payload shape: [`RulePayload`], tagged by
//! `type`. Each variant carries the shared parameters plus the fields only
//! that rule type accepts. Responses decode into [`RuleResponse`], whose
//! `Unsupported` arm catches rule types this crate does not model yet.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

use elasticstack_typeutils::KibanaDuration;

/// Every rule type string the detection engine accepts.
pub const RULE_TYPES: [&str; 8] = [
    "query",
    "saved_query",
    "eql",
    "esql",
    "machine_learning",
    "new_terms",
    "threat_match",
    "threshold",
];

/// Rule severity.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleSeverity {
    /// low
    #[default]
    Low,
    /// medium
    Medium,
    /// high
    High,
    /// critical
    Critical,
}

impl RuleSeverity {
    /// Wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for RuleSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RuleSeverity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            "critical" => Ok(Self::Critical),
            other => Err(format!(
                "expected one of low, medium, high, critical; got {other:?}"
            )),
        }
    }
}

/// Reference to an exception list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleExceptionList {
    /// Saved object ID
    pub id: String,
    /// Human-readable list ID
    pub list_id: String,
    /// `detection`, `rule_default` or `endpoint`
    #[serde(rename = "type")]
    pub list_type: String,
    /// `single` or `agnostic`
    pub namespace_type: String,
}

/// How often an action fires.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFrequency {
    /// `onActiveAlert`, `onThrottleInterval` or `onActionGroupChange`
    #[serde(rename = "notifyWhen")]
    pub notify_when: String,
    /// Summarize alerts instead of one action per alert
    pub summary: bool,
    /// Throttle interval, required with `onThrottleInterval`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub throttle: Option<String>,
}

/// A connector action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleAction {
    /// Connector type such as `.slack`
    pub action_type_id: String,
    /// Connector ID
    pub id: String,
    /// Connector-specific parameters
    #[serde(default)]
    pub params: serde_json::Map<String, Json>,
    /// Action group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<String>,
    /// Action UUID assigned by Kibana
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uuid: Option<String>,
    /// Notification frequency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<ActionFrequency>,
    /// KQL or time-frame filter on which alerts trigger the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alerts_filter: Option<Json>,
}

/// Response action, tagged by `action_type_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action_type_id")]
pub enum ResponseAction {
    /// Run an osquery query or pack
    #[serde(rename = ".osquery")]
    Osquery {
        /// Query parameters
        params: OsqueryParams,
    },
    /// Run an endpoint command
    #[serde(rename = ".endpoint")]
    Endpoint {
        /// Command parameters
        params: EndpointParams,
    },
}

/// Parameters of an osquery response action.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsqueryParams {
    /// Single query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// Query pack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pack_id: Option<String>,
    /// Saved query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_query_id: Option<String>,
    /// Timeout in seconds
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout: Option<i64>,
    /// Result to ECS field mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs_mapping: Option<BTreeMap<String, Json>>,
    /// Queries of an inline pack
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub queries: Option<Vec<OsqueryQuery>>,
}

/// One query of an inline osquery pack.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OsqueryQuery {
    /// Query ID
    pub id: String,
    /// SQL
    pub query: String,
    /// Target platforms
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    /// Minimum osquery version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    /// Report removed rows
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub removed: Option<bool>,
    /// Snapshot query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snapshot: Option<bool>,
    /// Result to ECS field mapping
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ecs_mapping: Option<BTreeMap<String, Json>>,
}

/// Parameters of an endpoint response action.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointParams {
    /// `isolate`, `kill-process` or `suspend-process`
    pub command: String,
    /// Comment attached to the action
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    /// Process selection for process commands
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub config: Option<EndpointProcessConfig>,
}

/// Process selection for `kill-process` and `suspend-process`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointProcessConfig {
    /// Alert field holding the process identifier
    pub field: String,
    /// Use `field` instead of the process entity ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overwrite: Option<bool>,
}

/// MITRE ATT&CK threat mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    /// Usually `MITRE ATT&CK`
    pub framework: String,
    /// Tactic
    pub tactic: ThreatTactic,
    /// Techniques under the tactic
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub technique: Option<Vec<ThreatTechnique>>,
}

/// A MITRE tactic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatTactic {
    /// Tactic ID, such as `TA0001`
    pub id: String,
    /// Tactic name
    pub name: String,
    /// Reference URL
    pub reference: String,
}

/// A MITRE technique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatTechnique {
    /// Technique ID, such as `T1566`
    pub id: String,
    /// Technique name
    pub name: String,
    /// Reference URL
    pub reference: String,
    /// Subtechniques
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtechnique: Option<Vec<ThreatSubtechnique>>,
}

/// A MITRE subtechnique.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatSubtechnique {
    /// Subtechnique ID, such as `T1566.001`
    pub id: String,
    /// Subtechnique name
    pub name: String,
    /// Reference URL
    pub reference: String,
}

/// Fields highlighted in the alert details flyout.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvestigationFields {
    /// Field names
    pub field_names: Vec<String>,
}

/// Overrides the risk score from a source event field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskScoreMapping {
    /// Source field
    pub field: String,
    /// Always `equals`
    pub operator: String,
    /// Matched value, empty for the field's own numeric value
    pub value: String,
    /// Score to apply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score: Option<i64>,
}

/// Overrides the severity from a source event field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeverityMapping {
    /// Source field
    pub field: String,
    /// Always `equals`
    pub operator: String,
    /// Matched value
    pub value: String,
    /// Severity to apply
    pub severity: RuleSeverity,
}

/// Alert suppression for every rule type except threshold.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AlertSuppression {
    /// Fields to group suppressed alerts by
    #[serde(default)]
    pub group_by: Vec<String>,
    /// Suppression window
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration: Option<KibanaDuration>,
    /// `suppress` or `doNotSuppress`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub missing_fields_strategy: Option<String>,
}

/// Threshold rules only accept a window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdAlertSuppression {
    /// Suppression window
    pub duration: KibanaDuration,
}

/// One field or several; the API accepts both shapes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum OneOrMany {
    /// A single string
    One(String),
    /// A list of strings
    Many(Vec<String>),
}

impl OneOrMany {
    /// Flattens to a list.
    #[must_use]
    pub fn into_vec(self) -> Vec<String> {
        match self {
            Self::One(value) => vec![value],
            Self::Many(values) => values,
        }
    }
}

impl From<Vec<String>> for OneOrMany {
    fn from(values: Vec<String>) -> Self {
        Self::Many(values)
    }
}

/// Threshold settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threshold {
    /// Fields to group by; empty means the whole result set
    pub field: OneOrMany,
    /// Minimum number of events
    pub value: i64,
    /// Distinct-value conditions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cardinality: Option<Vec<ThresholdCardinality>>,
}

/// `cardinality(field) >= value`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdCardinality {
    /// Field to count distinct values of
    pub field: String,
    /// Minimum distinct values
    pub value: i64,
}

/// One indicator match condition group.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatMappingItem {
    /// Conditions, all of which must match
    pub entries: Vec<ThreatMappingEntry>,
}

/// Source field compared with an indicator field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThreatMappingEntry {
    /// Source event field
    pub field: String,
    /// Always `mapping`
    #[serde(rename = "type")]
    pub entry_type: String,
    /// Indicator field
    pub value: String,
}

/// Parameters every rule type shares.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SharedRuleParams {
    /// Rule name
    pub name: String,
    /// Rule description
    pub description: String,
    /// Risk score, 0 to 100
    pub risk_score: i64,
    /// Severity
    pub severity: RuleSeverity,
    /// User-facing rule ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    /// Whether the rule runs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enabled: Option<bool>,
    /// Lookback start, date math
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    /// Lookback end, date math
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    /// Run interval
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interval: Option<String>,
    /// Tags
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tags: Option<Vec<String>>,
    /// Authors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<Vec<String>>,
    /// License
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license: Option<String>,
    /// Known false positives
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub false_positives: Option<Vec<String>>,
    /// Reference URLs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub references: Option<Vec<String>>,
    /// Investigation guide, markdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    /// Setup guide, markdown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub setup: Option<String>,
    /// Maximum alerts per run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_signals: Option<i64>,
    /// Rule version
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<i64>,
    /// Exception lists
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exceptions_list: Option<Vec<RuleExceptionList>>,
    /// Connector actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actions: Option<Vec<RuleAction>>,
    /// Response actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub response_actions: Option<Vec<ResponseAction>>,
    /// MITRE ATT&CK mappings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat: Option<Vec<Threat>>,
    /// Timeline template ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_id: Option<String>,
    /// Timeline template title
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeline_title: Option<String>,
    /// Investigation fields
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub investigation_fields: Option<InvestigationFields>,
    /// `default` marks a building block rule
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub building_block_type: Option<String>,
    /// Alert index namespace
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
    /// Risk score overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub risk_score_mapping: Option<Vec<RiskScoreMapping>>,
    /// Severity overrides
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity_mapping: Option<Vec<SeverityMapping>>,
}

/// Query rule fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRuleFields {
    /// Query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// `kuery` or `lucene`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Saved query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// Saved query rule fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SavedQueryRuleFields {
    /// Saved query
    pub saved_id: String,
    /// Query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub query: Option<String>,
    /// `kuery` or `lucene`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// EQL rule fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EqlRuleFields {
    /// EQL query
    pub query: String,
    /// Always `eql`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Sort tiebreaker
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tiebreaker_field: Option<String>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// ES|QL rule fields. ES|QL queries name their own sources, so there
/// are no index patterns or filters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EsqlRuleFields {
    /// ES|QL query
    pub query: String,
    /// Always `esql`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// Machine learning rule fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MachineLearningRuleFields {
    /// Minimum anomaly score
    pub anomaly_threshold: i64,
    /// Source job or jobs
    pub machine_learning_job_id: OneOrMany,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// New terms rule fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NewTermsRuleFields {
    /// Query
    pub query: String,
    /// `kuery` or `lucene`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Fields whose new values raise alerts
    pub new_terms_fields: Vec<String>,
    /// History window, date math
    pub history_window_start: String,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// Indicator match rule fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ThreatMatchRuleFields {
    /// Source event query
    pub query: String,
    /// `kuery` or `lucene`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Saved query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
    /// Indicator index patterns
    pub threat_index: Vec<String>,
    /// Match conditions
    pub threat_mapping: Vec<ThreatMappingItem>,
    /// Indicator query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_query: Option<String>,
    /// Indicator object path
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_indicator_path: Option<String>,
    /// Indicator filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threat_filters: Option<Vec<Json>>,
    /// Parallel searches per run
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub concurrent_searches: Option<i64>,
    /// Indicators per search
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub items_per_search: Option<i64>,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<AlertSuppression>,
}

/// Threshold rule fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdRuleFields {
    /// Query
    pub query: String,
    /// `kuery` or `lucene`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub language: Option<String>,
    /// Index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<String>>,
    /// Data view, instead of index patterns
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_view_id: Option<String>,
    /// Query DSL filters
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filters: Option<Vec<Json>>,
    /// Saved query
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub saved_id: Option<String>,
    /// Threshold settings
    pub threshold: Threshold,
    /// Alert suppression
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alert_suppression: Option<ThresholdAlertSuppression>,
}

/// Shared parameters plus the variant fields, with the rule `id` set
/// on update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProps<F> {
    /// Rule UUID, only on update
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Shared parameters
    #[serde(flatten)]
    pub shared: SharedRuleParams,
    /// Variant fields
    #[serde(flatten)]
    pub fields: F,
}

impl<F> RuleProps<F> {
    /// Props for a create request.
    pub const fn new(shared: SharedRuleParams, fields: F) -> Self {
        Self {
            id: None,
            shared,
            fields,
        }
    }
}

/// Create and update request body.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RulePayload {
    /// `query`
    Query(RuleProps<QueryRuleFields>),
    /// `saved_query`
    SavedQuery(RuleProps<SavedQueryRuleFields>),
    /// `eql`
    Eql(RuleProps<EqlRuleFields>),
    /// `esql`
    Esql(RuleProps<EsqlRuleFields>),
    /// `machine_learning`
    MachineLearning(RuleProps<MachineLearningRuleFields>),
    /// `new_terms`
    NewTerms(RuleProps<NewTermsRuleFields>),
    /// `threat_match`
    ThreatMatch(RuleProps<ThreatMatchRuleFields>),
    /// `threshold`
    Threshold(RuleProps<ThresholdRuleFields>),
}

impl RulePayload {
    /// The `type` discriminator.
    #[must_use]
    pub const fn rule_type(&self) -> &'static str {
        match self {
            Self::Query(_) => "query",
            Self::SavedQuery(_) => "saved_query",
            Self::Eql(_) => "eql",
            Self::Esql(_) => "esql",
            Self::MachineLearning(_) => "machine_learning",
            Self::NewTerms(_) => "new_terms",
            Self::ThreatMatch(_) => "threat_match",
            Self::Threshold(_) => "threshold",
        }
    }

    /// Shared parameters of whichever variant is set.
    #[must_use]
    pub const fn shared(&self) -> &SharedRuleParams {
        match self {
            Self::Query(p) => &p.shared,
            Self::SavedQuery(p) => &p.shared,
            Self::Eql(p) => &p.shared,
            Self::Esql(p) => &p.shared,
            Self::MachineLearning(p) => &p.shared,
            Self::NewTerms(p) => &p.shared,
            Self::ThreatMatch(p) => &p.shared,
            Self::Threshold(p) => &p.shared,
        }
    }

    /// Sets the rule UUID, turning a create body into an update body.
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        let id = Some(id.into());
        match &mut self {
            Self::Query(p) => p.id = id,
            Self::SavedQuery(p) => p.id = id,
            Self::Eql(p) => p.id = id,
            Self::Esql(p) => p.id = id,
            Self::MachineLearning(p) => p.id = id,
            Self::NewTerms(p) => p.id = id,
            Self::ThreatMatch(p) => p.id = id,
            Self::Threshold(p) => p.id = id,
        }
        self
    }
}

/// Server-assigned rule metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleMeta {
    /// Rule UUID
    pub id: String,
    /// Creation timestamp
    #[serde(default)]
    pub created_at: Option<String>,
    /// Creating user
    #[serde(default)]
    pub created_by: Option<String>,
    /// Last update timestamp
    #[serde(default)]
    pub updated_at: Option<String>,
    /// Last updating user
    #[serde(default)]
    pub updated_by: Option<String>,
    /// Revision, bumped on every change
    #[serde(default)]
    pub revision: Option<i64>,
}

/// A rule as returned by the API.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RuleBody<F> {
    /// Metadata
    #[serde(flatten)]
    pub meta: RuleMeta,
    /// Shared parameters
    #[serde(flatten)]
    pub shared: SharedRuleParams,
    /// Variant fields
    #[serde(flatten)]
    pub fields: F,
}

/// A decoded rule response.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RuleResponse {
    /// `query`
    Query(RuleBody<QueryRuleFields>),
    /// `saved_query`
    SavedQuery(RuleBody<SavedQueryRuleFields>),
    /// `eql`
    Eql(RuleBody<EqlRuleFields>),
    /// `esql`
    Esql(RuleBody<EsqlRuleFields>),
    /// `machine_learning`
    MachineLearning(RuleBody<MachineLearningRuleFields>),
    /// `new_terms`
    NewTerms(RuleBody<NewTermsRuleFields>),
    /// `threat_match`
    ThreatMatch(RuleBody<ThreatMatchRuleFields>),
    /// `threshold`
    Threshold(RuleBody<ThresholdRuleFields>),
    /// A rule type introduced server-side that is not modelled here
    #[serde(other)]
    Unsupported,
}

impl RuleResponse {
    /// Resolves a raw response into its concrete variant.
    ///
    /// # Errors
    ///
    /// Fails when the body does not match the shape its `type` names.
    pub fn resolve(raw: &RawRuleResponse) -> Result<Self, serde_json::Error> {
        Self::deserialize(&raw.0)
    }

    /// The `type` discriminator, or `None` for unsupported types.
    #[must_use]
    pub const fn rule_type(&self) -> Option<&'static str> {
        match self {
            Self::Query(_) => Some("query"),
            Self::SavedQuery(_) => Some("saved_query"),
            Self::Eql(_) => Some("eql"),
            Self::Esql(_) => Some("esql"),
            Self::MachineLearning(_) => Some("machine_learning"),
            Self::NewTerms(_) => Some("new_terms"),
            Self::ThreatMatch(_) => Some("threat_match"),
            Self::Threshold(_) => Some("threshold"),
            Self::Unsupported => None,
        }
    }

    /// Metadata and shared parameters of a supported variant.
    #[must_use]
    pub const fn common(&self) -> Option<(&RuleMeta, &SharedRuleParams)> {
        match self {
            Self::Query(b) => Some((&b.meta, &b.shared)),
            Self::SavedQuery(b) => Some((&b.meta, &b.shared)),
            Self::Eql(b) => Some((&b.meta, &b.shared)),
            Self::Esql(b) => Some((&b.meta, &b.shared)),
            Self::MachineLearning(b) => Some((&b.meta, &b.shared)),
            Self::NewTerms(b) => Some((&b.meta, &b.shared)),
            Self::ThreatMatch(b) => Some((&b.meta, &b.shared)),
            Self::Threshold(b) => Some((&b.meta, &b.shared)),
            Self::Unsupported => None,
        }
    }
}

/// An undecoded response body. Keeps the raw `type` for error messages.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct RawRuleResponse(pub Json);

impl RawRuleResponse {
    /// The raw `type` value, if any.
    #[must_use]
    pub fn rule_type(&self) -> Option<&str> {
        self.0.get("type").and_then(Json::as_str)
    }

    /// The raw `id` value, if any.
    #[must_use]
    pub fn id(&self) -> Option<&str> {
        self.0.get("id").and_then(Json::as_str)
    }
}
