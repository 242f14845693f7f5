//! Terraform models of the detection rule resource.
//!
//! The top-level model is flat: every attribute of every rule type lives on
//! [`DetectionRuleModel`], and the active `type` decides which of them are
//! sent. Nested blocks stay as raw [`AttrValue`]s on the model and are
//! decoded into their block models when a payload is built, so conversion
//! errors carry the full attribute path.

use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{AttrValue, FromAttr, IntoAttr, ObjectReader, Value};

/// Declares a model struct with attribute (de)coding.
///
/// Each field maps to the attribute named by the literal after `=>`.
macro_rules! attr_model {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $($field:ident: $ty:ty => $attr:literal),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq)]
        pub struct $name {
            $(
                #[doc = concat!("`", $attr, "`")]
                pub $field: $ty,
            )*
        }

        impl FromAttr for $name {
            fn from_attr(
                value: &AttrValue,
                path: &AttributePath,
                diags: &mut Diagnostics,
            ) -> Option<Self> {
                let obj = ObjectReader::new(value, path, diags)?;
                Some(Self {
                    $($field: obj.field($attr, diags),)*
                })
            }
        }

        impl IntoAttr for $name {
            fn into_attr(self) -> AttrValue {
                AttrValue::object([
                    $(($attr, self.$field.into_attr()),)*
                ])
            }
        }
    };
}

attr_model! {
    /// The resource model.
    pub struct DetectionRuleModel {
        id: Value<String> => "id",
        space_id: Value<String> => "space_id",
        rule_id: Value<String> => "rule_id",
        rule_type: Value<String> => "type",
        name: Value<String> => "name",
        description: Value<String> => "description",
        risk_score: Value<i64> => "risk_score",
        severity: Value<String> => "severity",
        enabled: Value<bool> => "enabled",
        from: Value<String> => "from",
        to: Value<String> => "to",
        interval: Value<String> => "interval",
        tags: Value<Vec<String>> => "tags",
        author: Value<Vec<String>> => "author",
        license: Value<String> => "license",
        false_positives: Value<Vec<String>> => "false_positives",
        references: Value<Vec<String>> => "references",
        note: Value<String> => "note",
        setup: Value<String> => "setup",
        max_signals: Value<i64> => "max_signals",
        version: Value<i64> => "version",
        namespace: Value<String> => "namespace",
        building_block_type: Value<String> => "building_block_type",
        timeline_id: Value<String> => "timeline_id",
        timeline_title: Value<String> => "timeline_title",
        investigation_fields: Value<Vec<String>> => "investigation_fields",
        exceptions_list: AttrValue => "exceptions_list",
        actions: AttrValue => "actions",
        response_actions: AttrValue => "response_actions",
        threat: AttrValue => "threat",
        risk_score_mapping: AttrValue => "risk_score_mapping",
        severity_mapping: AttrValue => "severity_mapping",

        query: Value<String> => "query",
        language: Value<String> => "language",
        index: Value<Vec<String>> => "index",
        data_view_id: Value<String> => "data_view_id",
        filters: Value<String> => "filters",
        saved_id: Value<String> => "saved_id",
        alert_suppression: AttrValue => "alert_suppression",
        tiebreaker_field: Value<String> => "tiebreaker_field",
        anomaly_threshold: Value<i64> => "anomaly_threshold",
        machine_learning_job_id: Value<Vec<String>> => "machine_learning_job_id",
        new_terms_fields: Value<Vec<String>> => "new_terms_fields",
        history_window_start: Value<String> => "history_window_start",
        threat_index: Value<Vec<String>> => "threat_index",
        threat_query: Value<String> => "threat_query",
        threat_indicator_path: Value<String> => "threat_indicator_path",
        threat_filters: Value<String> => "threat_filters",
        threat_mapping: AttrValue => "threat_mapping",
        concurrent_searches: Value<i64> => "concurrent_searches",
        items_per_search: Value<i64> => "items_per_search",
        threshold: AttrValue => "threshold",

        created_at: Value<String> => "created_at",
        created_by: Value<String> => "created_by",
        updated_at: Value<String> => "updated_at",
        updated_by: Value<String> => "updated_by",
        revision: Value<i64> => "revision",
    }
}

attr_model! {
    /// `exceptions_list` element.
    pub struct ExceptionListModel {
        id: Value<String> => "id",
        list_id: Value<String> => "list_id",
        list_type: Value<String> => "type",
        namespace_type: Value<String> => "namespace_type",
    }
}

attr_model! {
    /// `actions` element.
    pub struct ActionModel {
        action_type_id: Value<String> => "action_type_id",
        id: Value<String> => "id",
        params: Value<String> => "params",
        group: Value<String> => "group",
        uuid: Value<String> => "uuid",
        alerts_filter: Value<String> => "alerts_filter",
        frequency: AttrValue => "frequency",
    }
}

attr_model! {
    /// `actions[*].frequency`.
    pub struct ActionFrequencyModel {
        notify_when: Value<String> => "notify_when",
        summary: Value<bool> => "summary",
        throttle: Value<String> => "throttle",
    }
}

attr_model! {
    /// `response_actions` element.
    pub struct ResponseActionModel {
        action_type_id: Value<String> => "action_type_id",
        params: AttrValue => "params",
    }
}

attr_model! {
    /// `response_actions[*].params`, the union of osquery and endpoint
    /// parameters.
    pub struct ResponseActionParamsModel {
        query: Value<String> => "query",
        pack_id: Value<String> => "pack_id",
        saved_query_id: Value<String> => "saved_query_id",
        timeout: Value<i64> => "timeout",
        ecs_mapping: Value<String> => "ecs_mapping",
        queries: AttrValue => "queries",
        command: Value<String> => "command",
        comment: Value<String> => "comment",
        config: AttrValue => "config",
    }
}

attr_model! {
    /// `response_actions[*].params.queries` element.
    pub struct OsqueryQueryModel {
        id: Value<String> => "id",
        query: Value<String> => "query",
        platform: Value<String> => "platform",
        version: Value<String> => "version",
        removed: Value<bool> => "removed",
        snapshot: Value<bool> => "snapshot",
        ecs_mapping: Value<String> => "ecs_mapping",
    }
}

attr_model! {
    /// `response_actions[*].params.config`.
    pub struct EndpointProcessConfigModel {
        field: Value<String> => "field",
        overwrite: Value<bool> => "overwrite",
    }
}

attr_model! {
    /// `threat` element.
    pub struct ThreatModel {
        framework: Value<String> => "framework",
        tactic: AttrValue => "tactic",
        technique: AttrValue => "technique",
    }
}

attr_model! {
    /// `threat[*].tactic`.
    pub struct ThreatTacticModel {
        id: Value<String> => "id",
        name: Value<String> => "name",
        reference: Value<String> => "reference",
    }
}

attr_model! {
    /// `threat[*].technique` element.
    pub struct ThreatTechniqueModel {
        id: Value<String> => "id",
        name: Value<String> => "name",
        reference: Value<String> => "reference",
        subtechnique: AttrValue => "subtechnique",
    }
}

attr_model! {
    /// `threat[*].technique[*].subtechnique` element.
    pub struct ThreatSubtechniqueModel {
        id: Value<String> => "id",
        name: Value<String> => "name",
        reference: Value<String> => "reference",
    }
}

attr_model! {
    /// `risk_score_mapping` element.
    pub struct RiskScoreMappingModel {
        field: Value<String> => "field",
        operator: Value<String> => "operator",
        value: Value<String> => "value",
        risk_score: Value<i64> => "risk_score",
    }
}

attr_model! {
    /// `severity_mapping` element.
    pub struct SeverityMappingModel {
        field: Value<String> => "field",
        operator: Value<String> => "operator",
        value: Value<String> => "value",
        severity: Value<String> => "severity",
    }
}

attr_model! {
    /// `alert_suppression`. Threshold rules only accept `duration`.
    pub struct AlertSuppressionModel {
        group_by: Value<Vec<String>> => "group_by",
        duration: Value<String> => "duration",
        missing_fields_strategy: Value<String> => "missing_fields_strategy",
    }
}

attr_model! {
    /// `threshold`.
    pub struct ThresholdModel {
        field: Value<Vec<String>> => "field",
        value: Value<i64> => "value",
        cardinality: AttrValue => "cardinality",
    }
}

attr_model! {
    /// `threshold.cardinality` element.
    pub struct ThresholdCardinalityModel {
        field: Value<String> => "field",
        value: Value<i64> => "value",
    }
}

attr_model! {
    /// `threat_mapping` element.
    pub struct ThreatMappingModel {
        entries: AttrValue => "entries",
    }
}

attr_model! {
    /// `threat_mapping[*].entries` element.
    pub struct ThreatMappingEntryModel {
        field: Value<String> => "field",
        entry_type: Value<String> => "type",
        value: Value<String> => "value",
    }
}
