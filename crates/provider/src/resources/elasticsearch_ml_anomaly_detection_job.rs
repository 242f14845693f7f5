//! `elasticstack_elasticsearch_ml_anomaly_detection_job`: anomaly detection jobs.

use async_trait::async_trait;
use serde_json::Value as Json;
use tracing::instrument;

use elasticstack_clients::ApiClient;
use elasticstack_clients::elasticsearch::ml::{self, Job, JobConfig, JobUpdate};
use elasticstack_diagnostics::{AttributePath, Diagnostics};
use elasticstack_typeutils::{
    AttrValue, FromAttr, IntoAttr, ObjectReader, Value, json_string_as, json_string_from,
};

use super::{client_error, parse_id, required_string};
use crate::resource::{Resource, Response};

/// Resource type name.
pub const TYPE_NAME: &str = "elasticstack_elasticsearch_ml_anomaly_detection_job";

/// Prefix Elasticsearch adds to dedicated results index names.
const CUSTOM_RESULTS_PREFIX: &str = "custom-";

/// Terraform model.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MlJobModel {
    /// `<cluster_uuid>/<job_id>`
    pub id: Value<String>,
    /// Job ID
    pub job_id: Value<String>,
    /// Description
    pub description: Value<String>,
    /// Job groups
    pub groups: Value<Vec<String>>,
    /// Analysis configuration, JSON object
    pub analysis_config: Value<String>,
    /// Data description, JSON object
    pub data_description: Value<String>,
    /// Analysis limits, JSON object
    pub analysis_limits: Value<String>,
    /// Results index name
    pub results_index_name: Value<String>,
    /// Allow lazy open
    pub allow_lazy_open: Value<bool>,
    /// Snapshot retention in days
    pub model_snapshot_retention_days: Value<i64>,
    /// Days after which only daily snapshots are kept
    pub daily_model_snapshot_retention_after_days: Value<i64>,
    /// Creation time, epoch millis
    pub create_time: Value<i64>,
    /// Job type
    pub job_type: Value<String>,
}

impl FromAttr for MlJobModel {
    fn from_attr(value: &AttrValue, path: &AttributePath, diags: &mut Diagnostics) -> Option<Self> {
        let obj = ObjectReader::new(value, path, diags)?;
        Some(Self {
            id: obj.field("id", diags),
            job_id: obj.field("job_id", diags),
            description: obj.field("description", diags),
            groups: obj.field("groups", diags),
            analysis_config: obj.field("analysis_config", diags),
            data_description: obj.field("data_description", diags),
            analysis_limits: obj.field("analysis_limits", diags),
            results_index_name: obj.field("results_index_name", diags),
            allow_lazy_open: obj.field("allow_lazy_open", diags),
            model_snapshot_retention_days: obj.field("model_snapshot_retention_days", diags),
            daily_model_snapshot_retention_after_days: obj
                .field("daily_model_snapshot_retention_after_days", diags),
            create_time: obj.field("create_time", diags),
            job_type: obj.field("job_type", diags),
        })
    }
}

impl IntoAttr for MlJobModel {
    fn into_attr(self) -> AttrValue {
        AttrValue::object([
            ("id", self.id.into_attr()),
            ("job_id", self.job_id.into_attr()),
            ("description", self.description.into_attr()),
            ("groups", self.groups.into_attr()),
            ("analysis_config", self.analysis_config.into_attr()),
            ("data_description", self.data_description.into_attr()),
            ("analysis_limits", self.analysis_limits.into_attr()),
            ("results_index_name", self.results_index_name.into_attr()),
            ("allow_lazy_open", self.allow_lazy_open.into_attr()),
            (
                "model_snapshot_retention_days",
                self.model_snapshot_retention_days.into_attr(),
            ),
            (
                "daily_model_snapshot_retention_after_days",
                self.daily_model_snapshot_retention_after_days.into_attr(),
            ),
            ("create_time", self.create_time.into_attr()),
            ("job_type", self.job_type.into_attr()),
        ])
    }
}

/// True if every value in `subset` appears in `superset` at the same path.
///
/// Elasticsearch fills defaults into stored job documents; a configured
/// document is unchanged as long as the stored one only adds to it.
fn json_superset(superset: &Json, subset: &Json) -> bool {
    match (superset, subset) {
        (Json::Object(big), Json::Object(small)) => small
            .iter()
            .all(|(k, v)| big.get(k).is_some_and(|b| json_superset(b, v))),
        (Json::Array(big), Json::Array(small)) => {
            big.len() == small.len() && big.iter().zip(small).all(|(b, s)| json_superset(b, s))
        }
        (a, b) => a == b,
    }
}

/// Keeps the configured JSON string when the server only added defaults.
fn reconcile_json(prior: &Value<String>, fresh: Option<&Json>, path: &AttributePath, diags: &mut Diagnostics) -> Value<String> {
    let Some(fresh) = fresh.filter(|f| !f.is_null()) else {
        return Value::Null;
    };
    if let Some(old) = prior.known_str()
        && let Ok(old_json) = serde_json::from_str::<Json>(old)
        && json_superset(fresh, &old_json)
    {
        return prior.clone();
    }
    json_string_from(fresh, path, diags)
}

fn reconcile_results_index(prior: &Value<String>, fresh: Option<String>) -> Value<String> {
    match (prior.known_str(), fresh) {
        (Some(old), Some(new)) if new == format!("{CUSTOM_RESULTS_PREFIX}{old}") => prior.clone(),
        (_, fresh) => Value::from_option(fresh),
    }
}

/// Elasticsearch defaults, sent when the field is removed from the configuration.
const DEFAULT_ALLOW_LAZY_OPEN: bool = false;
const DEFAULT_SNAPSHOT_RETENTION_DAYS: i64 = 10;
const DEFAULT_DAILY_SNAPSHOT_RETENTION_AFTER_DAYS: i64 = 1;

/// The `_update` value moving `prior` to `plan`, if any.
///
/// Unknown plans send nothing. A null plan over a known prior sends `cleared`.
fn changed<T: Clone + PartialEq>(plan: &Value<T>, prior: &Value<T>, cleared: T) -> Option<T> {
    match (plan, prior) {
        (Value::Known(value), _) if plan != prior => Some(value.clone()),
        (Value::Null, Value::Known(_)) => Some(cleared),
        _ => None,
    }
}

/// The server value, except that a default the configuration left unset stays null.
fn unset_default<T: PartialEq>(prior: &Value<T>, fresh: Option<T>, default: &T) -> Value<T> {
    match fresh {
        Some(value) if matches!(prior, Value::Null) && &value == default => Value::Null,
        other => Value::from_option(other),
    }
}

fn required_json(value: &Value<String>, name: &str, diags: &mut Diagnostics) -> Option<Json> {
    let path = AttributePath::root(name);
    if value.known().is_none() {
        diags.add_attribute_error(
            path,
            "Missing required attribute",
            format!("{name} must be set to a known value"),
        );
        return None;
    }
    json_string_as(value, &path, diags)
}

impl MlJobModel {
    fn to_config(&self, diags: &mut Diagnostics) -> Option<JobConfig> {
        let analysis_config = required_json(&self.analysis_config, "analysis_config", diags);
        let data_description = required_json(&self.data_description, "data_description", diags);
        let analysis_limits =
            json_string_as(&self.analysis_limits, &AttributePath::root("analysis_limits"), diags);
        Some(JobConfig {
            description: self.description.known_cloned(),
            groups: self.groups.known_cloned(),
            analysis_config: analysis_config?,
            data_description: data_description?,
            analysis_limits,
            results_index_name: self.results_index_name.known_cloned(),
            allow_lazy_open: self.allow_lazy_open.known_cloned(),
            model_snapshot_retention_days: self.model_snapshot_retention_days.known_cloned(),
            daily_model_snapshot_retention_after_days: self
                .daily_model_snapshot_retention_after_days
                .known_cloned(),
        })
    }

    /// Updatable fields that differ from `prior`.
    ///
    /// A field removed from the configuration sends the value Elasticsearch
    /// treats as unset. `analysis_limits` can only be raised, so removing it
    /// is an error.
    fn to_update(&self, prior: &Self, diags: &mut Diagnostics) -> JobUpdate {
        let analysis_limits = match (&self.analysis_limits, &prior.analysis_limits) {
            (Value::Null, Value::Known(_)) => {
                diags.add_attribute_error(
                    AttributePath::root("analysis_limits"),
                    "Unable to clear attribute",
                    "analysis_limits of an existing job can only be raised; replace the job to reset them",
                );
                None
            }
            (planned, stored) => changed(planned, stored, String::new()).and_then(|_| {
                json_string_as(&self.analysis_limits, &AttributePath::root("analysis_limits"), diags)
            }),
        };
        JobUpdate {
            description: changed(&self.description, &prior.description, String::new()),
            groups: changed(&self.groups, &prior.groups, Vec::new()),
            analysis_limits,
            allow_lazy_open: changed(&self.allow_lazy_open, &prior.allow_lazy_open, DEFAULT_ALLOW_LAZY_OPEN),
            model_snapshot_retention_days: changed(
                &self.model_snapshot_retention_days,
                &prior.model_snapshot_retention_days,
                DEFAULT_SNAPSHOT_RETENTION_DAYS,
            ),
            daily_model_snapshot_retention_after_days: changed(
                &self.daily_model_snapshot_retention_after_days,
                &prior.daily_model_snapshot_retention_after_days,
                DEFAULT_DAILY_SNAPSHOT_RETENTION_AFTER_DAYS,
            ),
        }
    }

    fn update_from_job(&mut self, job: Job, diags: &mut Diagnostics) {
        let config = job.config;
        self.job_id = Value::Known(job.job_id);
        self.job_type = Value::from_option(job.job_type);
        self.create_time = Value::from_option(job.create_time);
        self.description = match config.description {
            Some(d) if d.is_empty() && self.description.known_str() != Some("") => Value::Null,
            other => Value::from_option(other),
        };
        self.groups = match config.groups {
            Some(groups) if !groups.is_empty() => Value::Known(groups),
            _ if self.groups.known().is_some_and(Vec::is_empty) => Value::Known(Vec::new()),
            _ => Value::Null,
        };
        self.analysis_config = reconcile_json(
            &self.analysis_config,
            Some(&config.analysis_config),
            &AttributePath::root("analysis_config"),
            diags,
        );
        self.data_description = reconcile_json(
            &self.data_description,
            Some(&config.data_description),
            &AttributePath::root("data_description"),
            diags,
        );
        self.analysis_limits = reconcile_json(
            &self.analysis_limits,
            config.analysis_limits.as_ref(),
            &AttributePath::root("analysis_limits"),
            diags,
        );
        self.results_index_name =
            reconcile_results_index(&self.results_index_name, config.results_index_name);
        self.allow_lazy_open =
            unset_default(&self.allow_lazy_open, config.allow_lazy_open, &DEFAULT_ALLOW_LAZY_OPEN);
        self.model_snapshot_retention_days = unset_default(
            &self.model_snapshot_retention_days,
            config.model_snapshot_retention_days,
            &DEFAULT_SNAPSHOT_RETENTION_DAYS,
        );
        self.daily_model_snapshot_retention_after_days = unset_default(
            &self.daily_model_snapshot_retention_after_days,
            config.daily_model_snapshot_retention_after_days,
            &DEFAULT_DAILY_SNAPSHOT_RETENTION_AFTER_DAYS,
        );
    }
}

/// Anomaly detection job resource.
#[derive(Debug, Clone, Copy, Default)]
pub struct MlAnomalyDetectionJobResource;

#[async_trait]
impl Resource for MlAnomalyDetectionJobResource {
    type Model = MlJobModel;

    fn type_name(&self) -> &'static str {
        TYPE_NAME
    }

    fn requires_replace(&self) -> &'static [&'static str] {
        &["job_id", "analysis_config", "data_description", "results_index_name"]
    }

    #[instrument(skip_all, fields(job_id = ?plan.job_id))]
    async fn create(&self, client: &ApiClient, mut plan: MlJobModel) -> Response<MlJobModel> {
        let mut diags = Diagnostics::new();
        let job_id = required_string(&plan.job_id, "job_id", &mut diags);
        let config = plan.to_config(&mut diags);
        let (Some(job_id), Some(config)) = (job_id, config) else {
            return Response::failed(diags);
        };
        if diags.has_error() {
            return Response::failed(diags);
        }

        if let Err(err) = ml::put_job(client, &job_id, &config).await {
            client_error(&mut diags, "Unable to create ML anomaly detection job", &err);
            return Response::failed(diags);
        }
        match client.id(&job_id).await {
            Ok(id) => plan.id = Value::Known(id.to_string()),
            Err(err) => {
                client_error(&mut diags, "Unable to get cluster UUID", &err);
                return Response::failed(diags);
            }
        }

        let mut response = self.read(client, plan).await;
        response.diagnostics.append(diags);
        response
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn read(&self, client: &ApiClient, mut state: MlJobModel) -> Response<MlJobModel> {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return Response::failed(diags);
        };
        match ml::get_job(client, &id.resource_id).await {
            Ok(Some(job)) => {
                state.update_from_job(job, &mut diags);
                Response::with_diagnostics(state, diags)
            }
            Ok(None) => {
                tracing::warn!(id = %id, "ML job not found, removing from state");
                Response::removed()
            }
            Err(err) => {
                client_error(&mut diags, "Unable to get ML anomaly detection job", &err);
                Response::failed(diags)
            }
        }
    }

    #[instrument(skip_all, fields(id = ?prior.id))]
    async fn update(
        &self,
        client: &ApiClient,
        mut plan: MlJobModel,
        prior: MlJobModel,
    ) -> Response<MlJobModel> {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&prior.id, &mut diags) else {
            return Response::failed(diags);
        };
        let update = plan.to_update(&prior, &mut diags);
        if diags.has_error() {
            return Response::failed(diags);
        }
        if update == JobUpdate::default() {
            tracing::debug!(id = %id, "No updatable ML job fields changed");
        } else if let Err(err) = ml::update_job(client, &id.resource_id, &update).await {
            client_error(&mut diags, "Unable to update ML anomaly detection job", &err);
            return Response::failed(diags);
        }

        plan.id = prior.id;
        let mut response = self.read(client, plan).await;
        response.diagnostics.append(diags);
        response
    }

    #[instrument(skip_all, fields(id = ?state.id))]
    async fn delete(&self, client: &ApiClient, state: MlJobModel) -> Diagnostics {
        let mut diags = Diagnostics::new();
        let Some(id) = parse_id(&state.id, &mut diags) else {
            return diags;
        };
        // Open jobs cannot be deleted; closing is best effort
        if let Err(err) = ml::close_job(client, &id.resource_id).await {
            tracing::warn!(id = %id, error = %err, "Unable to close ML job before delete");
            diags.add_warning(
                "Unable to close ML anomaly detection job",
                format!("proceeding with delete: {err}"),
            );
        }
        if let Err(err) = ml::delete_job(client, &id.resource_id).await {
            client_error(&mut diags, "Unable to delete ML anomaly detection job", &err);
        }
        diags
    }

    fn import_state(&self, id: &str) -> Response<MlJobModel> {
        let mut diags = Diagnostics::new();
        let id_value = Value::from(id);
        if parse_id(&id_value, &mut diags).is_none() {
            return Response::failed(diags);
        }
        Response::ok(MlJobModel {
            id: id_value,
            ..MlJobModel::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn planned() -> MlJobModel {
        MlJobModel {
            job_id: Value::from("cpu"),
            analysis_config: Value::from(
                r#"{"bucket_span":"15m","detectors":[{"function":"mean","field_name":"cpu"}]}"#,
            ),
            data_description: Value::from(r#"{"time_field":"@timestamp"}"#),
            results_index_name: Value::from("cpu-results"),
            ..MlJobModel::default()
        }
    }

    #[test]
    fn test_superset_keeps_configured_json() {
        let prior = Value::from(r#"{"bucket_span":"15m"}"#);
        let server = json!({"bucket_span": "15m", "model_prune_window": "30d"});
        let mut diags = Diagnostics::new();
        let kept = reconcile_json(&prior, Some(&server), &AttributePath::root("analysis_config"), &mut diags);
        assert_eq!(kept, prior);

        let changed = json!({"bucket_span": "30m"});
        let fresh = reconcile_json(&prior, Some(&changed), &AttributePath::root("analysis_config"), &mut diags);
        assert_eq!(fresh, Value::from(r#"{"bucket_span":"30m"}"#));
    }

    #[test]
    fn test_custom_results_index_prefix() {
        let prior = Value::from("cpu-results");
        assert_eq!(
            reconcile_results_index(&prior, Some("custom-cpu-results".into())),
            prior
        );
        assert_eq!(
            reconcile_results_index(&Value::Null, Some("shared".into())),
            Value::from("shared")
        );
    }

    #[test]
    fn test_update_sends_only_changed_updatable_fields() {
        let prior = planned();
        let mut plan = planned();
        plan.description = Value::from("CPU anomalies");
        plan.analysis_config = Value::from(r#"{"bucket_span":"30m"}"#);

        let mut diags = Diagnostics::new();
        let update = plan.to_update(&prior, &mut diags);
        assert_eq!(
            update,
            JobUpdate {
                description: Some("CPU anomalies".into()),
                ..JobUpdate::default()
            }
        );
    }

    #[test]
    fn test_missing_analysis_config() {
        let mut plan = planned();
        plan.analysis_config = Value::Unknown;
        let mut diags = Diagnostics::new();
        assert!(plan.to_config(&mut diags).is_none());
        assert_eq!(diags.error_count(), 1);
    }

    #[test]
    fn test_update_from_job_nulls_missing_fields() {
        let mut state = planned();
        state.allow_lazy_open = Value::Unknown;
        let job: Job = serde_json::from_value(json!({
            "job_id": "cpu",
            "job_type": "anomaly_detector",
            "create_time": 1_700_000_000_000_i64,
            "analysis_config": {"bucket_span": "15m", "detectors": [{"function": "mean", "field_name": "cpu", "detector_index": 0}]},
            "data_description": {"time_field": "@timestamp", "time_format": "epoch_ms"},
            "results_index_name": "custom-cpu-results"
        }))
        .unwrap();
        let mut diags = Diagnostics::new();
        state.update_from_job(job, &mut diags);

        assert!(!diags.has_error());
        assert_eq!(state.allow_lazy_open, Value::Null);
        assert_eq!(state.results_index_name, Value::from("cpu-results"));
        assert_eq!(state.analysis_config, planned().analysis_config);
        assert_eq!(state.job_type, Value::from("anomaly_detector"));
    }

    #[test]
    fn test_removed_fields_send_unset_values() {
        let mut prior = planned();
        prior.description = Value::from("old description");
        prior.groups = Value::Known(vec!["g1".into()]);
        prior.model_snapshot_retention_days = Value::Known(30);
        prior.allow_lazy_open = Value::Known(true);
        let plan = planned();

        let mut diags = Diagnostics::new();
        let update = plan.to_update(&prior, &mut diags);
        assert!(!diags.has_error());
        assert_eq!(
            update,
            JobUpdate {
                description: Some(String::new()),
                groups: Some(Vec::new()),
                allow_lazy_open: Some(false),
                model_snapshot_retention_days: Some(10),
                ..JobUpdate::default()
            }
        );
    }

    #[test]
    fn test_unknown_plan_sends_nothing() {
        let mut prior = planned();
        prior.description = Value::from("old description");
        let mut plan = planned();
        plan.description = Value::Unknown;

        let mut diags = Diagnostics::new();
        assert_eq!(plan.to_update(&prior, &mut diags), JobUpdate::default());
    }

    #[test]
    fn test_removing_analysis_limits_is_rejected() {
        let mut prior = planned();
        prior.analysis_limits = Value::from(r#"{"model_memory_limit":"64mb"}"#);
        let mut diags = Diagnostics::new();
        let update = planned().to_update(&prior, &mut diags);
        assert_eq!(update.analysis_limits, None);
        let error = diags.errors().next().unwrap();
        assert_eq!(error.summary, "Unable to clear attribute");
    }

    #[test]
    fn test_server_defaults_stay_null_when_unset() {
        let job = || -> Job {
            serde_json::from_value(json!({
                "job_id": "cpu",
                "description": "",
                "analysis_config": {"bucket_span": "15m", "detectors": [{"function": "mean", "field_name": "cpu"}]},
                "data_description": {"time_field": "@timestamp"},
                "allow_lazy_open": false,
                "model_snapshot_retention_days": 10,
                "daily_model_snapshot_retention_after_days": 1
            }))
            .unwrap()
        };
        let mut diags = Diagnostics::new();

        let mut unset = planned();
        unset.update_from_job(job(), &mut diags);
        assert_eq!(unset.description, Value::Null);
        assert_eq!(unset.allow_lazy_open, Value::Null);
        assert_eq!(unset.model_snapshot_retention_days, Value::Null);
        assert_eq!(unset.daily_model_snapshot_retention_after_days, Value::Null);

        let mut configured = planned();
        configured.description = Value::from("");
        configured.model_snapshot_retention_days = Value::Known(10);
        configured.update_from_job(job(), &mut diags);
        assert_eq!(configured.description, Value::from(""));
        assert_eq!(configured.model_snapshot_retention_days, Value::Known(10));
        assert!(!diags.has_error());
    }
}
