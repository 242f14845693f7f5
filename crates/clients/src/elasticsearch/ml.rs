//! Machine learning anomaly detection jobs: `_ml/anomaly_detectors/{id}`.

use reqwest::Method;
use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tracing::instrument;

use crate::api_client::ApiClient;
use crate::error::Result;

const ANOMALY_DETECTORS: &str = "anomaly_detectors";

/// The writable part of a job, sent on create.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobConfig {
    /// Free-form description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Job groups
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Detectors, bucket span and influencers
    pub analysis_config: Json,
    /// Input data format
    pub data_description: Json,
    /// Memory and category limits
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis_limits: Option<Json>,
    /// Results index suffix
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub results_index_name: Option<String>,
    /// Allow the job to open when no ML node has capacity
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allow_lazy_open: Option<bool>,
    /// Days to keep model snapshots
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model_snapshot_retention_days: Option<i64>,
    /// Days after which only one snapshot per day is kept
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub daily_model_snapshot_retention_after_days: Option<i64>,
}

/// A job as returned by `GET`.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Job {
    /// Job identifier
    pub job_id: String,
    /// Always `anomaly_detector`
    #[serde(default)]
    pub job_type: Option<String>,
    /// Creation time, epoch millis
    #[serde(default)]
    pub create_time: Option<i64>,
    /// Configuration as stored
    #[serde(flatten)]
    pub config: JobConfig,
}

/// Fields `_update` accepts.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct JobUpdate {
    /// Free-form description
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Job groups
    #[serde(skip_serializing_if = "Option::is_none")]
    pub groups: Option<Vec<String>>,
    /// Memory and category limits
    #[serde(skip_serializing_if = "Option::is_none")]
    pub analysis_limits: Option<Json>,
    /// Allow the job to open when no ML node has capacity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allow_lazy_open: Option<bool>,
    /// Days to keep model snapshots
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model_snapshot_retention_days: Option<i64>,
    /// Days after which only one snapshot per day is kept
    #[serde(skip_serializing_if = "Option::is_none")]
    pub daily_model_snapshot_retention_after_days: Option<i64>,
}

#[derive(Deserialize)]
struct GetJobsResponse {
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Creates a job.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client, config))]
pub async fn put_job(client: &ApiClient, job_id: &str, config: &JobConfig) -> Result<()> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_ml", ANOMALY_DETECTORS, job_id])?;
    es.send(Method::PUT, url, Some(config))
        .await?
        .error_for_status()?;
    Ok(())
}

/// Fetches a job; `None` when it does not exist.
///
/// # Errors
///
/// Fails on transport errors, non-404 failure statuses and malformed bodies.
#[instrument(skip(client))]
pub async fn get_job(client: &ApiClient, job_id: &str) -> Result<Option<Job>> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_ml", ANOMALY_DETECTORS, job_id])?;
    let response = es.get(url).await?;
    if response.is_not_found() {
        return Ok(None);
    }
    let body: GetJobsResponse = response.error_for_status()?.json()?;
    Ok(body.jobs.into_iter().find(|job| job.job_id == job_id))
}

/// Applies the updatable fields of a job.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client, update))]
pub async fn update_job(client: &ApiClient, job_id: &str, update: &JobUpdate) -> Result<()> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_ml", ANOMALY_DETECTORS, job_id, "_update"])?;
    es.send(Method::POST, url, Some(update))
        .await?
        .error_for_status()?;
    Ok(())
}

/// Force-closes a job.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client))]
pub async fn close_job(client: &ApiClient, job_id: &str) -> Result<()> {
    let es = client.elasticsearch()?;
    let mut url = es.url(&["_ml", ANOMALY_DETECTORS, job_id, "_close"])?;
    url.query_pairs_mut().append_pair("force", "true");
    es.send::<()>(Method::POST, url, None)
        .await?
        .error_for_status()?;
    Ok(())
}

/// Deletes a job. The job must be closed.
///
/// # Errors
///
/// Fails on transport errors and failure statuses.
#[instrument(skip(client))]
pub async fn delete_job(client: &ApiClient, job_id: &str) -> Result<()> {
    let es = client.elasticsearch()?;
    let url = es.url(&["_ml", ANOMALY_DETECTORS, job_id])?;
    es.delete(url).await?.error_for_status()?;
    Ok(())
}
