//! Request and response types for the job-control operations.

use std::collections::BTreeMap;

use jobctl_environments::{Environment, Pipeline};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::state::JobState;

/// Parameters for `job/prepare`.
///
/// # Examples
///
/// ```
/// use jobctl::PrepareJobRequest;
///
/// let json = serde_json::json!({ "jobName": "wordcount" });
/// let request: PrepareJobRequest = serde_json::from_value(json).unwrap();
/// assert_eq!(request.job_name, "wordcount");
/// assert!(request.pipeline_options.is_empty());
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareJobRequest {
    /// The pipeline graph to run.
    #[serde(default)]
    pub pipeline: Pipeline,
    /// Structured pipeline options.
    #[serde(default)]
    pub pipeline_options: Map<String, Value>,
    /// Caller-chosen job name, unique among pending preparations.
    pub job_name: String,
}

/// Result of `job/prepare`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrepareJobResponse {
    /// Server-generated id to pass to `job/run`.
    pub preparation_id: String,
    /// Where to stage artifacts before running.
    pub artifact_staging_endpoint: String,
    /// Token authenticating the staging session.
    pub staging_session_token: String,
}

/// Parameters for `job/run`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJobRequest {
    /// Id returned by `job/prepare`.
    pub preparation_id: String,
    /// Proof that staged artifacts are finalized. Absent when nothing was staged.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retrieval_token: Option<String>,
}

/// Result of `job/run`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunJobResponse {
    /// Id of the created job.
    pub job_id: String,
}

/// Parameters naming a single job (`job/getState`, `job/cancel`, streams).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobIdParams {
    pub job_id: String,
}

/// Result of `job/getState` and `job/cancel`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStateResponse {
    pub state: JobState,
}

/// Summary of one job, as returned by `job/list`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInfo {
    pub job_id: String,
    pub job_name: String,
    pub state: JobState,
}

/// Result of `job/list`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListJobsResponse {
    pub jobs: Vec<JobInfo>,
}

/// Parameters for `job/environments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBindingsParams {
    pub preparation_id: String,
    /// Restrict the answer to one transform.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transform_id: Option<String>,
}

/// Result of `job/environments`: transform id to bound environment.
///
/// Transforms without an environment are absent from the map.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnvironmentBindingsResponse {
    pub bindings: BTreeMap<String, Environment>,
}
