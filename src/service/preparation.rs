//! Preparation sessions.

use chrono::{DateTime, Utc};
use jobctl_environments::RehydratedComponents;
use serde_json::{Map, Value};

/// A prepared, not yet run, job.
///
/// Created by Prepare and consumed exactly once by Run. Nothing mutates it
/// in between.
#[derive(Debug, Clone)]
pub struct PreparationSession {
    pub preparation_id: String,
    pub job_name: String,
    /// The submitted pipeline, shared with the invocation on Run.
    pub pipeline: RehydratedComponents,
    pub pipeline_options: Map<String, Value>,
    pub artifact_staging_endpoint: String,
    pub staging_session_token: String,
    pub created_at: DateTime<Utc>,
}
