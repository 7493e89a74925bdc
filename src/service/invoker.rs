//! Executor hand-off on Run.
//!
//! The service does not execute pipelines. When a job is run it builds a
//! [`JobInvocation`] and passes it to the configured [`JobInvoker`], which
//! starts the work (typically on its own task) and reports progress through
//! the invocation's [`JobStateMachine`].

use std::sync::Arc;

use async_trait::async_trait;
use jobctl_environments::{resolver, Environment, Pipeline, RehydratedComponents};
use serde_json::{Map, Value};
use tokio_util::sync::CancellationToken;

use crate::error::JobError;
use crate::lifecycle::JobStateMachine;

/// Everything an executor needs to run one job.
#[derive(Debug, Clone)]
pub struct JobInvocation {
    /// The job to drive.
    pub job: Arc<JobStateMachine>,
    /// The submitted pipeline, also the component table for environment
    /// lookups.
    pub components: RehydratedComponents,
    /// The submitted pipeline options.
    pub pipeline_options: Map<String, Value>,
    /// Retrieval token for staged artifacts, absent when nothing was staged.
    pub retrieval_token: Option<String>,
    /// Environment for work the pipeline does not bind explicitly.
    pub default_environment: Environment,
    /// Fired when the job is cancelled.
    pub cancellation: CancellationToken,
}

impl JobInvocation {
    pub fn job_id(&self) -> &str {
        self.job.job_id()
    }

    /// The submitted pipeline.
    pub fn pipeline(&self) -> &Pipeline {
        self.components.pipeline()
    }

    /// Resolves the environment of `transform_id`.
    pub fn transform_environment(&self, transform_id: &str) -> Result<Option<Environment>, JobError> {
        Ok(resolver::resolve(transform_id, &self.components)?)
    }

    /// Resolves `transform_id`, falling back to the default environment
    /// when the transform has no binding.
    pub fn environment_or_default(&self, transform_id: &str) -> Result<Environment, JobError> {
        Ok(self
            .transform_environment(transform_id)?
            .unwrap_or_else(|| self.default_environment.clone()))
    }
}

/// Starts jobs.
#[async_trait]
pub trait JobInvoker: Send + Sync {
    /// Starts the job described by `invocation`.
    ///
    /// Should return once the job is started, not when it finishes. An error
    /// marks the job `FAILED`.
    async fn invoke(&self, invocation: JobInvocation) -> Result<(), JobError>;
}
