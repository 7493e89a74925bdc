//! The job control service.
//!
//! [`JobService`] owns three independent registries:
//!
//! - preparations, keyed by preparation id, consumed exactly once by Run
//! - the job name index, mapping each reserved job name to the preparation
//!   that holds it
//! - jobs, keyed by job id, retained for the life of the service
//!
//! Prepare reserves the job name with an atomic check-and-insert on the name
//! index, so concurrent Prepares for the same name see exactly one winner.
//! Run removes the preparation atomically, so concurrent Runs for the same
//! preparation see exactly one job created.
//!
//! # Examples
//!
//! ```
//! use jobctl::config::ServiceConfig;
//! use jobctl::service::JobService;
//! use jobctl::{JobState, PrepareJobRequest, RunJobRequest};
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let service = JobService::new(ServiceConfig::default()).unwrap();
//!
//! let prepared = service
//!     .prepare(PrepareJobRequest {
//!         job_name: "wordcount".to_string(),
//!         ..Default::default()
//!     })
//!     .await
//!     .unwrap();
//!
//! let run = service
//!     .run(RunJobRequest {
//!         preparation_id: prepared.preparation_id,
//!         retrieval_token: None,
//!     })
//!     .await
//!     .unwrap();
//!
//! assert_eq!(service.get_state(&run.job_id).unwrap(), JobState::Starting);
//! assert_eq!(service.cancel(&run.job_id).unwrap(), JobState::Cancelled);
//! # });
//! ```

pub mod invoker;
pub mod preparation;
pub mod staging;

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use jobctl_environments::{resolver, Environment, EnvironmentFactory, RehydratedComponents};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use crate::config::{ConfigError, ServiceConfig};
use crate::error::JobError;
use crate::lifecycle::{JobMessageStream, JobStateMachine, JobStateStream};
use crate::types::message::MessageImportance;
use crate::types::params::{
    JobInfo, PrepareJobRequest, PrepareJobResponse, RunJobRequest, RunJobResponse,
};
use crate::types::state::JobState;

use self::invoker::{JobInvocation, JobInvoker};
use self::preparation::PreparationSession;
use self::staging::{ArtifactStaging, StaticArtifactStaging};

/// Prepare/Run/Cancel/GetState and the two job streams.
///
/// Staging and execution are collaborators: artifact staging sessions come
/// from an [`ArtifactStaging`] implementation (by default a
/// [`StaticArtifactStaging`] at the configured endpoint), and jobs are handed
/// to an optional [`JobInvoker`] on Run. Without an invoker, jobs stay in
/// `STARTING` until driven through [`JobService::job`].
pub struct JobService {
    config: ServiceConfig,
    environments: EnvironmentFactory,
    staging: Arc<dyn ArtifactStaging>,
    invoker: Option<Arc<dyn JobInvoker>>,
    accepting: AtomicBool,
    preparations: DashMap<String, PreparationSession>,
    job_names: DashMap<String, String>,
    jobs: DashMap<String, Arc<JobStateMachine>>,
}

impl fmt::Debug for JobService {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JobService")
            .field("config", &self.config)
            .field("accepting", &self.is_accepting())
            .field("has_invoker", &self.invoker.is_some())
            .field("preparations", &self.preparations.len())
            .field("jobs", &self.jobs.len())
            .finish_non_exhaustive()
    }
}

impl JobService {
    /// Creates a service from validated configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError`] if the configuration does not validate.
    pub fn new(config: ServiceConfig) -> Result<Self, ConfigError> {
        config.validate()?;
        let environments = config.default_environment.factory()?;
        let staging = Arc::new(StaticArtifactStaging::new(
            config.artifact_staging_endpoint.clone(),
        ));
        Ok(Self {
            accepting: AtomicBool::new(config.accepting_jobs),
            config,
            environments,
            staging,
            invoker: None,
            preparations: DashMap::new(),
            job_names: DashMap::new(),
            jobs: DashMap::new(),
        })
    }

    /// Replaces the artifact staging collaborator.
    #[must_use]
    pub fn with_staging(mut self, staging: Arc<dyn ArtifactStaging>) -> Self {
        self.staging = staging;
        self
    }

    /// Sets the executor that receives jobs on Run.
    #[must_use]
    pub fn with_invoker(mut self, invoker: Arc<dyn JobInvoker>) -> Self {
        self.invoker = Some(invoker);
        self
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// The environment used for work without an explicit binding.
    pub fn default_environment(&self) -> &Environment {
        self.environments.default_environment()
    }

    /// The factory the default environment came from.
    pub fn environment_factory(&self) -> &EnvironmentFactory {
        &self.environments
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// Turns away new preparations with `UNAVAILABLE`.
    ///
    /// Pending preparations can still be run and existing jobs are
    /// unaffected.
    pub fn stop_accepting(&self) {
        if self.accepting.swap(false, Ordering::AcqRel) {
            info!("job service stopped accepting new jobs");
        }
    }

    /// Accepts new preparations again.
    pub fn resume_accepting(&self) {
        if !self.accepting.swap(true, Ordering::AcqRel) {
            info!("job service accepting new jobs");
        }
    }

    /// Number of prepared jobs not yet run.
    pub fn pending_preparations(&self) -> usize {
        self.preparations.len()
    }

    /// Registers a pipeline for a later Run.
    ///
    /// # Errors
    ///
    /// - [`JobError::Unavailable`] when not accepting or at capacity
    /// - [`JobError::AlreadyExists`] when `job_name` is reserved by another
    ///   pending preparation
    /// - [`JobError::Unknown`] when no staging session could be opened
    pub async fn prepare(&self, request: PrepareJobRequest) -> Result<PrepareJobResponse, JobError> {
        if !self.is_accepting() {
            return Err(JobError::Unavailable {
                reason: "service is not accepting new jobs".to_string(),
            });
        }

        let pending = self.preparations.len();
        if pending >= self.config.max_pending_preparations {
            warn!(pending, "rejecting prepare, too many pending preparations");
            return Err(JobError::Unavailable {
                reason: format!("{pending} preparations pending"),
            });
        }

        let PrepareJobRequest {
            pipeline,
            pipeline_options,
            job_name,
        } = request;
        let preparation_id = format!("{job_name}_{}", Uuid::new_v4());

        self.reserve_job_name(&job_name, &preparation_id)?;

        let session = match self.staging.begin_session(&preparation_id).await {
            Ok(session) => session,
            Err(err) => {
                self.release_job_name(&job_name, &preparation_id);
                error!(
                    preparation_id = %preparation_id,
                    error = %err,
                    "failed to open staging session"
                );
                return Err(match err {
                    unavailable @ JobError::Unavailable { .. } => unavailable,
                    other => JobError::Unknown(format!("failed to open staging session: {other}")),
                });
            },
        };

        self.preparations.insert(
            preparation_id.clone(),
            PreparationSession {
                preparation_id: preparation_id.clone(),
                job_name: job_name.clone(),
                pipeline: RehydratedComponents::from_pipeline(pipeline),
                pipeline_options,
                artifact_staging_endpoint: session.endpoint.clone(),
                staging_session_token: session.session_token.clone(),
                created_at: Utc::now(),
            },
        );

        info!(
            preparation_id = %preparation_id,
            job_name = %job_name,
            "job prepared"
        );

        Ok(PrepareJobResponse {
            preparation_id,
            artifact_staging_endpoint: session.endpoint,
            staging_session_token: session.session_token,
        })
    }

    /// Turns a preparation into a job and hands it to the invoker.
    ///
    /// # Errors
    ///
    /// - [`JobError::PreparationNotFound`] for unknown or already run
    ///   preparations
    /// - [`JobError::Unknown`] when the invoker fails to start the job; the
    ///   job is left `FAILED` with an `ERROR` message
    pub async fn run(&self, request: RunJobRequest) -> Result<RunJobResponse, JobError> {
        let RunJobRequest {
            preparation_id,
            retrieval_token,
        } = request;

        let (_, session) = self.preparations.remove(&preparation_id).ok_or_else(|| {
            JobError::PreparationNotFound {
                preparation_id: preparation_id.clone(),
            }
        })?;
        self.release_job_name(&session.job_name, &preparation_id);

        let job_id = Uuid::new_v4().to_string();
        let job = Arc::new(JobStateMachine::new(job_id.clone(), session.job_name.clone()));
        self.jobs.insert(job_id.clone(), Arc::clone(&job));

        info!(
            job_id = %job_id,
            job_name = %session.job_name,
            preparation_id = %preparation_id,
            staged = retrieval_token.is_some(),
            "job created"
        );

        let Some(invoker) = &self.invoker else {
            debug!(job_id = %job_id, "no invoker configured, job left in STARTING");
            return Ok(RunJobResponse { job_id });
        };

        let cancellation = CancellationToken::new();
        job.attach_cancellation(cancellation.clone());
        let invocation = JobInvocation {
            job: Arc::clone(&job),
            components: session.pipeline,
            pipeline_options: session.pipeline_options,
            retrieval_token,
            default_environment: self.default_environment().clone(),
            cancellation,
        };

        if let Err(err) = invoker.invoke(invocation).await {
            error!(job_id = %job_id, error = %err, "failed to start job");
            job.append_message(MessageImportance::Error, format!("failed to start job: {err}"));
            if let Err(transition) = job.set_state(JobState::Failed) {
                debug!(job_id = %job_id, error = %transition, "job already terminal");
            }
            return Err(JobError::Unknown(format!("failed to start job {job_id}: {err}")));
        }

        Ok(RunJobResponse { job_id })
    }

    /// Current state of a job.
    pub fn get_state(&self, job_id: &str) -> Result<JobState, JobError> {
        Ok(self.job(job_id)?.state())
    }

    /// Requests cancellation of a job and returns the resulting state.
    ///
    /// Cancelling a terminal job returns its terminal state unchanged.
    pub fn cancel(&self, job_id: &str) -> Result<JobState, JobError> {
        let job = self.job(job_id)?;
        let state = job.cancel();
        info!(job_id = %job_id, state = %state, "cancel requested");
        Ok(state)
    }

    /// Stream of state changes, starting with the current state.
    pub fn get_state_stream(&self, job_id: &str) -> Result<JobStateStream, JobError> {
        let stream = self.job(job_id)?.subscribe_state();
        debug!(job_id = %job_id, "state stream opened");
        Ok(stream)
    }

    /// Stream of messages and state changes appended from now on.
    pub fn get_message_stream(&self, job_id: &str) -> Result<JobMessageStream, JobError> {
        let stream = self.job(job_id)?.subscribe_messages();
        debug!(job_id = %job_id, "message stream opened");
        Ok(stream)
    }

    /// The state machine of a job, for executors and embedding code.
    pub fn job(&self, job_id: &str) -> Result<Arc<JobStateMachine>, JobError> {
        self.jobs
            .get(job_id)
            .map(|entry| Arc::clone(entry.value()))
            .ok_or_else(|| JobError::JobNotFound {
                job_id: job_id.to_string(),
            })
    }

    /// Every job, oldest first.
    pub fn list_jobs(&self) -> Vec<JobInfo> {
        let mut jobs: Vec<_> = self
            .jobs
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        jobs.sort_by(|a, b| {
            a.created_at()
                .cmp(&b.created_at())
                .then_with(|| a.job_id().cmp(b.job_id()))
        });
        jobs.iter().map(|job| job.info()).collect()
    }

    /// Environment bindings of every transform in a prepared pipeline.
    ///
    /// Transforms without an environment are absent from the map.
    pub fn environment_bindings(
        &self,
        preparation_id: &str,
    ) -> Result<BTreeMap<String, Environment>, JobError> {
        let session = self.preparation(preparation_id)?;
        Ok(resolver::bindings(session.pipeline.components())?)
    }

    /// Environment binding of one transform in a prepared pipeline.
    pub fn transform_environment(
        &self,
        preparation_id: &str,
        transform_id: &str,
    ) -> Result<Option<Environment>, JobError> {
        let session = self.preparation(preparation_id)?;
        Ok(resolver::resolve(transform_id, &session.pipeline)?)
    }

    fn preparation(
        &self,
        preparation_id: &str,
    ) -> Result<dashmap::mapref::one::Ref<'_, String, PreparationSession>, JobError> {
        self.preparations
            .get(preparation_id)
            .ok_or_else(|| JobError::PreparationNotFound {
                preparation_id: preparation_id.to_string(),
            })
    }

    fn reserve_job_name(&self, job_name: &str, preparation_id: &str) -> Result<(), JobError> {
        match self.job_names.entry(job_name.to_string()) {
            Entry::Occupied(_) => {
                warn!(job_name = %job_name, "job name already reserved");
                Err(JobError::AlreadyExists {
                    job_name: job_name.to_string(),
                })
            },
            Entry::Vacant(slot) => {
                slot.insert(preparation_id.to_string());
                Ok(())
            },
        }
    }

    fn release_job_name(&self, job_name: &str, preparation_id: &str) {
        self.job_names
            .remove_if(job_name, |_, owner| owner == preparation_id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::service::staging::StagingSession;
    use async_trait::async_trait;

    struct FailingStaging;

    #[async_trait]
    impl ArtifactStaging for FailingStaging {
        async fn begin_session(&self, _preparation_id: &str) -> Result<StagingSession, JobError> {
            Err(JobError::Unknown("staging backend down".to_string()))
        }
    }

    fn request(name: &str) -> PrepareJobRequest {
        PrepareJobRequest {
            job_name: name.to_string(),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn staging_failure_releases_job_name() {
        let service = JobService::new(ServiceConfig::default())
            .unwrap()
            .with_staging(Arc::new(FailingStaging));

        let err = service.prepare(request("jobA")).await.unwrap_err();
        assert!(matches!(err, JobError::Unknown(_)));
        assert!(service.job_names.is_empty());
        assert_eq!(service.pending_preparations(), 0);
    }

    #[tokio::test]
    async fn run_releases_job_name() {
        let service = JobService::new(ServiceConfig::default()).unwrap();
        let prepared = service.prepare(request("jobA")).await.unwrap();
        assert!(service.job_names.contains_key("jobA"));

        service
            .run(RunJobRequest {
                preparation_id: prepared.preparation_id,
                retrieval_token: None,
            })
            .await
            .unwrap();
        assert!(service.job_names.is_empty());
        assert!(service.prepare(request("jobA")).await.is_ok());
    }

    #[tokio::test]
    async fn capacity_is_enforced() {
        let config = ServiceConfig {
            max_pending_preparations: 1,
            ..ServiceConfig::default()
        };
        let service = JobService::new(config).unwrap();
        service.prepare(request("a")).await.unwrap();
        let err = service.prepare(request("b")).await.unwrap_err();
        assert!(matches!(err, JobError::Unavailable { .. }));
    }

    #[test]
    fn debug_does_not_require_collaborators_to_be_debug() {
        let service = JobService::new(ServiceConfig::default()).unwrap();
        let rendered = format!("{service:?}");
        assert!(rendered.contains("JobService"));
    }
}
