//! # jobctl
//!
//! Job control for portable data-processing pipelines.
//!
//! A client submits a pipeline in three steps:
//!
//! 1. **Prepare** registers the pipeline under a job name and opens an
//!    artifact staging session.
//! 2. The client stages its artifacts out of band.
//! 3. **Run** turns the preparation into a job and hands it to an executor.
//!
//! From then on the job is observable through [`JobService::get_state`],
//! a state stream, and a merged message stream, and can be cancelled.
//!
//! The [`jobctl_environments`] crate decides, for each transform in the
//! pipeline, which runtime environment executes it, and builds environment
//! descriptors from a mode tag and configuration string.
//!
//! ## Crate Layout
//!
//! - [`service`]: the [`JobService`] and its staging / executor collaborators
//! - [`lifecycle`]: per-job state machine with multi-subscriber streams
//! - [`router`]: JSON method dispatch with wire error codes
//! - [`types`]: wire request, response, and stream types
//! - [`config`]: TOML + environment configuration
//! - [`error`]: [`JobError`] and its [`ErrorKind`] classification
//!
//! ## Feature Flags
//!
//! - `logging` (default): [`logging::init_logging`] via `tracing-subscriber`
//!
//! ## Quick Start
//!
//! ```
//! use futures::StreamExt;
//! use jobctl::config::ServiceConfig;
//! use jobctl::service::JobService;
//! use jobctl::{JobState, PrepareJobRequest, RunJobRequest};
//!
//! # let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
//! # runtime.block_on(async {
//! let service = JobService::new(ServiceConfig::default()).unwrap();
//! let prepared = service
//!     .prepare(PrepareJobRequest {
//!         job_name: "wordcount".to_string(),
//!         ..Default::default()
//!     })
//!     .await
//!     .unwrap();
//! let job_id = service
//!     .run(RunJobRequest {
//!         preparation_id: prepared.preparation_id,
//!         retrieval_token: None,
//!     })
//!     .await
//!     .unwrap()
//!     .job_id;
//!
//! let mut states = service.get_state_stream(&job_id).unwrap();
//! assert_eq!(states.next().await, Some(JobState::Starting));
//!
//! let job = service.job(&job_id).unwrap();
//! job.set_state(JobState::Running).unwrap();
//! job.set_state(JobState::Done).unwrap();
//! assert_eq!(states.next().await, Some(JobState::Running));
//! assert_eq!(states.next().await, Some(JobState::Done));
//! assert_eq!(states.next().await, None);
//! # });
//! ```

#![warn(missing_debug_implementations)]

pub mod config;
pub mod constants;
pub mod error;
pub mod lifecycle;
#[cfg(feature = "logging")]
pub mod logging;
pub mod router;
pub mod service;
pub mod types;

pub use config::{ConfigError, ServiceConfig};
pub use error::{ErrorKind, JobError};
pub use lifecycle::{JobMessageStream, JobStateMachine, JobStateStream};
pub use router::{JobRouter, RpcError};
pub use service::invoker::{JobInvocation, JobInvoker};
pub use service::staging::{ArtifactStaging, StagingSession, StaticArtifactStaging};
pub use service::JobService;
pub use types::{
    JobInfo, JobMessage, JobState, JobStateEvent, JobStreamItem, MessageImportance,
    PrepareJobRequest, PrepareJobResponse, RunJobRequest, RunJobResponse,
};

pub use jobctl_environments;
