//! JSON method dispatch over [`JobService`].
//!
//! [`JobRouter`] is the wire boundary: it decodes request params into the
//! types in [`crate::types::params`], calls the service, and encodes the
//! result back to JSON. Failures become an [`RpcError`] carrying the wire
//! code from [`JobError::error_code`], the coarse [`ErrorKind`], and the
//! display message.
//!
//! The two server-streaming operations do not fit request/response dispatch
//! and are exposed as [`JobRouter::state_stream`] and
//! [`JobRouter::message_stream`], each yielding JSON items.

use std::fmt;
use std::sync::Arc;

use futures::stream::{BoxStream, StreamExt};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::constants::{
    METHOD_CANCEL, METHOD_ENVIRONMENTS, METHOD_GET_STATE, METHOD_LIST, METHOD_MESSAGE_STREAM,
    METHOD_PREPARE, METHOD_RUN, METHOD_STATE_STREAM,
};
use crate::error::{ErrorKind, JobError, INVALID_ARGUMENT_CODE};
use crate::service::JobService;
use crate::types::params::{
    EnvironmentBindingsParams, EnvironmentBindingsResponse, JobIdParams, JobStateResponse,
    ListJobsResponse, PrepareJobRequest, RunJobRequest,
};

/// A failed call, as returned to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RpcError {
    pub code: i32,
    pub kind: ErrorKind,
    pub message: String,
}

impl RpcError {
    fn invalid_params(message: impl Into<String>) -> Self {
        Self {
            code: INVALID_ARGUMENT_CODE,
            kind: ErrorKind::InvalidArgument,
            message: message.into(),
        }
    }

    fn method_not_found(method: &str) -> Self {
        Self::invalid_params(format!("unknown method: {method}"))
    }
}

impl fmt::Display for RpcError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({}): {}", self.kind, self.code, self.message)
    }
}

impl std::error::Error for RpcError {}

impl From<JobError> for RpcError {
    fn from(err: JobError) -> Self {
        Self {
            code: err.error_code(),
            kind: err.kind(),
            message: err.to_string(),
        }
    }
}

/// Routes JSON requests to a shared [`JobService`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use jobctl::config::ServiceConfig;
/// use jobctl::router::JobRouter;
/// use jobctl::service::JobService;
///
/// let service = Arc::new(JobService::new(ServiceConfig::default()).unwrap());
/// let router = JobRouter::new(service);
/// assert!(router.service().is_accepting());
/// ```
#[derive(Debug, Clone)]
pub struct JobRouter {
    service: Arc<JobService>,
}

impl JobRouter {
    pub fn new(service: Arc<JobService>) -> Self {
        Self { service }
    }

    /// The underlying service.
    pub fn service(&self) -> &Arc<JobService> {
        &self.service
    }

    /// Dispatches one request.
    ///
    /// # Errors
    ///
    /// An [`RpcError`] with code `-32602` for unknown methods or params that
    /// do not decode, otherwise the code of the service error.
    pub async fn handle(&self, method: &str, params: Value) -> Result<Value, RpcError> {
        tracing::debug!(method, "dispatching job request");
        match method {
            METHOD_PREPARE => {
                let request: PrepareJobRequest = decode_params(method, params)?;
                encode(self.service.prepare(request).await?)
            },
            METHOD_RUN => {
                let request: RunJobRequest = decode_params(method, params)?;
                encode(self.service.run(request).await?)
            },
            METHOD_GET_STATE => {
                let JobIdParams { job_id } = decode_params(method, params)?;
                let state = self.service.get_state(&job_id)?;
                encode(JobStateResponse { state })
            },
            METHOD_CANCEL => {
                let JobIdParams { job_id } = decode_params(method, params)?;
                let state = self.service.cancel(&job_id)?;
                encode(JobStateResponse { state })
            },
            METHOD_LIST => encode(ListJobsResponse {
                jobs: self.service.list_jobs(),
            }),
            METHOD_ENVIRONMENTS => {
                let EnvironmentBindingsParams {
                    preparation_id,
                    transform_id,
                } = decode_params(method, params)?;
                let bindings = match transform_id {
                    Some(transform_id) => self
                        .service
                        .transform_environment(&preparation_id, &transform_id)?
                        .map(|environment| (transform_id, environment))
                        .into_iter()
                        .collect(),
                    None => self.service.environment_bindings(&preparation_id)?,
                };
                encode(EnvironmentBindingsResponse { bindings })
            },
            other => {
                tracing::warn!(method = other, "unknown job method");
                Err(RpcError::method_not_found(other))
            },
        }
    }

    /// Opens a state stream for the job named in `params`.
    ///
    /// Each item is a [`JobStateResponse`] as JSON.
    pub fn state_stream(&self, params: Value) -> Result<BoxStream<'static, Value>, RpcError> {
        let JobIdParams { job_id } = decode_params(METHOD_STATE_STREAM, params)?;
        let stream = self.service.get_state_stream(&job_id)?;
        Ok(stream
            .filter_map(|state| async move { serde_json::to_value(JobStateResponse { state }).ok() })
            .boxed())
    }

    /// Opens a message stream for the job named in `params`.
    ///
    /// Each item is a [`JobStreamItem`](crate::types::message::JobStreamItem)
    /// as JSON.
    pub fn message_stream(&self, params: Value) -> Result<BoxStream<'static, Value>, RpcError> {
        let JobIdParams { job_id } = decode_params(METHOD_MESSAGE_STREAM, params)?;
        let stream = self.service.get_message_stream(&job_id)?;
        Ok(stream
            .filter_map(|item| async move { serde_json::to_value(item).ok() })
            .boxed())
    }
}

fn decode_params<T: DeserializeOwned>(method: &str, params: Value) -> Result<T, RpcError> {
    serde_json::from_value(params)
        .map_err(|e| RpcError::invalid_params(format!("invalid params for {method}: {e}")))
}

fn encode<T: Serialize>(value: T) -> Result<Value, RpcError> {
    serde_json::to_value(value)
        .map_err(|e| JobError::Unknown(format!("failed to encode response: {e}")).into())
}
