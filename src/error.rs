//! Error types for job-control operations.
//!
//! Provides [`JobError`], a rich error enum with context fields, its coarse
//! [`ErrorKind`] classification, and wire error code mapping. Callers branch
//! on [`JobError::kind`] to tell retryable conditions from fatal ones without
//! matching on messages.

use std::fmt;

use jobctl_environments::EnvironmentError;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::types::state::JobState;

/// Wire code for invalid arguments and malformed submissions.
pub const INVALID_ARGUMENT_CODE: i32 = -32602;
/// Wire code for unclassified internal faults.
pub const UNKNOWN_CODE: i32 = -32603;
/// Wire code for unknown preparation or job ids.
pub const NOT_FOUND_CODE: i32 = -32001;
/// Wire code for job name collisions.
pub const ALREADY_EXISTS_CODE: i32 = -32002;
/// Wire code for a service that is not accepting requests.
pub const UNAVAILABLE_CODE: i32 = -32003;

/// Coarse classification of a [`JobError`].
///
/// | Kind              | Retryable | Meaning                                      |
/// |-------------------|-----------|----------------------------------------------|
/// | `Unavailable`     | yes       | service cannot accept the request right now  |
/// | `AlreadyExists`   | no        | job name already reserved by a preparation   |
/// | `NotFound`        | no        | unknown or stale preparation / job id        |
/// | `InvalidArgument` | no        | malformed graph or illegal state transition  |
/// | `Unknown`         | no        | unclassified internal fault                  |
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    Unavailable,
    AlreadyExists,
    NotFound,
    InvalidArgument,
    Unknown,
}

impl ErrorKind {
    /// Returns `true` if the caller may retry the same request later.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Maps this kind to its wire error code.
    pub fn code(&self) -> i32 {
        match self {
            Self::Unavailable => UNAVAILABLE_CODE,
            Self::AlreadyExists => ALREADY_EXISTS_CODE,
            Self::NotFound => NOT_FOUND_CODE,
            Self::InvalidArgument => INVALID_ARGUMENT_CODE,
            Self::Unknown => UNKNOWN_CODE,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => write!(f, "UNAVAILABLE"),
            Self::AlreadyExists => write!(f, "ALREADY_EXISTS"),
            Self::NotFound => write!(f, "NOT_FOUND"),
            Self::InvalidArgument => write!(f, "INVALID_ARGUMENT"),
            Self::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Errors that can occur during job-control operations.
///
/// # Examples
///
/// ```
/// use jobctl::{ErrorKind, JobError};
///
/// let err = JobError::JobNotFound {
///     job_id: "missing-job".to_string(),
/// };
/// assert_eq!(err.kind(), ErrorKind::NotFound);
/// assert_eq!(err.error_code(), -32001);
/// assert!(err.to_string().contains("missing-job"));
/// ```
#[derive(Error, Debug)]
pub enum JobError {
    /// The service is not accepting new work.
    #[error("service unavailable: {reason}")]
    Unavailable {
        /// Why the request was turned away.
        reason: String,
    },

    /// A preparation with this job name is already pending.
    #[error("job name already in use: {job_name}")]
    AlreadyExists {
        /// The colliding job name.
        job_name: String,
    },

    /// The preparation id is unknown or has already been run.
    #[error("preparation not found: {preparation_id}")]
    PreparationNotFound {
        /// The preparation id that was not found.
        preparation_id: String,
    },

    /// The job id is unknown.
    #[error("job not found: {job_id}")]
    JobNotFound {
        /// The job id that was not found.
        job_id: String,
    },

    /// Attempted to move a job out of a terminal state.
    #[error("illegal transition from {from} to {to} for job {job_id}")]
    InvalidTransition {
        /// The job that was being transitioned.
        job_id: String,
        /// The job's current (terminal) state.
        from: JobState,
        /// The rejected target state.
        to: JobState,
    },

    /// The submitted pipeline failed environment resolution.
    #[error("invalid pipeline: {0}")]
    Environment(#[from] EnvironmentError),

    /// A request could not be decoded.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Unclassified internal fault.
    #[error("internal error: {0}")]
    Unknown(String),
}

impl JobError {
    /// Classifies this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Unavailable { .. } => ErrorKind::Unavailable,
            Self::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            Self::PreparationNotFound { .. } | Self::JobNotFound { .. } => ErrorKind::NotFound,
            Self::InvalidTransition { .. } | Self::Environment(_) | Self::InvalidArgument(_) => {
                ErrorKind::InvalidArgument
            },
            Self::Unknown(_) => ErrorKind::Unknown,
        }
    }

    /// Maps this error to its wire error code.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobctl::{JobError, JobState};
    ///
    /// let err = JobError::InvalidTransition {
    ///     job_id: "j1".to_string(),
    ///     from: JobState::Done,
    ///     to: JobState::Running,
    /// };
    /// assert_eq!(err.error_code(), -32602);
    ///
    /// let err = JobError::Unknown("staging backend down".to_string());
    /// assert_eq!(err.error_code(), -32603);
    /// ```
    pub fn error_code(&self) -> i32 {
        self.kind().code()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display_messages() {
        let err = JobError::JobNotFound {
            job_id: "abc".to_string(),
        };
        assert_eq!(err.to_string(), "job not found: abc");

        let err = JobError::InvalidTransition {
            job_id: "def".to_string(),
            from: JobState::Done,
            to: JobState::Running,
        };
        assert_eq!(
            err.to_string(),
            "illegal transition from DONE to RUNNING for job def"
        );

        let err = JobError::AlreadyExists {
            job_name: "jobA".to_string(),
        };
        assert!(err.to_string().contains("jobA"));
    }

    #[test]
    fn error_kinds() {
        assert_eq!(
            JobError::Unavailable {
                reason: "draining".to_string()
            }
            .kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            JobError::PreparationNotFound {
                preparation_id: "p".to_string()
            }
            .kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            JobError::Environment(EnvironmentError::UnknownEnvironment {
                environment_id: "e".to_string()
            })
            .kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            JobError::Unknown("boom".to_string()).kind(),
            ErrorKind::Unknown
        );
    }

    #[test]
    fn only_unavailable_is_retryable() {
        for kind in [
            ErrorKind::AlreadyExists,
            ErrorKind::NotFound,
            ErrorKind::InvalidArgument,
            ErrorKind::Unknown,
        ] {
            assert!(!kind.is_retryable(), "{kind} should not be retryable");
        }
        assert!(ErrorKind::Unavailable.is_retryable());
    }

    #[test]
    fn codes_are_distinct() {
        let codes = [
            ErrorKind::Unavailable.code(),
            ErrorKind::AlreadyExists.code(),
            ErrorKind::NotFound.code(),
            ErrorKind::InvalidArgument.code(),
            ErrorKind::Unknown.code(),
        ];
        let unique: std::collections::HashSet<_> = codes.iter().collect();
        assert_eq!(unique.len(), codes.len());
    }
}
