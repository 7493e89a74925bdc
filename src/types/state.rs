//! Job lifecycle states.
//!
//! A job starts in [`JobState::Starting`] and moves freely between
//! non-terminal states. `Done`, `Failed`, and `Cancelled` are terminal:
//! once reached, every further transition is rejected.
//!
//! # Transition policy
//!
//! ```text
//! any non-terminal -> any state (including itself and back to RUNNING)
//! DONE | FAILED | CANCELLED -> (terminal, no transitions)
//! ```
//!
//! Edge-level legality (for example `STARTING -> DRAINED`) is deliberately
//! left to the executing backend.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::JobError;

/// Lifecycle state of a job.
///
/// # Examples
///
/// ```
/// use jobctl::JobState;
///
/// let state = JobState::Running;
/// assert!(!state.is_terminal());
/// assert!(state.can_transition_to(&JobState::Draining));
/// assert!(!JobState::Done.can_transition_to(&JobState::Running));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    /// No state reported.
    Unspecified,
    /// Stopped, may be resumed.
    Stopped,
    /// Actively processing.
    Running,
    /// Finished successfully (terminal).
    Done,
    /// Finished with an error (terminal).
    Failed,
    /// Cancelled on request (terminal).
    Cancelled,
    /// Replaced by an updated job.
    Updated,
    /// Finishing in-flight work before stopping.
    Draining,
    /// All in-flight work finished.
    Drained,
    /// Accepted and being started by the executor.
    Starting,
    /// Cancellation requested, executor is shutting down.
    Cancelling,
}

impl JobState {
    /// Every state, in declaration order.
    pub const ALL: [Self; 11] = [
        Self::Unspecified,
        Self::Stopped,
        Self::Running,
        Self::Done,
        Self::Failed,
        Self::Cancelled,
        Self::Updated,
        Self::Draining,
        Self::Drained,
        Self::Starting,
        Self::Cancelling,
    ];

    /// Returns `true` for `Done`, `Failed`, and `Cancelled`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobctl::JobState;
    ///
    /// assert!(JobState::Done.is_terminal());
    /// assert!(JobState::Failed.is_terminal());
    /// assert!(JobState::Cancelled.is_terminal());
    /// assert!(!JobState::Cancelling.is_terminal());
    /// assert!(!JobState::Drained.is_terminal());
    /// ```
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Failed | Self::Cancelled)
    }

    /// Returns `true` if a job in this state may move to `next`.
    ///
    /// Only the source state matters: terminal states reject everything,
    /// every other state accepts everything.
    pub fn can_transition_to(&self, _next: &Self) -> bool {
        !self.is_terminal()
    }

    /// Validates a transition from this state to `next`.
    ///
    /// # Examples
    ///
    /// ```
    /// use jobctl::JobState;
    ///
    /// assert!(JobState::Starting.validate_transition("job-1", &JobState::Drained).is_ok());
    /// assert!(JobState::Done.validate_transition("job-1", &JobState::Running).is_err());
    /// ```
    pub fn validate_transition(&self, job_id: &str, next: &Self) -> Result<(), JobError> {
        if self.can_transition_to(next) {
            Ok(())
        } else {
            Err(JobError::InvalidTransition {
                job_id: job_id.to_string(),
                from: *self,
                to: *next,
            })
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unspecified => write!(f, "UNSPECIFIED"),
            Self::Stopped => write!(f, "STOPPED"),
            Self::Running => write!(f, "RUNNING"),
            Self::Done => write!(f, "DONE"),
            Self::Failed => write!(f, "FAILED"),
            Self::Cancelled => write!(f, "CANCELLED"),
            Self::Updated => write!(f, "UPDATED"),
            Self::Draining => write!(f, "DRAINING"),
            Self::Drained => write!(f, "DRAINED"),
            Self::Starting => write!(f, "STARTING"),
            Self::Cancelling => write!(f, "CANCELLING"),
        }
    }
}

/// A state snapshot, as delivered on the message stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStateEvent {
    /// The state the job moved to.
    pub state: JobState,
    /// When the transition happened.
    pub timestamp: DateTime<Utc>,
}
