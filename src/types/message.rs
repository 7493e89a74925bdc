//! Job log messages and the merged message stream item.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::state::{JobState, JobStateEvent};

/// Importance of a job message, ordered by severity (`Debug` lowest).
///
/// ```
/// use jobctl::MessageImportance;
///
/// assert!(MessageImportance::Debug < MessageImportance::Detailed);
/// assert!(MessageImportance::Warning < MessageImportance::Error);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MessageImportance {
    Debug,
    Detailed,
    Basic,
    Warning,
    Error,
}

impl fmt::Display for MessageImportance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Debug => write!(f, "DEBUG"),
            Self::Detailed => write!(f, "DETAILED"),
            Self::Basic => write!(f, "BASIC"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// One entry of a job's message log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobMessage {
    /// Unique id, `{job_id}:{sequence}`.
    pub message_id: String,
    /// When the message was appended.
    pub time: DateTime<Utc>,
    /// Severity.
    pub importance: MessageImportance,
    /// Message body.
    pub message_text: String,
}

/// An item of the merged message stream.
///
/// Messages and state changes share one stream so subscribers observe them
/// in the order they happened on the job.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum JobStreamItem {
    /// A log message.
    MessageResponse(JobMessage),
    /// A state change.
    StateResponse(JobStateEvent),
}

impl JobStreamItem {
    /// The state carried by this item, if it is a state change.
    pub fn state(&self) -> Option<JobState> {
        match self {
            Self::StateResponse(event) => Some(event.state),
            Self::MessageResponse(_) => None,
        }
    }

    /// The message carried by this item, if it is a log message.
    pub fn message(&self) -> Option<&JobMessage> {
        match self {
            Self::MessageResponse(message) => Some(message),
            Self::StateResponse(_) => None,
        }
    }
}
