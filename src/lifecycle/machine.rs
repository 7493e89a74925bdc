//! The per-job state machine.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_util::sync::CancellationToken;

use super::fanout::{completed, Subscribers};
use crate::error::JobError;
use crate::types::message::{JobMessage, JobStreamItem, MessageImportance};
use crate::types::params::JobInfo;
use crate::types::state::{JobState, JobStateEvent};

/// Stream of job states. The first item is the state at subscription time.
pub type JobStateStream = UnboundedReceiverStream<JobState>;

/// Merged stream of log messages and state changes.
pub type JobMessageStream = UnboundedReceiverStream<JobStreamItem>;

/// Lifecycle of one job.
///
/// # Streams
///
/// - [`subscribe_state`](Self::subscribe_state) yields the current state
///   first, then every transition.
/// - [`subscribe_messages`](Self::subscribe_messages) yields messages and
///   state changes appended after registration, in the order they happened.
///
/// Both streams end after the job reaches a terminal state. Dropping a
/// stream unsubscribes it.
///
/// # Examples
///
/// ```
/// use jobctl::{JobState, JobStateMachine};
///
/// let job = JobStateMachine::new("job-1", "wordcount");
/// assert_eq!(job.state(), JobState::Starting);
///
/// job.set_state(JobState::Running).unwrap();
/// job.set_state(JobState::Done).unwrap();
/// assert!(job.set_state(JobState::Running).is_err());
/// assert_eq!(job.state(), JobState::Done);
/// ```
#[derive(Debug)]
pub struct JobStateMachine {
    job_id: String,
    job_name: String,
    created_at: DateTime<Utc>,
    inner: Mutex<Inner>,
}

#[derive(Debug)]
struct Inner {
    state: JobState,
    messages: Vec<JobMessage>,
    next_sequence: u64,
    state_subscribers: Subscribers<JobState>,
    message_subscribers: Subscribers<JobStreamItem>,
    cancellation: Option<CancellationToken>,
}

impl JobStateMachine {
    /// Creates a job in the `Starting` state.
    pub fn new(job_id: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            job_name: job_name.into(),
            created_at: Utc::now(),
            inner: Mutex::new(Inner {
                state: JobState::Starting,
                messages: Vec::new(),
                next_sequence: 0,
                state_subscribers: Subscribers::new(),
                message_subscribers: Subscribers::new(),
                cancellation: None,
            }),
        }
    }

    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    pub fn job_name(&self) -> &str {
        &self.job_name
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Current state.
    pub fn state(&self) -> JobState {
        self.inner.lock().state
    }

    /// Summary for listings.
    pub fn info(&self) -> JobInfo {
        JobInfo {
            job_id: self.job_id.clone(),
            job_name: self.job_name.clone(),
            state: self.state(),
        }
    }

    /// Moves the job to `new_state` and notifies subscribers.
    ///
    /// # Errors
    ///
    /// [`JobError::InvalidTransition`] if the job is already terminal; the
    /// state is left unchanged.
    pub fn set_state(&self, new_state: JobState) -> Result<(), JobError> {
        let mut guard = self.inner.lock();
        if let Err(err) = guard.state.validate_transition(&self.job_id, &new_state) {
            tracing::warn!(
                job_id = %self.job_id,
                from = %guard.state,
                to = %new_state,
                "rejected transition out of terminal state"
            );
            return Err(err);
        }
        self.apply(&mut guard, new_state);
        Ok(())
    }

    /// Requests cancellation and returns the resulting state.
    ///
    /// - terminal job: returns the terminal state unchanged
    /// - executor attached: fires its cancellation token and moves to
    ///   `Cancelling`; the executor reports the final state
    /// - no executor: moves straight to `Cancelled`
    pub fn cancel(&self) -> JobState {
        let mut guard = self.inner.lock();
        if guard.state.is_terminal() || guard.state == JobState::Cancelling {
            tracing::debug!(job_id = %self.job_id, state = %guard.state, "cancel is a no-op");
            return guard.state;
        }

        let target = match &guard.cancellation {
            Some(token) => {
                token.cancel();
                JobState::Cancelling
            },
            None => JobState::Cancelled,
        };
        self.apply(&mut guard, target);
        target
    }

    /// Appends a log message and delivers it to message subscribers.
    pub fn append_message(
        &self,
        importance: MessageImportance,
        text: impl Into<String>,
    ) -> JobMessage {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        inner.next_sequence += 1;
        let message = JobMessage {
            message_id: format!("{}:{}", self.job_id, inner.next_sequence),
            time: Utc::now(),
            importance,
            message_text: text.into(),
        };
        inner.messages.push(message.clone());
        inner
            .message_subscribers
            .publish(&JobStreamItem::MessageResponse(message.clone()));
        message
    }

    /// Subscribes to state changes.
    pub fn subscribe_state(&self) -> JobStateStream {
        let mut guard = self.inner.lock();
        let current = guard.state;
        let rx = if current.is_terminal() {
            completed(Some(current))
        } else {
            guard.state_subscribers.subscribe_with(current)
        };
        UnboundedReceiverStream::new(rx)
    }

    /// Subscribes to the merged message and state stream.
    pub fn subscribe_messages(&self) -> JobMessageStream {
        let mut guard = self.inner.lock();
        let rx = if guard.state.is_terminal() {
            completed(None)
        } else {
            guard.message_subscribers.subscribe()
        };
        UnboundedReceiverStream::new(rx)
    }

    /// Snapshot of every message appended so far.
    pub fn messages(&self) -> Vec<JobMessage> {
        self.inner.lock().messages.clone()
    }

    /// Number of live state subscribers. Dropped streams do not count.
    pub fn state_subscriber_count(&self) -> usize {
        self.inner.lock().state_subscribers.len()
    }

    /// Number of live message subscribers.
    pub fn message_subscriber_count(&self) -> usize {
        self.inner.lock().message_subscribers.len()
    }

    /// Hands cancellation to an executor: later `cancel` calls fire `token`
    /// instead of cancelling directly.
    pub(crate) fn attach_cancellation(&self, token: CancellationToken) {
        self.inner.lock().cancellation = Some(token);
    }

    fn apply(&self, inner: &mut Inner, new_state: JobState) {
        let previous = inner.state;
        inner.state = new_state;

        let event = JobStateEvent {
            state: new_state,
            timestamp: Utc::now(),
        };
        let pruned = inner.state_subscribers.publish(&new_state)
            + inner
                .message_subscribers
                .publish(&JobStreamItem::StateResponse(event));
        if pruned > 0 {
            tracing::debug!(
                job_id = %self.job_id,
                pruned,
                "dropped closed subscribers"
            );
        }

        tracing::info!(
            job_id = %self.job_id,
            from = %previous,
            to = %new_state,
            "job state changed"
        );

        if new_state.is_terminal() {
            inner.state_subscribers.close();
            inner.message_subscribers.close();
            inner.cancellation = None;
        }
    }
}
