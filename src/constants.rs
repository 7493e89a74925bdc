//! Wire method names handled by [`JobRouter`](crate::router::JobRouter).

pub const METHOD_PREPARE: &str = "job/prepare";
pub const METHOD_RUN: &str = "job/run";
pub const METHOD_GET_STATE: &str = "job/getState";
pub const METHOD_CANCEL: &str = "job/cancel";
pub const METHOD_LIST: &str = "job/list";
pub const METHOD_ENVIRONMENTS: &str = "job/environments";

/// Server-streaming state updates, served by
/// [`JobRouter::state_stream`](crate::router::JobRouter::state_stream).
pub const METHOD_STATE_STREAM: &str = "job/stateStream";

/// Server-streaming messages, served by
/// [`JobRouter::message_stream`](crate::router::JobRouter::message_stream).
pub const METHOD_MESSAGE_STREAM: &str = "job/messageStream";
