//! Per-job lifecycle state machines with multi-subscriber streaming.
//!
//! [`JobStateMachine`] owns one job's state and message log. All mutation
//! goes through a per-job lock, so transitions and appends on one job are
//! totally ordered while unrelated jobs proceed in parallel.
//!
//! Subscribers each own an unbounded channel fed by the writer. A slow
//! subscriber buffers on its own queue and never holds up the writer; a
//! dropped subscriber is pruned on the next delivery.

mod fanout;
mod machine;

pub use machine::{JobMessageStream, JobStateMachine, JobStateStream};
