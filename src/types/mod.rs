//! Wire types for the job-control protocol.
//!
//! Enumerations serialize as `SCREAMING_SNAKE_CASE` strings; request and
//! response structs use `camelCase` field names.

pub mod message;
pub mod params;
pub mod state;

pub use message::*;
pub use params::*;
pub use state::*;
