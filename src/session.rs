//! Session module: ties scanning, the queue and the playback engine together.
//!
//! The `Session` lives in `session::coordinator`; the play sequence it walks
//! through lives in `session::queue`.

mod coordinator;
mod queue;

pub use coordinator::*;
pub use queue::Queue;
