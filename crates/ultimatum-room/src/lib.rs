//! Game-room host for the Ultimatum Game matcher
//!
//! Wraps the pure core in `ultimatum-logic` with the session-level
//! plumbing: wait room, round timers, reconnects, persistence and the
//! final bonus.

mod error;
mod events;
mod room;
mod sink;

pub use error::RoomError;
pub use events::{Directive, Event};
pub use room::{GameRoom, Phase};
pub use sink::{JsonLinesSink, MemorySink, RecordSink};
