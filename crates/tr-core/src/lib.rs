//! Trace Rewind core: reconstruct an operating-system process tree from a
//! recorded strace event log and navigate its history.
//!
//! The log is an ordered sequence of forward deltas with periodic full
//! snapshots (keyframes). [`ReplayEngine`] applies one event per forward
//! step and reconstructs arbitrary frames by rebuilding from the nearest
//! keyframe and replaying the records after it. State changes stream to a
//! [`StateSink`]; the engine itself holds no rendering state.
//!
//! ```no_run
//! use tr_core::{Playback, ReplayEngine, NullSink};
//!
//! let engine = ReplayEngine::new(NullSink);
//! let mut playback = Playback::new(engine);
//! playback.load(&std::fs::read_to_string("trace.jsonl")?)?;
//! playback.step_forward()?;
//! playback.jump_to(0)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod engine;
pub mod model;
pub mod naming;
pub mod notify;
pub mod playback;

pub use engine::ReplayEngine;
pub use model::{
    size_text, Descriptor, DescriptorClass, DescriptorKind, DisplaySlot, Process, SlotRegistry,
    SocketInfo, WorldState,
};
pub use naming::{PidOffsetNamer, ProcessNamer};
pub use notify::{DescriptorView, Notification, NullSink, RecordingSink, StateSink};
pub use playback::{LoadTicket, Playback};

// re-exports so hosts can use one crate
pub use tr_common::{Error, Fd, Pid, Result};
pub use tr_log::{EventLog, FdSnapshot, LogRecord, ProcessSnapshot, TraceEvent};
