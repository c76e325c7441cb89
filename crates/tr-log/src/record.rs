//! One parsed line of the trace log.

use serde::Deserialize;
use tr_common::{Error, Pid, Result};

use crate::event::TraceEvent;
use crate::snapshot::{ProcessSnapshot, ProcessTable};

/// Wire shape of a record, used only during parsing.
#[derive(Debug, Deserialize)]
struct WireRecord {
    time: String,
    event: TraceEvent,
    #[serde(default)]
    p_table: Option<ProcessTable>,
}

/// One entry in the trace log.
///
/// `event_text` is the compact JSON of the raw event object, kept so the
/// frame-changed notification can surface the current command verbatim
/// without re-serializing a typed variant.
#[derive(Debug, Clone, PartialEq)]
pub struct LogRecord {
    /// Time label from the original strace output, opaque to the engine.
    pub time: String,

    /// Typed event payload.
    pub event: TraceEvent,

    /// Compact JSON text of the raw event object.
    pub event_text: String,

    /// Full process table if this record is a keyframe.
    pub p_table: Option<ProcessTable>,
}

impl LogRecord {
    /// Parse a single JSONL line into a record.
    pub fn from_json_line(line: &str) -> Result<LogRecord> {
        let value: serde_json::Value = serde_json::from_str(line)?;
        let event_text = value
            .get("event")
            .map(|e| e.to_string())
            .unwrap_or_default();
        let wire: WireRecord = serde_json::from_value(value)?;
        Ok(LogRecord {
            time: wire.time,
            event: wire.event,
            event_text,
            p_table: wire.p_table,
        })
    }

    /// Whether this record carries a full snapshot usable as a rebuild
    /// baseline.
    pub fn is_keyframe(&self) -> bool {
        self.p_table.is_some()
    }

    /// The snapshot entry for `pid`, if this record is a keyframe that
    /// contains one. A well-formed `add_proc`/`open_fd`/`accept` record
    /// always does; a record that parsed but lacks the entry yields a
    /// [`Error::MalformedEvent`] which replay treats as non-fatal.
    pub fn snapshot_entry(
        &self,
        frame: usize,
        pid: Pid,
    ) -> Result<&ProcessSnapshot> {
        self.p_table
            .as_ref()
            .and_then(|t| t.get(&pid))
            .ok_or_else(|| Error::MalformedEvent {
                frame,
                message: format!("no snapshot entry for pid {}", pid),
            })
    }
}
