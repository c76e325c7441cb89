//! Trace Rewind event log.
//!
//! This crate owns the vocabulary of the replay engine:
//! - Typed trace events ([`TraceEvent`]), fixed at parse time
//! - Keyframe snapshot tables ([`ProcessSnapshot`], [`FdSnapshot`])
//! - The ordered, immutable [`EventLog`] with keyframe lookup
//!
//! The input is the converter's JSONL output: one self-contained record
//! per line. Lines that fail to parse are dropped and loading continues;
//! strace interleaves its own status lines with traced output, so a lossy
//! load is the normal case, not an exception.

pub mod event;
pub mod record;
pub mod snapshot;

pub use event::TraceEvent;
pub use record::LogRecord;
pub use snapshot::{FdSnapshot, ProcessSnapshot, ProcessTable};

use tr_common::{Error, Pid, Result};
use tracing::{debug, warn};

/// An ordered, immutable sequence of parsed trace records.
///
/// The current frame of a replay is an index into this sequence; the log
/// itself holds no cursor.
#[derive(Debug, Clone, Default)]
pub struct EventLog {
    records: Vec<LogRecord>,
}

impl EventLog {
    /// Parse newline-delimited records. Malformed lines are dropped with
    /// a warning; an input of nothing but malformed lines yields an empty
    /// log, which is a valid (if unnavigable) state.
    pub fn parse(raw: &str) -> EventLog {
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            match LogRecord::from_json_line(line) {
                Ok(rec) => records.push(rec),
                Err(e) => {
                    warn!(line = idx + 1, error = %e, "dropping malformed record");
                }
            }
        }
        debug!(records = records.len(), "event log parsed");
        EventLog { records }
    }

    /// Load and parse a log file.
    pub fn from_file(path: &std::path::Path) -> Result<EventLog> {
        let raw = std::fs::read_to_string(path)?;
        Ok(EventLog::parse(&raw))
    }

    /// Strict variant of [`EventLog::parse`]: the first malformed line
    /// aborts with its line number instead of being dropped. For hosts
    /// validating freshly converted traces, where a silent drop would
    /// hide a converter bug; replay loading stays lossy.
    pub fn parse_strict(raw: &str) -> Result<EventLog> {
        let mut records = Vec::new();
        for (idx, line) in raw.lines().enumerate() {
            if line.trim().is_empty() {
                continue;
            }
            let rec =
                LogRecord::from_json_line(line).map_err(|e| Error::MalformedRecord {
                    line: idx + 1,
                    message: e.to_string(),
                })?;
            records.push(rec);
        }
        Ok(EventLog { records })
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn get(&self, frame: usize) -> Option<&LogRecord> {
        self.records.get(frame)
    }

    /// Index of the last record, if any.
    pub fn last_index(&self) -> Option<usize> {
        self.len().checked_sub(1)
    }

    pub fn records(&self) -> &[LogRecord] {
        &self.records
    }

    /// Pid of the first record's event. Display-name derivation offsets
    /// from this. Defaults to 1 when the log is empty or starts with an
    /// ignored event.
    pub fn first_pid(&self) -> Pid {
        self.records
            .first()
            .and_then(|r| r.event.pid())
            .unwrap_or(Pid(1))
    }

    /// Nearest keyframe index at or before `frame`.
    ///
    /// The first record of a well-formed log carries a snapshot, so this
    /// normally finds one; a truncated log bottoms out at 0 and the
    /// rebuild starts from an empty table.
    pub fn keyframe_at(&self, frame: usize) -> usize {
        if self.records.is_empty() {
            return 0;
        }
        (0..=frame.min(self.records.len() - 1))
            .rev()
            .find(|&i| self.records[i].is_keyframe())
            .unwrap_or(0)
    }
}
