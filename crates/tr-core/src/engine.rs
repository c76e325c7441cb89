//! The replay engine: per-event state transitions and arbitrary-frame
//! seeks.
//!
//! The log encodes forward deltas plus periodic full snapshots; there are
//! no inverse events. Stepping forward is the only O(1) path. Every other
//! navigation (backward step, jump, slider drag) reconstructs: find the
//! nearest keyframe at or before the target, rebuild the world from its
//! snapshot, then replay the records after it in order. The rebuild is
//! rejected up front by the range check, so a caller never observes a
//! half-applied seek.
//!
//! Lookup misses (events naming a pid or fd the world does not have) are
//! ignored by design: a trace that starts mid-stream references state
//! whose creation was never captured, and replay tolerates that rather
//! than erroring.

use tracing::debug;

use tr_common::{Error, Fd, Pid, Result};
use tr_log::{EventLog, LogRecord, ProcessSnapshot, TraceEvent};

use crate::model::{Descriptor, Process, SlotRegistry, WorldState};
use crate::naming::{PidOffsetNamer, ProcessNamer};
use crate::notify::{DescriptorView, StateSink};

/// Replay engine over one loaded event log.
///
/// The only mutable state is `(frame, world)`; `frame` is `None` until a
/// non-empty log has been loaded.
pub struct ReplayEngine<S: StateSink> {
    log: EventLog,
    frame: Option<usize>,
    world: WorldState,
    slots: SlotRegistry,
    first_pid: Pid,
    namer: Box<dyn ProcessNamer>,
    sink: S,
}

impl<S: StateSink> ReplayEngine<S> {
    pub fn new(sink: S) -> ReplayEngine<S> {
        ReplayEngine::with_namer(sink, Box::new(PidOffsetNamer))
    }

    pub fn with_namer(sink: S, namer: Box<dyn ProcessNamer>) -> ReplayEngine<S> {
        ReplayEngine {
            log: EventLog::default(),
            frame: None,
            world: WorldState::new(),
            slots: SlotRegistry::new(),
            first_pid: Pid(1),
            namer,
            sink,
        }
    }

    /// Parse raw JSONL and load it, replacing any current log. See
    /// [`ReplayEngine::load_log`].
    pub fn load(&mut self, raw: &str) -> Result<()> {
        self.load_log(EventLog::parse(raw))
    }

    /// Replace the current log. Tears down the world (notifying the
    /// sink), derives the first-seen pid for display naming, then seeks
    /// frame 0. An empty log leaves the frame range empty; step and seek
    /// are rejected until a non-empty one is loaded. Display slots are
    /// kept across loads so recurring pids land where they were.
    pub fn load_log(&mut self, log: EventLog) -> Result<()> {
        let mut tx = Applier {
            world: &mut self.world,
            slots: &mut self.slots,
            namer: self.namer.as_ref(),
            sink: &mut self.sink,
            first_pid: self.first_pid,
        };
        tx.clear();

        self.frame = None;
        self.first_pid = log.first_pid();
        self.log = log;
        debug!(records = self.log.len(), first_pid = %self.first_pid, "log loaded");

        if self.log.is_empty() {
            return Ok(());
        }
        self.seek(0)
    }

    /// Advance one frame and apply that frame's event. The fast path: no
    /// rebuild. Returns `Ok(false)` when already at the last frame.
    pub fn step_forward(&mut self) -> Result<bool> {
        let last = self.log.last_index().ok_or(Error::EmptyLog)?;
        let current = self.frame.unwrap_or(0);
        if current >= last {
            return Ok(false);
        }
        let next = current + 1;

        let rec = match self.log.get(next) {
            Some(rec) => rec,
            None => return Ok(false),
        };
        let mut tx = Applier {
            world: &mut self.world,
            slots: &mut self.slots,
            namer: self.namer.as_ref(),
            sink: &mut self.sink,
            first_pid: self.first_pid,
        };
        tx.apply(next, rec);

        self.frame = Some(next);
        self.emit_frame_changed(next);
        Ok(true)
    }

    /// Move one frame back. There are no inverse events, so this is a
    /// full `seek(frame - 1)`. Returns `Ok(false)` at frame 0.
    pub fn step_backward(&mut self) -> Result<bool> {
        if self.log.is_empty() {
            return Err(Error::EmptyLog);
        }
        match self.frame {
            Some(f) if f > 0 => {
                self.seek(f - 1)?;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    /// Jump to an arbitrary frame. Alias for [`ReplayEngine::seek`].
    pub fn jump_to(&mut self, target: usize) -> Result<()> {
        self.seek(target)
    }

    /// Reconstruct the world at `target`: nearest keyframe at or before
    /// it, rebuild from that snapshot, replay the records after it in
    /// order, exactly once each. The range check precedes any mutation.
    pub fn seek(&mut self, target: usize) -> Result<()> {
        if self.log.is_empty() {
            return Err(Error::EmptyLog);
        }
        if target >= self.log.len() {
            return Err(Error::OutOfRange {
                frame: target,
                len: self.log.len(),
            });
        }

        let keyframe = self.log.keyframe_at(target);
        debug!(target, keyframe, "seek");

        let mut tx = Applier {
            world: &mut self.world,
            slots: &mut self.slots,
            namer: self.namer.as_ref(),
            sink: &mut self.sink,
            first_pid: self.first_pid,
        };
        tx.clear();

        if let Some(table) = self.log.get(keyframe).and_then(|r| r.p_table.as_ref()) {
            for snap in table.values() {
                tx.spawn_process(snap);
            }
        }

        for i in keyframe + 1..=target {
            if let Some(rec) = self.log.get(i) {
                tx.apply(i, rec);
            }
        }

        self.frame = Some(target);
        self.emit_frame_changed(target);
        Ok(())
    }

    pub fn frame(&self) -> Option<usize> {
        self.frame
    }

    pub fn world(&self) -> &WorldState {
        &self.world
    }

    pub fn log(&self) -> &EventLog {
        &self.log
    }

    pub fn first_pid(&self) -> Pid {
        self.first_pid
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    fn emit_frame_changed(&mut self, frame: usize) {
        if let Some(rec) = self.log.get(frame) {
            self.sink.frame_changed(frame, &rec.time, &rec.event_text);
        }
    }
}

/// Borrow bundle for applying events: the world and its bookkeeping,
/// split from the log so records can be read while state mutates.
struct Applier<'a, S: StateSink> {
    world: &'a mut WorldState,
    slots: &'a mut SlotRegistry,
    namer: &'a dyn ProcessNamer,
    sink: &'a mut S,
    first_pid: Pid,
}

impl<S: StateSink> Applier<'_, S> {
    /// Destroy every live process, notifying the sink per process.
    fn clear(&mut self) {
        for pid in self.world.pids() {
            self.world.remove(pid);
            self.sink.process_destroyed(pid);
        }
    }

    /// Create a process (full fd table) from a keyframe snapshot entry.
    fn spawn_process(&mut self, snap: &ProcessSnapshot) {
        let pid = snap.pid;
        // a live pid being re-added means the old incarnation is gone
        if self.world.remove(pid).is_some() {
            self.sink.process_destroyed(pid);
        }

        let name = self.namer.name_for(pid, self.first_pid);
        let slot = self.slots.slot_for(pid);
        let process = Process::from_snapshot(name, snap);

        let views: Vec<DescriptorView> = process
            .descriptors()
            .map(|d| DescriptorView {
                fd: d.fd,
                class: d.class(),
                text: d.render(),
            })
            .collect();
        self.sink
            .process_created(pid, &process.name, process.memory, slot, &views);
        self.world.insert(process);
    }

    /// Apply one record's event to the world. Infallible: malformed
    /// events and dangling references degrade to no-ops.
    fn apply(&mut self, frame: usize, rec: &LogRecord) {
        match &rec.event {
            TraceEvent::AddProc { pid, .. } => match rec.snapshot_entry(frame, *pid) {
                Ok(snap) => self.spawn_process(snap),
                Err(e) => debug!(error = %e, "ignoring add_proc"),
            },

            TraceEvent::CloseProc { pid } => {
                if self.world.remove(*pid).is_some() {
                    self.sink.process_destroyed(*pid);
                }
            }

            TraceEvent::OpenFd { pid, fd } | TraceEvent::Accept { pid, fd, .. } => {
                if !self.world.contains(*pid) {
                    return;
                }
                let fd_snap = rec
                    .p_table
                    .as_ref()
                    .and_then(|t| t.get(pid))
                    .and_then(|p| p.fd_table.get(fd));
                match fd_snap {
                    Some(f) => {
                        let descriptor = Descriptor::from_snapshot(f);
                        let class = descriptor.class();
                        let text = descriptor.render();
                        if let Some(p) = self.world.get_mut(*pid) {
                            p.add_descriptor(descriptor);
                            self.sink.descriptor_created(*pid, *fd, class, &text);
                        }
                    }
                    None => debug!(frame, %pid, %fd, "open event without snapshot entry"),
                }
            }

            TraceEvent::CloseFd { pid, fd } => {
                if let Some(p) = self.world.get_mut(*pid) {
                    if p.remove_descriptor(*fd).is_some() {
                        self.sink.descriptor_destroyed(*pid, *fd);
                    }
                }
            }

            TraceEvent::ReadFd { pid, fd, len, .. } => self.counter_delta(*pid, *fd, *len, 0),
            TraceEvent::WriteFd { pid, fd, len, .. } => self.counter_delta(*pid, *fd, 0, *len),

            TraceEvent::Bind {
                pid,
                fd,
                family,
                bind,
            } => self.socket_update(*pid, *fd, Some(family.as_str()), Some(bind.as_str()), None, None),

            TraceEvent::Listen { pid, fd } => {
                self.socket_update(*pid, *fd, None, None, None, Some(false))
            }

            TraceEvent::Connect {
                pid,
                fd,
                family,
                target,
            } => self.socket_update(
                *pid,
                *fd,
                Some(family.as_str()),
                None,
                Some(target.as_str()),
                Some(true),
            ),

            TraceEvent::ManipMem { pid, amount, .. } => {
                if let Some(p) = self.world.get_mut(*pid) {
                    p.apply_memory_delta(*amount);
                    let text = p.memory_text();
                    self.sink.memory_changed(*pid, &text);
                }
            }

            // recorded for display, no state effect
            TraceEvent::SendSignal { .. } | TraceEvent::Ignored => {}
        }
    }

    fn counter_delta(&mut self, pid: Pid, fd: Fd, r: i64, w: i64) {
        let Some(p) = self.world.get_mut(pid) else {
            return;
        };
        let Some(d) = p.descriptor_mut(fd) else {
            return;
        };
        d.apply_counter_delta(r, w);
        let text = d.render();
        self.sink.descriptor_text_changed(pid, fd, &text);
    }

    fn socket_update(
        &mut self,
        pid: Pid,
        fd: Fd,
        family: Option<&str>,
        bind: Option<&str>,
        target: Option<&str>,
        is_out: Option<bool>,
    ) {
        let Some(p) = self.world.get_mut(pid) else {
            return;
        };
        let Some(d) = p.descriptor_mut(fd) else {
            return;
        };
        if d.apply_socket_update(family, bind, target, is_out) {
            let text = d.render();
            self.sink.descriptor_text_changed(pid, fd, &text);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::{Notification, RecordingSink};

    fn keyframe(time: &str, pid: i32, memory: i64) -> String {
        format!(
            r#"{{"time":"{time}","event":{{"name":"add_proc","pid":{pid},"ppid":0}},"p_table":{{"{pid}":{{"ppid":0,"pid":{pid},"name":"postgres","memory":{memory},"fd_table":{{"0":{{"class":"SStd","fd":0,"r":0,"w":0}}}}}}}}}}"#
        )
    }

    fn close_proc(pid: i32) -> String {
        format!(
            r#"{{"time":"t","event":{{"name":"close_proc","pid":{pid}}},"p_table":null}}"#
        )
    }

    fn write_fd(pid: i32, fd: i32, len: i64) -> String {
        format!(
            r#"{{"time":"t","event":{{"name":"write_fd","pid":{pid},"fd":{fd},"content":null,"len":{len}}},"p_table":null}}"#
        )
    }

    fn engine() -> ReplayEngine<RecordingSink> {
        ReplayEngine::new(RecordingSink::new())
    }

    #[test]
    fn test_add_then_close_scenario() {
        let raw = format!("{}\n{}\n", keyframe("t0", 77, 100), close_proc(77));
        let mut e = engine();
        e.load(&raw).unwrap();

        assert_eq!(e.frame(), Some(0));
        let p = e.world().get(Pid(77)).unwrap();
        assert_eq!(p.memory, 100);

        assert!(e.step_forward().unwrap());
        assert_eq!(e.frame(), Some(1));
        assert!(e.world().get(Pid(77)).is_none());
        assert!(e
            .sink()
            .notifications
            .contains(&Notification::ProcessDestroyed { pid: Pid(77) }));
    }

    #[test]
    fn test_step_at_last_frame_is_refused() {
        let raw = keyframe("t0", 1, 0);
        let mut e = engine();
        e.load(&raw).unwrap();
        assert!(!e.step_forward().unwrap());
        assert_eq!(e.frame(), Some(0));
    }

    #[test]
    fn test_empty_log_rejects_navigation() {
        let mut e = engine();
        e.load("no records here\n").unwrap();
        assert_eq!(e.frame(), None);
        assert!(matches!(e.step_forward(), Err(Error::EmptyLog)));
        assert!(matches!(e.step_backward(), Err(Error::EmptyLog)));
        assert!(matches!(e.seek(0), Err(Error::EmptyLog)));
    }

    #[test]
    fn test_out_of_range_jump_leaves_state_unchanged() {
        let raw = format!("{}\n{}\n", keyframe("t0", 5, 64), write_fd(5, 0, 10));
        let mut e = engine();
        e.load(&raw).unwrap();
        e.step_forward().unwrap();
        let before = e.world().clone();

        let err = e.jump_to(2).unwrap_err();
        assert!(matches!(err, Error::OutOfRange { frame: 2, len: 2 }));
        assert_eq!(e.frame(), Some(1));
        assert_eq!(*e.world(), before);
    }

    #[test]
    fn test_dangling_write_is_silently_ignored() {
        let raw = format!("{}\n{}\n{}\n", keyframe("t0", 5, 0), write_fd(5, 99, 512), write_fd(42, 0, 512));
        let mut e = engine();
        e.load(&raw).unwrap();
        let before = e.world().clone();

        e.step_forward().unwrap(); // unknown fd
        e.step_forward().unwrap(); // unknown pid
        assert_eq!(*e.world(), before);
    }

    #[test]
    fn test_keyframe_fallback_replays_from_zero() {
        let mut raw = keyframe("t0", 5, 0);
        raw.push('\n');
        for _ in 0..10 {
            raw.push_str(&write_fd(5, 0, 100));
            raw.push('\n');
        }
        let mut e = engine();
        e.load(&raw).unwrap();

        e.seek(7).unwrap();
        let d = e.world().get(Pid(5)).unwrap().descriptor(Fd(0)).unwrap();
        assert_eq!(d.bytes_written, 700);
    }

    #[test]
    fn test_seek_is_deterministic_regardless_of_history() {
        let mut raw = keyframe("t0", 5, 0);
        raw.push('\n');
        for i in 0..10 {
            raw.push_str(&write_fd(5, 0, 100 + i));
            raw.push('\n');
        }

        let mut a = engine();
        a.load(&raw).unwrap();
        a.seek(9).unwrap();
        a.seek(2).unwrap();
        a.seek(6).unwrap();

        let mut b = engine();
        b.load(&raw).unwrap();
        b.seek(6).unwrap();

        assert_eq!(a.world(), b.world());
        assert_eq!(a.world().render(), b.world().render());
    }

    #[test]
    fn test_frame_changed_carries_raw_event_text() {
        let raw = keyframe("10:15:35.419", 2710, 0);
        let mut e = engine();
        e.load(&raw).unwrap();
        assert!(e.sink().notifications.contains(&Notification::FrameChanged {
            frame: 0,
            time_label: "10:15:35.419".to_string(),
            event_text: r#"{"name":"add_proc","pid":2710,"ppid":0}"#.to_string(),
        }));
    }

    #[test]
    fn test_slot_survives_reload() {
        let raw = keyframe("t0", 5, 0);
        let mut e = engine();
        e.load(&raw).unwrap();
        let slot_before = match &e.sink().notifications[0] {
            Notification::ProcessCreated { slot, .. } => *slot,
            other => panic!("unexpected first notification: {:?}", other),
        };

        e.sink_mut().clear();
        e.load(&raw).unwrap();
        let created = e
            .sink()
            .notifications
            .iter()
            .find_map(|n| match n {
                Notification::ProcessCreated { slot, .. } => Some(*slot),
                _ => None,
            })
            .unwrap();
        assert_eq!(created, slot_before);
    }
}
