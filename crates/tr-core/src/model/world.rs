//! World state: every live process at one frame, plus the slot registry
//! that keeps a reappearing pid in the same display position across
//! rebuilds.

use std::collections::{BTreeMap, HashMap};
use tr_common::Pid;

use super::process::Process;

/// Stable display position handed to renderers. The engine only promises
/// that the same pid gets the same slot every time it (re)appears; how a
/// slot maps to screen or scene coordinates is the renderer's business.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DisplaySlot(pub u32);

/// Remembers the slot chosen for each pid.
///
/// Entries survive process destruction, reconstruction from any keyframe,
/// and even a full log reload; seeks rebuild the world from scratch, and
/// without this memory every rebuild would relocate still-live processes.
#[derive(Debug, Clone, Default)]
pub struct SlotRegistry {
    history: HashMap<Pid, DisplaySlot>,
    next: u32,
}

impl SlotRegistry {
    pub fn new() -> SlotRegistry {
        SlotRegistry::default()
    }

    /// The slot for `pid`: the remembered one, or a freshly allocated one
    /// recorded for all future appearances.
    pub fn slot_for(&mut self, pid: Pid) -> DisplaySlot {
        if let Some(slot) = self.history.get(&pid) {
            return *slot;
        }
        let slot = DisplaySlot(self.next);
        self.next += 1;
        self.history.insert(pid, slot);
        slot
    }

    pub fn len(&self) -> usize {
        self.history.len()
    }

    pub fn is_empty(&self) -> bool {
        self.history.is_empty()
    }
}

/// The entire reconstructable state at one frame: pid → process.
///
/// Ordered map so iteration (and therefore rendering and comparison) is
/// deterministic for a given state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WorldState {
    processes: BTreeMap<Pid, Process>,
}

impl WorldState {
    pub fn new() -> WorldState {
        WorldState::default()
    }

    pub fn insert(&mut self, process: Process) -> Option<Process> {
        self.processes.insert(process.pid, process)
    }

    pub fn remove(&mut self, pid: Pid) -> Option<Process> {
        self.processes.remove(&pid)
    }

    pub fn get(&self, pid: Pid) -> Option<&Process> {
        self.processes.get(&pid)
    }

    pub fn get_mut(&mut self, pid: Pid) -> Option<&mut Process> {
        self.processes.get_mut(&pid)
    }

    pub fn contains(&self, pid: Pid) -> bool {
        self.processes.contains_key(&pid)
    }

    pub fn processes(&self) -> impl Iterator<Item = &Process> {
        self.processes.values()
    }

    pub fn pids(&self) -> Vec<Pid> {
        self.processes.keys().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    /// Deterministic text dump of the whole world, one process header per
    /// line followed by its rendered descriptors. Two equal states render
    /// byte-identically.
    pub fn render(&self) -> String {
        let mut out = String::new();
        for p in self.processes.values() {
            out.push_str(&p.header_text());
            out.push('\n');
            out.push_str(&p.memory_text());
            out.push('\n');
            for d in p.descriptors() {
                out.push_str("  ");
                out.push_str(&d.render());
                out.push('\n');
            }
        }
        out
    }
}
