//! Traced process state: identity, memory counter, owned descriptors.

use std::collections::BTreeMap;
use tr_common::{Fd, Pid};
use tr_log::ProcessSnapshot;

use super::descriptor::{size_text, Descriptor};

/// One traced process at a point in time.
#[derive(Debug, Clone, PartialEq)]
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub memory: i64,
    descriptors: BTreeMap<Fd, Descriptor>,
}

impl Process {
    pub fn new(pid: Pid, name: String, memory: i64) -> Process {
        Process {
            pid,
            name,
            memory,
            descriptors: BTreeMap::new(),
        }
    }

    /// Build a process (fd table included) from a keyframe snapshot.
    /// `name` comes from the naming strategy, not the recorded name.
    pub fn from_snapshot(name: String, snap: &ProcessSnapshot) -> Process {
        let descriptors = snap
            .fd_table
            .values()
            .map(|f| (f.fd(), Descriptor::from_snapshot(f)))
            .collect();
        Process {
            pid: snap.pid,
            name,
            memory: snap.memory,
            descriptors,
        }
    }

    /// Add a signed amount to the memory counter (mmap grows, munmap
    /// shrinks).
    pub fn apply_memory_delta(&mut self, amount: i64) {
        self.memory += amount;
    }

    pub fn add_descriptor(&mut self, descriptor: Descriptor) {
        self.descriptors.insert(descriptor.fd, descriptor);
    }

    /// Remove and return the descriptor, or `None` if the fd is unknown
    /// (a no-op by design: close events may reference descriptors whose
    /// creation predates the trace).
    pub fn remove_descriptor(&mut self, fd: Fd) -> Option<Descriptor> {
        self.descriptors.remove(&fd)
    }

    pub fn descriptor(&self, fd: Fd) -> Option<&Descriptor> {
        self.descriptors.get(&fd)
    }

    pub fn descriptor_mut(&mut self, fd: Fd) -> Option<&mut Descriptor> {
        self.descriptors.get_mut(&fd)
    }

    pub fn descriptors(&self) -> impl Iterator<Item = &Descriptor> {
        self.descriptors.values()
    }

    pub fn descriptor_count(&self) -> usize {
        self.descriptors.len()
    }

    /// Memory counter rendered with the shared size rule.
    pub fn memory_text(&self) -> String {
        size_text(self.memory)
    }

    /// Node header line: `name (pid)`.
    pub fn header_text(&self) -> String {
        format!("{} ({})", self.name, self.pid)
    }
}
