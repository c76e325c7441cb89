//! State-change notifications from the engine to its rendering
//! collaborator.
//!
//! The engine holds no rendering state; everything a renderer needs to
//! add, remove, or relabel a visual element arrives through [`StateSink`].
//! During a seek the sink sees the full teardown (one destroy per live
//! process) followed by the rebuilt state, so a renderer that does nothing
//! but mirror the callbacks stays consistent.

use tr_common::{Fd, Pid};

use crate::model::{DescriptorClass, DisplaySlot};

/// Rendered view of one descriptor, as passed alongside process creation.
#[derive(Debug, Clone, PartialEq)]
pub struct DescriptorView {
    pub fd: Fd,
    pub class: DescriptorClass,
    pub text: String,
}

/// Observer for replay state changes. All methods default to no-ops so a
/// sink only implements what it renders.
pub trait StateSink {
    fn process_created(
        &mut self,
        _pid: Pid,
        _name: &str,
        _memory: i64,
        _slot: DisplaySlot,
        _descriptors: &[DescriptorView],
    ) {
    }

    fn process_destroyed(&mut self, _pid: Pid) {}

    fn descriptor_created(&mut self, _pid: Pid, _fd: Fd, _class: DescriptorClass, _text: &str) {}

    fn descriptor_destroyed(&mut self, _pid: Pid, _fd: Fd) {}

    fn descriptor_text_changed(&mut self, _pid: Pid, _fd: Fd, _text: &str) {}

    fn memory_changed(&mut self, _pid: Pid, _memory_text: &str) {}

    fn frame_changed(&mut self, _frame: usize, _time_label: &str, _event_text: &str) {}
}

/// Sink that discards everything; for headless replay.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullSink;

impl StateSink for NullSink {}

/// One recorded notification, for assertion in tests and for hosts that
/// want a queue instead of callbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    ProcessCreated {
        pid: Pid,
        name: String,
        memory: i64,
        slot: DisplaySlot,
        descriptors: Vec<DescriptorView>,
    },
    ProcessDestroyed {
        pid: Pid,
    },
    DescriptorCreated {
        pid: Pid,
        fd: Fd,
        class: DescriptorClass,
        text: String,
    },
    DescriptorDestroyed {
        pid: Pid,
        fd: Fd,
    },
    DescriptorTextChanged {
        pid: Pid,
        fd: Fd,
        text: String,
    },
    MemoryChanged {
        pid: Pid,
        memory_text: String,
    },
    FrameChanged {
        frame: usize,
        time_label: String,
        event_text: String,
    },
}

/// Sink that records every notification in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    pub notifications: Vec<Notification>,
}

impl RecordingSink {
    pub fn new() -> RecordingSink {
        RecordingSink::default()
    }

    pub fn clear(&mut self) {
        self.notifications.clear();
    }
}

impl StateSink for RecordingSink {
    fn process_created(
        &mut self,
        pid: Pid,
        name: &str,
        memory: i64,
        slot: DisplaySlot,
        descriptors: &[DescriptorView],
    ) {
        self.notifications.push(Notification::ProcessCreated {
            pid,
            name: name.to_string(),
            memory,
            slot,
            descriptors: descriptors.to_vec(),
        });
    }

    fn process_destroyed(&mut self, pid: Pid) {
        self.notifications.push(Notification::ProcessDestroyed { pid });
    }

    fn descriptor_created(&mut self, pid: Pid, fd: Fd, class: DescriptorClass, text: &str) {
        self.notifications.push(Notification::DescriptorCreated {
            pid,
            fd,
            class,
            text: text.to_string(),
        });
    }

    fn descriptor_destroyed(&mut self, pid: Pid, fd: Fd) {
        self.notifications
            .push(Notification::DescriptorDestroyed { pid, fd });
    }

    fn descriptor_text_changed(&mut self, pid: Pid, fd: Fd, text: &str) {
        self.notifications.push(Notification::DescriptorTextChanged {
            pid,
            fd,
            text: text.to_string(),
        });
    }

    fn memory_changed(&mut self, pid: Pid, memory_text: &str) {
        self.notifications.push(Notification::MemoryChanged {
            pid,
            memory_text: memory_text.to_string(),
        });
    }

    fn frame_changed(&mut self, frame: usize, time_label: &str, event_text: &str) {
        self.notifications.push(Notification::FrameChanged {
            frame,
            time_label: time_label.to_string(),
            event_text: event_text.to_string(),
        });
    }
}
