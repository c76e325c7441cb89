//! The closed set of trace event variants.
//!
//! The converter emits one event object per record, discriminated by its
//! `name` field. Everything the replay engine can react to is a variant
//! here, fixed once at parse time; any name outside the set maps to
//! [`TraceEvent::Ignored`] instead of falling through string comparisons
//! at each use site.

use serde::{Deserialize, Serialize};
use tr_common::{Fd, Pid};

/// One state-changing occurrence in the trace, tagged by `name`.
///
/// Counter and memory quantities are `i64`: `len` values are sums of
/// syscall return values and `amount` may be negative (munmap).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum TraceEvent {
    /// Process created (execve or clone); the full fd table rides in the
    /// record's keyframe snapshot.
    AddProc { pid: Pid, ppid: Pid },

    /// Process exited.
    CloseProc { pid: Pid },

    /// Descriptor opened (open/socket/pipe/epoll_create1).
    OpenFd { pid: Pid, fd: Fd },

    /// Inbound connection accepted on `src`, producing a new socket `fd`.
    Accept { pid: Pid, src: Fd, fd: Fd },

    /// Descriptor closed.
    CloseFd { pid: Pid, fd: Fd },

    /// Bytes read from a descriptor (read/recvfrom).
    ReadFd {
        pid: Pid,
        fd: Fd,
        len: i64,
        #[serde(default)]
        content: Option<String>,
    },

    /// Bytes written to a descriptor (write/sendto).
    WriteFd {
        pid: Pid,
        fd: Fd,
        len: i64,
        #[serde(default)]
        content: Option<String>,
    },

    /// Socket bound to a local address.
    Bind {
        pid: Pid,
        fd: Fd,
        family: String,
        bind: String,
    },

    /// Socket marked listening (direction becomes inbound).
    Listen { pid: Pid, fd: Fd },

    /// Socket connected to a remote target (direction becomes outbound).
    Connect {
        pid: Pid,
        fd: Fd,
        family: String,
        target: String,
    },

    /// Anonymous mapping grown or shrunk; `amount` is signed.
    ManipMem { pid: Pid, addr: String, amount: i64 },

    /// Signal sent between traced processes. Recorded by the converter
    /// but has no effect on reconstructed state.
    SendSignal { pid: Pid, to: Pid, act: String },

    /// Any event name outside the closed set above.
    #[serde(other)]
    Ignored,
}

impl TraceEvent {
    /// The pid this event acts on, if it carries one.
    pub fn pid(&self) -> Option<Pid> {
        match self {
            TraceEvent::AddProc { pid, .. }
            | TraceEvent::CloseProc { pid }
            | TraceEvent::OpenFd { pid, .. }
            | TraceEvent::Accept { pid, .. }
            | TraceEvent::CloseFd { pid, .. }
            | TraceEvent::ReadFd { pid, .. }
            | TraceEvent::WriteFd { pid, .. }
            | TraceEvent::Bind { pid, .. }
            | TraceEvent::Listen { pid, .. }
            | TraceEvent::Connect { pid, .. }
            | TraceEvent::ManipMem { pid, .. }
            | TraceEvent::SendSignal { pid, .. } => Some(*pid),
            TraceEvent::Ignored => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_proc_round_trip() {
        let e: TraceEvent =
            serde_json::from_str(r#"{"name":"add_proc","pid":2710,"ppid":0}"#).unwrap();
        assert_eq!(
            e,
            TraceEvent::AddProc {
                pid: Pid(2710),
                ppid: Pid(0)
            }
        );
        assert_eq!(e.pid(), Some(Pid(2710)));
    }

    #[test]
    fn test_read_fd_with_content() {
        let e: TraceEvent = serde_json::from_str(
            r#"{"name":"read_fd","pid":5,"fd":3,"content":"\"SELECT 1\"","len":128}"#,
        )
        .unwrap();
        match e {
            TraceEvent::ReadFd { fd, len, .. } => {
                assert_eq!(fd, Fd(3));
                assert_eq!(len, 128);
            }
            other => panic!("wrong variant: {:?}", other),
        }
    }

    #[test]
    fn test_unknown_name_maps_to_ignored() {
        let e: TraceEvent =
            serde_json::from_str(r#"{"name":"setsockopt","pid":5,"fd":3}"#).unwrap();
        assert_eq!(e, TraceEvent::Ignored);
        assert_eq!(e.pid(), None);
    }

    #[test]
    fn test_negative_manip_mem() {
        let e: TraceEvent = serde_json::from_str(
            r#"{"name":"manip_mem","pid":5,"addr":"0x7f2b4c000000","amount":-135168}"#,
        )
        .unwrap();
        assert_eq!(
            e,
            TraceEvent::ManipMem {
                pid: Pid(5),
                addr: "0x7f2b4c000000".to_string(),
                amount: -135168
            }
        );
    }
}
