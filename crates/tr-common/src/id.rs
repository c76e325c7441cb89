//! Process and descriptor identity types.
//!
//! A descriptor is identified by `(Pid, Fd)`. Both sides of that pair get
//! a newtype so the two integer namespaces cannot be swapped silently.
//! Note that pids may be reused by the kernel across a full trace, and fd
//! values are reused within a process after close; neither wrapper claims
//! global uniqueness, only identity at a single instant.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Process ID wrapper with display formatting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Pid {
    fn from(pid: i32) -> Self {
        Pid(pid)
    }
}

/// File descriptor number, unique within its owning process at any instant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fd(pub i32);

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for Fd {
    fn from(fd: i32) -> Self {
        Fd(fd)
    }
}
