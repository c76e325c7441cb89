//! Keyframe snapshot wire types.
//!
//! A keyframe record carries a full `p_table`: every live process with its
//! complete fd table, valid as of that record. These are the rebuild
//! baselines for arbitrary-frame seeks.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tr_common::{Fd, Pid};

/// Snapshot of one open descriptor, tagged by `class`.
///
/// Socket fields past the creation triple are nullable in the wire format:
/// the converter fills them in as bind/connect/listen are observed, and an
/// explicit non-null value is never later cleared.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "class")]
pub enum FdSnapshot {
    SFile {
        fd: Fd,
        target: String,
        #[serde(default)]
        flag: Option<String>,
        r: i64,
        w: i64,
    },
    SSocket {
        fd: Fd,
        domain: String,
        stype: String,
        protocol: String,
        r: i64,
        w: i64,
        #[serde(default)]
        is_out: Option<bool>,
        #[serde(default)]
        family: Option<String>,
        #[serde(default)]
        bind: Option<String>,
        #[serde(default)]
        target: Option<String>,
    },
    SStd { fd: Fd, r: i64, w: i64 },
    SEpoll { fd: Fd, r: i64, w: i64 },
    SPipe { fd: Fd, r: i64, w: i64 },
}

impl FdSnapshot {
    pub fn fd(&self) -> Fd {
        match self {
            FdSnapshot::SFile { fd, .. }
            | FdSnapshot::SSocket { fd, .. }
            | FdSnapshot::SStd { fd, .. }
            | FdSnapshot::SEpoll { fd, .. }
            | FdSnapshot::SPipe { fd, .. } => *fd,
        }
    }
}

/// Snapshot of one live process.
///
/// `ppid` and `name` come from the converter (execve/clone); display
/// naming is a viewer concern and may ignore the recorded name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProcessSnapshot {
    pub ppid: Pid,
    pub pid: Pid,
    #[serde(default)]
    pub name: Option<String>,
    pub memory: i64,
    #[serde(default)]
    pub fd_table: BTreeMap<Fd, FdSnapshot>,
}

/// Full process table carried by a keyframe record, keyed by pid.
pub type ProcessTable = BTreeMap<Pid, ProcessSnapshot>;
