//! Display-name derivation for traced processes.
//!
//! The trace records a name per process, but the recorded execve name is
//! the same binary for every worker in the tree. Display naming is a
//! strategy the host can swap out; the built-in one is the pid-offset
//! table for a traced postgres instance, where the auxiliary processes
//! fork in a fixed order after the postmaster.

use tr_common::Pid;

/// Strategy for naming a process when it enters the world.
pub trait ProcessNamer {
    /// Display name for `pid`, given the first pid seen in the log.
    fn name_for(&self, pid: Pid, first_pid: Pid) -> String;
}

/// Fixed offset → role lookup for a postgres process tree.
///
/// This is a closed table tied to one traced application's layout, not
/// inferred from log content; anything outside the table gets the generic
/// name.
#[derive(Debug, Clone, Default)]
pub struct PidOffsetNamer;

impl ProcessNamer for PidOffsetNamer {
    fn name_for(&self, pid: Pid, first_pid: Pid) -> String {
        let name = match pid.0 - first_pid.0 {
            4 => "startup",
            5 => "checkpointer process",
            6 => "writer process",
            7 => "wal writer process",
            8 => "autovacuum launcher process",
            9 => "stats collector process",
            _ => "postgres",
        };
        name.to_string()
    }
}
