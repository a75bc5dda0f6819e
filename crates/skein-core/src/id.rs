//! Strongly-typed identifiers used across the workspace.

use std::fmt;

/// Solver iteration counter.
///
/// Incremented by the external numerical core each time the simulation
/// advances one step. Iteration 0 is the initial condition.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Iteration(pub u64);

impl fmt::Display for Iteration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Iteration {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a checkpoint within a run.
///
/// Checkpoint ids grow monotonically; each id owns a named group inside
/// one of a sequence of checkpoint files. The group name is the decimal
/// rendering of the id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CheckpointId(pub u64);

impl fmt::Display for CheckpointId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for CheckpointId {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Index of a checkpoint file within a run's file chain.
///
/// File `f` holds checkpoint ids in
/// `[f * checkpoints_per_file, (f + 1) * checkpoints_per_file)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FileIndex(pub u64);

impl fmt::Display for FileIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for FileIndex {
    fn from(v: u64) -> Self {
        Self(v)
    }
}

/// Identifies a worker process within the fixed-size process group.
///
/// Worker 0 is the distinguished worker: it alone probes external state
/// and broadcasts control signals to the rest of the group.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct WorkerId(pub u32);

impl fmt::Display for WorkerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for WorkerId {
    fn from(v: u32) -> Self {
        Self(v)
    }
}
