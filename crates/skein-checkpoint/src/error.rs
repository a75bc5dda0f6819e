//! Checkpoint-chain error types.

use std::fmt;

use skein_core::container::ContainerError;
use skein_core::id::Iteration;

/// Errors from checkpoint resolution, loading, seeding, and the
/// control-signal channel.
#[derive(Debug, PartialEq)]
pub enum CheckpointError {
    /// The checkpoint named by the configuration record is missing or
    /// unreadable. Fatal; there is no automatic repair.
    CorruptState {
        /// What was expected and where it was looked for.
        detail: String,
    },
    /// Every checkpoint file of the source run was scanned without
    /// finding the requested iteration.
    MissingSourceData {
        /// The source run's name.
        source: String,
        /// The iteration that could not be found.
        iteration: Iteration,
    },
    /// The chain layout parameters do not describe a usable chain.
    InvalidLayout {
        /// Iterations between checkpoints.
        niter_out: u64,
        /// Checkpoints per file.
        checkpoints_per_file: u64,
    },
    /// A control-channel peer is gone; the worker group cannot reach a
    /// consistent decision any more.
    Disconnected,
    /// A container operation failed.
    Container(ContainerError),
}

impl fmt::Display for CheckpointError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::CorruptState { detail } => write!(f, "corrupt checkpoint state: {detail}"),
            Self::MissingSourceData { source, iteration } => write!(
                f,
                "no checkpoint file of source run '{source}' holds iteration {iteration}"
            ),
            Self::InvalidLayout {
                niter_out,
                checkpoints_per_file,
            } => write!(
                f,
                "invalid chain layout: niter_out = {niter_out}, \
                 checkpoints_per_file = {checkpoints_per_file} (both must be positive)"
            ),
            Self::Disconnected => write!(f, "control channel disconnected"),
            Self::Container(e) => write!(f, "container: {e}"),
        }
    }
}

impl std::error::Error for CheckpointError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Container(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ContainerError> for CheckpointError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}
