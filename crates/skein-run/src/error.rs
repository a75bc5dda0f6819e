//! Run-driver error type, wrapping every subsystem's failures.

use std::fmt;

use skein_checkpoint::CheckpointError;
use skein_codegen::AssemblyError;
use skein_core::container::ContainerError;
use skein_core::param::ParamError;
use skein_stats::StatsError;

/// Errors surfaced while preparing, seeding, or post-processing a run.
///
/// Assembly and configuration failures abort before any distributed
/// work starts; nothing here is recoverable mid-run.
#[derive(Debug)]
pub enum RunError {
    /// Writing the generated program text failed.
    Io(std::io::Error),
    /// Program assembly failed.
    Assembly(AssemblyError),
    /// Checkpoint chain or seeding failure.
    Checkpoint(CheckpointError),
    /// A container operation failed.
    Container(ContainerError),
    /// The parameter registry or configuration record rejected an
    /// operation.
    Param(ParamError),
    /// Statistics post-processing failed.
    Stats(StatsError),
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "io: {e}"),
            Self::Assembly(e) => write!(f, "assembly: {e}"),
            Self::Checkpoint(e) => write!(f, "checkpoint: {e}"),
            Self::Container(e) => write!(f, "container: {e}"),
            Self::Param(e) => write!(f, "parameters: {e}"),
            Self::Stats(e) => write!(f, "statistics: {e}"),
        }
    }
}

impl std::error::Error for RunError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            Self::Assembly(e) => Some(e),
            Self::Checkpoint(e) => Some(e),
            Self::Container(e) => Some(e),
            Self::Param(e) => Some(e),
            Self::Stats(e) => Some(e),
        }
    }
}

impl From<std::io::Error> for RunError {
    fn from(e: std::io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<AssemblyError> for RunError {
    fn from(e: AssemblyError) -> Self {
        Self::Assembly(e)
    }
}

impl From<CheckpointError> for RunError {
    fn from(e: CheckpointError) -> Self {
        Self::Checkpoint(e)
    }
}

impl From<ContainerError> for RunError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}

impl From<ParamError> for RunError {
    fn from(e: ParamError) -> Self {
        Self::Param(e)
    }
}

impl From<StatsError> for RunError {
    fn from(e: StatsError) -> Self {
        Self::Stats(e)
    }
}
