//! Statistics post-processing error types.

use std::fmt;

use skein_core::container::ContainerError;
use skein_core::param::ParamError;

/// Errors from statistics extraction and derivation.
///
/// A shell-count disagreement between stored k-space metadata and the
/// sampled spectra is deliberately not represented here: it is logged
/// and counted by the post-processor, since consumers may tolerate
/// stale shell metadata. Absence of sampled data is not an error
/// either; it surfaces as an empty result.
#[derive(Debug, PartialEq)]
pub enum StatsError {
    /// A container read failed.
    Container(ContainerError),
    /// The configuration record is missing a required parameter.
    Param(ParamError),
}

impl fmt::Display for StatsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Container(e) => write!(f, "container: {e}"),
            Self::Param(e) => write!(f, "configuration record: {e}"),
        }
    }
}

impl std::error::Error for StatsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Container(e) => Some(e),
            Self::Param(e) => Some(e),
        }
    }
}

impl From<ContainerError> for StatsError {
    fn from(e: ContainerError) -> Self {
        Self::Container(e)
    }
}

impl From<ParamError> for StatsError {
    fn from(e: ParamError) -> Self {
        Self::Param(e)
    }
}
