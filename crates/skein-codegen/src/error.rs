//! Error types for program assembly.

use std::fmt;

use crate::stage::Stage;

/// Errors detected while registering fragments or assembling the
/// program. All of them are fatal: a malformed program must never be
/// launched.
#[derive(Debug, PartialEq, Eq)]
pub enum AssemblyError {
    /// A stage name does not belong to the fixed stage set.
    UnknownStage {
        /// The unrecognized name.
        name: String,
    },
    /// A mandatory stage has no fragments; the executable would be
    /// missing initialization or cleanup code.
    IncompleteAssembly {
        /// The empty mandatory stage.
        stage: Stage,
    },
    /// A feature was configured with values outside its valid range.
    InvalidFeature {
        /// Description of the invalid configuration.
        reason: String,
    },
}

impl fmt::Display for AssemblyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownStage { name } => write!(f, "unknown stage '{name}'"),
            Self::IncompleteAssembly { stage } => {
                write!(f, "mandatory stage '{stage}' has no fragments")
            }
            Self::InvalidFeature { reason } => write!(f, "invalid feature: {reason}"),
        }
    }
}

impl std::error::Error for AssemblyError {}
