//! The fixed set of lifecycle stages fragments can be registered into.

use std::fmt;
use std::str::FromStr;

use crate::error::AssemblyError;

/// A lifecycle stage of the generated executable.
///
/// The set is closed: features register fragments against these
/// compile-time-checked identifiers, never against free-form string
/// keys. [`Stage::from_str`] exists for the driver's configuration
/// surface and is the one place an unknown name can be observed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
    /// Header inclusions.
    Includes,
    /// File-scope variable declarations.
    Declarations,
    /// File-scope type definitions.
    TypeDefinitions,
    /// Solver construction and state loading, before the main loop.
    FluidInit,
    /// One physically meaningful solver step inside the main loop.
    FluidLoopBody,
    /// Solver teardown after the main loop.
    FluidFinalize,
    /// Particle system construction, before the main loop.
    ParticleInit,
    /// Particle advance inside the main loop.
    ParticleLoopBody,
    /// Particle system teardown after the main loop.
    ParticleFinalize,
    /// Statistics accumulation, gated on the sampling stride.
    StatisticsBlock,
}

impl Stage {
    /// Every stage, in skeleton order.
    pub const ALL: [Stage; 10] = [
        Stage::Includes,
        Stage::Declarations,
        Stage::TypeDefinitions,
        Stage::FluidInit,
        Stage::FluidLoopBody,
        Stage::FluidFinalize,
        Stage::ParticleInit,
        Stage::ParticleLoopBody,
        Stage::ParticleFinalize,
        Stage::StatisticsBlock,
    ];

    /// Stages that must be non-empty for assembly to succeed.
    ///
    /// An executable missing initialization, stepping, or cleanup code
    /// would be invalid; the particle and statistics stages are
    /// optional and included only when a feature registered into them.
    pub const MANDATORY: [Stage; 5] = [
        Stage::Includes,
        Stage::Declarations,
        Stage::FluidInit,
        Stage::FluidLoopBody,
        Stage::FluidFinalize,
    ];

    /// The stage's canonical name.
    pub fn name(self) -> &'static str {
        match self {
            Stage::Includes => "includes",
            Stage::Declarations => "declarations",
            Stage::TypeDefinitions => "type-definitions",
            Stage::FluidInit => "fluid-init",
            Stage::FluidLoopBody => "fluid-loop-body",
            Stage::FluidFinalize => "fluid-finalize",
            Stage::ParticleInit => "particle-init",
            Stage::ParticleLoopBody => "particle-loop-body",
            Stage::ParticleFinalize => "particle-finalize",
            Stage::StatisticsBlock => "statistics-block",
        }
    }

    /// Position in the per-stage buffer array.
    pub(crate) fn index(self) -> usize {
        match self {
            Stage::Includes => 0,
            Stage::Declarations => 1,
            Stage::TypeDefinitions => 2,
            Stage::FluidInit => 3,
            Stage::FluidLoopBody => 4,
            Stage::FluidFinalize => 5,
            Stage::ParticleInit => 6,
            Stage::ParticleLoopBody => 7,
            Stage::ParticleFinalize => 8,
            Stage::StatisticsBlock => 9,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Stage {
    type Err = AssemblyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Stage::ALL
            .iter()
            .copied()
            .find(|stage| stage.name() == s)
            .ok_or_else(|| AssemblyError::UnknownStage {
                name: s.to_string(),
            })
    }
}
