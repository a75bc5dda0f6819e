//! Skein: orchestration of checkpointable distributed turbulence
//! simulations.
//!
//! This is the top-level facade crate that re-exports the public API
//! from all Skein sub-crates. For most users, adding `skein` as a
//! single dependency is sufficient.
//!
//! # Quick start
//!
//! ```rust
//! use skein::prelude::*;
//!
//! // Assemble a solver-plus-particles program.
//! let tracking = ParticleTracking::new(0, 100, 4, 1, 1).unwrap();
//! let builder = ProgramBuilder::new("nsve")
//!     .with_feature(&VorticitySolver::default())
//!     .unwrap()
//!     .with_feature(&tracking)
//!     .unwrap();
//! let text = builder.assemble().unwrap();
//! assert!(text.contains("fs->step(dt);"));
//!
//! // Resolve where a checkpoint lives.
//! let layout = ChainLayout::new(8, 3).unwrap();
//! let (file, id) = layout.resolve(Iteration(56));
//! assert_eq!((file.0, id.0), (2, 7));
//! ```
//!
//! # Modules
//!
//! Each module corresponds to a sub-crate:
//!
//! | Module | Sub-crate | Contents |
//! |--------|-----------|----------|
//! | [`core`] | `skein-core` | IDs, parameter registry, container traits |
//! | [`codegen`] | `skein-codegen` | Stage model, features, program assembly |
//! | [`checkpoint`] | `skein-checkpoint` | Chain resolution, seeding, control protocol |
//! | [`stats`] | `skein-stats` | Raw extraction, derived diagnostics, caching |
//! | [`run`] | `skein-run` | Run preparation, seeding, launch, post-processing |

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

/// Core types, traits, and IDs (`skein-core`).
///
/// Typed identifiers, the [`core::param::ParameterRegistry`], and the
/// abstract container interface persistence backends implement.
pub use skein_core as core;

/// Program assembly (`skein-codegen`).
///
/// The fixed [`codegen::Stage`] set, the [`codegen::Feature`] seam,
/// and the deterministic assembler.
pub use skein_codegen as codegen;

/// Checkpoint chains and the control protocol (`skein-checkpoint`).
///
/// Iteration → (file, group) resolution with
/// [`checkpoint::ChainLayout`], source-run seeding, and the
/// distinguished-worker broadcast channel.
pub use skein_checkpoint as checkpoint;

/// Statistics extraction and caching (`skein-stats`).
///
/// Raw window extraction, exact derived turbulence diagnostics, and
/// the iteration-range keyed [`stats::PostProcessor`].
pub use skein_stats as stats;

/// Run driving (`skein-run`).
///
/// [`run::RunDriver`] prepares parameters, writes the configuration
/// record, seeds checkpoint 0, and composes the launch command.
pub use skein_run as run;

/// Common imports for typical Skein usage.
///
/// ```rust
/// use skein::prelude::*;
/// ```
pub mod prelude {
    // Core identifiers and parameters
    pub use skein_core::{
        CheckpointId, Container, ContainerError, ContainerStore, DatasetSpec, Dtype, FileIndex,
        Iteration, ParamError, ParamValue, ParameterRegistry, WorkerId,
    };

    // Assembly
    pub use skein_codegen::{
        Assembler, AssemblyError, Feature, GradientStats, ParticleTracking, Precision,
        ProgramBuilder, Stage, VorticitySolver,
    };

    // Checkpoints and control signals
    pub use skein_checkpoint::{
        ChainLayout, CheckpointChain, CheckpointError, ControlSignal, FsSentinel, SentinelProbe,
        WorkerRole,
    };

    // Statistics
    pub use skein_stats::{
        CacheOutcome, DerivedMeans, DerivedStats, KspaceMetadata, PostProcessor, RawWindow,
        StatsBundle, StatsError,
    };

    // Run driving
    pub use skein_run::{RunDriver, RunError, SeedSource};
}
