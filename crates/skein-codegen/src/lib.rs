//! Program assembly from feature-contributed fragments.
//!
//! Independent feature modules (base solver, particle tracking,
//! gradient statistics) each contribute ordered text to shared
//! lifecycle stages of one generated executable. A fixed skeleton
//! orders the stages; assembly is a pure function of the stage
//! contents, so identical inputs always produce byte-identical output.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

mod assembler;
mod error;
mod feature;
mod gradient;
mod particles;
mod skeleton;
mod solver;
mod stage;

pub use assembler::Assembler;
pub use error::AssemblyError;
pub use feature::{Feature, ProgramBuilder};
pub use gradient::GradientStats;
pub use particles::ParticleTracking;
pub use solver::{Precision, VorticitySolver};
pub use stage::Stage;
