//! Preparation, seeding, launch composition, and post-processing of
//! simulation runs.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod driver;
pub mod error;
pub mod layout;
pub mod seed;

pub use driver::{apply_launch_heuristics, init_logging, RunDriver, SeedSource};
pub use error::RunError;
pub use layout::{create_statistics_layout, spectral_metadata};
pub use seed::{seed_initial_field, seed_tracer_state};
