//! Turbulence statistics extraction, derivation, and caching.
//!
//! Raw spectra and moment series sampled by the solver are reduced to
//! per-shell scalars, turned into the standard derived diagnostics
//! (integral scales, Kolmogorov scales, Reynolds numbers, resolution
//! measures), and memoized per requested iteration window.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod derived;
pub mod error;
pub mod kspace;
pub mod post;
pub mod raw;

pub use derived::{DerivedMeans, DerivedStats};
pub use error::StatsError;
pub use kspace::{KspaceMetadata, SchemaMonitor};
pub use post::{CacheOutcome, PostProcessor, StatsBundle};
pub use raw::{extract_window, RawWindow};
