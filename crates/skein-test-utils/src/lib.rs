//! Test utilities and mock containers for Skein development.
//!
//! Provides [`MemContainer`] and [`MemStore`], in-memory implementations
//! of the abstract container interface, plus fixture builders for
//! statistics post-processing tests.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

mod container;
mod fixtures;

pub use container::{MemContainer, MemStore};
pub use fixtures::{stats_fixture, StatsFixture};
