//! Core types and traits for the Skein simulation orchestrator.
//!
//! This is the leaf crate with zero internal dependencies. It defines
//! the fundamental abstractions used throughout the Skein workspace:
//! typed identifiers, the ordered parameter registry, and the abstract
//! structured-container interface behind which the persistence library
//! (an HDF5-like hierarchical store) lives.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod container;
pub mod id;
pub mod param;

pub use container::{
    Container, ContainerError, ContainerStore, DatasetSpec, Dtype, Shape, CHUNK_BYTE_BUDGET,
};
pub use id::{CheckpointId, FileIndex, Iteration, WorkerId};
pub use param::{ParamError, ParamValue, ParameterRegistry};
