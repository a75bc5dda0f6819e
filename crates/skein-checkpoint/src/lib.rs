//! Checkpoint chain management and the worker-group control protocol.
//!
//! A run's state lives in a chain of checkpoint files; this crate owns
//! the arithmetic mapping an iteration to its checkpoint file and
//! group, resuming a chain from the configuration record, seeding a
//! new run from another run's checkpoints, and the broadcast protocol
//! that keeps every worker's stop decision and checkpoint position
//! consistent.

#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]
#![forbid(unsafe_code)]

pub mod chain;
pub mod control;
pub mod error;
pub mod source;

pub use chain::{
    checkpoint_file, field_state_path, read_checkpoint_id, store_checkpoint_id, ChainLayout,
    CheckpointChain, CHECKPOINT_SCALAR, FIELD_STATE_GROUP, ITERATION_SCALAR,
};
pub use control::{
    worker_group, ControlChannel, ControlSignal, FsSentinel, SentinelProbe, WorkerRole,
};
pub use error::CheckpointError;
pub use source::{locate_source_state, seed_from_source};
