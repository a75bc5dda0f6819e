//! Deterministic iteration → (file, group) resolution and the chain
//! state carried across a run.
//!
//! A run's checkpoints live in a sequence of files named
//! `<simname>_checkpoint_<n>`; file `n` holds `checkpoints_per_file`
//! consecutive checkpoint ids, and each id owns a group named by its
//! decimal rendering. The configuration record stores the id of the
//! checkpoint the run should resume from.

use skein_core::container::{Container, ContainerStore};
use skein_core::id::{CheckpointId, FileIndex, Iteration};
use skein_core::param::ParamValue;

use crate::error::CheckpointError;

/// Scalar entry in the configuration record holding the authoritative
/// checkpoint id.
pub const CHECKPOINT_SCALAR: &str = "checkpoint";

/// Scalar entry in the configuration record holding the iteration the
/// stored checkpoint corresponds to.
pub const ITERATION_SCALAR: &str = "iteration";

/// Group inside a checkpoint file holding the spectral field state,
/// one subgroup per iteration.
pub const FIELD_STATE_GROUP: &str = "vorticity/complex";

/// Path of the field state stored for one iteration.
pub fn field_state_path(iteration: Iteration) -> String {
    format!("{FIELD_STATE_GROUP}/{iteration}")
}

/// Name of the `n`-th checkpoint file of a run.
pub fn checkpoint_file(simname: &str, file: FileIndex) -> String {
    format!("{simname}_checkpoint_{file}")
}

// ── Layout ─────────────────────────────────────────────────────────

/// The pure arithmetic of the checkpoint chain.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ChainLayout {
    niter_out: u64,
    checkpoints_per_file: u64,
}

impl ChainLayout {
    /// Build a layout from the output cadence and file rotation count.
    ///
    /// Both must be positive; a zero cadence would make every division
    /// below meaningless.
    pub fn new(niter_out: u64, checkpoints_per_file: u64) -> Result<Self, CheckpointError> {
        if niter_out == 0 || checkpoints_per_file == 0 {
            return Err(CheckpointError::InvalidLayout {
                niter_out,
                checkpoints_per_file,
            });
        }
        Ok(Self {
            niter_out,
            checkpoints_per_file,
        })
    }

    /// Iterations between checkpoints.
    pub fn niter_out(&self) -> u64 {
        self.niter_out
    }

    /// Checkpoints per file before rotation.
    pub fn checkpoints_per_file(&self) -> u64 {
        self.checkpoints_per_file
    }

    /// The checkpoint holding the given iteration, and the file that
    /// checkpoint lives in.
    pub fn resolve(&self, iteration: Iteration) -> (FileIndex, CheckpointId) {
        let id = CheckpointId(iteration.0 / self.niter_out);
        (self.file_of(id), id)
    }

    /// The file a checkpoint id lives in.
    pub fn file_of(&self, id: CheckpointId) -> FileIndex {
        FileIndex(id.0 / self.checkpoints_per_file)
    }
}

// ── Record helpers ─────────────────────────────────────────────────

/// Read the authoritative checkpoint id from a configuration record.
///
/// A missing or non-integer entry means the record cannot be resumed
/// from and is reported as corrupt state.
pub fn read_checkpoint_id(record: &dyn Container) -> Result<CheckpointId, CheckpointError> {
    read_counter(record, CHECKPOINT_SCALAR).map(CheckpointId)
}

/// Write the authoritative checkpoint id into a configuration record.
///
/// Unlike parameters, the checkpoint id is updated at the end of every
/// run, so overwriting is expected.
pub fn store_checkpoint_id(
    record: &mut dyn Container,
    id: CheckpointId,
) -> Result<(), CheckpointError> {
    record.write_scalar(CHECKPOINT_SCALAR, ParamValue::Int(id.0 as i64))?;
    Ok(())
}

fn read_counter(record: &dyn Container, name: &str) -> Result<u64, CheckpointError> {
    match record.read_scalar(name) {
        Ok(ParamValue::Int(v)) if v >= 0 => Ok(v as u64),
        Ok(other) => Err(CheckpointError::CorruptState {
            detail: format!("scalar '{name}' holds '{other}', expected a non-negative integer"),
        }),
        Err(e) => Err(CheckpointError::CorruptState {
            detail: format!("scalar '{name}': {e}"),
        }),
    }
}

// ── Chain state ────────────────────────────────────────────────────

/// A run's position in its checkpoint chain.
///
/// Opened from the configuration record at process start; advanced as
/// the run crosses output intervals; stored back at run end.
#[derive(Clone, Debug)]
pub struct CheckpointChain {
    simname: String,
    layout: ChainLayout,
    current: CheckpointId,
    iteration: Iteration,
}

impl CheckpointChain {
    /// Resume a chain from the run's configuration record.
    ///
    /// Reads the stored checkpoint id and iteration, then verifies the
    /// corresponding checkpoint file holds field state for that
    /// iteration. Any gap is fatal [`CheckpointError::CorruptState`].
    pub fn open(
        store: &dyn ContainerStore,
        simname: &str,
        layout: ChainLayout,
    ) -> Result<Self, CheckpointError> {
        let record = store.get(simname)?;
        let current = read_checkpoint_id(record)?;
        let iteration = Iteration(read_counter(record, ITERATION_SCALAR)?);

        let fname = checkpoint_file(simname, layout.file_of(current));
        let file = store.get(&fname).map_err(|_| CheckpointError::CorruptState {
            detail: format!("checkpoint file '{fname}' for checkpoint {current} does not exist"),
        })?;
        let state = field_state_path(iteration);
        if !file.has(&state) {
            return Err(CheckpointError::CorruptState {
                detail: format!("'{fname}' holds no field state at '{state}'"),
            });
        }
        Ok(Self {
            simname: simname.to_string(),
            layout,
            current,
            iteration,
        })
    }

    /// Start a fresh chain at checkpoint 0, iteration 0.
    ///
    /// The caller is responsible for seeding the initial field state;
    /// [`store`](Self::store) records the position.
    pub fn fresh(simname: &str, layout: ChainLayout) -> Self {
        Self {
            simname: simname.to_string(),
            layout,
            current: CheckpointId(0),
            iteration: Iteration(0),
        }
    }

    /// The run's name.
    pub fn simname(&self) -> &str {
        &self.simname
    }

    /// The chain arithmetic.
    pub fn layout(&self) -> ChainLayout {
        self.layout
    }

    /// The checkpoint the run is currently positioned at.
    pub fn current(&self) -> CheckpointId {
        self.current
    }

    /// The iteration of the current checkpoint.
    pub fn iteration(&self) -> Iteration {
        self.iteration
    }

    /// Name of the file holding the current checkpoint.
    pub fn current_file(&self) -> String {
        checkpoint_file(&self.simname, self.layout.file_of(self.current))
    }

    /// Advance the chain position to the checkpoint holding
    /// `iteration`, returning `true` when that rotated into a new file.
    ///
    /// Followers call this with the broadcast iteration, never a
    /// locally computed one, so every worker's notion of the current
    /// checkpoint stays in lockstep.
    pub fn advance_to(&mut self, iteration: Iteration) -> bool {
        let before = self.layout.file_of(self.current);
        let (file, id) = self.layout.resolve(iteration);
        self.current = id;
        self.iteration = iteration;
        file != before
    }

    /// Borrow the container for the current checkpoint's file, creating
    /// it when the chain has just rotated into a file that does not
    /// exist yet.
    pub fn ensure_current_file<'a>(
        &self,
        store: &'a mut dyn ContainerStore,
    ) -> Result<&'a mut dyn Container, CheckpointError> {
        let fname = self.current_file();
        if store.exists(&fname) {
            Ok(store.get_mut(&fname)?)
        } else {
            Ok(store.create(&fname)?)
        }
    }

    /// Write the chain position into the configuration record.
    pub fn store(&self, record: &mut dyn Container) -> Result<(), CheckpointError> {
        store_checkpoint_id(record, self.current)?;
        record.write_scalar(ITERATION_SCALAR, ParamValue::Int(self.iteration.0 as i64))?;
        Ok(())
    }
}
