//! Abstract structured container: a hierarchical, chunked,
//! time-extensible key/value store.
//!
//! The real persistence library (an HDF5-like container) is an external
//! collaborator; Skein only depends on the operations defined here.
//! Time-series datasets have an implicit leading time axis that starts
//! with length 1 and grows in place as the simulation progresses, which
//! is why creation takes a [`DatasetSpec`] with a per-row shape and the
//! chunking heuristic lives on the spec rather than on callers.

use std::fmt;

use smallvec::SmallVec;

use crate::param::ParamValue;

/// Per-row shape of a dataset, excluding the time axis.
///
/// Inline capacity of 4 covers every layout Skein creates
/// (spectra are `(nshells, 3, 3)`, moments `(10, 4)`).
pub type Shape = SmallVec<[usize; 4]>;

/// Byte budget one chunk of a time-series dataset should occupy.
///
/// The time axis is grown in place, so chunks must be sized up front:
/// roughly 1 MiB per chunk, but never less than one time step.
pub const CHUNK_BYTE_BUDGET: usize = 1 << 20;

// ── Dataset description ────────────────────────────────────────────

/// Element type of a dataset.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Dtype {
    /// 32-bit float (single-precision field lines).
    F32,
    /// 64-bit float (spectra, moments).
    F64,
    /// 64-bit signed integer (histograms).
    I64,
}

impl Dtype {
    /// Size of one element in bytes.
    pub fn byte_size(self) -> usize {
        match self {
            Dtype::F32 => 4,
            Dtype::F64 | Dtype::I64 => 8,
        }
    }
}

/// Description of a time-series dataset: one row per statistics sample.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DatasetSpec {
    /// Shape of a single time step, excluding the time axis.
    pub row_shape: Shape,
    /// Element type.
    pub dtype: Dtype,
}

impl DatasetSpec {
    /// Convenience constructor from a slice of dimensions.
    pub fn new(row_shape: &[usize], dtype: Dtype) -> Self {
        Self {
            row_shape: Shape::from_slice(row_shape),
            dtype,
        }
    }

    /// Number of elements in one time step.
    pub fn row_elems(&self) -> usize {
        self.row_shape.iter().product()
    }

    /// Number of bytes in one time step.
    pub fn row_bytes(&self) -> usize {
        self.row_elems() * self.dtype.byte_size()
    }

    /// Chunk length along the time axis.
    ///
    /// One chunk occupies roughly [`CHUNK_BYTE_BUDGET`] bytes but never
    /// holds fewer than one time step.
    pub fn time_chunk(&self) -> usize {
        (CHUNK_BYTE_BUDGET / self.row_bytes().max(1)).max(1)
    }
}

// ── Errors ─────────────────────────────────────────────────────────

/// Errors from container and container-store operations.
#[derive(Debug, PartialEq)]
pub enum ContainerError {
    /// No object exists at the given path (or no container of that name).
    NotFound {
        /// The missing path or container name.
        path: String,
    },
    /// An object already exists at the given path.
    AlreadyExists {
        /// The occupied path.
        path: String,
    },
    /// The object at the path is not a time-series dataset.
    NotADataset {
        /// The offending path.
        path: String,
    },
    /// A written row does not match the dataset's row shape.
    RowShapeMismatch {
        /// The dataset path.
        path: String,
        /// Element count expected from the dataset spec.
        expected: usize,
        /// Element count actually supplied.
        found: usize,
    },
    /// A requested time window exceeds the dataset's current extent.
    WindowOutOfRange {
        /// The dataset path.
        path: String,
        /// Requested window start (inclusive sample index).
        t0: usize,
        /// Requested window end (inclusive sample index).
        t1: usize,
        /// Current number of samples.
        len: usize,
    },
    /// The object at the path is not a scalar entry.
    NotAScalar {
        /// The offending path.
        path: String,
    },
}

impl fmt::Display for ContainerError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound { path } => write!(f, "no object at '{path}'"),
            Self::AlreadyExists { path } => write!(f, "object already exists at '{path}'"),
            Self::NotADataset { path } => write!(f, "'{path}' is not a time-series dataset"),
            Self::RowShapeMismatch {
                path,
                expected,
                found,
            } => write!(
                f,
                "row shape mismatch at '{path}': expected {expected} elements, got {found}"
            ),
            Self::WindowOutOfRange { path, t0, t1, len } => write!(
                f,
                "window [{t0}, {t1}] out of range for '{path}' with {len} samples"
            ),
            Self::NotAScalar { path } => write!(f, "'{path}' is not a scalar entry"),
        }
    }
}

impl std::error::Error for ContainerError {}

// ── Container trait ────────────────────────────────────────────────

/// A hierarchical named-dataset store.
///
/// Paths are `/`-separated; groups are created implicitly by dataset
/// and scalar writes, or explicitly via [`create_group`](Self::create_group).
/// Rows are exchanged as flattened `f64` slices regardless of the
/// declared [`Dtype`]; the concrete backend narrows on write.
pub trait Container {
    /// Whether any object (group, dataset, scalar, or link) exists at `path`.
    fn has(&self, path: &str) -> bool;

    /// Create an empty group.
    fn create_group(&mut self, path: &str) -> Result<(), ContainerError>;

    /// Names of the direct children of the group at `path`, in
    /// insertion order.
    fn keys(&self, path: &str) -> Result<Vec<String>, ContainerError>;

    /// Create a time-series dataset with initial time length 1,
    /// unbounded maximum extent, and chunking per
    /// [`DatasetSpec::time_chunk`].
    fn create_time_series(&mut self, path: &str, spec: DatasetSpec) -> Result<(), ContainerError>;

    /// The spec a time-series dataset was created with.
    fn dataset_spec(&self, path: &str) -> Result<DatasetSpec, ContainerError>;

    /// Write one row at sample index `t`, growing the time axis in
    /// place if `t` is past the current extent.
    fn write_row(&mut self, path: &str, t: usize, row: &[f64]) -> Result<(), ContainerError>;

    /// Read the row at sample index `t`.
    fn read_row(&self, path: &str, t: usize) -> Result<Vec<f64>, ContainerError>;

    /// Read the inclusive window `[t0, t1]` of rows.
    fn read_window(
        &self,
        path: &str,
        t0: usize,
        t1: usize,
    ) -> Result<Vec<Vec<f64>>, ContainerError>;

    /// Current number of samples along the time axis.
    fn sample_count(&self, path: &str) -> Result<usize, ContainerError>;

    /// Write (create or overwrite) a scalar entry.
    fn write_scalar(&mut self, path: &str, value: ParamValue) -> Result<(), ContainerError>;

    /// Read a scalar entry.
    fn read_scalar(&self, path: &str) -> Result<ParamValue, ContainerError>;

    /// Create a link at `path` pointing at `source_path` inside the
    /// container named `source`.
    fn link_external(
        &mut self,
        path: &str,
        source: &str,
        source_path: &str,
    ) -> Result<(), ContainerError>;

    /// Delete the object at `path` (recursively for groups).
    fn delete(&mut self, path: &str) -> Result<(), ContainerError>;

    /// Names of every top-level object, in insertion order.
    fn root_keys(&self) -> Vec<String>;
}

/// A collection of named containers (one per file on disk).
pub trait ContainerStore {
    /// Whether a container of the given name exists.
    fn exists(&self, name: &str) -> bool;

    /// Borrow an existing container read-only.
    fn get(&self, name: &str) -> Result<&dyn Container, ContainerError>;

    /// Borrow an existing container mutably.
    fn get_mut(&mut self, name: &str) -> Result<&mut dyn Container, ContainerError>;

    /// Create a new empty container; fails if the name is taken.
    fn create(&mut self, name: &str) -> Result<&mut dyn Container, ContainerError>;
}
