//! k-space shell metadata: stored once per run, verified on restart.

use skein_core::container::{Container, DatasetSpec, Dtype};
use skein_core::param::ParamValue;

use crate::error::StatsError;

/// Dataset of shell wavenumbers, one entry per shell.
pub const KSHELL_PATH: &str = "kspace/kshell";
/// Dataset of per-shell mode counts.
pub const NSHELL_PATH: &str = "kspace/nshell";
/// Scalar maximum resolved wavenumber.
pub const KMAX_PATH: &str = "kspace/kM";
/// Scalar shell width.
pub const DK_PATH: &str = "kspace/dk";

/// Shell metadata of the spectral grid.
#[derive(Clone, Debug, PartialEq)]
pub struct KspaceMetadata {
    /// Wavenumber of each shell.
    pub kshell: Vec<f64>,
    /// Number of modes aggregated into each shell.
    pub nshell: Vec<f64>,
    /// Maximum resolved wavenumber.
    pub k_max: f64,
    /// Shell width.
    pub dk: f64,
}

impl KspaceMetadata {
    /// Number of shells.
    pub fn nshells(&self) -> usize {
        self.kshell.len()
    }

    /// Write the metadata into a run data file.
    ///
    /// Stored exactly once, at iteration 0, by the distinguished
    /// worker; an existing record is left untouched.
    pub fn store(&self, c: &mut dyn Container) -> Result<(), StatsError> {
        if c.has(KSHELL_PATH) {
            return Ok(());
        }
        c.create_time_series(KSHELL_PATH, DatasetSpec::new(&[self.nshells()], Dtype::F64))?;
        c.write_row(KSHELL_PATH, 0, &self.kshell)?;
        c.create_time_series(NSHELL_PATH, DatasetSpec::new(&[self.nshells()], Dtype::I64))?;
        c.write_row(NSHELL_PATH, 0, &self.nshell)?;
        c.write_scalar(KMAX_PATH, ParamValue::Float(self.k_max))?;
        c.write_scalar(DK_PATH, ParamValue::Float(self.dk))?;
        Ok(())
    }

    /// Read the metadata stored in a run data file.
    pub fn load(c: &dyn Container) -> Result<Self, StatsError> {
        let kshell = c.read_row(KSHELL_PATH, 0)?;
        let nshell = c.read_row(NSHELL_PATH, 0)?;
        let k_max = read_float(c, KMAX_PATH)?;
        let dk = read_float(c, DK_PATH)?;
        Ok(Self {
            kshell,
            nshell,
            k_max,
            dk,
        })
    }
}

fn read_float(c: &dyn Container, path: &str) -> Result<f64, StatsError> {
    match c.read_scalar(path)? {
        ParamValue::Float(v) => Ok(v),
        ParamValue::Int(v) => Ok(v as f64),
        other => Err(StatsError::Container(
            skein_core::container::ContainerError::NotAScalar {
                path: format!("{path} (holds {})", other.type_name()),
            },
        )),
    }
}

/// Tracks shell-count disagreements between stored metadata and
/// sampled spectra.
///
/// A disagreement means the data file was produced by a differently
/// configured solver build. Downstream consumers may tolerate stale
/// shell metadata, so the mismatch is logged and counted rather than
/// raised.
#[derive(Clone, Debug, Default)]
pub struct SchemaMonitor {
    mismatches: usize,
}

impl SchemaMonitor {
    /// Create a monitor with no observed mismatches.
    pub fn new() -> Self {
        Self::default()
    }

    /// Compare the stored shell count with a freshly observed one.
    ///
    /// Returns whether they agree; on disagreement the event is
    /// logged at warning level and counted.
    pub fn verify(&mut self, stored: usize, observed: usize) -> bool {
        if stored == observed {
            return true;
        }
        self.mismatches += 1;
        log::warn!(
            "shell count mismatch: metadata has {stored} shells, sampled spectra have {observed}"
        );
        false
    }

    /// Number of mismatches observed so far.
    pub fn mismatches(&self) -> usize {
        self.mismatches
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_test_utils::{stats_fixture, MemContainer};

    fn metadata() -> KspaceMetadata {
        KspaceMetadata {
            kshell: vec![0.0, 1.0, 2.0, 3.0],
            nshell: vec![1.0, 6.0, 12.0, 24.0],
            k_max: 3.0,
            dk: 1.0,
        }
    }

    #[test]
    fn store_then_load_round_trips() {
        let mut c = MemContainer::new();
        metadata().store(&mut c).unwrap();
        assert_eq!(KspaceMetadata::load(&c).unwrap(), metadata());
    }

    #[test]
    fn store_is_write_once() {
        let mut c = MemContainer::new();
        metadata().store(&mut c).unwrap();
        let mut other = metadata();
        other.k_max = 99.0;
        other.store(&mut c).unwrap();
        // First write wins.
        assert_eq!(KspaceMetadata::load(&c).unwrap().k_max, 3.0);
    }

    #[test]
    fn fixture_metadata_loads() {
        let c = stats_fixture(5);
        let meta = KspaceMetadata::load(&c).unwrap();
        assert_eq!(meta.nshells(), 8);
        assert_eq!(meta.kshell[3], 3.0);
        assert_eq!(meta.k_max, 4.0);
    }

    #[test]
    fn monitor_counts_disagreements() {
        let mut monitor = SchemaMonitor::new();
        assert!(monitor.verify(8, 8));
        assert_eq!(monitor.mismatches(), 0);
        assert!(!monitor.verify(8, 6));
        assert!(!monitor.verify(8, 6));
        assert_eq!(monitor.mismatches(), 2);
    }
}
