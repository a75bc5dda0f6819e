//! The post-processor: iteration-range keyed memoization of derived
//! statistics.
//!
//! The cache is an explicit value object keyed by the window bounds in
//! sample units. It is a pure memoization layer over the raw series;
//! any bound mismatch drops the whole cached bundle before
//! recomputation, so a stale partial entry can never leak into a new
//! window.

use skein_core::container::Container;
use skein_core::param::ParameterRegistry;

use crate::derived::{DerivedMeans, DerivedStats};
use crate::error::StatsError;
use crate::kspace::{KspaceMetadata, SchemaMonitor};
use crate::raw::{extract_window, RawWindow, VELOCITY_MOMENTS_PATH};

/// Whether a statistics request was served from cache.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CacheOutcome {
    /// The stored window bounds matched; nothing was re-extracted.
    Hit,
    /// The cache was dropped and the window recomputed from raw data.
    Recomputed,
}

/// One cached statistics window: raw slices plus everything derived
/// from them.
#[derive(Clone, Debug, PartialEq)]
pub struct StatsBundle {
    /// First sample index (inclusive).
    pub ii0: usize,
    /// Last sample index (inclusive).
    pub ii1: usize,
    /// The extracted raw window.
    pub raw: RawWindow,
    /// Derived diagnostic series.
    pub derived: DerivedStats,
    /// Window-averaged diagnostics.
    pub means: DerivedMeans,
}

/// Computes and caches derived statistics for a run data file.
#[derive(Clone, Debug)]
pub struct PostProcessor {
    niter_stat: u64,
    nu: f64,
    dealias_type: i64,
    schema: SchemaMonitor,
    cache: Option<StatsBundle>,
}

impl PostProcessor {
    /// Build a post-processor from the run's configuration record.
    ///
    /// Reads `nu`, `niter_stat`, and `dealias_type` from the persisted
    /// parameters.
    pub fn from_record(record: &dyn Container) -> Result<Self, StatsError> {
        let mut params = ParameterRegistry::new();
        params.set("nu", 0.0);
        params.set("niter_stat", 1i64);
        params.set("dealias_type", 0i64);
        params.read_record(record)?;
        Ok(Self::new(
            params.get_float("nu")?,
            params.get_int("niter_stat")?.max(1) as u64,
            params.get_int("dealias_type")?,
        ))
    }

    /// Build a post-processor from explicit solver configuration.
    pub fn new(nu: f64, niter_stat: u64, dealias_type: i64) -> Self {
        Self {
            niter_stat: niter_stat.max(1),
            nu,
            dealias_type,
            schema: SchemaMonitor::new(),
            cache: None,
        }
    }

    /// Compute (or reuse) statistics over an iteration range.
    ///
    /// Bounds default to the full sampled range and are clamped to it;
    /// they are then converted to sample indices by the sampling
    /// stride. Returns `Ok(None)` when the run never reached a
    /// sampling interval, which is not an error.
    pub fn compute_statistics(
        &mut self,
        data: &dyn Container,
        iter0: Option<u64>,
        iter1: Option<u64>,
    ) -> Result<Option<(&StatsBundle, CacheOutcome)>, StatsError> {
        if !data.has(VELOCITY_MOMENTS_PATH) {
            return Ok(None);
        }
        let samples = data.sample_count(VELOCITY_MOMENTS_PATH)?;
        if samples == 0 {
            return Ok(None);
        }
        let latest = (samples as u64 - 1) * self.niter_stat;
        let i0 = iter0.unwrap_or(0).min(latest);
        let i1 = iter1.unwrap_or(latest).min(latest).max(i0);
        let ii0 = (i0 / self.niter_stat) as usize;
        let ii1 = (i1 / self.niter_stat) as usize;

        let hit = matches!(&self.cache, Some(b) if b.ii0 == ii0 && b.ii1 == ii1);
        if !hit {
            // Full invalidation before any recomputation.
            self.cache = None;
            let raw = extract_window(data, ii0, ii1)?;
            let meta = KspaceMetadata::load(data)?;
            self.schema.verify(meta.nshells(), raw.nshells);
            let derived = DerivedStats::compute(&raw, &meta, self.nu, self.dealias_type);
            let means = derived.means();
            self.cache = Some(StatsBundle {
                ii0,
                ii1,
                raw,
                derived,
                means,
            });
        }
        let outcome = if hit {
            CacheOutcome::Hit
        } else {
            CacheOutcome::Recomputed
        };
        Ok(self.cache.as_ref().map(|bundle| (bundle, outcome)))
    }

    /// The currently cached bundle, if any.
    pub fn cached(&self) -> Option<&StatsBundle> {
        self.cache.as_ref()
    }

    /// Drop the cached bundle.
    pub fn invalidate(&mut self) {
        self.cache = None;
    }

    /// Shell-count disagreements observed while recomputing.
    pub fn schema_mismatches(&self) -> usize {
        self.schema.mismatches()
    }
}
