//! Fixture builders for statistics post-processing tests.

use skein_core::container::{Container, DatasetSpec, Dtype};
use skein_core::param::ParamValue;

use crate::MemContainer;

/// Describes a synthetic run data file with sampled statistics.
///
/// The spectral (co-)tensors are diagonal with constant per-component
/// values, so expected derived quantities are easy to compute by hand:
/// `energy(t, k) = 3 * vel_diag / 2` for every shell and sample.
/// Moment entries are `t * 1000 + i` (row-major flattened index `i`),
/// so extraction offsets are directly observable.
#[derive(Clone, Debug)]
pub struct StatsFixture {
    pub nshells: usize,
    pub nsamples: usize,
    pub niter_stat: u64,
    pub nu: f64,
    pub dt: f64,
    pub dk: f64,
    pub k_max: f64,
    pub dealias_type: i64,
    pub vel_diag: f64,
    pub vort_diag: f64,
}

impl Default for StatsFixture {
    fn default() -> Self {
        Self {
            nshells: 8,
            nsamples: 5,
            niter_stat: 4,
            nu: 0.1,
            dt: 0.01,
            dk: 1.0,
            k_max: 4.0,
            dealias_type: 0,
            vel_diag: 1.0,
            vort_diag: 2.0,
        }
    }
}

impl StatsFixture {
    /// Build the run data file: k-space metadata, sampled spectra and
    /// moments, the configuration record, and the iteration scalar.
    pub fn build(&self) -> MemContainer {
        let mut c = MemContainer::new();

        // Configuration record.
        c.create_group("parameters").unwrap();
        c.write_scalar("parameters/nu", ParamValue::Float(self.nu))
            .unwrap();
        c.write_scalar("parameters/dt", ParamValue::Float(self.dt))
            .unwrap();
        c.write_scalar(
            "parameters/niter_stat",
            ParamValue::Int(self.niter_stat as i64),
        )
        .unwrap();
        c.write_scalar(
            "parameters/dealias_type",
            ParamValue::Int(self.dealias_type),
        )
        .unwrap();
        c.write_scalar("checkpoint", ParamValue::Int(0)).unwrap();
        c.write_scalar(
            "iteration",
            ParamValue::Int((self.nsamples.saturating_sub(1) as u64 * self.niter_stat) as i64),
        )
        .unwrap();

        // k-space metadata: shell k of index i sits at i * dk.
        c.create_time_series("kspace/kshell", DatasetSpec::new(&[self.nshells], Dtype::F64))
            .unwrap();
        let kshell: Vec<f64> = (0..self.nshells).map(|i| i as f64 * self.dk).collect();
        c.write_row("kspace/kshell", 0, &kshell).unwrap();
        c.create_time_series("kspace/nshell", DatasetSpec::new(&[self.nshells], Dtype::I64))
            .unwrap();
        c.write_row("kspace/nshell", 0, &vec![1.0; self.nshells])
            .unwrap();
        c.write_scalar("kspace/kM", ParamValue::Float(self.k_max))
            .unwrap();
        c.write_scalar("kspace/dk", ParamValue::Float(self.dk))
            .unwrap();

        if self.nsamples == 0 {
            return c;
        }

        // Spectral co-tensors, diagonal by construction.
        for (name, diag) in [
            ("statistics/spectra/velocity_velocity", self.vel_diag),
            ("statistics/spectra/vorticity_vorticity", self.vort_diag),
        ] {
            c.create_time_series(name, DatasetSpec::new(&[self.nshells, 3, 3], Dtype::F64))
                .unwrap();
            let mut row = vec![0.0; self.nshells * 9];
            for k in 0..self.nshells {
                row[k * 9] = diag;
                row[k * 9 + 4] = diag;
                row[k * 9 + 8] = diag;
            }
            for t in 0..self.nsamples {
                c.write_row(name, t, &row).unwrap();
            }
        }

        // Moments with a flattened-index pattern.
        for name in [
            "statistics/moments/velocity",
            "statistics/moments/vorticity",
        ] {
            c.create_time_series(name, DatasetSpec::new(&[10, 4], Dtype::F64))
                .unwrap();
            for t in 0..self.nsamples {
                let row: Vec<f64> = (0..40).map(|i| (t * 1000 + i) as f64).collect();
                c.write_row(name, t, &row).unwrap();
            }
        }

        c
    }
}

/// Shorthand: default fixture with the given number of samples.
pub fn stats_fixture(nsamples: usize) -> MemContainer {
    StatsFixture {
        nsamples,
        ..StatsFixture::default()
    }
    .build()
}
