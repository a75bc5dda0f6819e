//! Raw statistics extraction: per-sample slices of the persisted
//! spectra and moment series.

use skein_core::container::{Container, ContainerError};

use crate::error::StatsError;

/// Velocity spectral co-tensor series, rows of shape `(nshells, 3, 3)`.
pub const VELOCITY_SPECTRUM_PATH: &str = "statistics/spectra/velocity_velocity";
/// Vorticity spectral co-tensor series, rows of shape `(nshells, 3, 3)`.
pub const VORTICITY_SPECTRUM_PATH: &str = "statistics/spectra/vorticity_vorticity";
/// Velocity moment series, rows of shape `(10, 4)`.
pub const VELOCITY_MOMENTS_PATH: &str = "statistics/moments/velocity";
/// Vorticity moment series, rows of shape `(10, 4)`.
pub const VORTICITY_MOMENTS_PATH: &str = "statistics/moments/vorticity";

/// Flattened moment index of the maximum velocity magnitude: row 9
/// (highest moment order), column 3 (magnitude component).
const VEL_MAX_INDEX: usize = 9 * 4 + 3;
/// Flattened moment index of the second-order magnitude moment; half
/// of it is the resolved kinetic energy.
const SECOND_MOMENT_INDEX: usize = 2 * 4 + 3;

/// The raw per-sample slices backing one cached statistics window.
///
/// Spectra are reduced to per-shell scalars on extraction:
/// `energy(t, k)` is half the trace of the velocity co-tensor at shell
/// `k`, `enstrophy(t, k)` the same for vorticity.
#[derive(Clone, Debug, PartialEq)]
pub struct RawWindow {
    /// First sample index of the window (inclusive).
    pub ii0: usize,
    /// Last sample index of the window (inclusive).
    pub ii1: usize,
    /// Shell count the sampled spectra actually carry.
    pub nshells: usize,
    /// `energy(t, k)`, indexed `[t][k]`.
    pub energy_spectrum: Vec<Vec<f64>>,
    /// `enstrophy(t, k)`, indexed `[t][k]`.
    pub enstrophy_spectrum: Vec<Vec<f64>>,
    /// Velocity moment rows, flattened `(10, 4)`, indexed `[t]`.
    pub velocity_moments: Vec<Vec<f64>>,
    /// Vorticity moment rows, flattened `(10, 4)`, indexed `[t]`.
    pub vorticity_moments: Vec<Vec<f64>>,
    /// Maximum velocity magnitude per sample.
    pub vel_max: Vec<f64>,
    /// Resolved kinetic energy per sample, from the second-order
    /// magnitude moment.
    pub resolved_energy: Vec<f64>,
}

/// Extract the inclusive sample window `[ii0, ii1]` from a run data
/// file.
pub fn extract_window(
    data: &dyn Container,
    ii0: usize,
    ii1: usize,
) -> Result<RawWindow, StatsError> {
    let spec = data.dataset_spec(VELOCITY_SPECTRUM_PATH)?;
    let nshells = spec.row_shape[0];

    let energy_spectrum = trace_halves(
        data.read_window(VELOCITY_SPECTRUM_PATH, ii0, ii1)?,
        VELOCITY_SPECTRUM_PATH,
        nshells,
    )?;
    let enstrophy_spectrum = trace_halves(
        data.read_window(VORTICITY_SPECTRUM_PATH, ii0, ii1)?,
        VORTICITY_SPECTRUM_PATH,
        nshells,
    )?;
    let velocity_moments = data.read_window(VELOCITY_MOMENTS_PATH, ii0, ii1)?;
    let vorticity_moments = data.read_window(VORTICITY_MOMENTS_PATH, ii0, ii1)?;

    let vel_max = velocity_moments.iter().map(|row| row[VEL_MAX_INDEX]).collect();
    let resolved_energy = velocity_moments
        .iter()
        .map(|row| row[SECOND_MOMENT_INDEX] / 2.0)
        .collect();

    Ok(RawWindow {
        ii0,
        ii1,
        nshells,
        energy_spectrum,
        enstrophy_spectrum,
        velocity_moments,
        vorticity_moments,
        vel_max,
        resolved_energy,
    })
}

/// Half the trace of each shell's 3x3 co-tensor, per sample.
///
/// A dataset whose rows carry fewer shells than the velocity spectrum
/// promises is a shape mismatch, not a panic.
fn trace_halves(
    rows: Vec<Vec<f64>>,
    path: &str,
    nshells: usize,
) -> Result<Vec<Vec<f64>>, StatsError> {
    rows.iter()
        .map(|row| {
            if row.len() < nshells * 9 {
                return Err(StatsError::Container(ContainerError::RowShapeMismatch {
                    path: path.to_string(),
                    expected: nshells * 9,
                    found: row.len(),
                }));
            }
            Ok((0..nshells)
                .map(|k| (row[k * 9] + row[k * 9 + 4] + row[k * 9 + 8]) / 2.0)
                .collect())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::container::{ContainerError, DatasetSpec, Dtype};
    use skein_test_utils::stats_fixture;

    #[test]
    fn spectra_reduce_to_half_traces() {
        let data = stats_fixture(5);
        let raw = extract_window(&data, 0, 4).unwrap();
        assert_eq!(raw.nshells, 8);
        for t in 0..5 {
            for k in 0..8 {
                // Diagonal entries are 1.0 (velocity) and 2.0 (vorticity).
                assert_eq!(raw.energy_spectrum[t][k], 1.5);
                assert_eq!(raw.enstrophy_spectrum[t][k], 3.0);
            }
        }
    }

    #[test]
    fn moment_extraction_offsets() {
        let data = stats_fixture(3);
        let raw = extract_window(&data, 0, 2).unwrap();
        // Moment entries are t * 1000 + flattened index.
        assert_eq!(raw.vel_max, [39.0, 1039.0, 2039.0]);
        assert_eq!(raw.resolved_energy[1], 1011.0 / 2.0);
        assert_eq!(raw.vorticity_moments[2][0], 2000.0);
    }

    #[test]
    fn partial_windows_take_a_subrange() {
        let data = stats_fixture(5);
        let raw = extract_window(&data, 1, 3).unwrap();
        assert_eq!(raw.velocity_moments.len(), 3);
        assert_eq!(raw.vel_max[0], 1039.0);
    }

    #[test]
    fn short_spectra_rows_surface_a_shape_error() {
        let mut data = stats_fixture(2);
        // Rebuild the vorticity spectra with fewer shells than the
        // velocity spectra carry.
        data.delete(VORTICITY_SPECTRUM_PATH).unwrap();
        data.create_time_series(VORTICITY_SPECTRUM_PATH, DatasetSpec::new(&[4, 3, 3], Dtype::F64))
            .unwrap();
        data.write_row(VORTICITY_SPECTRUM_PATH, 1, &[0.0; 36]).unwrap();

        match extract_window(&data, 0, 1) {
            Err(StatsError::Container(ContainerError::RowShapeMismatch {
                expected, found, ..
            })) => {
                assert_eq!((expected, found), (72, 36));
            }
            other => panic!("expected RowShapeMismatch, got {other:?}"),
        }
    }

    #[test]
    fn window_past_extent_is_out_of_range() {
        let data = stats_fixture(2);
        match extract_window(&data, 0, 10) {
            Err(StatsError::Container(ContainerError::WindowOutOfRange { len, .. })) => {
                assert_eq!(len, 2)
            }
            other => panic!("expected WindowOutOfRange, got {other:?}"),
        }
    }
}
