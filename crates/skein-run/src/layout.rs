//! Run data file layout: k-space metadata and the statistics datasets
//! every run samples into.
//!
//! Every time-series dataset is created with one sample along the time
//! axis and the shared chunking heuristic; the solver grows the axis in
//! place as it samples.

use skein_core::container::{Container, DatasetSpec, Dtype};
use skein_core::param::ParameterRegistry;
use skein_stats::KspaceMetadata;

use crate::error::RunError;

/// Shell metadata for the spectral grid the parameters describe.
///
/// The shell width is unity; the maximum resolved wavenumber depends
/// on the dealiasing mode: the reduced variant (mode flag 1) keeps
/// modes up to `n / 3`, anything else up to `n / 2`.
pub fn spectral_metadata(params: &ParameterRegistry) -> Result<KspaceMetadata, RunError> {
    let n = params
        .get_int("nx")?
        .max(params.get_int("ny")?)
        .max(params.get_int("nz")?) as u64;
    let dealias_type = params.get_int("dealias_type")?;
    let dk = 1.0;
    let k_max = if dealias_type == 1 {
        dk * (n / 3) as f64
    } else {
        dk * (n / 2) as f64
    };
    let nshells = (k_max / dk) as usize + 2;
    Ok(KspaceMetadata {
        kshell: (0..nshells).map(|i| i as f64 * dk).collect(),
        nshell: vec![0.0; nshells],
        k_max,
        dk,
    })
}

/// Create the statistics datasets in a run data file.
///
/// Layouts per sample: line extracts `(nx, 3)` in the solver's field
/// precision, spectral co-tensors `(nshells, 3, 3)`, moments `(10, 4)`,
/// histograms `(bins, 4)` as integers. With gradient statistics
/// enabled, the invariant moment/histogram datasets and the joint
/// two-dimensional histogram are added.
pub fn create_statistics_layout(
    data: &mut dyn Container,
    params: &ParameterRegistry,
    nshells: usize,
    precision: Dtype,
    with_gradient: bool,
) -> Result<(), RunError> {
    let nx = params.get_int("nx")? as usize;
    let bins = params.get_int("histogram_bins")? as usize;

    for field in ["velocity", "vorticity"] {
        data.create_time_series(
            &format!("statistics/xlines/{field}"),
            DatasetSpec::new(&[nx, 3], precision),
        )?;
        data.create_time_series(
            &format!("statistics/spectra/{field}_{field}"),
            DatasetSpec::new(&[nshells, 3, 3], Dtype::F64),
        )?;
        data.create_time_series(
            &format!("statistics/moments/{field}"),
            DatasetSpec::new(&[10, 4], Dtype::F64),
        )?;
        data.create_time_series(
            &format!("statistics/histograms/{field}"),
            DatasetSpec::new(&[bins, 4], Dtype::I64),
        )?;
    }

    if with_gradient {
        let qr_bins = params.get_int("QR2D_histogram_bins")? as usize;
        data.create_time_series(
            "statistics/moments/trS2_Q_R",
            DatasetSpec::new(&[10, 3], Dtype::F64),
        )?;
        data.create_time_series(
            "statistics/moments/velocity_gradient",
            DatasetSpec::new(&[10, 9], Dtype::F64),
        )?;
        data.create_time_series(
            "statistics/histograms/trS2_Q_R",
            DatasetSpec::new(&[bins, 3], Dtype::I64),
        )?;
        data.create_time_series(
            "statistics/histograms/velocity_gradient",
            DatasetSpec::new(&[bins, 9], Dtype::I64),
        )?;
        data.create_time_series(
            "statistics/histograms/QR2D",
            DatasetSpec::new(&[qr_bins, qr_bins], Dtype::I64),
        )?;
    }
    Ok(())
}
