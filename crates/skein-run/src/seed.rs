//! Initial-condition generation: fresh random vorticity fields and
//! tracer states, deterministic under a fixed seed.

use std::f64::consts::TAU;

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

use skein_core::container::{Container, DatasetSpec, Dtype};
use skein_core::param::ParameterRegistry;

use crate::error::RunError;

/// Spectrum shape of the generated field, matching the legacy initial
/// condition.
const SPECTRA_SLOPE: f64 = 2.0;
/// Overall amplitude of the generated field.
const AMPLITUDE: f64 = 0.05;

/// Write a freshly generated spectral vorticity field into a
/// checkpoint file at iteration 0.
///
/// The field layout is the solver's half-complex representation:
/// `(ny, nz, nx / 2 + 1, 3)` complex values, stored as interleaved
/// real/imaginary pairs. Mode amplitudes decay with the configured
/// spectrum slope; phases are uniform. Identical seeds generate
/// identical fields.
pub fn seed_initial_field(
    checkpoint: &mut dyn Container,
    params: &ParameterRegistry,
    seed: u64,
) -> Result<(), RunError> {
    let nx = params.get_int("nx")? as usize;
    let ny = params.get_int("ny")? as usize;
    let nz = params.get_int("nz")? as usize;
    let modes_x = nx / 2 + 1;

    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut row = Vec::with_capacity(ny * nz * modes_x * 3 * 2);
    for _ in 0..(ny * nz) {
        for kx in 0..modes_x {
            // Amplitude envelope k^(-slope / 2), flat at the zero mode.
            let k = (kx.max(1)) as f64;
            let envelope = AMPLITUDE * k.powf(-SPECTRA_SLOPE / 2.0);
            for _ in 0..3 {
                let phase: f64 = rng.random_range(0.0..TAU);
                row.push(envelope * phase.cos());
                row.push(envelope * phase.sin());
            }
        }
    }

    checkpoint.create_time_series(
        "vorticity/complex/0",
        DatasetSpec::new(&[ny, nz, modes_x, 3, 2], Dtype::F64),
    )?;
    checkpoint.write_row("vorticity/complex/0", 0, &row)?;
    Ok(())
}

/// Write the initial tracer state for one species into a checkpoint
/// file at iteration 0.
///
/// Positions are sampled uniformly in `[0, 2π)^3`; the derivative
/// history starts zeroed at the configured integration depth.
pub fn seed_tracer_state(
    checkpoint: &mut dyn Container,
    species: u32,
    nparticles: usize,
    integration_steps: usize,
    seed: u64,
) -> Result<(), RunError> {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let state: Vec<f64> = (0..nparticles * 3)
        .map(|_| rng.random_range(0.0..TAU))
        .collect();

    let state_path = format!("tracers{species}/state/0");
    checkpoint.create_time_series(&state_path, DatasetSpec::new(&[nparticles, 3], Dtype::F64))?;
    checkpoint.write_row(&state_path, 0, &state)?;

    let rhs_path = format!("tracers{species}/rhs/0");
    checkpoint.create_time_series(
        &rhs_path,
        DatasetSpec::new(&[integration_steps, nparticles, 3], Dtype::F64),
    )?;
    checkpoint.write_row(
        &rhs_path,
        0,
        &vec![0.0; integration_steps * nparticles * 3],
    )?;
    Ok(())
}
