//! Derived turbulence diagnostics.
//!
//! Everything here is a function of the raw window and the k-space
//! metadata only, so derived series are always recomputable and never
//! persisted independently of the raw series that produced them.

use std::f64::consts::PI;

use crate::kspace::KspaceMetadata;
use crate::raw::RawWindow;

/// Effective-cutoff correction applied to `kMeta` when the solver runs
/// the reduced dealiasing variant (mode flag 1).
const REDUCED_DEALIAS_CORRECTION: f64 = 0.8;

/// Per-sample derived diagnostic series over one statistics window.
#[derive(Clone, Debug, PartialEq)]
pub struct DerivedStats {
    /// Shell-integrated kinetic energy.
    pub energy: Vec<f64>,
    /// Shell-integrated enstrophy.
    pub enstrophy: Vec<f64>,
    /// Integral-scale velocity `sqrt(2 E / 3)`.
    pub uint: Vec<f64>,
    /// Integral length scale.
    pub lint: Vec<f64>,
    /// Integral time scale `Lint / Uint`.
    pub tint: Vec<f64>,
    /// Energy dissipation rate `2 nu enstrophy`.
    pub dissipation: Vec<f64>,
    /// Kolmogorov length scale.
    pub eta_kolmogorov: Vec<f64>,
    /// Kolmogorov time scale.
    pub tau_kolmogorov: Vec<f64>,
    /// Integral-scale Reynolds number.
    pub reynolds: Vec<f64>,
    /// Taylor microscale.
    pub taylor_microscale: Vec<f64>,
    /// Taylor-scale Reynolds number.
    pub r_lambda: Vec<f64>,
    /// Resolution measure `kMax etaK`, dealias-corrected.
    pub k_meta: Vec<f64>,
    /// Maximum velocity magnitude.
    pub vel_max: Vec<f64>,
    /// Resolved kinetic energy from the moment series.
    pub resolved_energy: Vec<f64>,
}

/// Window-averaged scalar counterparts of [`DerivedStats`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DerivedMeans {
    /// Mean shell-integrated kinetic energy.
    pub energy: f64,
    /// Mean shell-integrated enstrophy.
    pub enstrophy: f64,
    /// Mean integral-scale velocity.
    pub uint: f64,
    /// Mean integral length scale.
    pub lint: f64,
    /// Mean integral time scale.
    pub tint: f64,
    /// Mean dissipation rate.
    pub dissipation: f64,
    /// Mean Kolmogorov length scale.
    pub eta_kolmogorov: f64,
    /// Mean Kolmogorov time scale.
    pub tau_kolmogorov: f64,
    /// Mean integral-scale Reynolds number.
    pub reynolds: f64,
    /// Mean Taylor microscale.
    pub taylor_microscale: f64,
    /// Mean Taylor-scale Reynolds number.
    pub r_lambda: f64,
    /// Mean resolution measure.
    pub k_meta: f64,
    /// Mean maximum velocity magnitude.
    pub vel_max: f64,
    /// Mean resolved kinetic energy.
    pub resolved_energy: f64,
}

impl DerivedStats {
    /// Compute every derived series from a raw window.
    ///
    /// Shells past the stored metadata's count are ignored, so a stale
    /// metadata record degrades to a truncated integration instead of
    /// an index error. The zero shell is excluded from the `Lint`
    /// integrand explicitly rather than through NaN propagation.
    pub fn compute(
        raw: &RawWindow,
        meta: &KspaceMetadata,
        nu: f64,
        dealias_type: i64,
    ) -> Self {
        let nshells = raw.nshells.min(meta.nshells());
        let dealias = if dealias_type == 1 {
            REDUCED_DEALIAS_CORRECTION
        } else {
            1.0
        };
        let samples = raw.energy_spectrum.len();

        let mut out = Self {
            energy: Vec::with_capacity(samples),
            enstrophy: Vec::with_capacity(samples),
            uint: Vec::with_capacity(samples),
            lint: Vec::with_capacity(samples),
            tint: Vec::with_capacity(samples),
            dissipation: Vec::with_capacity(samples),
            eta_kolmogorov: Vec::with_capacity(samples),
            tau_kolmogorov: Vec::with_capacity(samples),
            reynolds: Vec::with_capacity(samples),
            taylor_microscale: Vec::with_capacity(samples),
            r_lambda: Vec::with_capacity(samples),
            k_meta: Vec::with_capacity(samples),
            vel_max: raw.vel_max.clone(),
            resolved_energy: raw.resolved_energy.clone(),
        };

        for t in 0..samples {
            let ek = &raw.energy_spectrum[t][..nshells];
            let wk = &raw.enstrophy_spectrum[t][..nshells];

            let energy = meta.dk * ek.iter().sum::<f64>();
            let enstrophy = meta.dk * wk.iter().sum::<f64>();
            let uint = (2.0 * energy / 3.0).sqrt();
            let weighted: f64 = ek
                .iter()
                .zip(&meta.kshell[..nshells])
                .filter(|(_, k)| **k > 0.0)
                .map(|(e, k)| e / k)
                .sum();
            let lint = meta.dk * PI / (2.0 * uint * uint) * weighted;
            let dissipation = 2.0 * nu * enstrophy;
            let eta = (nu.powi(3) / dissipation).powf(0.25);
            let lambda = (15.0 * nu * uint * uint / dissipation).sqrt();

            out.energy.push(energy);
            out.enstrophy.push(enstrophy);
            out.uint.push(uint);
            out.lint.push(lint);
            out.tint.push(lint / uint);
            out.dissipation.push(dissipation);
            out.eta_kolmogorov.push(eta);
            out.tau_kolmogorov.push((nu / dissipation).sqrt());
            out.reynolds.push(uint * lint / nu);
            out.taylor_microscale.push(lambda);
            out.r_lambda.push(uint * lambda / nu);
            out.k_meta.push(meta.k_max * eta * dealias);
        }
        out
    }

    /// Arithmetic means over the sampled window.
    pub fn means(&self) -> DerivedMeans {
        DerivedMeans {
            energy: mean(&self.energy),
            enstrophy: mean(&self.enstrophy),
            uint: mean(&self.uint),
            lint: mean(&self.lint),
            tint: mean(&self.tint),
            dissipation: mean(&self.dissipation),
            eta_kolmogorov: mean(&self.eta_kolmogorov),
            tau_kolmogorov: mean(&self.tau_kolmogorov),
            reynolds: mean(&self.reynolds),
            taylor_microscale: mean(&self.taylor_microscale),
            r_lambda: mean(&self.r_lambda),
            k_meta: mean(&self.k_meta),
            vel_max: mean(&self.vel_max),
            resolved_energy: mean(&self.resolved_energy),
        }
    }
}

fn mean(series: &[f64]) -> f64 {
    if series.is_empty() {
        return 0.0;
    }
    series.iter().sum::<f64>() / series.len() as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raw::extract_window;
    use skein_test_utils::StatsFixture;

    fn compute(fixture: &StatsFixture) -> (DerivedStats, KspaceMetadata) {
        let data = fixture.build();
        let raw = extract_window(&data, 0, fixture.nsamples - 1).unwrap();
        let meta = KspaceMetadata::load(&data).unwrap();
        let derived = DerivedStats::compute(&raw, &meta, fixture.nu, fixture.dealias_type);
        (derived, meta)
    }

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn unit_energy_gives_unit_uint() {
        // One shell, diagonal 1.0: energy(t, 0) = 1.5, summed = 1.5,
        // Uint = sqrt(2 * 1.5 / 3) = 1.
        let fixture = StatsFixture {
            nshells: 1,
            ..StatsFixture::default()
        };
        let (derived, _) = compute(&fixture);
        assert!(close(derived.energy[0], 1.5));
        assert!(close(derived.uint[0], 1.0));
    }

    #[test]
    fn lint_excludes_the_zero_shell() {
        // Shells at k = 0, 1, 2, 3 with energy 1.5 each. The k = 0 term
        // is skipped, not NaN.
        let fixture = StatsFixture {
            nshells: 4,
            ..StatsFixture::default()
        };
        let (derived, _) = compute(&fixture);
        let energy = 4.0 * 1.5;
        let uint2 = 2.0 * energy / 3.0;
        let weighted = 1.5 / 1.0 + 1.5 / 2.0 + 1.5 / 3.0;
        assert!(close(derived.lint[0], PI / (2.0 * uint2) * weighted));
        assert!(derived.lint.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn dissipation_scales_enstrophy_by_viscosity() {
        let fixture = StatsFixture::default();
        let (derived, _) = compute(&fixture);
        // 8 shells, enstrophy(t, k) = 3.0, dk = 1: enstrophy = 24.
        assert!(close(derived.enstrophy[0], 24.0));
        assert!(close(derived.dissipation[0], 2.0 * 0.1 * 24.0));
    }

    #[test]
    fn kolmogorov_scales_follow_dissipation() {
        let fixture = StatsFixture::default();
        let (derived, _) = compute(&fixture);
        let diss = derived.dissipation[0];
        assert!(close(derived.eta_kolmogorov[0], (0.1f64.powi(3) / diss).powf(0.25)));
        assert!(close(derived.tau_kolmogorov[0], (0.1 / diss).sqrt()));
    }

    #[test]
    fn reduced_dealias_scales_k_meta_by_correction() {
        let plain = StatsFixture::default();
        let reduced = StatsFixture {
            dealias_type: 1,
            ..StatsFixture::default()
        };
        let (a, _) = compute(&plain);
        let (b, _) = compute(&reduced);
        for t in 0..plain.nsamples {
            assert!(close(b.k_meta[t], 0.8 * a.k_meta[t]));
        }
        // The correction carries through the window average identically.
        assert!(close(b.means().k_meta, 0.8 * a.means().k_meta));
    }

    #[test]
    fn taylor_scale_relations_hold() {
        let fixture = StatsFixture::default();
        let (derived, _) = compute(&fixture);
        let (nu, t) = (fixture.nu, 0);
        let uint = derived.uint[t];
        let lambda = derived.taylor_microscale[t];
        assert!(close(
            lambda,
            (15.0 * nu * uint * uint / derived.dissipation[t]).sqrt()
        ));
        assert!(close(derived.r_lambda[t], uint * lambda / nu));
        assert!(close(derived.reynolds[t], uint * derived.lint[t] / nu));
        assert!(close(derived.tint[t], derived.lint[t] / uint));
    }

    #[test]
    fn means_average_the_window() {
        let fixture = StatsFixture { nsamples: 3, ..StatsFixture::default() };
        let (derived, _) = compute(&fixture);
        // vel_max(t) = t * 1000 + 39.
        assert!(close(derived.means().vel_max, (39.0 + 1039.0 + 2039.0) / 3.0));
    }

    #[test]
    fn stale_metadata_truncates_instead_of_panicking() {
        let fixture = StatsFixture::default();
        let data = fixture.build();
        let raw = extract_window(&data, 0, 4).unwrap();
        let meta = KspaceMetadata {
            kshell: vec![0.0, 1.0],
            nshell: vec![1.0, 6.0],
            k_max: 4.0,
            dk: 1.0,
        };
        let derived = DerivedStats::compute(&raw, &meta, fixture.nu, 0);
        // Only the two metadata shells are integrated.
        assert!(close(derived.energy[0], 3.0));
    }
}
