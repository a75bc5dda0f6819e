//! Velocity-gradient statistics feature.
//!
//! Adds joint invariant histograms (trace of S squared, Q, R) to the
//! statistics block. Purely additive: registers its own estimate
//! parameters and one statistics fragment, nothing else.

use crate::error::AssemblyError;
use crate::feature::{Feature, ProgramBuilder};
use crate::stage::Stage;

/// Joint velocity-gradient invariant statistics.
#[derive(Clone, Debug)]
pub struct GradientStats {
    histogram_bins: i64,
    max_trs2_estimate: f64,
    max_q_estimate: f64,
    max_r_estimate: f64,
}

impl GradientStats {
    /// Configure gradient statistics with the given two-dimensional
    /// histogram resolution and invariant range estimates.
    pub fn new(
        histogram_bins: i64,
        max_trs2_estimate: f64,
        max_q_estimate: f64,
        max_r_estimate: f64,
    ) -> Result<Self, AssemblyError> {
        if histogram_bins < 1 {
            return Err(AssemblyError::InvalidFeature {
                reason: format!("histogram_bins must be positive, got {histogram_bins}"),
            });
        }
        Ok(Self {
            histogram_bins,
            max_trs2_estimate,
            max_q_estimate,
            max_r_estimate,
        })
    }
}

impl Default for GradientStats {
    fn default() -> Self {
        Self {
            histogram_bins: 64,
            max_trs2_estimate: 1.0,
            max_q_estimate: 1.0,
            max_r_estimate: 1.0,
        }
    }
}

impl Feature for GradientStats {
    fn name(&self) -> &str {
        "gradient-stats"
    }

    fn contribute(&self, builder: &mut ProgramBuilder) -> Result<(), AssemblyError> {
        let params = builder.params_mut();
        params.set("QR2D_histogram_bins", self.histogram_bins);
        params.set("max_trS2_estimate", self.max_trs2_estimate);
        params.set("max_Q_estimate", self.max_q_estimate);
        params.set("max_R_estimate", self.max_r_estimate);

        let asm = builder.assembler_mut();
        asm.append(Stage::Includes, "#include \"gradient_statistics.hpp\"");
        asm.append(
            Stage::StatisticsBlock,
            "fs->compute_velocity(fs->cvorticity);\n\
             compute_gradient_statistics(\n\
             \x20   fs->kk, fs->cvelocity, stat_file,\n\
             \x20   fs->iteration / niter_stat,\n\
             \x20   max_trS2_estimate,\n\
             \x20   max_Q_estimate,\n\
             \x20   max_R_estimate,\n\
             \x20   QR2D_histogram_bins);",
        );
        Ok(())
    }
}
