//! Base solver feature: the vorticity-formulation Navier-Stokes core.
//!
//! Contributes the mandatory stages, the checkpointed output block,
//! the statistics block (spectra, moments, stop-sentinel probe and
//! broadcast), and the k-space metadata store.

use crate::error::AssemblyError;
use crate::feature::{Feature, ProgramBuilder};
use crate::stage::Stage;

/// Floating-point precision of the generated solver.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Precision {
    /// 32-bit fields.
    Single,
    /// 64-bit fields.
    Double,
}

impl Precision {
    fn c_type(self) -> &'static str {
        match self {
            Precision::Single => "float",
            Precision::Double => "double",
        }
    }
}

/// The base vorticity-equation solver feature.
///
/// Every run carries this feature; it owns the mandatory stages and
/// the control-signal text (checkpoint id read and broadcast at init,
/// stop-sentinel probe and broadcast on the sampling stride).
#[derive(Clone, Debug)]
pub struct VorticitySolver {
    precision: Precision,
}

impl VorticitySolver {
    /// Create the solver feature with the given field precision.
    pub fn new(precision: Precision) -> Self {
        Self { precision }
    }
}

impl Default for VorticitySolver {
    fn default() -> Self {
        Self::new(Precision::Single)
    }
}

impl Feature for VorticitySolver {
    fn name(&self) -> &str {
        "vorticity-solver"
    }

    fn contribute(&self, builder: &mut ProgramBuilder) -> Result<(), AssemblyError> {
        let params = builder.params_mut();
        params.set("nu", 0.1);
        params.set("fmode", 1i64);
        params.set("famplitude", 0.5);
        params.set("fk0", 2.0);
        params.set("fk1", 4.0);
        params.set("forcing_type", "linear");
        params.set("histogram_bins", 256i64);
        params.set("max_velocity_estimate", 1.0);
        params.set("max_vorticity_estimate", 1.0);
        params.set("checkpoints_per_file", 1i64);

        let ctype = self.precision.c_type();
        let asm = builder.assembler_mut();

        asm.append(Stage::Includes, "#include \"vorticity_equation.hpp\"");
        asm.append(Stage::Includes, "#include <cmath>");
        asm.append(Stage::Includes, "#include <sys/stat.h>");

        asm.append(
            Stage::Declarations,
            format!(
                "vorticity_equation<{ctype}, FFTW> *fs;\n\
                 field<{ctype}, FFTW, THREE> *tmp_vec_field;\n\
                 int checkpoint;"
            ),
        );

        asm.append(
            Stage::TypeDefinitions,
            format!(
                "typedef struct {{\n\
                 \x20   {ctype} re;\n\
                 \x20   {ctype} im;\n\
                 }} tmp_complex_type;"
            ),
        );

        // Solver construction, authoritative checkpoint id, state load.
        // Only the distinguished worker reads the configuration record;
        // everyone else takes the broadcast value.
        asm.append(
            Stage::FluidInit,
            format!(
                "fs = new vorticity_equation<{ctype}, FFTW>(simname, nx, ny, nz);\n\
                 tmp_vec_field = new field<{ctype}, FFTW, THREE>(nx, ny, nz, MPI_COMM_WORLD);\n\
                 fs->checkpoints_per_file = checkpoints_per_file;\n\
                 fs->nu = nu;\n\
                 fs->fmode = fmode;\n\
                 fs->famplitude = famplitude;\n\
                 fs->fk0 = fk0;\n\
                 fs->fk1 = fk1;\n\
                 strncpy(fs->forcing_type, forcing_type, 128);\n\
                 fs->iteration = iter0;\n\
                 if (myrank == 0)\n\
                 {{\n\
                 \x20   checkpoint = read_checkpoint_id(stat_file);\n\
                 }}\n\
                 MPI_Bcast(&checkpoint, 1, MPI_INT, 0, MPI_COMM_WORLD);\n\
                 fs->checkpoint = checkpoint;\n\
                 fs->io_checkpoint();"
            ),
        );

        // k-space metadata is stored once, by the distinguished worker,
        // at the very first iteration. A shell-count disagreement with
        // the record is reported but does not abort the run.
        asm.append(
            Stage::FluidInit,
            "if (myrank == 0 && fs->iteration == 0)\n\
             {\n\
             \x20   if (store_kspace(stat_file, fs->kk) != 0)\n\
             \x20   {\n\
             \x20       DEBUG_MSG(\"computed nshells disagrees with data file\\n\");\n\
             \x20   }\n\
             }",
        );

        asm.append(Stage::FluidLoopBody, "fs->step(dt);");

        asm.append(
            Stage::StatisticsBlock,
            "fs->compute_velocity(fs->cvorticity);\n\
             *tmp_vec_field = fs->cvelocity->get_cdata();\n\
             tmp_vec_field->compute_stats(\n\
             \x20   fs->kk, stat_file, \"velocity\",\n\
             \x20   fs->iteration / niter_stat,\n\
             \x20   max_velocity_estimate / sqrt(3));\n\
             *tmp_vec_field = fs->cvorticity->get_cdata();\n\
             tmp_vec_field->compute_stats(\n\
             \x20   fs->kk, stat_file, \"vorticity\",\n\
             \x20   fs->iteration / niter_stat,\n\
             \x20   max_vorticity_estimate / sqrt(3));",
        );

        // Stop protocol: the distinguished worker probes the sentinel,
        // then every worker branches on the broadcast value, never on a
        // local filesystem check.
        asm.append(
            Stage::StatisticsBlock,
            "if (myrank == 0)\n\
             {\n\
             \x20   std::string fname = std::string(\"stop_\") + std::string(simname);\n\
             \x20   struct stat file_buffer;\n\
             \x20   stop_code_now = (stat(fname.c_str(), &file_buffer) == 0);\n\
             }\n\
             MPI_Bcast(&stop_code_now, 1, MPI_C_BOOL, 0, MPI_COMM_WORLD);",
        );

        // Output block: field checkpoint write plus the authoritative
        // checkpoint id, stored by the distinguished worker.
        asm.append_output(
            "fs->io_checkpoint(false);\n\
             checkpoint = fs->checkpoint;\n\
             if (myrank == 0)\n\
             {\n\
             \x20   store_checkpoint_id(stat_file, checkpoint);\n\
             }",
        );

        asm.append(
            Stage::FluidFinalize,
            "delete fs;\n\
             delete tmp_vec_field;",
        );
        Ok(())
    }
}
