//! Particle tracking feature: per-species tracer advection.
//!
//! Registering this feature adds the particle stages, a particle
//! write to the output block, and the per-species parameters. The
//! solver feature is untouched; independence of feature modules is
//! the point of the stage model.

use crate::error::AssemblyError;
use crate::feature::{Feature, ProgramBuilder};
use crate::stage::Stage;

/// Tracer particle tracking for one species.
#[derive(Clone, Debug)]
pub struct ParticleTracking {
    species: u32,
    nparticles: i64,
    integration_steps: u32,
    neighbours: u32,
    smoothness: u32,
}

impl ParticleTracking {
    /// Configure tracking for `nparticles` tracers of the given
    /// species.
    ///
    /// `integration_steps` is the derivative-history depth of the
    /// stepping scheme and must lie in `1..=5`.
    pub fn new(
        species: u32,
        nparticles: i64,
        integration_steps: u32,
        neighbours: u32,
        smoothness: u32,
    ) -> Result<Self, AssemblyError> {
        if !(1..=5).contains(&integration_steps) {
            return Err(AssemblyError::InvalidFeature {
                reason: format!(
                    "integration_steps must be in 1..=5, got {integration_steps}"
                ),
            });
        }
        Ok(Self {
            species,
            nparticles,
            integration_steps,
            neighbours,
            smoothness,
        })
    }

    /// The species index.
    pub fn species(&self) -> u32 {
        self.species
    }

    /// Derivative-history depth required by the stepping scheme.
    pub fn integration_steps(&self) -> u32 {
        self.integration_steps
    }
}

impl Feature for ParticleTracking {
    fn name(&self) -> &str {
        "particle-tracking"
    }

    fn contribute(&self, builder: &mut ProgramBuilder) -> Result<(), AssemblyError> {
        let s = self.species;
        let params = builder.params_mut();
        params.set("nparticles", self.nparticles);
        params.set(
            format!("tracers{s}_integration_steps"),
            self.integration_steps as i64,
        );
        params.set(format!("tracers{s}_neighbours"), self.neighbours as i64);
        params.set(format!("tracers{s}_smoothness"), self.smoothness as i64);
        params.set(format!("tracers{s}_interpolator"), "spline");

        let asm = builder.assembler_mut();
        asm.append(
            Stage::Includes,
            "#include \"particles/particles_system_builder.hpp\"\n\
             #include \"particles/particles_output.hpp\"",
        );

        asm.append(
            Stage::ParticleInit,
            format!(
                "std::unique_ptr<abstract_particles_system<long long int, double>> ps =\n\
                 \x20   particles_system_builder(\n\
                 \x20       fs->cvelocity, fs->kk,\n\
                 \x20       tracers{s}_integration_steps,\n\
                 \x20       (long long int)nparticles,\n\
                 \x20       fs->get_current_fname(),\n\
                 \x20       std::string(\"/tracers{s}/state/\") + std::to_string(fs->iteration),\n\
                 \x20       std::string(\"/tracers{s}/rhs/\") + std::to_string(fs->iteration),\n\
                 \x20       tracers{s}_neighbours,\n\
                 \x20       tracers{s}_smoothness,\n\
                 \x20       MPI_COMM_WORLD,\n\
                 \x20       fs->iteration + 1);\n\
                 particles_output<long long int, double, 3, 3> particles_writer(\n\
                 \x20   MPI_COMM_WORLD, \"tracers{s}\", nparticles,\n\
                 \x20   tracers{s}_integration_steps);"
            ),
        );

        asm.append(
            Stage::ParticleLoopBody,
            "fs->compute_velocity(fs->cvorticity);\n\
             fs->cvelocity->ift();\n\
             ps->completeLoop(dt);",
        );

        asm.append_output(
            "particles_writer.open_file(fs->get_current_fname());\n\
             particles_writer.save(\n\
             \x20   ps->getParticlesPositions(),\n\
             \x20   ps->getParticlesRhs(),\n\
             \x20   ps->getParticlesIndexes(),\n\
             \x20   ps->getLocalNbParticles(),\n\
             \x20   fs->iteration);\n\
             particles_writer.close_file();",
        );

        asm.append(Stage::ParticleFinalize, "ps.release();");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::VorticitySolver;

    fn tracking() -> ParticleTracking {
        ParticleTracking::new(0, 100, 4, 1, 1).unwrap()
    }

    #[test]
    fn integration_steps_out_of_range_rejected() {
        for bad in [0, 6, 10] {
            match ParticleTracking::new(0, 100, bad, 1, 1) {
                Err(AssemblyError::InvalidFeature { .. }) => {}
                other => panic!("expected InvalidFeature for {bad}, got {other:?}"),
            }
        }
    }

    #[test]
    fn particle_stages_appear_only_when_registered() {
        let without = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap();
        assert!(!without.assemble().unwrap().contains("completeLoop"));

        let with = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap()
            .with_feature(&tracking())
            .unwrap();
        let text = with.assemble().unwrap();
        assert!(text.contains("ps->completeLoop(dt);"));
        assert!(text.contains("ps.release();"));
    }

    #[test]
    fn enabling_particles_leaves_solver_fragments_ordered() {
        let solver_only = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap();
        let both = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap()
            .with_feature(&tracking())
            .unwrap();

        for stage in crate::Stage::ALL {
            let before = solver_only.assembler().fragments(stage);
            let after = both.assembler().fragments(stage);
            // Solver fragments must be a prefix of the combined list.
            assert_eq!(&after[..before.len()], before, "stage {stage}");
        }
    }

    #[test]
    fn particle_write_joins_output_block() {
        let with = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap()
            .with_feature(&tracking())
            .unwrap();
        let text = with.assemble().unwrap();
        // Field write first (solver registered first), particle write
        // second, in both the gated block and the flush.
        assert_eq!(text.matches("particles_writer.save(").count(), 2);
        let field = text.find("fs->io_checkpoint(false);").unwrap();
        let particle = text.find("particles_writer.save(").unwrap();
        assert!(field < particle);
    }

    #[test]
    fn species_parameters_registered() {
        let with = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap()
            .with_feature(&tracking())
            .unwrap();
        let params = with.params();
        assert_eq!(params.get_int("tracers0_integration_steps").unwrap(), 4);
        assert_eq!(params.get_str("tracers0_interpolator").unwrap(), "spline");
        assert_eq!(params.get_int("nparticles").unwrap(), 100);
    }
}
