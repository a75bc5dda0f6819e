//! The run driver: ties parameters, assembly, seeding, and
//! post-processing together around one named run.

use std::fs;
use std::path::{Path, PathBuf};

use skein_checkpoint::{seed_from_source, CHECKPOINT_SCALAR, ITERATION_SCALAR};
use skein_codegen::ProgramBuilder;
use skein_core::container::{Container, ContainerStore, Dtype};
use skein_core::id::{FileIndex, Iteration};
use skein_core::param::{ParamValue, ParameterRegistry};
use skein_stats::{PostProcessor, StatsBundle};

use crate::error::RunError;
use crate::layout::{create_statistics_layout, spectral_metadata};
use crate::seed::{seed_initial_field, seed_tracer_state};

/// Initialize the logging backend for the driver's process.
///
/// Safe to call more than once; later calls are ignored.
pub fn init_logging() {
    let _ = env_logger::Builder::from_default_env().try_init();
}

/// Apply the resolution-derived launch heuristics to a parameter set.
///
/// The viscosity is chosen so the requested resolution measure
/// `kMeta` comes out near the target: `nu = (2 kMeta / n)^(4/3)` with
/// `n` the largest grid extent. The timestep scales inversely with
/// resolution, `dt = dtfactor / n`. An output cadence that is zero,
/// negative, or not a divisor of the iteration budget is forced to
/// the whole budget so the final state is always written on the
/// cadence.
pub fn apply_launch_heuristics(
    params: &mut ParameterRegistry,
    k_meta: f64,
    dtfactor: f64,
) -> Result<(), RunError> {
    let n = params
        .get_int("nx")?
        .max(params.get_int("ny")?)
        .max(params.get_int("nz")?) as f64;
    params.set("nu", (2.0 * k_meta / n).powf(4.0 / 3.0));
    params.set("dt", dtfactor / n);

    let niter_todo = params.get_int("niter_todo")?;
    let niter_out = params.get_int("niter_out")?;
    if niter_out <= 0 || niter_todo % niter_out != 0 {
        params.set("niter_out", niter_todo);
    }
    Ok(())
}

/// Where checkpoint 0 gets its field state from.
#[derive(Clone, Debug)]
pub enum SeedSource {
    /// Generate a fresh random field with the given seed.
    Fresh {
        /// RNG seed; identical seeds generate identical fields.
        seed: u64,
    },
    /// Link to the state a different named run stored for an
    /// iteration.
    SourceRun {
        /// The source run's name.
        source: String,
        /// The source iteration to link to.
        iteration: Iteration,
    },
}

/// Drives one named run from preparation through post-processing.
pub struct RunDriver {
    simname: String,
    builder: ProgramBuilder,
    precision: Dtype,
}

impl RunDriver {
    /// Create a driver for the given run around an assembled feature
    /// set.
    pub fn new(simname: impl Into<String>, builder: ProgramBuilder, precision: Dtype) -> Self {
        Self {
            simname: simname.into(),
            builder,
            precision,
        }
    }

    /// The run's name.
    pub fn simname(&self) -> &str {
        &self.simname
    }

    /// The feature-assembled program builder.
    pub fn builder(&self) -> &ProgramBuilder {
        &self.builder
    }

    /// Mutable parameter access for pre-launch overrides.
    pub fn params_mut(&mut self) -> &mut ParameterRegistry {
        self.builder.params_mut()
    }

    /// Write the run's configuration record and statistics layout, or
    /// load the record of an earlier run.
    ///
    /// A fresh run gets its parameters, the initial checkpoint and
    /// iteration scalars, the k-space metadata, and every statistics
    /// dataset written exactly once. When the record already exists
    /// this is a restart: persisted values replace the in-memory ones
    /// and nothing is written.
    pub fn write_record(&mut self, store: &mut dyn ContainerStore) -> Result<(), RunError> {
        if store.exists(&self.simname) {
            log::info!("run '{}' already has a record, reading it back", self.simname);
            let record = store.get(&self.simname)?;
            self.builder.params_mut().read_record(record)?;
            return Ok(());
        }

        log::info!("writing configuration record for run '{}'", self.simname);
        let meta = spectral_metadata(self.builder.params())?;
        let with_gradient = self.builder.params().get("QR2D_histogram_bins").is_some();
        let record = store.create(&self.simname)?;
        self.builder.params().write_record(record)?;
        record.write_scalar(CHECKPOINT_SCALAR, ParamValue::Int(0))?;
        record.write_scalar(ITERATION_SCALAR, ParamValue::Int(0))?;
        meta.store(record)?;
        create_statistics_layout(
            record,
            self.builder.params(),
            meta.nshells(),
            self.precision,
            with_gradient,
        )?;
        Ok(())
    }

    /// Seed checkpoint 0, unless the run already has one.
    ///
    /// Fresh runs get a generated field and, for each configured
    /// tracer species, an initial state in the periodic box; source
    /// runs get external links into the source's checkpoint chain.
    pub fn seed_run(
        &self,
        store: &mut dyn ContainerStore,
        source: &SeedSource,
    ) -> Result<(), RunError> {
        let fname = skein_checkpoint::checkpoint_file(&self.simname, FileIndex(0));
        if store.exists(&fname) {
            log::info!("checkpoint file '{fname}' exists, leaving it untouched");
            return Ok(());
        }

        match source {
            SeedSource::Fresh { seed } => {
                store.create(&fname)?;
                let checkpoint = store.get_mut(&fname)?;
                seed_initial_field(checkpoint, self.builder.params(), *seed)?;
                self.seed_tracers(checkpoint, *seed)?;
            }
            SeedSource::SourceRun {
                source,
                iteration,
            } => {
                seed_from_source(store, &self.simname, source, *iteration)?;
            }
        }
        Ok(())
    }

    fn seed_tracers(&self, checkpoint: &mut dyn Container, seed: u64) -> Result<(), RunError> {
        let params = self.builder.params();
        let nparticles = match params.get("nparticles") {
            Some(ParamValue::Int(n)) if *n > 0 => *n as usize,
            _ => return Ok(()),
        };
        let mut species = 0u32;
        while let Some(ParamValue::Int(steps)) =
            params.get(&format!("tracers{species}_integration_steps"))
        {
            seed_tracer_state(
                checkpoint,
                species,
                nparticles,
                *steps as usize,
                seed.wrapping_add(species as u64),
            )?;
            species += 1;
        }
        Ok(())
    }

    /// Assemble the generated program's text.
    pub fn assemble_program(&self) -> Result<String, RunError> {
        Ok(self.builder.assemble()?)
    }

    /// Assemble and write the generated program next to the run data,
    /// returning the written path.
    pub fn write_program(&self, dir: &Path) -> Result<PathBuf, RunError> {
        let text = self.assemble_program()?;
        let path = dir.join(format!("{}.cpp", self.builder.name()));
        fs::write(&path, text)?;
        Ok(path)
    }

    /// Compose the external launch command.
    ///
    /// The generated executable takes exactly two positional inputs:
    /// the run name and the starting iteration.
    pub fn launch_command(&self, nb_processes: u32, iter0: Iteration) -> Vec<String> {
        vec![
            "mpirun".to_string(),
            "-np".to_string(),
            nb_processes.to_string(),
            format!("./{}", self.builder.name()),
            self.simname.clone(),
            iter0.to_string(),
        ]
    }

    /// Run statistics post-processing over an iteration range.
    ///
    /// Returns `Ok(None)` when the run never sampled statistics.
    pub fn post_process(
        &self,
        store: &dyn ContainerStore,
        iter0: Option<u64>,
        iter1: Option<u64>,
    ) -> Result<Option<StatsBundle>, RunError> {
        let data = store.get(&self.simname)?;
        let mut pp = PostProcessor::from_record(data)?;
        let bundle = pp
            .compute_statistics(data, iter0, iter1)?
            .map(|(bundle, _)| bundle.clone());
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_codegen::{ParticleTracking, VorticitySolver};
    use skein_test_utils::{stats_fixture, MemStore};

    fn builder() -> ProgramBuilder {
        let mut builder = ProgramBuilder::new("nsve")
            .with_feature(&VorticitySolver::default())
            .unwrap();
        builder.params_mut().set("nx", 8i64);
        builder.params_mut().set("ny", 8i64);
        builder.params_mut().set("nz", 8i64);
        builder
    }

    fn driver() -> RunDriver {
        RunDriver::new("test_run", builder(), Dtype::F32)
    }

    // ── Launch heuristics ────────────────────────────────────

    #[test]
    fn viscosity_follows_the_resolution_rule() {
        let mut params = builder().params().clone();
        params.set("nx", 64i64);
        params.set("ny", 64i64);
        params.set("nz", 64i64);
        apply_launch_heuristics(&mut params, 2.0, 0.5).unwrap();
        let expected = (2.0f64 * 2.0 / 64.0).powf(4.0 / 3.0);
        assert_eq!(params.get_float("nu").unwrap(), expected);
        assert_eq!(params.get_float("dt").unwrap(), 0.5 / 64.0);
    }

    #[test]
    fn output_cadence_forced_to_divide_the_budget() {
        let mut params = builder().params().clone();
        params.set("niter_todo", 100i64);
        params.set("niter_out", 8i64);
        apply_launch_heuristics(&mut params, 2.0, 0.5).unwrap();
        assert_eq!(params.get_int("niter_out").unwrap(), 100);

        params.set("niter_todo", 64i64);
        params.set("niter_out", 8i64);
        apply_launch_heuristics(&mut params, 2.0, 0.5).unwrap();
        assert_eq!(params.get_int("niter_out").unwrap(), 8);
    }

    #[test]
    fn degenerate_output_cadence_forced_to_the_budget() {
        let mut params = builder().params().clone();
        params.set("niter_todo", 100i64);
        params.set("niter_out", 0i64);
        apply_launch_heuristics(&mut params, 2.0, 0.5).unwrap();
        assert_eq!(params.get_int("niter_out").unwrap(), 100);

        params.set("niter_out", -4i64);
        apply_launch_heuristics(&mut params, 2.0, 0.5).unwrap();
        assert_eq!(params.get_int("niter_out").unwrap(), 100);
    }

    // ── Record lifecycle ─────────────────────────────────────

    #[test]
    fn fresh_record_holds_parameters_and_layout() {
        let mut store = MemStore::new();
        let mut driver = driver();
        driver.write_record(&mut store).unwrap();

        let record = store.get("test_run").unwrap();
        assert_eq!(
            record.read_scalar("parameters/nu").unwrap(),
            ParamValue::Float(0.1)
        );
        assert_eq!(
            record.read_scalar(CHECKPOINT_SCALAR).unwrap(),
            ParamValue::Int(0)
        );
        assert!(record.has("kspace/kshell"));
        assert!(record.has("statistics/spectra/velocity_velocity"));
    }

    #[test]
    fn restart_reads_the_record_instead_of_writing() {
        let mut store = MemStore::new();
        let mut first = driver();
        first.write_record(&mut store).unwrap();
        // The previous run persisted a different viscosity.
        store
            .get_mut("test_run")
            .unwrap()
            .write_scalar("parameters/nu", ParamValue::Float(0.7))
            .unwrap();

        let mut second = driver();
        second.write_record(&mut store).unwrap();
        assert_eq!(second.builder().params().get_float("nu").unwrap(), 0.7);
    }

    // ── Seeding ──────────────────────────────────────────────

    #[test]
    fn fresh_seed_creates_field_and_tracers() {
        let mut store = MemStore::new();
        let tracking = ParticleTracking::new(0, 50, 4, 1, 1).unwrap();
        let builder = builder().with_feature(&tracking).unwrap();
        let driver = RunDriver::new("test_run", builder, Dtype::F32);

        driver
            .seed_run(&mut store, &SeedSource::Fresh { seed: 9 })
            .unwrap();
        let checkpoint = store.mem("test_run_checkpoint_0").unwrap();
        assert!(checkpoint.has("vorticity/complex/0"));
        assert!(checkpoint.has("tracers0/state/0"));
        assert_eq!(
            checkpoint.dataset_spec("tracers0/rhs/0").unwrap().row_shape[0],
            4
        );
    }

    #[test]
    fn existing_checkpoint_is_left_alone() {
        let mut store = MemStore::new();
        store.create("test_run_checkpoint_0").unwrap();
        driver()
            .seed_run(&mut store, &SeedSource::Fresh { seed: 9 })
            .unwrap();
        let checkpoint = store.mem("test_run_checkpoint_0").unwrap();
        assert!(!checkpoint.has("vorticity/complex/0"));
    }

    // ── Launch composition ───────────────────────────────────

    #[test]
    fn launch_command_takes_two_positional_inputs() {
        let cmd = driver().launch_command(4, Iteration(128));
        assert_eq!(
            cmd,
            ["mpirun", "-np", "4", "./nsve", "test_run", "128"]
        );
    }

    #[test]
    fn program_text_assembles_for_the_driver() {
        let text = driver().assemble_program().unwrap();
        assert!(text.contains("int main(int argc, char *argv[])"));
        assert!(text.contains("fs->step(dt);"));
    }

    // ── Post-processing ──────────────────────────────────────

    #[test]
    fn post_process_uses_the_run_record() {
        let mut store = MemStore::new();
        store.insert("test_run", stats_fixture(5));
        let bundle = driver().post_process(&store, None, None).unwrap().unwrap();
        assert_eq!((bundle.ii0, bundle.ii1), (0, 4));
        assert!(bundle.means.energy > 0.0);
    }

    #[test]
    fn post_process_of_unsampled_run_is_empty() {
        let mut store = MemStore::new();
        store.insert("test_run", stats_fixture(0));
        assert!(driver().post_process(&store, None, None).unwrap().is_none());
    }
}
