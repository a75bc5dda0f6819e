//! The fragment assembler: append-only per-stage buffers and the
//! assembly entry point.

use crate::error::AssemblyError;
use crate::skeleton;
use crate::stage::Stage;

/// Accumulates per-stage text fragments and assembles them into one
/// program following the fixed skeleton.
///
/// Fragments within a stage preserve the order in which contributing
/// features registered them; nothing is ever removed or reordered.
/// [`assemble`](Self::assemble) borrows immutably, so calling it twice
/// with no intervening append yields byte-identical output.
///
/// The output block is a separate buffer spliced into the program
/// twice: gated on `iteration % niter_out == 0` at the end of the
/// loop body, and replayed unconditionally in the finalize section
/// when the loop ended off the output cadence.
#[derive(Clone, Debug, Default)]
pub struct Assembler {
    buffers: [Vec<String>; Stage::ALL.len()],
    output_block: Vec<String>,
}

impl Assembler {
    /// Create an assembler with every stage empty.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a fragment to a stage.
    pub fn append(&mut self, stage: Stage, text: impl Into<String>) {
        self.buffers[stage.index()].push(text.into());
    }

    /// Append a fragment to the output block (field write, particle
    /// write, checkpoint store).
    pub fn append_output(&mut self, text: impl Into<String>) {
        self.output_block.push(text.into());
    }

    /// The fragments registered into a stage, in registration order.
    pub fn fragments(&self, stage: Stage) -> &[String] {
        &self.buffers[stage.index()]
    }

    /// The fragments registered into the output block.
    pub fn output_fragments(&self) -> &[String] {
        &self.output_block
    }

    /// Total number of registered fragments across all buffers.
    pub fn fragment_count(&self) -> usize {
        self.buffers.iter().map(Vec::len).sum::<usize>() + self.output_block.len()
    }

    /// Assemble the program text.
    ///
    /// Fails with [`AssemblyError::IncompleteAssembly`] if any
    /// mandatory stage is empty. Optional stages are conditionally
    /// included only when a feature registered into them.
    pub fn assemble(&self) -> Result<String, AssemblyError> {
        skeleton::compose(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn minimal() -> Assembler {
        let mut asm = Assembler::new();
        asm.append(Stage::Includes, "#include \"solver.hpp\"");
        asm.append(Stage::Declarations, "solver *fs;");
        asm.append(Stage::FluidInit, "fs = new solver(simname);");
        asm.append(Stage::FluidLoopBody, "fs->step(dt);");
        asm.append(Stage::FluidFinalize, "delete fs;");
        asm
    }

    // ── Completeness gate ────────────────────────────────────

    #[test]
    fn minimal_program_assembles() {
        let text = minimal().assemble().unwrap();
        assert!(text.contains("fs->step(dt);"));
        assert!(text.contains("MPI_Init"));
        assert!(text.contains("return EXIT_FAILURE;"));
    }

    #[test]
    fn each_missing_mandatory_stage_fails() {
        for missing in Stage::MANDATORY {
            let mut asm = Assembler::new();
            for stage in Stage::MANDATORY {
                if stage != missing {
                    asm.append(stage, "x;");
                }
            }
            match asm.assemble() {
                Err(AssemblyError::IncompleteAssembly { stage }) => {
                    assert_eq!(stage, missing)
                }
                other => panic!("expected IncompleteAssembly({missing}), got {other:?}"),
            }
        }
    }

    // ── Determinism and idempotence ──────────────────────────

    #[test]
    fn assemble_twice_is_byte_identical() {
        let asm = minimal();
        assert_eq!(asm.assemble().unwrap(), asm.assemble().unwrap());
    }

    #[test]
    fn identical_append_sequences_agree() {
        let a = minimal();
        let b = minimal();
        assert_eq!(a.assemble().unwrap(), b.assemble().unwrap());
    }

    // ── Stage independence ───────────────────────────────────

    #[test]
    fn later_registration_preserves_earlier_order() {
        let mut asm = minimal();
        asm.append(Stage::FluidLoopBody, "fs->force(famplitude);");
        let before = asm.assemble().unwrap();
        let step = before.find("fs->step(dt);").unwrap();
        let force = before.find("fs->force(famplitude);").unwrap();
        assert!(step < force);

        // A second feature registering into shared stages must not
        // disturb the first feature's relative order.
        asm.append(Stage::Includes, "#include \"tracers.hpp\"");
        asm.append(Stage::ParticleLoopBody, "ps->completeLoop(dt);");
        let after = asm.assemble().unwrap();
        let step = after.find("fs->step(dt);").unwrap();
        let force = after.find("fs->force(famplitude);").unwrap();
        assert!(step < force);
    }

    // ── Conditional inclusion ────────────────────────────────

    #[test]
    fn optional_stages_absent_when_empty() {
        let text = minimal().assemble().unwrap();
        assert!(!text.contains("% niter_stat"));
        assert!(!text.contains("% niter_out"));
    }

    #[test]
    fn statistics_gate_appears_with_fragments() {
        let mut asm = minimal();
        asm.append(Stage::StatisticsBlock, "compute_stats();");
        let text = asm.assemble().unwrap();
        assert!(text.contains("if (iteration % niter_stat == 0)"));
    }

    // ── Flush on exit ────────────────────────────────────────

    #[test]
    fn output_block_spliced_twice() {
        let mut asm = minimal();
        asm.append_output("fs->io_checkpoint();");
        let text = asm.assemble().unwrap();
        assert_eq!(text.matches("fs->io_checkpoint();").count(), 2);
        assert!(text.contains("if (iteration % niter_out == 0)"));
        assert!(text.contains("if (iteration % niter_out != 0)"));
        // The flush comes after the loop closes, before finalize.
        let gate = text.find("% niter_out == 0").unwrap();
        let flush = text.find("% niter_out != 0").unwrap();
        let stop = text.find("if (stop_code_now)").unwrap();
        assert!(gate < stop && stop < flush);
    }

    #[test]
    fn stop_check_present_without_output_block() {
        let text = minimal().assemble().unwrap();
        assert!(text.contains("if (stop_code_now)\n{\nbreak;\n}"));
    }

    #[test]
    fn gates_test_the_stepped_iteration() {
        let mut asm = minimal();
        asm.append(Stage::StatisticsBlock, "compute_stats();");
        asm.append_output("fs->io_checkpoint();");
        let text = asm.assemble().unwrap();
        assert!(text.contains("for (iteration = iter0; iteration < iter0 + niter_todo;)"));
        let step = text.find("fs->step(dt);").unwrap();
        let bump = text.find("iteration++;").unwrap();
        let stat_gate = text.find("if (iteration % niter_stat == 0)").unwrap();
        let out_gate = text.find("if (iteration % niter_out == 0)").unwrap();
        assert!(step < bump && bump < stat_gate && stat_gate < out_gate);
    }

    /// Replays the emitted loop arithmetic: step, counter increment,
    /// output gate, stop check, then the post-loop flush.
    fn written_states(iter0: u64, niter_todo: u64, niter_out: u64, stop_at: Option<u64>) -> Vec<u64> {
        let mut iteration = iter0;
        let mut written = Vec::new();
        while iteration < iter0 + niter_todo {
            iteration += 1;
            if iteration % niter_out == 0 {
                written.push(iteration);
            }
            if stop_at == Some(iteration) {
                break;
            }
        }
        if iteration % niter_out != 0 {
            written.push(iteration);
        }
        written
    }

    #[test]
    fn final_state_is_written_on_every_exit_path() {
        // Cadence divides the budget: the last pass hits the in-loop
        // gate and the flush stays quiet.
        assert_eq!(written_states(0, 8, 4, None), [4, 8]);
        // Cadence does not divide: the flush catches the final state.
        assert_eq!(written_states(0, 8, 3, None), [3, 6, 8]);
        // Stop signal off the cadence: flushed too.
        assert_eq!(written_states(0, 8, 4, Some(5)), [4, 5]);
        // Restarts keep the gate on absolute multiples of the cadence.
        assert_eq!(written_states(8, 8, 4, None), [12, 16]);
    }

    // ── Determinism under arbitrary append sequences ─────────

    proptest::proptest! {
        #[test]
        fn arbitrary_append_sequences_are_deterministic(
            appends in proptest::collection::vec(
                (0usize..Stage::ALL.len(), "[a-z_]{1,12};"),
                0..24,
            ),
        ) {
            let mut a = minimal();
            let mut b = minimal();
            for (idx, text) in &appends {
                a.append(Stage::ALL[*idx], text.clone());
                b.append(Stage::ALL[*idx], text.clone());
            }
            let first = a.assemble().unwrap();
            proptest::prop_assert_eq!(&first, &a.assemble().unwrap());
            proptest::prop_assert_eq!(&first, &b.assemble().unwrap());
        }

        #[test]
        fn appends_into_other_stages_never_reorder_a_stage(
            own in proptest::collection::vec("[a-z]{1,8};", 1..6),
            other in proptest::collection::vec(
                (0usize..Stage::ALL.len(), "[a-z]{1,8};"),
                0..12,
            ),
        ) {
            let mut asm = minimal();
            for text in &own {
                asm.append(Stage::FluidLoopBody, text.clone());
            }
            let before: Vec<String> = asm.fragments(Stage::FluidLoopBody).to_vec();
            for (idx, text) in &other {
                let stage = Stage::ALL[*idx];
                if stage != Stage::FluidLoopBody {
                    asm.append(stage, text.clone());
                }
            }
            proptest::prop_assert_eq!(
                &asm.fragments(Stage::FluidLoopBody)[..before.len()],
                &before[..]
            );
        }
    }
}
