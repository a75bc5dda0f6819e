//! The fixed program skeleton: literal boilerplate plus the total
//! ordering over stages.
//!
//! Composition is a pure function of the assembler's stage contents.
//! The loop-body rule is load-bearing: one solver step, then the
//! counter increment, then the statistics block on the sampling
//! stride, then the output block gated on `iteration % niter_out == 0`,
//! then the stop check. The gates run after the increment so they test
//! the stepped state, in lockstep with the solver's own counter. The
//! finalize section replays the same output block whenever the loop
//! ended on an iteration that was not itself an output multiple, so
//! the last state is never silently lost regardless of how the loop
//! terminated.

use crate::assembler::Assembler;
use crate::error::AssemblyError;
use crate::stage::Stage;

/// Declarations every generated program carries, ahead of any
/// feature-contributed declarations.
pub(crate) const BASE_DECLARATIONS: &str = "\
int myrank, nprocs;
int iter0;
int iteration;
char simname[256];
bool stop_code_now;
";

/// Process-group initialization, argument validation, and
/// configuration load. Exactly two positional inputs are accepted: a
/// run name and a starting iteration; anything else is a usage error
/// with a non-zero exit.
pub(crate) const MAIN_START: &str = "\
int main(int argc, char *argv[])
{
    MPI_Init(&argc, &argv);
    MPI_Comm_rank(MPI_COMM_WORLD, &myrank);
    MPI_Comm_size(MPI_COMM_WORLD, &nprocs);
    if (argc != 3)
    {
        std::cerr << \"usage: executable <simname> <iteration>\" << std::endl;
        MPI_Finalize();
        return EXIT_FAILURE;
    }
    strcpy(simname, argv[1]);
    iter0 = atoi(argv[2]);
    read_parameters();
    stop_code_now = false;
";

/// Process-group teardown.
pub(crate) const MAIN_END: &str = "\
    MPI_Finalize();
    return EXIT_SUCCESS;
}
";

/// Compose the final program text from the skeleton and the
/// assembler's stage contents.
pub(crate) fn compose(asm: &Assembler) -> Result<String, AssemblyError> {
    for stage in Stage::MANDATORY {
        if asm.fragments(stage).is_empty() {
            return Err(AssemblyError::IncompleteAssembly { stage });
        }
    }

    let mut out = String::new();
    push_stage(&mut out, asm, Stage::Includes);
    out.push_str(BASE_DECLARATIONS);
    push_stage(&mut out, asm, Stage::Declarations);
    push_stage(&mut out, asm, Stage::TypeDefinitions);
    out.push_str(MAIN_START);
    push_stage(&mut out, asm, Stage::FluidInit);
    push_stage(&mut out, asm, Stage::ParticleInit);

    // `iteration` outlives the loop so the finalize section can test
    // whether the last pass hit the output gate. It is incremented
    // after the step fragments and before the gates: the solver's
    // counter advances inside the step, so the gates must test the
    // stepped value or the written state lands off the cadence.
    out.push_str("for (iteration = iter0; iteration < iter0 + niter_todo;)\n{\n");
    push_stage(&mut out, asm, Stage::FluidLoopBody);
    push_stage(&mut out, asm, Stage::ParticleLoopBody);
    out.push_str("iteration++;\n");
    if !asm.fragments(Stage::StatisticsBlock).is_empty() {
        out.push_str("if (iteration % niter_stat == 0)\n{\n");
        push_stage(&mut out, asm, Stage::StatisticsBlock);
        out.push_str("}\n");
    }
    if !asm.output_fragments().is_empty() {
        out.push_str("if (iteration % niter_out == 0)\n{\n");
        push_fragments(&mut out, asm.output_fragments());
        out.push_str("}\n");
    }
    out.push_str("if (stop_code_now)\n{\nbreak;\n}\n");
    out.push_str("}\n");

    // Flush on exit: the loop may have ended (by count or by stop
    // signal) on an iteration that missed the output gate.
    if !asm.output_fragments().is_empty() {
        out.push_str("if (iteration % niter_out != 0)\n{\n");
        push_fragments(&mut out, asm.output_fragments());
        out.push_str("}\n");
    }
    push_stage(&mut out, asm, Stage::ParticleFinalize);
    push_stage(&mut out, asm, Stage::FluidFinalize);
    out.push_str(MAIN_END);
    Ok(out)
}

fn push_stage(out: &mut String, asm: &Assembler, stage: Stage) {
    push_fragments(out, asm.fragments(stage));
}

fn push_fragments(out: &mut String, fragments: &[String]) {
    for fragment in fragments {
        out.push_str(fragment);
        if !fragment.ends_with('\n') {
            out.push('\n');
        }
    }
}
