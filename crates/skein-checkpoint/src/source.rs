//! Seeding a new run's first checkpoint from a different named run.
//!
//! Instead of generating a fresh field, checkpoint 0 of the new run can
//! link to the state a source run stored for some iteration. The
//! source's chain layout is unknown here, so its checkpoint files are
//! scanned in increasing order until one holds the requested iteration.

use skein_core::container::ContainerStore;
use skein_core::id::{FileIndex, Iteration};

use crate::chain::{checkpoint_file, field_state_path};
use crate::error::CheckpointError;

/// Tracer species groups in a checkpoint file start with this prefix.
const TRACER_PREFIX: &str = "tracers";

/// Find the source checkpoint file holding `iteration`.
///
/// Scans `<source>_checkpoint_0`, `_1`, ... in order; the scan stops at
/// the first missing file. Exhausting every existing file without a
/// match is fatal [`CheckpointError::MissingSourceData`].
pub fn locate_source_state(
    store: &dyn ContainerStore,
    source: &str,
    iteration: Iteration,
) -> Result<FileIndex, CheckpointError> {
    let state = field_state_path(iteration);
    let mut n = 0u64;
    loop {
        let fname = checkpoint_file(source, FileIndex(n));
        if !store.exists(&fname) {
            return Err(CheckpointError::MissingSourceData {
                source: source.to_string(),
                iteration,
            });
        }
        if store.get(&fname)?.has(&state) {
            return Ok(FileIndex(n));
        }
        n += 1;
    }
}

/// Seed checkpoint 0 of `simname` by linking to a source run's state.
///
/// The new run's first checkpoint file gains an external link for the
/// field state at iteration 0, plus one per tracer species the source
/// file carries. Returns the source file index the links point into.
pub fn seed_from_source(
    store: &mut dyn ContainerStore,
    simname: &str,
    source: &str,
    source_iteration: Iteration,
) -> Result<FileIndex, CheckpointError> {
    let found = locate_source_state(store, source, source_iteration)?;
    let source_file = checkpoint_file(source, found);

    // Tracer species present at the source iteration, in file order.
    let mut tracer_links = Vec::new();
    {
        let src = store.get(&source_file)?;
        for key in src.root_keys() {
            if !key.starts_with(TRACER_PREFIX) {
                continue;
            }
            for kind in ["state", "rhs"] {
                let path = format!("{key}/{kind}/{source_iteration}");
                if src.has(&path) {
                    tracer_links.push((format!("{key}/{kind}/0"), path));
                }
            }
        }
    }

    let target_name = checkpoint_file(simname, FileIndex(0));
    let target = if store.exists(&target_name) {
        store.get_mut(&target_name)?
    } else {
        store.create(&target_name)?
    };
    target.link_external(
        &field_state_path(Iteration(0)),
        &source_file,
        &field_state_path(source_iteration),
    )?;
    for (path, source_path) in tracer_links {
        target.link_external(&path, &source_file, &source_path)?;
    }
    Ok(found)
}

#[cfg(test)]
mod tests {
    use super::*;
    use skein_core::Container;
    use skein_test_utils::{MemContainer, MemStore};

    fn source_store() -> MemStore {
        let mut store = MemStore::new();
        let mut cp0 = MemContainer::new();
        cp0.create_group("vorticity/complex/0").unwrap();
        let mut cp1 = MemContainer::new();
        cp1.create_group("vorticity/complex/128").unwrap();
        cp1.create_group("tracers0/state/128").unwrap();
        cp1.create_group("tracers0/rhs/128").unwrap();
        store.insert("base_checkpoint_0", cp0);
        store.insert("base_checkpoint_1", cp1);
        store
    }

    #[test]
    fn scan_walks_files_in_increasing_order() {
        let store = source_store();
        assert_eq!(
            locate_source_state(&store, "base", Iteration(0)).unwrap(),
            FileIndex(0)
        );
        assert_eq!(
            locate_source_state(&store, "base", Iteration(128)).unwrap(),
            FileIndex(1)
        );
    }

    #[test]
    fn exhausted_scan_is_missing_source_data() {
        let store = source_store();
        match locate_source_state(&store, "base", Iteration(999)) {
            Err(CheckpointError::MissingSourceData { source, iteration }) => {
                assert_eq!(source, "base");
                assert_eq!(iteration, Iteration(999));
            }
            other => panic!("expected MissingSourceData, got {other:?}"),
        }
    }

    #[test]
    fn unknown_source_run_is_missing_source_data() {
        let store = MemStore::new();
        assert!(matches!(
            locate_source_state(&store, "ghost", Iteration(0)),
            Err(CheckpointError::MissingSourceData { .. })
        ));
    }

    #[test]
    fn seeding_links_field_state_at_iteration_zero() {
        let mut store = source_store();
        let found = seed_from_source(&mut store, "run", "base", Iteration(128)).unwrap();
        assert_eq!(found, FileIndex(1));

        let target = store.mem("run_checkpoint_0").unwrap();
        assert_eq!(
            target.link_target("vorticity/complex/0").unwrap(),
            ("base_checkpoint_1", "vorticity/complex/128")
        );
    }

    #[test]
    fn seeding_links_tracer_state_and_history() {
        let mut store = source_store();
        seed_from_source(&mut store, "run", "base", Iteration(128)).unwrap();

        let target = store.mem("run_checkpoint_0").unwrap();
        assert_eq!(
            target.link_target("tracers0/state/0").unwrap(),
            ("base_checkpoint_1", "tracers0/state/128")
        );
        assert_eq!(
            target.link_target("tracers0/rhs/0").unwrap(),
            ("base_checkpoint_1", "tracers0/rhs/128")
        );
    }

    #[test]
    fn seeding_without_tracers_links_field_only() {
        let mut store = source_store();
        seed_from_source(&mut store, "run", "base", Iteration(0)).unwrap();
        let target = store.mem("run_checkpoint_0").unwrap();
        assert!(target.link_target("vorticity/complex/0").is_some());
        assert!(target.link_target("tracers0/state/0").is_none());
    }
}
