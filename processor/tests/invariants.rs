//! Whole-run invariants that only show up once the full pipeline is driving
//! real compile/mount/dispose cycles (spec.md §8's universal invariants):
//! every memory cell a block allocates is gone once that block disposes,
//! and a completed run leaves nothing behind.

use wodscript_core::{Fragment, RoundsValue, Statement, StatementId};
use wodscript_processor::event::Event;
use wodscript_processor::jit::Script;
use wodscript_processor::memory::{Owner, SearchCriteria};
use wodscript_processor::{RuntimeOptions, ScriptRuntime};

fn two_round_script() -> Script {
    let root = Statement::new(1, vec![Fragment::Rounds { image: "2".into(), value: RoundsValue::Count(2) }])
        .with_children(vec![vec![StatementId(2)]]);
    let leaf = Statement::new(2, vec![Fragment::Effort { name: "Rowing".into() }]);
    Script::new(vec![root, leaf], vec![StatementId(1)])
}

#[test]
fn a_disposed_block_leaves_no_memory_cells_behind() {
    let mut runtime = ScriptRuntime::new(two_round_script(), RuntimeOptions::default());
    runtime.push_root().unwrap();

    let first_leaf_key = runtime.stack().current().unwrap().key;
    assert!(!runtime.memory().search(SearchCriteria::owned_by(Owner::Block(first_leaf_key))).is_empty());

    runtime.handle(Event::new("next")).unwrap();

    // The first leaf's cells (its action-layer availability list, its
    // history span) are gone now that it has disposed.
    assert!(runtime.memory().search(SearchCriteria::owned_by(Owner::Block(first_leaf_key))).is_empty());
}

#[test]
fn a_fully_completed_run_releases_every_cell_it_allocated() {
    let mut runtime = ScriptRuntime::new(two_round_script(), RuntimeOptions::default());
    runtime.push_root().unwrap();
    runtime.handle(Event::new("next")).unwrap();
    runtime.handle(Event::new("next")).unwrap();

    assert!(runtime.is_complete());
    assert!(runtime.memory().is_empty(), "every cell allocated over the run must be released by completion");
    assert!(runtime.errors().is_empty());
}
