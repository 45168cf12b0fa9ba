//! A rep-scheme loop publishes its per-round rep count through memory; a
//! child with no explicit rep count inherits whatever value was current at
//! its own compile time, and earlier children keep their own captured value
//! even after the parent moves on (spec.md §4.5, §8 scenario 5).

use wodscript_core::{Fragment, MetricKind, RoundsValue, Statement, StatementId};
use wodscript_processor::event::Event;
use wodscript_processor::jit::Script;
use wodscript_processor::memory::{SearchCriteria, Visibility};
use wodscript_processor::{RuntimeOptions, ScriptRuntime};

fn script() -> Script {
    let root = Statement::new(1, vec![Fragment::Rounds {
        image: "(21-15)".into(),
        value: RoundsValue::Scheme(vec![21, 15]),
    }])
    .with_children(vec![vec![StatementId(2)]]);
    let burpees = Statement::new(2, vec![Fragment::Effort { name: "Burpees".into() }]);
    Script::new(vec![root, burpees], vec![StatementId(1)])
}

fn latest_reps(runtime: &ScriptRuntime) -> Option<u32> {
    runtime.memory().latest::<u32>(SearchCriteria::of_type("metric:reps").with_visibility(Visibility::Public))
}

#[test]
fn a_later_round_change_does_not_retroactively_alter_an_earlier_child() {
    let mut runtime = ScriptRuntime::new(script(), RuntimeOptions::default());
    runtime.push_root().unwrap();

    assert_eq!(latest_reps(&runtime), Some(21));
    let first_child_reps = runtime
        .stack()
        .current()
        .unwrap()
        .metric
        .value_of(MetricKind::Repetitions)
        .map(|v| v.as_u32());
    assert_eq!(first_child_reps, Some(21));

    runtime.handle(Event::new("next")).unwrap();
    assert_eq!(latest_reps(&runtime), Some(15));
    let second_child_reps = runtime
        .stack()
        .current()
        .unwrap()
        .metric
        .value_of(MetricKind::Repetitions)
        .map(|v| v.as_u32());
    assert_eq!(second_child_reps, Some(15));

    // The captured value from the first child's own compile-time snapshot
    // never changed even though the shared memory cell has since moved on.
    assert_eq!(first_child_reps, Some(21));
    assert!(runtime.errors().is_empty());
}
