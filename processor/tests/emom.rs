//! End-to-end: a 10-minute EMOM with a single fixed-rep movement each
//! minute (spec.md §8 scenario 3).

use wodscript_core::{Fragment, MetricKind, Statement, StatementId, TimerDirection};
use wodscript_processor::event::Event;
use wodscript_processor::jit::Script;
use wodscript_processor::{RuntimeOptions, ScriptRuntime};

fn emom_script() -> Script {
    let root = Statement::new(
        1,
        vec![
            Fragment::Timer { image: "10:00".into(), value_ms: 10 * 60 * 1000, direction: Some(TimerDirection::Down) },
            Fragment::Action { name: "EMOM".into() },
        ],
    )
    .with_children(vec![vec![StatementId(2)]]);
    let burpees = Statement::new(
        2,
        vec![Fragment::Repetitions { value: 5 }, Fragment::Effort { name: "Burpees".into() }],
    );
    Script::new(vec![root, burpees], vec![StatementId(1)])
}

#[test]
fn emom_rounds_are_paced_by_elapsed_time_not_by_next_or_premature_ticks() {
    let mut runtime = ScriptRuntime::new(emom_script(), RuntimeOptions::default());
    runtime.push_root().unwrap();

    let leaf = runtime.stack().current().unwrap();
    assert_eq!(leaf.metric.exercise_id.as_deref(), Some("Burpees"));
    assert_eq!(leaf.metric.value_of(MetricKind::Repetitions).map(|v| v.as_u32()), Some(5));

    // A tick while Burpees is still the literal top of stack must reach the
    // EMOM container's countdown through the bubble-scoped observer
    // registered at mount, not bounce off as a stack-state error.
    runtime.handle(Event::new("tick")).unwrap();
    assert!(runtime.errors().is_empty());
    let leaf = runtime.stack().current().unwrap();
    assert_eq!(leaf.metric.exercise_id.as_deref(), Some("Burpees"), "60s boundary hasn't been crossed yet");

    // Finishing the movement early no longer starts the next round on the
    // spot: the interval coordinator only advances on a `tick` that actually
    // crosses a round boundary, so the container sits idle once its one
    // child pops.
    runtime.handle(Event::new("next")).unwrap();
    assert!(
        runtime.stack().current().unwrap().metric.exercise_id.is_none(),
        "container is idle until the next interval boundary, not re-pushing on next"
    );
    assert!(!runtime.is_complete());

    // And a tick immediately after still isn't enough to cross a 60s boundary.
    runtime.handle(Event::new("tick")).unwrap();
    assert!(runtime.stack().current().unwrap().metric.exercise_id.is_none());
    assert!(!runtime.is_complete());
    assert!(runtime.errors().is_empty());
}
