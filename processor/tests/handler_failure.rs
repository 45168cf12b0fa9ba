//! A handler's failure is local: it doesn't stop sibling handlers for the
//! same event, and it doesn't poison the pipeline (spec.md §8 scenario 6).

use std::cell::RefCell;
use std::rc::Rc;

use wodscript_core::{Fragment, Statement, StatementId};
use wodscript_processor::event::{Event, HandlerOutcome};
use wodscript_processor::jit::Script;
use wodscript_processor::{RuntimeOptions, ScriptRuntime};

fn trivial_script() -> Script {
    Script::new(vec![Statement::new(1, vec![Fragment::Effort { name: "Row".into() }])], vec![StatementId(1)])
}

#[test]
fn a_failing_handler_does_not_stop_its_sibling_or_the_caller() {
    let mut runtime = ScriptRuntime::new(trivial_script(), RuntimeOptions::default());
    runtime.push_root().unwrap();

    let second_ran = Rc::new(RefCell::new(false));
    let second_ran_clone = second_ran.clone();
    runtime.on_event("lap", |_| Err("handler exploded".to_string()));
    runtime.on_event("lap", move |_| {
        *second_ran_clone.borrow_mut() = true;
        Ok(HandlerOutcome::Continue)
    });

    let result = runtime.handle(Event::new("lap"));

    assert!(result.is_ok(), "a failing handler must not surface as a RuntimeError");
    assert!(*second_ran.borrow(), "the second handler must still run after the first fails");
    assert_eq!(runtime.errors().len(), 1);
    assert!(runtime.stack().current().is_some(), "stack invariants survive a handler failure");
}
