use super::{BehaviorContext, Hooks};
use crate::action::{Action, StackOp};

pub type Predicate = fn(&BehaviorContext) -> bool;

/// Evaluates `predicate` when `onNext` fires for one of `trigger_events`
/// (spec.md §4.5 CompletionBehavior). `trigger_events` holds event names
/// (e.g. `"next"`, `"timer:complete"`) rather than lifecycle hook names,
/// since completion is usually driven by a named event reaching the block,
/// not merely by the hook being called.
pub struct CompletionBehavior {
    predicate: Predicate,
    trigger_events: Vec<String>,
    check_on_push: bool,
}

impl CompletionBehavior {
    pub fn new(predicate: Predicate, trigger_events: Vec<String>, check_on_push: bool) -> Self {
        CompletionBehavior { predicate, trigger_events, check_on_push }
    }

    /// The common case: complete on any `next` event reaching this block.
    /// `check_on_push` is `false` so a leaf doesn't self-pop the instant it's
    /// pushed during mount recursion, before any external `next` reaches it.
    pub fn on_next_only(predicate: Predicate) -> Self {
        CompletionBehavior::new(predicate, vec!["next".to_string()], false)
    }

    fn matches_event(&self, ctx: &BehaviorContext) -> bool {
        match ctx.event_name {
            Some(name) => self.trigger_events.iter().any(|t| t == name),
            None => self.trigger_events.iter().any(|t| t == "next"),
        }
    }
}

impl Hooks for CompletionBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        if self.check_on_push && self.matches_event(ctx) && (self.predicate)(ctx) {
            vec![Action::Stack(StackOp::Pop { target: ctx.key })]
        } else {
            Vec::new()
        }
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        if self.matches_event(ctx) && (self.predicate)(ctx) {
            vec![Action::Stack(StackOp::Pop { target: ctx.key })]
        } else {
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn on_next_only_defaults_to_triggering_on_the_next_event() {
        let behavior = CompletionBehavior::on_next_only(|_| true);
        assert_eq!(behavior.trigger_events, vec!["next".to_string()]);
        assert!(!behavior.check_on_push);
    }
}
