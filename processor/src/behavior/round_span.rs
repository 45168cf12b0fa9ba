use super::history::{SpanStatus, TrackedSpan};
use super::{BehaviorContext, Hooks};
use crate::action::Action;
use crate::memory::{MemoryRef, Owner, SearchCriteria, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanType {
    Rounds,
    Interval,
}

/// Opens one [`TrackedSpan`] per round, closing the previous on round
/// transition; on pop closes the final round span (spec.md §4.5).
pub struct RoundSpanBehavior {
    span_type: SpanType,
    current_round: i64,
    span_ref: Option<MemoryRef<TrackedSpan>>,
}

impl RoundSpanBehavior {
    pub fn new(span_type: SpanType) -> Self {
        RoundSpanBehavior { span_type, current_round: -1, span_ref: None }
    }

    fn close_current(&mut self, ctx: &mut BehaviorContext) {
        if let Some(r) = self.span_ref.take() {
            if let Some(mut span) = ctx.memory.get(&r) {
                span.status = SpanStatus::Completed;
                span.end_elapsed_ms = Some(ctx.clock.elapsed_ms());
                ctx.memory.set(&r, span);
            }
            ctx.memory.release(&r);
        }
    }

    fn open_round(&mut self, ctx: &mut BehaviorContext, round: i64) {
        self.close_current(ctx);
        self.current_round = round;
        let label = match self.span_type {
            SpanType::Rounds => format!("round:{round}"),
            SpanType::Interval => format!("interval:{round}"),
        };
        let span = TrackedSpan {
            block: ctx.key,
            parent_span: ctx.parent,
            label,
            status: SpanStatus::Active,
            start_elapsed_ms: ctx.clock.elapsed_ms(),
            end_elapsed_ms: None,
            metrics: ctx.metric.values.clone(),
        };
        self.span_ref =
            Some(ctx.memory.allocate("history:round_span", Owner::Block(ctx.key), span, Visibility::Public));
    }
}

impl Hooks for RoundSpanBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        self.open_round(ctx, 0);
        Vec::new()
    }

    fn on_next(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        // Read the round LoopCoordinatorBehavior actually landed on rather
        // than inferring it from the triggering event name: an Interval
        // loop only advances on *some* ticks (the ones crossing a boundary),
        // so "did a round change" can't be read off `next` vs `tick` alone.
        let latest = ctx
            .memory
            .latest::<i64>(SearchCriteria::of_type("loop:round_index").with_owner(Owner::Block(ctx.key)));
        if let Some(round) = latest {
            if round != self.current_round {
                self.open_round(ctx, round);
            }
        }
        Vec::new()
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        self.close_current(ctx);
        Vec::new()
    }
}
