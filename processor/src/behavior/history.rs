use wodscript_core::MetricValues;

use super::{BehaviorContext, Hooks};
use crate::action::Action;
use crate::key::BlockKey;
use crate::memory::{MemoryRef, Owner, Visibility};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanStatus {
    Active,
    Completed,
    Failed,
    Skipped,
}

/// An execution history record for a block, anchored by a parent span id
/// (spec.md §3 "TrackedSpan"). Held as an ordinary memory cell rather than a
/// separate persistence layer — journals are out of scope for this crate.
#[derive(Debug, Clone)]
pub struct TrackedSpan {
    pub block: BlockKey,
    pub parent_span: Option<BlockKey>,
    pub label: String,
    pub status: SpanStatus,
    pub start_elapsed_ms: i64,
    pub end_elapsed_ms: Option<i64>,
    pub metrics: MetricValues,
}

pub struct HistoryBehavior {
    label: String,
    span_ref: Option<MemoryRef<TrackedSpan>>,
}

impl HistoryBehavior {
    pub fn new(label: impl Into<String>) -> Self {
        HistoryBehavior { label: label.into(), span_ref: None }
    }
}

impl Hooks for HistoryBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        let span = TrackedSpan {
            block: ctx.key,
            parent_span: ctx.parent,
            label: self.label.clone(),
            status: SpanStatus::Active,
            start_elapsed_ms: ctx.clock.elapsed_ms(),
            end_elapsed_ms: None,
            metrics: ctx.metric.values.clone(),
        };
        self.span_ref =
            Some(ctx.memory.allocate("history:span", Owner::Block(ctx.key), span, Visibility::Public));
        Vec::new()
    }

    fn on_unmount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        if let Some(r) = &self.span_ref {
            if let Some(mut span) = ctx.memory.get(r) {
                span.status = SpanStatus::Completed;
                span.end_elapsed_ms = Some(ctx.clock.elapsed_ms());
                ctx.memory.set(r, span);
            }
        }
        Vec::new()
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext) {
        if let Some(r) = self.span_ref.take() {
            ctx.memory.release(&r);
        }
    }
}
