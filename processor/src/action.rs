//! The phased action pipeline (§4.4). Behaviors don't mutate the runtime
//! directly; they enqueue [`Action`]s, which are drained phase by phase in a
//! fixed order so that, e.g., every pending `Memory` write is visible before
//! any `Event` fires this tick.
//!
//! Grounded in the teacher's continuation-stack execution (`fast/join.rs`,
//! `fast/loop.rs`): a node doesn't run its children inline, it pushes
//! continuations and lets the driving loop pop and run them in order. Here
//! the phases play that role: each is a bucket, not a call.

use indexmap::IndexSet;

use crate::errors::RuntimeError;
use crate::event::Event;
use crate::key::BlockKey;
use crate::memory::{MemoryType, Owner};

/// Fixed draining order. `Immediate` actions that enqueue further actions
/// are folded back into the same sweep; everything else waits its turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Phase {
    Immediate,
    Display,
    Memory,
    SideEffect,
    Event,
    Stack,
}

impl Phase {
    const ORDER: [Phase; 6] =
        [Phase::Immediate, Phase::Display, Phase::Memory, Phase::SideEffect, Phase::Event, Phase::Stack];
}

#[derive(Debug, Clone)]
pub enum StackOp {
    /// Compile statement group `group_index` of `parent`'s children and push
    /// the result. Resolved against the script tree by
    /// [`crate::runtime::ScriptRuntime`], since behaviors don't hold a
    /// reference to the JIT compiler or the statement tree.
    PushChild { parent: BlockKey, group_index: usize },
    /// Pop `target` (which must be the current top of stack).
    Pop { target: BlockKey },
}

/// Something a behavior hook wants done, instead of doing it directly.
#[derive(Debug, Clone)]
pub enum Action {
    /// Re-run the owning block's `next` immediately, within this same sweep.
    Requeue(BlockKey),
    /// A value destined for a display/observer surface; carried opaquely —
    /// the pipeline doesn't interpret `Display` actions, only orders them
    /// ahead of `Memory`.
    Display { owner: BlockKey, label: String },
    MemoryRelease { owner: BlockKey, type_tag: MemoryType },
    SideEffect { owner: BlockKey, label: String },
    Emit(Event),
    Stack(StackOp),
}

impl Action {
    fn phase(&self) -> Phase {
        match self {
            Action::Requeue(_) => Phase::Immediate,
            Action::Display { .. } => Phase::Display,
            Action::MemoryRelease { .. } => Phase::Memory,
            Action::SideEffect { .. } => Phase::SideEffect,
            Action::Emit(_) => Phase::Event,
            Action::Stack(_) => Phase::Stack,
        }
    }
}

/// Per-phase FIFO buckets, drained in [`Phase::ORDER`] until every bucket is
/// empty or `max_iterations` outer sweeps have run.
#[derive(Default)]
pub struct ActionPipeline {
    buckets: std::collections::HashMap<Phase, Vec<Action>>,
    max_iterations: usize,
    requeued: IndexSet<BlockKey>,
}

impl ActionPipeline {
    pub fn new(max_iterations: usize) -> Self {
        ActionPipeline { buckets: Default::default(), max_iterations, requeued: IndexSet::new() }
    }

    pub fn enqueue(&mut self, action: Action) {
        if let Action::Requeue(key) = &action {
            self.requeued.insert(*key);
        }
        self.buckets.entry(action.phase()).or_default().push(action);
    }

    pub fn drain_requeued(&mut self) -> Vec<BlockKey> {
        self.requeued.drain(..).collect()
    }

    /// Pops every action queued for `phase`, in FIFO order, leaving later
    /// phases untouched.
    pub fn take_phase(&mut self, phase: Phase) -> Vec<Action> {
        self.buckets.remove(&phase).unwrap_or_default()
    }

    pub fn has_pending(&self) -> bool {
        self.buckets.values().any(|b| !b.is_empty())
    }

    pub fn is_empty_phase(&self, phase: Phase) -> bool {
        self.buckets.get(&phase).is_none_or(Vec::is_empty)
    }

    /// Runs `drain_one` (which should pop one phase's worth of work and
    /// execute it, possibly enqueueing more) until no bucket has pending
    /// work, bounded by `max_iterations` outer sweeps.
    pub fn run_to_quiescence(
        &mut self,
        mut drain_one: impl FnMut(&mut Self, Phase),
    ) -> Result<(), RuntimeError> {
        for _ in 0..self.max_iterations {
            if !self.has_pending() {
                return Ok(());
            }
            for phase in Phase::ORDER {
                drain_one(self, phase);
            }
        }
        if self.has_pending() {
            Err(RuntimeError::PipelineOverflow(self.max_iterations))
        } else {
            Ok(())
        }
    }
}

pub fn owner_of(action: &Action) -> Option<(Owner, &'static str)> {
    match action {
        Action::Display { owner, .. } => Some((Owner::Block(*owner), "display")),
        Action::MemoryRelease { owner, .. } => Some((Owner::Block(*owner), "memory")),
        Action::SideEffect { owner, .. } => Some((Owner::Block(*owner), "side_effect")),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(n: u64) -> BlockKey {
        let mut r#gen = crate::key::KeyGenerator::new();
        let mut k = r#gen.next();
        for _ in 1..n {
            k = r#gen.next();
        }
        k
    }

    #[test]
    fn phases_drain_in_fixed_order() {
        let mut pipeline = ActionPipeline::new(10);
        pipeline.enqueue(Action::Emit(Event::new("late")));
        pipeline.enqueue(Action::Display { owner: key(1), label: "early".into() });
        assert!(!pipeline.is_empty_phase(Phase::Event));
        let display = pipeline.take_phase(Phase::Display);
        assert_eq!(display.len(), 1);
        assert!(!pipeline.is_empty_phase(Phase::Event));
    }

    #[test]
    fn overflow_past_max_iterations_is_reported() {
        let mut pipeline = ActionPipeline::new(3);
        let result = pipeline.run_to_quiescence(|p, _phase| {
            p.enqueue(Action::Emit(Event::new("loop")));
        });
        assert!(matches!(result, Err(RuntimeError::PipelineOverflow(3))));
    }

    #[test]
    fn quiescence_returns_ok_once_all_buckets_drain() {
        let mut pipeline = ActionPipeline::new(10);
        pipeline.enqueue(Action::Emit(Event::new("once")));
        let mut ticks = 0;
        let result = pipeline.run_to_quiescence(|p, phase| {
            if phase == Phase::Event {
                p.take_phase(Phase::Event);
                ticks += 1;
            }
        });
        assert!(result.is_ok());
        assert_eq!(ticks, 1);
    }
}
