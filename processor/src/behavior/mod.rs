//! The composable behavior model (§4.5). A block's semantics come entirely
//! from its ordered list of `Behavior`s; the block itself is inert plumbing.
//!
//! Modeled as a sum type per the design notes rather than `Box<dyn Trait>`:
//! the variant set is closed (six kinds, enumerated in spec) and dispatch
//! cost matters on the stack's hot push/pop path.

mod action_layer;
mod completion;
mod history;
mod loop_coordinator;
mod round_span;
mod timer;

pub use action_layer::ActionLayerBehavior;
pub use completion::CompletionBehavior;
pub use history::{HistoryBehavior, SpanStatus, TrackedSpan};
pub use loop_coordinator::{LoopConfig, LoopCoordinatorBehavior};
pub use round_span::{RoundSpanBehavior, SpanType};
pub use timer::TimerBehavior;

use wodscript_core::RuntimeMetric;

use crate::action::Action;
use crate::clock::Clock;
use crate::key::BlockKey;
use crate::memory::MemoryStore;

/// Everything a hook needs, borrowed for the duration of one call. Built by
/// [`crate::runtime::ScriptRuntime`] from its owned fields plus the
/// currently-dispatching block's own clock/metric, so behaviors never hold
/// onto runtime state between calls (§4.5: "must not retain references to
/// the runtime or stack beyond the current invocation").
pub struct BehaviorContext<'a> {
    pub key: BlockKey,
    pub parent: Option<BlockKey>,
    pub memory: &'a mut MemoryStore,
    pub clock: &'a mut Clock,
    pub metric: &'a mut RuntimeMetric,
    /// Number of compiled child statement groups for this block, resolved by
    /// the caller from the statement tree; `0` for leaves.
    pub child_group_count: usize,
    pub event_name: Option<&'a str>,
}

pub enum Behavior {
    Timer(TimerBehavior),
    LoopCoordinator(LoopCoordinatorBehavior),
    Completion(CompletionBehavior),
    History(HistoryBehavior),
    RoundSpan(RoundSpanBehavior),
    ActionLayer(ActionLayerBehavior),
}

impl Behavior {
    pub fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        match self {
            Behavior::Timer(b) => b.on_mount(ctx),
            Behavior::LoopCoordinator(b) => b.on_mount(ctx),
            Behavior::Completion(b) => b.on_mount(ctx),
            Behavior::History(b) => b.on_mount(ctx),
            Behavior::RoundSpan(b) => b.on_mount(ctx),
            Behavior::ActionLayer(b) => b.on_mount(ctx),
        }
    }

    pub fn on_next(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        match self {
            Behavior::Timer(b) => b.on_next(ctx),
            Behavior::LoopCoordinator(b) => b.on_next(ctx),
            Behavior::Completion(b) => b.on_next(ctx),
            Behavior::History(b) => b.on_next(ctx),
            Behavior::RoundSpan(b) => b.on_next(ctx),
            Behavior::ActionLayer(b) => b.on_next(ctx),
        }
    }

    pub fn on_unmount(&mut self, ctx: &mut BehaviorContext) -> Vec<Action> {
        match self {
            Behavior::Timer(b) => b.on_unmount(ctx),
            Behavior::LoopCoordinator(b) => b.on_unmount(ctx),
            Behavior::Completion(b) => b.on_unmount(ctx),
            Behavior::History(b) => b.on_unmount(ctx),
            Behavior::RoundSpan(b) => b.on_unmount(ctx),
            Behavior::ActionLayer(b) => b.on_unmount(ctx),
        }
    }

    pub fn on_dispose(&mut self, ctx: &mut BehaviorContext) {
        match self {
            Behavior::Timer(b) => b.on_dispose(ctx),
            Behavior::LoopCoordinator(b) => b.on_dispose(ctx),
            Behavior::Completion(b) => b.on_dispose(ctx),
            Behavior::History(b) => b.on_dispose(ctx),
            Behavior::RoundSpan(b) => b.on_dispose(ctx),
            Behavior::ActionLayer(b) => b.on_dispose(ctx),
        }
    }
}

/// Shared default so individual behavior modules only override the hooks
/// they care about, mirroring how most of the teacher's decorator impls
/// leave `before_enter`/`after_exit` as no-ops.
pub(crate) trait Hooks {
    fn on_mount(&mut self, _ctx: &mut BehaviorContext) -> Vec<Action> {
        Vec::new()
    }
    fn on_next(&mut self, _ctx: &mut BehaviorContext) -> Vec<Action> {
        Vec::new()
    }
    fn on_unmount(&mut self, _ctx: &mut BehaviorContext) -> Vec<Action> {
        Vec::new()
    }
    fn on_dispose(&mut self, _ctx: &mut BehaviorContext) {}
}
