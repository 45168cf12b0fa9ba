use super::{BehaviorContext, Hooks};
use crate::action::Action as PipelineAction;
use crate::memory::{MemoryRef, Owner, Visibility};

/// Exposes fragment-derived user actions (e.g. "Next", "Pause") for an
/// external UI via public memory (spec.md §4.5 ActionLayerBehavior). This is
/// the one behavior whose entire job is publishing a read-only surface; it
/// never enqueues pipeline actions itself.
pub struct ActionLayerBehavior {
    available: Vec<String>,
    actions_ref: Option<MemoryRef<Vec<String>>>,
}

impl ActionLayerBehavior {
    pub fn new(available: Vec<String>) -> Self {
        ActionLayerBehavior { available, actions_ref: None }
    }
}

impl Hooks for ActionLayerBehavior {
    fn on_mount(&mut self, ctx: &mut BehaviorContext) -> Vec<PipelineAction> {
        self.actions_ref = Some(ctx.memory.allocate(
            "action_layer:available",
            Owner::Block(ctx.key),
            self.available.clone(),
            Visibility::Public,
        ));
        Vec::new()
    }

    fn on_dispose(&mut self, ctx: &mut BehaviorContext) {
        if let Some(r) = self.actions_ref.take() {
            ctx.memory.release(&r);
        }
    }
}
