//! The orchestrator (§4.9). Owns every other component and is the sole
//! entry point external callers use: construct it with a [`Script`], push
//! the root, then feed it events through [`ScriptRuntime::handle`].

use std::cell::RefCell;
use std::rc::Rc;

use crate::action::{Action, ActionPipeline, Phase, StackOp};
use crate::behavior::{Behavior, BehaviorContext, TrackedSpan};
use crate::block::Block;
use crate::clock::Clock;
use crate::errors::{RecordedError, RuntimeError};
use crate::event::{Event, EventBus, HandlerId, HandlerOutcome, Pattern, Scope, StackOrder};
use crate::jit::{CompileHints, JitCompiler, Script};
use crate::key::BlockKey;
use crate::memory::{MemoryStore, Owner, SearchCriteria, Visibility};
use crate::options::RuntimeOptions;
use crate::stack::RuntimeStack;

pub struct ScriptRuntime {
    script: Script,
    stack: RuntimeStack,
    memory: MemoryStore,
    clock: Clock,
    events: EventBus,
    jit: JitCompiler,
    pipeline: ActionPipeline,
    history: Vec<TrackedSpan>,
    options: RuntimeOptions,
    /// Blocks a `tick` dispatch reached via a bubble-scoped registration
    /// (see [`Self::register_tick_observer`]), drained and redelivered as
    /// `next` hook calls by [`Self::dispatch_event`]. A registered handler
    /// can't reach back into `&mut self` to run a hook directly, so it just
    /// records that its owner was visited; the runtime does the rest.
    tick_hits: Rc<RefCell<Vec<BlockKey>>>,
    pub errors: Vec<RecordedError>,
}

impl ScriptRuntime {
    pub fn new(script: Script, options: RuntimeOptions) -> Self {
        ScriptRuntime {
            script,
            stack: RuntimeStack::new(),
            memory: MemoryStore::new(),
            clock: Clock::new(),
            events: EventBus::new(),
            jit: JitCompiler::with_default_strategies(),
            pipeline: ActionPipeline::new(options.max_iterations),
            history: Vec::new(),
            options,
            tick_hits: Rc::new(RefCell::new(Vec::new())),
            errors: Vec::new(),
        }
    }

    pub fn errors(&self) -> &[RecordedError] {
        &self.errors
    }

    pub fn history(&self) -> &[TrackedSpan] {
        &self.history
    }

    pub fn stack(&self) -> &RuntimeStack {
        &self.stack
    }

    pub fn memory(&self) -> &MemoryStore {
        &self.memory
    }

    pub fn is_complete(&self) -> bool {
        self.stack.is_empty()
    }

    /// Wall-clock time since [`Self::push_root`], independent of any block's
    /// own clock.
    pub fn elapsed_ms(&self) -> i64 {
        self.clock.elapsed_ms()
    }

    /// Registers an external driver's handler against the bus (spec.md §6
    /// `register-event-handler`), independent of any block's lifecycle.
    pub fn on_event(
        &mut self,
        pattern: impl Into<Pattern>,
        handler: impl FnMut(&Event) -> Result<HandlerOutcome, String> + 'static,
    ) -> HandlerId {
        self.events.register_global(pattern, handler)
    }

    /// Compiles the script's root group and pushes it, running its mount
    /// hooks. Must be called exactly once, before the first `handle`.
    pub fn push_root(&mut self) -> Result<(), RuntimeError> {
        self.clock.start();
        let root_ids = self.script.root.clone();
        let block = self.jit.compile(&root_ids, &self.script, None, CompileHints::default())?;
        let key = block.key;
        self.push_compiled(block);
        self.register_tick_observer(key);
        let mount_actions = self.run_hook(key, HookKind::Mount, None);
        for action in mount_actions {
            self.pipeline.enqueue(action);
        }
        self.drain_pipeline()
    }

    /// Dispatches `event` to the bus and the current top block's `next`
    /// hook, then drives the action pipeline to quiescence (§4.9, §5).
    #[tracing::instrument(skip(self, event), fields(event = %event.name))]
    pub fn handle(&mut self, event: Event) -> Result<(), RuntimeError> {
        for action in self.dispatch_event(&event) {
            self.pipeline.enqueue(action);
        }
        if let Some(top) = self.stack.top_owner() {
            let actions = self.run_hook(top, HookKind::Next, Some(&event.name));
            for action in actions {
                self.pipeline.enqueue(action);
            }
        }
        self.drain_pipeline()
    }

    fn drain_pipeline(&mut self) -> Result<(), RuntimeError> {
        let mut pipeline = std::mem::replace(&mut self.pipeline, ActionPipeline::new(self.options.max_iterations));
        let result = pipeline.run_to_quiescence(|p, phase| self.drain_phase(p, phase));
        self.pipeline = pipeline;
        if let Err(RuntimeError::PipelineOverflow(n)) = &result {
            tracing::error!(max_iterations = n, "action pipeline exceeded max_iterations");
        }
        result
    }

    fn drain_phase(&mut self, pipeline: &mut ActionPipeline, phase: Phase) {
        let actions = pipeline.take_phase(phase);
        tracing::debug!(?phase, count = actions.len(), "draining phase");
        for action in actions {
            self.execute(action, pipeline);
        }
    }

    fn execute(&mut self, action: Action, pipeline: &mut ActionPipeline) {
        match action {
            Action::Requeue(key) => {
                let actions = self.run_hook(key, HookKind::Next, None);
                for a in actions {
                    pipeline.enqueue(a);
                }
            }
            Action::Display { .. } | Action::SideEffect { .. } => {
                // Carried opaquely; the pipeline only orders these relative
                // to other phases. A host embedding this engine observes
                // them via `tracing` or its own subscriber, not here.
            }
            Action::MemoryRelease { owner, type_tag } => {
                let matches = self.memory.search(SearchCriteria::owned_by(Owner::Block(owner)));
                for r in matches.into_iter().filter(|r| r.type_tag == type_tag) {
                    self.memory.release_any(r);
                }
            }
            Action::Emit(event) => {
                for action in self.dispatch_event(&event) {
                    pipeline.enqueue(action);
                }
            }
            Action::Stack(op) => self.execute_stack_op(op, pipeline),
        }
    }

    /// A block holding a [`Behavior::Timer`] needs to see `tick` even while
    /// buried under an active child — an AMRAP/EMOM container's countdown
    /// keeps running while a movement is in progress on top of it (§4.3). A
    /// bubble-scoped registration is the bus's existing mechanism for
    /// "notify every ancestor, not just the top"; cleaned up automatically
    /// by `deregister_owner` when the block disposes.
    fn register_tick_observer(&mut self, key: BlockKey) {
        let has_timer = self
            .stack
            .find_by_key(key)
            .is_some_and(|b| b.behaviors.iter().any(|b| matches!(b, Behavior::Timer(_))));
        if !has_timer {
            return;
        }
        let hits = self.tick_hits.clone();
        self.events.register(key, "tick", Scope::Bubble, move |_event| {
            hits.borrow_mut().push(key);
            Ok(HandlerOutcome::Continue)
        });
    }

    /// Walks the event bus, then redelivers the event as a `next` hook call
    /// to every block the bus walk flagged as interested (currently: `tick`
    /// observers registered by [`Self::register_tick_observer`]), plus —
    /// if `event.target` names a block still on the stack — that block
    /// directly, since a block raising an event about itself (e.g.
    /// `timer:complete`) is rarely the literal top of stack: mount/advance
    /// always pushes a child over it first. A registered handler can't call
    /// back into `&mut self`, so it only records which owner was visited;
    /// this is where that record turns into an actual hook call. Returns
    /// the actions produced by all of that direct delivery for the caller
    /// to enqueue.
    fn dispatch_event(&mut self, event: &Event) -> Vec<Action> {
        let failures = self.events.dispatch(event, &self.stack);
        for (owner, detail) in failures {
            self.record(RecordedError::EventHandler { owner, event: event.name.clone(), detail });
        }
        let mut actions = Vec::new();
        let top = self.stack.top_owner();
        let hits: Vec<BlockKey> = self.tick_hits.borrow_mut().drain(..).collect();
        for owner in hits {
            // The literal top of stack already gets this event's `next` hook
            // from `handle`'s unconditional top delivery; only redeliver to
            // the ancestors a bubble-scoped registration actually exists for.
            if Some(owner) == top {
                continue;
            }
            actions.extend(self.run_hook(owner, HookKind::Next, Some(&event.name)));
        }
        if let Some(target) = event.target {
            if self.stack.find_by_key(target).is_some() {
                actions.extend(self.run_hook(target, HookKind::Next, Some(&event.name)));
            }
        }
        actions
    }

    fn execute_stack_op(&mut self, op: StackOp, pipeline: &mut ActionPipeline) {
        match op {
            StackOp::PushChild { parent, group_index } => self.push_child(parent, group_index, pipeline),
            StackOp::Pop { target } => self.pop_and_dispose(target, pipeline),
        }
    }

    fn push_child(&mut self, parent: BlockKey, group_index: usize, pipeline: &mut ActionPipeline) {
        let Some(parent_block) = self.stack.find_by_key(parent) else {
            self.record(RecordedError::StackState {
                detail: format!("push_child: parent {parent} not on stack"),
            });
            return;
        };
        let Some(group) = parent_block.child_groups.get(group_index).cloned() else {
            self.record(RecordedError::StackState {
                detail: format!("push_child: {parent} has no child group {group_index}"),
            });
            return;
        };
        let inherited_reps = self
            .memory
            .latest::<u32>(SearchCriteria::of_type("metric:reps").with_visibility(Visibility::Public));
        let hints = CompileHints { inherited_reps };
        match self.jit.compile(&group, &self.script, Some(parent), hints) {
            Ok(block) => {
                let key = block.key;
                self.push_compiled(block);
                self.register_tick_observer(key);
                let mount_actions = self.run_hook(key, HookKind::Mount, None);
                for a in mount_actions {
                    pipeline.enqueue(a);
                }
                if let Some(parent_mut) = self.stack.find_by_key_mut(parent) {
                    parent_mut.children.push(key);
                }
            }
            Err(err) => self.record(RecordedError::Strategy { detail: err.to_string() }),
        }
    }

    fn push_compiled(&mut self, block: Block) {
        self.stack.push(block);
    }

    /// Pops `target` and disposes it. `target` need not be the current top:
    /// a container can complete (e.g. an AMRAP timer running out) while a
    /// child is still mid-round, in which case every block above `target`
    /// is unmounted and disposed first, in stack order, before `target`
    /// itself comes down.
    fn pop_and_dispose(&mut self, target: BlockKey, pipeline: &mut ActionPipeline) {
        if self.stack.find_by_key(target).is_none() {
            self.record(RecordedError::StackState { detail: format!("pop: {target} is not on stack") });
            return;
        }
        while self.stack.top_owner() != Some(target) {
            let Some(current) = self.stack.top_owner() else { break };
            self.unmount_and_pop_one(current, pipeline);
        }
        self.unmount_and_pop_one(target, pipeline);
        if let Some(new_top) = self.stack.top_owner() {
            pipeline.enqueue(Action::Requeue(new_top));
        }
    }

    fn unmount_and_pop_one(&mut self, key: BlockKey, pipeline: &mut ActionPipeline) {
        let unmount_actions = self.run_hook(key, HookKind::Unmount, None);
        for a in unmount_actions {
            pipeline.enqueue(a);
        }
        let Some(mut block) = self.stack.pop() else { return };
        self.dispose(&mut block);
    }

    fn dispose(&mut self, block: &mut Block) {
        if !block.mark_disposed() {
            return;
        }
        let key = block.key;
        let parent = block.parent;
        let child_group_count = block.child_groups.len();
        let Block { behaviors, clock, metric, .. } = block;
        for behavior in behaviors.iter_mut() {
            let mut ctx = BehaviorContext {
                key,
                parent,
                memory: &mut self.memory,
                clock,
                metric,
                child_group_count,
                event_name: None,
            };
            behavior.on_dispose(&mut ctx);
        }
        if self.options.debug {
            let spans = self
                .memory
                .search(SearchCriteria::of_type("history:span").with_owner(Owner::Block(key)));
            for span_ref in spans {
                if let Some(span) = self.memory.get_any::<TrackedSpan>(&span_ref) {
                    self.history.push(span);
                }
            }
        }
        self.memory.release_owned_by(key);
        self.events.deregister_owner(key);
    }

    fn record(&mut self, err: RecordedError) {
        tracing::warn!(%err, "recorded error");
        self.errors.push(err);
    }

    fn run_hook(&mut self, key: BlockKey, hook: HookKind, event_name: Option<&str>) -> Vec<Action> {
        let Some(block) = self.stack.find_by_key_mut(key) else {
            self.record(RecordedError::StackState { detail: format!("run_hook: {key} not on stack") });
            return Vec::new();
        };
        let parent = block.parent;
        let child_group_count = block.child_groups.len();
        let Block { behaviors, clock, metric, .. } = block;
        let mut actions = Vec::new();
        for behavior in behaviors.iter_mut() {
            let mut ctx = BehaviorContext {
                key,
                parent,
                memory: &mut self.memory,
                clock,
                metric,
                child_group_count,
                event_name,
            };
            let produced = match hook {
                HookKind::Mount => behavior.on_mount(&mut ctx),
                HookKind::Next => behavior.on_next(&mut ctx),
                HookKind::Unmount => behavior.on_unmount(&mut ctx),
            };
            actions.extend(produced);
        }
        actions
    }
}

#[derive(Debug, Clone, Copy)]
enum HookKind {
    Mount,
    Next,
    Unmount,
}
