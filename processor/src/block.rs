//! A compiled node in the block tree (§4.5/§4.6). Blocks are produced by the
//! JIT compiler, pushed onto the [`crate::stack::RuntimeStack`], and driven
//! through `mount -> next* -> unmount -> dispose` by
//! [`crate::runtime::ScriptRuntime`].

use wodscript_core::{RuntimeMetric, StatementId};

use crate::behavior::Behavior;
use crate::clock::Clock;
use crate::key::BlockKey;

/// One inner array of the `children: int[][]` shape: a group of statement
/// ids that compile and execute together as a single child unit.
pub type ChildGroup = Vec<StatementId>;

/// One node of the compiled tree. Carries its own clock and metric (for
/// history/reporting) plus the ordered list of behaviors that give it its
/// actual semantics — a `Block` by itself does nothing; its `Behavior`s
/// implement `onMount`/`onNext`/`onUnmount`/`onDispose`.
pub struct Block {
    pub key: BlockKey,
    pub source_id: StatementId,
    pub parent: Option<BlockKey>,
    /// Live child blocks currently on the stack, pushed from `child_groups`.
    pub children: Vec<BlockKey>,
    /// Statement groups this block may still push, resolved from the
    /// compiling statement's `children: int[][]` (or synthesized by a
    /// strategy, e.g. the Group strategy wrapping a flat sibling group).
    pub child_groups: Vec<ChildGroup>,
    pub clock: Clock,
    pub metric: RuntimeMetric,
    pub behaviors: Vec<Behavior>,
    mounted: bool,
    disposed: bool,
}

impl Block {
    pub fn new(key: BlockKey, source_id: StatementId, parent: Option<BlockKey>) -> Self {
        Block {
            key,
            source_id,
            parent,
            children: Vec::new(),
            child_groups: Vec::new(),
            clock: Clock::new(),
            metric: RuntimeMetric::new(source_id),
            behaviors: Vec::new(),
            mounted: false,
            disposed: false,
        }
    }

    pub fn with_behaviors(mut self, behaviors: Vec<Behavior>) -> Self {
        self.behaviors = behaviors;
        self
    }

    pub fn with_child_groups(mut self, child_groups: Vec<ChildGroup>) -> Self {
        self.child_groups = child_groups;
        self
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn mark_mounted(&mut self) {
        self.mounted = true;
    }

    /// Marks this block permanently disposed. Idempotent: callers (notably
    /// `ScriptRuntime::pop_block`) may call this more than once; only the
    /// first call has effect, guaranteeing dispose hooks run exactly once.
    pub fn mark_disposed(&mut self) -> bool {
        if self.disposed {
            return false;
        }
        self.disposed = true;
        true
    }
}
