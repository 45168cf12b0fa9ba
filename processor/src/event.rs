//! The event bus (§4.3): pattern-matched handler registration with
//! owner-scoped lifetime, dispatched top-of-stack → root during the `Event`
//! phase of the action pipeline.
//!
//! Grounded in the host-trait dispatch split the teacher uses for external
//! notification (`BaseHost`/`SyncHost` in `processor/src/host/mod.rs`):
//! handlers are plain closures rather than trait objects implementing a
//! fixed set of callbacks, since the set of event names here is open-ended
//! and script-defined rather than a fixed opcode set.

use std::any::Any;
use std::fmt;
use std::rc::Rc;

use crate::key::BlockKey;

pub type EventPayload = Rc<dyn Any>;

#[derive(Debug, Clone)]
pub struct Event {
    pub name: String,
    pub payload: Option<EventPayload>,
    /// The block this event is *about*, if any (e.g. a timer reporting its
    /// own completion). Delivered straight to that block's `next` hook in
    /// addition to the normal bus walk, since a block is rarely the literal
    /// top of stack when its own condition changes — see
    /// [`crate::runtime::ScriptRuntime::dispatch_event`].
    pub target: Option<BlockKey>,
}

impl Event {
    pub fn new(name: impl Into<String>) -> Self {
        Event { name: name.into(), payload: None, target: None }
    }

    pub fn with_payload(name: impl Into<String>, payload: EventPayload) -> Self {
        Event { name: name.into(), payload: Some(payload), target: None }
    }

    /// An event a block raises about itself (spec.md §4.5 completion
    /// triggers such as `timer:complete`).
    pub fn targeted(name: impl Into<String>, target: BlockKey) -> Self {
        Event { name: name.into(), payload: None, target: Some(target) }
    }
}

/// What a handler is registered to match: either an exact event name, or the
/// wildcard that matches every event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pattern {
    Any,
    Exact(String),
}

impl Pattern {
    fn matches(&self, name: &str) -> bool {
        match self {
            Pattern::Any => true,
            Pattern::Exact(pat) => pat == name,
        }
    }
}

impl From<&str> for Pattern {
    fn from(raw: &str) -> Self {
        if raw == "*" {
            Pattern::Any
        } else {
            Pattern::Exact(raw.to_string())
        }
    }
}

/// Whether a handler fires only while its owning block sits at the top of
/// the stack, or unconditionally as dispatch walks every ancestor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    Active,
    Bubble,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HandlerId(u64);

impl fmt::Display for HandlerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "handler:{}", self.0)
    }
}

/// A handler's verdict: whether dispatch should keep walking toward the
/// root, or stop here. Most handlers return `Continue`; a handler can
/// short-circuit by returning `StopPropagation`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerOutcome {
    Continue,
    StopPropagation,
}

/// A handler may fail without poisoning dispatch: mirrors the teacher's
/// `Result`-returning host callbacks (`processor/src/host/mod.rs`) rather than
/// unwinding. A failed handler is skipped; dispatch continues to the next one.
type Handler = Box<dyn FnMut(&Event) -> Result<HandlerOutcome, String>>;

struct Registration {
    id: HandlerId,
    owner: BlockKey,
    pattern: Pattern,
    scope: Scope,
    handler: Handler,
}

/// Dispatches events against the current stack shape. Implemented by
/// [`crate::stack::RuntimeStack`]; kept as a trait here so the bus doesn't
/// depend on the stack's full interface.
pub trait StackOrder {
    /// Owners visited from the top of the stack down to the root, in order.
    fn owners_top_to_root(&self) -> Vec<BlockKey>;

    fn top_owner(&self) -> Option<BlockKey>;
}

/// A handler registered by an external driver rather than a block (spec.md
/// §6's `register-event-handler`). Not owner-scoped: it lives for the whole
/// runtime, independent of any block's mount/dispose lifecycle, and observes
/// every dispatch regardless of stack shape.
struct GlobalRegistration {
    id: HandlerId,
    pattern: Pattern,
    handler: Handler,
}

#[derive(Default)]
pub struct EventBus {
    registrations: Vec<Registration>,
    globals: Vec<GlobalRegistration>,
    next_id: u64,
}

impl EventBus {
    pub fn new() -> Self {
        EventBus::default()
    }

    pub fn register(
        &mut self,
        owner: BlockKey,
        pattern: impl Into<Pattern>,
        scope: Scope,
        handler: impl FnMut(&Event) -> Result<HandlerOutcome, String> + 'static,
    ) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.registrations.push(Registration {
            id,
            owner,
            pattern: pattern.into(),
            scope,
            handler: Box::new(handler),
        });
        id
    }

    /// Registers an external driver's handler, independent of any block's
    /// lifecycle. Runs on every dispatch whose event name matches, after the
    /// owner walk completes.
    pub fn register_global(
        &mut self,
        pattern: impl Into<Pattern>,
        handler: impl FnMut(&Event) -> Result<HandlerOutcome, String> + 'static,
    ) -> HandlerId {
        self.next_id += 1;
        let id = HandlerId(self.next_id);
        self.globals.push(GlobalRegistration { id, pattern: pattern.into(), handler: Box::new(handler) });
        id
    }

    pub fn deregister(&mut self, id: HandlerId) {
        self.registrations.retain(|r| r.id != id);
        self.globals.retain(|r| r.id != id);
    }

    /// Drops every handler owned by `owner`. Called when a block disposes.
    pub fn deregister_owner(&mut self, owner: BlockKey) {
        self.registrations.retain(|r| r.owner != owner);
    }

    /// Walks owners from top of stack to root. At each owner, runs handlers
    /// registered by that owner whose pattern matches: `Bubble`-scope
    /// handlers always run when their owner is visited; `Active`-scope
    /// handlers only run when their owner *is* the current top of stack.
    /// A handler returning `StopPropagation` halts the walk after the
    /// current owner's handlers finish. A handler that errors is recorded
    /// in the returned list and does not stop its sibling handlers from
    /// running (spec.md §8 "handler failure is local").
    pub fn dispatch(&mut self, event: &Event, stack: &impl StackOrder) -> Vec<(Option<BlockKey>, String)> {
        let top = stack.top_owner();
        let mut failures = Vec::new();
        'owners: for owner in stack.owners_top_to_root() {
            for reg in self
                .registrations
                .iter_mut()
                .filter(|r| r.owner == owner && r.pattern.matches(&event.name))
            {
                let eligible = match reg.scope {
                    Scope::Bubble => true,
                    Scope::Active => Some(owner) == top,
                };
                if !eligible {
                    continue;
                }
                match (reg.handler)(event) {
                    Ok(HandlerOutcome::StopPropagation) => break 'owners,
                    Ok(HandlerOutcome::Continue) => {}
                    Err(detail) => failures.push((Some(owner), detail)),
                }
            }
        }
        for global in self.globals.iter_mut().filter(|g| g.pattern.matches(&event.name)) {
            if let Err(detail) = (global.handler)(event) {
                failures.push((None, detail));
            }
        }
        failures
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;

    struct FixedStack(Vec<BlockKey>);

    impl StackOrder for FixedStack {
        fn owners_top_to_root(&self) -> Vec<BlockKey> {
            self.0.clone()
        }
        fn top_owner(&self) -> Option<BlockKey> {
            self.0.first().copied()
        }
    }

    fn key(n: u64) -> BlockKey {
        let mut r#gen = crate::key::KeyGenerator::new();
        let mut k = r#gen.next();
        for _ in 1..n {
            k = r#gen.next();
        }
        k
    }

    #[test]
    fn active_scope_only_fires_for_top_of_stack() {
        let root = key(1);
        let child = key(2);
        let stack = FixedStack(vec![child, root]);
        let mut bus = EventBus::new();
        let fired = Rc::new(RefCell::new(0));
        let fired_clone = fired.clone();
        bus.register(root, "*", Scope::Active, move |_| {
            *fired_clone.borrow_mut() += 1;
            Ok(HandlerOutcome::Continue)
        });
        bus.dispatch(&Event::new("tick"), &stack);
        assert_eq!(*fired.borrow(), 0, "root is not top of stack, active handler must not fire");
    }

    #[test]
    fn bubble_scope_fires_regardless_of_current_top() {
        let root = key(1);
        let child = key(2);
        let stack = FixedStack(vec![child, root]);
        let mut bus = EventBus::new();
        let fired = Rc::new(RefCell::new(0));
        let fired_clone = fired.clone();
        bus.register(root, "tick", Scope::Bubble, move |_| {
            *fired_clone.borrow_mut() += 1;
            Ok(HandlerOutcome::Continue)
        });
        bus.dispatch(&Event::new("tick"), &stack);
        assert_eq!(*fired.borrow(), 1);
    }

    #[test]
    fn deregister_owner_removes_all_its_handlers() {
        let owner = key(1);
        let stack = FixedStack(vec![owner]);
        let mut bus = EventBus::new();
        bus.register(owner, "*", Scope::Bubble, |_| Ok(HandlerOutcome::Continue));
        bus.register(owner, "foo", Scope::Active, |_| Ok(HandlerOutcome::Continue));
        bus.deregister_owner(owner);
        assert!(bus.is_empty());
        bus.dispatch(&Event::new("foo"), &stack);
    }

    #[test]
    fn dispatch_order_is_top_of_stack_to_root() {
        let root = key(1);
        let middle = key(2);
        let leaf = key(3);
        let stack = FixedStack(vec![leaf, middle, root]);
        let mut bus = EventBus::new();
        let order = Rc::new(RefCell::new(Vec::new()));
        for (label, owner) in [("root", root), ("middle", middle), ("leaf", leaf)] {
            let order = order.clone();
            bus.register(owner, "*", Scope::Bubble, move |_| {
                order.borrow_mut().push(label);
                Ok(HandlerOutcome::Continue)
            });
        }
        bus.dispatch(&Event::new("go"), &stack);
        assert_eq!(*order.borrow(), vec!["leaf", "middle", "root"]);
    }

    #[test]
    fn a_failing_handler_does_not_stop_its_siblings() {
        let owner = key(1);
        let stack = FixedStack(vec![owner]);
        let mut bus = EventBus::new();
        let second_ran = Rc::new(RefCell::new(false));
        let second_ran_clone = second_ran.clone();
        bus.register(owner, "go", Scope::Bubble, |_| Err("boom".to_string()));
        bus.register(owner, "go", Scope::Bubble, move |_| {
            *second_ran_clone.borrow_mut() = true;
            Ok(HandlerOutcome::Continue)
        });
        let failures = bus.dispatch(&Event::new("go"), &stack);
        assert_eq!(failures.len(), 1);
        assert!(*second_ran.borrow());
    }
}
