//! The scoped memory store (§4.1). A process-lifetime typed map keyed by
//! opaque reference ids, owned exclusively by one [`crate::runtime::ScriptRuntime`].
//!
//! Type erasure mirrors the teacher's chiplet-memory split between an
//! interface (here, the public methods) and a boxed cell: values are stored
//! behind `Box<dyn Any>` and downcast on read, so `MemoryStore` itself stays
//! non-generic and can hold references of unrelated types side by side.

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;

use indexmap::IndexMap;

use crate::key::BlockKey;

/// A tag identifying what kind of thing a reference holds, e.g.
/// `"metric:reps"`, `"timer:is_running"`, `"history:span"`. Distinct from the
/// static Rust type carried by [`MemoryRef<T>`]; several different tags may
/// share the same underlying `T`.
pub type MemoryType = &'static str;

/// Who allocated a reference: a specific block, or the runtime itself for
/// process-global state that outlives any single block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Owner {
    Runtime,
    Block(BlockKey),
}

impl fmt::Display for Owner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Owner::Runtime => write!(f, "runtime"),
            Owner::Block(key) => write!(f, "{key}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Private,
    Inherited,
}

impl Default for Visibility {
    fn default() -> Self {
        Visibility::Private
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryId(u64);

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mem:{}", self.0)
    }
}

/// A type-erased view of a reference, as returned by [`MemoryStore::search`].
/// Recover a typed handle with [`AnyRef::typed`] once the caller knows (from
/// `type_tag`, by convention) what `T` the cell holds.
#[derive(Debug, Clone, Copy)]
pub struct AnyRef {
    pub id: MemoryId,
    pub type_tag: MemoryType,
    pub owner: Owner,
    pub visibility: Visibility,
}

impl AnyRef {
    pub fn typed<T>(&self) -> MemoryRef<T> {
        MemoryRef {
            id: self.id,
            type_tag: self.type_tag,
            owner: self.owner,
            visibility: self.visibility,
            _marker: PhantomData,
        }
    }
}

/// A typed handle to a memory cell. Carries everything needed to prove
/// ownership on write: the store validates a `set` by comparing the caller's
/// claimed owner against the cell's recorded owner.
pub struct MemoryRef<T> {
    pub id: MemoryId,
    pub type_tag: MemoryType,
    pub owner: Owner,
    pub visibility: Visibility,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for MemoryRef<T> {
    fn clone(&self) -> Self {
        *self
    }
}
impl<T> Copy for MemoryRef<T> {}

impl<T> fmt::Debug for MemoryRef<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryRef")
            .field("id", &self.id)
            .field("type_tag", &self.type_tag)
            .field("owner", &self.owner)
            .field("visibility", &self.visibility)
            .finish()
    }
}

impl<T> From<MemoryRef<T>> for AnyRef {
    fn from(r: MemoryRef<T>) -> Self {
        AnyRef { id: r.id, type_tag: r.type_tag, owner: r.owner, visibility: r.visibility }
    }
}

/// Criteria for [`MemoryStore::search`]. `None` fields match any value.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchCriteria {
    pub type_tag: Option<MemoryType>,
    pub owner: Option<Owner>,
    pub id: Option<MemoryId>,
    pub visibility: Option<Visibility>,
}

impl SearchCriteria {
    pub fn of_type(type_tag: MemoryType) -> Self {
        SearchCriteria { type_tag: Some(type_tag), ..Default::default() }
    }

    pub fn owned_by(owner: Owner) -> Self {
        SearchCriteria { owner: Some(owner), ..Default::default() }
    }

    pub fn with_visibility(mut self, visibility: Visibility) -> Self {
        self.visibility = Some(visibility);
        self
    }

    pub fn with_owner(mut self, owner: Owner) -> Self {
        self.owner = Some(owner);
        self
    }

    fn matches(&self, id: MemoryId, cell: &Cell) -> bool {
        self.type_tag.is_none_or(|t| t == cell.type_tag)
            && self.owner.is_none_or(|o| o == cell.owner)
            && self.id.is_none_or(|i| i == id)
            && self.visibility.is_none_or(|v| v == cell.visibility)
    }
}

struct Cell {
    type_tag: MemoryType,
    owner: Owner,
    visibility: Visibility,
    value: Box<dyn Any>,
}

pub struct MemoryChange<'a> {
    pub id: MemoryId,
    pub type_tag: MemoryType,
    pub owner: Owner,
    pub new_value: &'a dyn Any,
    pub old_value: &'a dyn Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Subscriber = Box<dyn FnMut(&MemoryChange)>;

/// The store itself. Single-threaded: owned by one [`crate::runtime::ScriptRuntime`]
/// and mutated only from its event-processing loop.
#[derive(Default)]
pub struct MemoryStore {
    cells: IndexMap<MemoryId, Cell>,
    next_id: u64,
    subscribers: HashMap<SubscriptionId, Subscriber>,
    next_subscription: u64,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn allocate<T: 'static>(
        &mut self,
        type_tag: MemoryType,
        owner: Owner,
        initial: T,
        visibility: Visibility,
    ) -> MemoryRef<T> {
        self.next_id += 1;
        let id = MemoryId(self.next_id);
        self.cells.insert(id, Cell { type_tag, owner, visibility, value: Box::new(initial) });
        MemoryRef { id, type_tag, owner, visibility, _marker: PhantomData }
    }

    pub fn get<T: Clone + 'static>(&self, r: &MemoryRef<T>) -> Option<T> {
        self.cells.get(&r.id).and_then(|cell| cell.value.downcast_ref::<T>()).cloned()
    }

    pub fn get_any<T: Clone + 'static>(&self, r: &AnyRef) -> Option<T> {
        self.get(&r.typed::<T>())
    }

    /// Writes a new value through `r`, firing subscribers synchronously with
    /// the old and new values. A no-op if `r` has been released.
    pub fn set<T: Clone + 'static>(&mut self, r: &MemoryRef<T>, value: T) {
        let Some(cell) = self.cells.get_mut(&r.id) else { return };
        let old: Box<dyn Any> = std::mem::replace(&mut cell.value, Box::new(value.clone()));
        let type_tag = cell.type_tag;
        let owner = cell.owner;
        let new_ref = cell.value.as_ref();
        for sub in self.subscribers.values_mut() {
            sub(&MemoryChange {
                id: r.id,
                type_tag,
                owner,
                new_value: new_ref,
                old_value: old.as_ref(),
            });
        }
    }

    /// Invalidates `r`. Idempotent: releasing twice is a no-op.
    pub fn release<T>(&mut self, r: &MemoryRef<T>) {
        self.cells.shift_remove(&r.id);
    }

    pub fn release_any(&mut self, r: AnyRef) {
        self.cells.shift_remove(&r.id);
    }

    /// Releases every reference owned by `owner`. Called from
    /// [`crate::block::Block::dispose`].
    pub fn release_owned_by(&mut self, owner: BlockKey) {
        self.cells.retain(|_, cell| cell.owner != Owner::Block(owner));
    }

    /// Linear scan matching `criteria`; results preserve insertion order, so
    /// the last element is the most recently allocated match ("latest").
    pub fn search(&self, criteria: SearchCriteria) -> Vec<AnyRef> {
        self.cells
            .iter()
            .filter(|(id, cell)| criteria.matches(**id, cell))
            .map(|(id, cell)| AnyRef {
                id: *id,
                type_tag: cell.type_tag,
                owner: cell.owner,
                visibility: cell.visibility,
            })
            .collect()
    }

    /// Convenience over [`Self::search`]: the most recently allocated match,
    /// if any, already downcast to `T`.
    pub fn latest<T: Clone + 'static>(&self, criteria: SearchCriteria) -> Option<T> {
        self.search(criteria).last().and_then(|r| self.get_any(&r))
    }

    pub fn subscribe(&mut self, cb: impl FnMut(&MemoryChange) + 'static) -> SubscriptionId {
        self.next_subscription += 1;
        let id = SubscriptionId(self.next_subscription);
        self.subscribers.insert(id, Box::new(cb));
        id
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscribers.remove(&id);
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}
