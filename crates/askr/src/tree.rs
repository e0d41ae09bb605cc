//! # ObjectTree — The Parent-Owned Object Hierarchy
//!
//! The [`ObjectTree`] owns every game object. Objects form a forest: each node
//! has at most one parent and an ordered list of children, and destroying a
//! node destroys its whole subtree. Code outside the tree holds only
//! [`ObjectId`] handles, which go stale the moment the object they point at is
//! despawned.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────────────────────────────────────────────┐
//! │ ObjectTree                                         │
//! │                                                    │
//! │  HandleAllocator: mints ids, detects stale ones    │
//! │                                                    │
//! │  slots: Vec<Option<Node>>                          │
//! │    Node {                                          │
//! │      object:        Box<dyn GameObject>            │
//! │      parent:        Option<ObjectId>               │
//! │      children:      Vec<ObjectId>   (ordered)      │
//! │      subscriptions: channel → Callable             │
//! │    }                                               │
//! └────────────────────────────────────────────────────┘
//! ```
//!
//! Every node records the channels it is subscribed to, so the despawn
//! cascade can withdraw each object from the
//! [`MessageBus`](crate::bus::MessageBus) before its slot is freed. That
//! ordering is the load-bearing safety property of the runtime: the bus must
//! never be left holding a callable bound to a freed object, and a destroyed
//! subtree must never receive another message.
//!
//! ## Ownership discipline
//!
//! The tree is the single owner of node storage. "Ownership transfer" in the
//! API ([`release`](ObjectTree::release)) therefore means transfer of
//! *cascade responsibility*: the node becomes a parentless root that no
//! destructor cascade will reach until the caller despawns it (or gives it a
//! new parent).
//!
//! ## Comparison
//!
//! - **Godot's scene tree**: same shape — parent-owned nodes, cascading
//!   `queue_free`, signals auto-disconnected on destruction.
//! - **ECS worlds (hecs, bevy_ecs)**: flat storage with hierarchy bolted on
//!   as components. Here the hierarchy *is* the storage model, which keeps
//!   the cross-reference invariant (child's parent pointer agrees with the
//!   parent's child list) inside one type.

use std::collections::HashMap;

use crate::bus::{MessageBus, Payload};
use crate::callable::Callable;
use crate::handle::{HandleAllocator, ObjectId};
use crate::object::GameObject;

/// One slot's worth of tree state.
struct Node {
    object: Box<dyn GameObject>,
    parent: Option<ObjectId>,
    /// Attachment order — this is the order child iteration and message
    /// fan-out bookkeeping observe.
    children: Vec<ObjectId>,
    /// Channel name → the one callable this object subscribed with. At most
    /// one subscription per channel per object.
    subscriptions: HashMap<String, Callable<Payload>>,
}

/// Owner of all game objects and their parent/child structure.
pub struct ObjectTree {
    allocator: HandleAllocator,
    slots: Vec<Option<Node>>,
    /// Objects spawned since the last stats snapshot.
    #[cfg(feature = "diagnostics")]
    spawned_this_tick: u32,
    /// Objects despawned since the last stats snapshot.
    #[cfg(feature = "diagnostics")]
    despawned_this_tick: u32,
}

/// Snapshot of tree storage health, for diagnostics overlays.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy)]
pub struct TreeStats {
    pub total_slots: u32,
    pub free_slots: usize,
    pub alive: usize,
    pub spawned_this_tick: u32,
    pub despawned_this_tick: u32,
}

impl ObjectTree {
    pub fn new() -> Self {
        Self {
            allocator: HandleAllocator::new(),
            slots: Vec::new(),
            #[cfg(feature = "diagnostics")]
            spawned_this_tick: 0,
            #[cfg(feature = "diagnostics")]
            despawned_this_tick: 0,
        }
    }

    // ── Spawning ─────────────────────────────────────────────────────

    /// Spawn a parentless root object. The tree owns it; the returned handle
    /// does not.
    pub fn spawn<T: GameObject>(&mut self, object: T) -> ObjectId {
        let id = self.allocator.allocate();
        let node = Node {
            object: Box::new(object),
            parent: None,
            children: Vec::new(),
            subscriptions: HashMap::new(),
        };
        let idx = id.index() as usize;
        if idx == self.slots.len() {
            self.slots.push(Some(node));
        } else {
            self.slots[idx] = Some(node);
        }
        #[cfg(feature = "diagnostics")]
        {
            self.spawned_this_tick += 1;
        }
        log::trace!("Spawned {} as {id}", self.slots[idx].as_ref().unwrap().object.kind());
        id
    }

    /// Spawn an object as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not alive.
    pub fn spawn_child<T: GameObject>(&mut self, parent: ObjectId, object: T) -> ObjectId {
        assert!(
            self.allocator.is_alive(parent),
            "Cannot spawn a child on dead object {parent}"
        );
        let child = self.spawn(object);
        self.node_mut(child).unwrap().parent = Some(parent);
        self.node_mut(parent).unwrap().children.push(child);
        child
    }

    /// Spawn a default-constructed `T` as the last child of `parent`.
    ///
    /// # Panics
    ///
    /// Panics if `parent` is not alive.
    pub fn create_child<T: GameObject + Default>(&mut self, parent: ObjectId) -> ObjectId {
        self.spawn_child(parent, T::default())
    }

    // ── Lookup ───────────────────────────────────────────────────────

    /// Whether the handle still points at a live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        self.allocator.is_alive(id)
    }

    /// Number of live objects.
    pub fn object_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// Typed access to the object behind `id`.
    ///
    /// Returns `None` if the handle is stale or the object is not a `T`.
    pub fn get<T: GameObject>(&self, id: ObjectId) -> Option<&T> {
        self.node(id)?.object.as_any().downcast_ref::<T>()
    }

    /// Typed mutable access to the object behind `id`.
    ///
    /// Returns `None` if the handle is stale or the object is not a `T`.
    pub fn get_mut<T: GameObject>(&mut self, id: ObjectId) -> Option<&mut T> {
        self.node_mut(id)?.object.as_any_mut().downcast_mut::<T>()
    }

    /// Untyped access to the object behind `id`.
    pub fn object(&self, id: ObjectId) -> Option<&dyn GameObject> {
        Some(self.node(id)?.object.as_ref())
    }

    /// Untyped mutable access to the object behind `id`.
    pub fn object_mut(&mut self, id: ObjectId) -> Option<&mut dyn GameObject> {
        Some(self.node_mut(id)?.object.as_mut())
    }

    // ── Hierarchy ────────────────────────────────────────────────────

    /// The parent of `id`, or `None` for roots and stale handles.
    pub fn parent(&self, id: ObjectId) -> Option<ObjectId> {
        self.node(id)?.parent
    }

    /// Direct children of `id`, in attachment order. Stale handles yield an
    /// empty slice. The view is not recursive; walk it yourself for deep
    /// traversals.
    pub fn children(&self, id: ObjectId) -> &[ObjectId] {
        self.node(id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Move `id` under `new_parent`, or detach it into a root with `None`.
    ///
    /// Reattaching appends to the end of the new parent's child list. Setting
    /// the current parent again is a no-op that preserves sibling order. The
    /// old parent's list, the new parent's list, and the node's own parent
    /// field are updated together — no observable intermediate state.
    ///
    /// # Panics
    ///
    /// Panics if `id` or `new_parent` is stale, if `new_parent == id`, or if
    /// `new_parent` is a descendant of `id` (the cascade would never
    /// terminate on a cyclic "tree").
    pub fn set_parent(&mut self, id: ObjectId, new_parent: Option<ObjectId>) {
        assert!(
            self.allocator.is_alive(id),
            "Cannot reparent dead object {id}"
        );
        if let Some(p) = new_parent {
            assert!(
                self.allocator.is_alive(p),
                "Cannot reparent {id} under dead object {p}"
            );
            assert!(p != id, "Cannot parent {id} under itself");
            assert!(
                !self.is_ancestor_of(id, p),
                "Cannot parent {id} under its own descendant {p}"
            );
        }

        let current = self.node(id).unwrap().parent;
        if current == new_parent {
            return;
        }

        if let Some(old) = current {
            self.node_mut(old).unwrap().children.retain(|&c| c != id);
        }
        if let Some(new) = new_parent {
            self.node_mut(new).unwrap().children.push(id);
        }
        self.node_mut(id).unwrap().parent = new_parent;
    }

    /// Detach `id` from its parent, making it a root the caller is now
    /// responsible for: no despawn cascade will reach it until the caller
    /// despawns it directly or parents it somewhere else.
    ///
    /// Returns `false` (and does nothing) for stale handles.
    pub fn release(&mut self, id: ObjectId) -> bool {
        if !self.allocator.is_alive(id) {
            return false;
        }
        self.set_parent(id, None);
        true
    }

    // ── Despawning ───────────────────────────────────────────────────

    /// Destroy `id` and every descendant, depth-first, children before
    /// parents in attachment order.
    ///
    /// Each destroyed object is withdrawn from all of its bus channels before
    /// its slot is freed, and the root of the cascade is detached from its
    /// parent last — after this returns, no channel holds a callable into the
    /// destroyed subtree and no live child list mentions `id`.
    ///
    /// Returns `true` if `id` was alive and destroyed.
    pub fn despawn(&mut self, bus: &mut MessageBus, id: ObjectId) -> bool {
        if !self.allocator.is_alive(id) {
            return false;
        }
        let parent = self.node(id).unwrap().parent;
        self.despawn_subtree(bus, id);
        if let Some(p) = parent {
            self.node_mut(p).unwrap().children.retain(|&c| c != id);
        }
        true
    }

    /// Destroy every object in the tree.
    pub fn despawn_all(&mut self, bus: &mut MessageBus) {
        // Every live object sits under some root, so cascading from the
        // roots clears everything.
        let roots: Vec<ObjectId> = self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(idx, slot)| {
                let node = slot.as_ref()?;
                if node.parent.is_some() {
                    return None;
                }
                let index = idx as u32;
                let generation = self.allocator.generation_of(index)?;
                Some(ObjectId { index, generation })
            })
            .collect();
        for id in roots {
            self.despawn(bus, id);
        }
    }

    fn despawn_subtree(&mut self, bus: &mut MessageBus, id: ObjectId) {
        let children = self.node(id).unwrap().children.clone();
        for child in children {
            self.despawn_subtree(bus, child);
        }
        let node = self.slots[id.index() as usize].take().unwrap();
        for (channel, callable) in node.subscriptions {
            bus.drop_listener(&channel, &callable);
        }
        self.allocator.deallocate(id);
        #[cfg(feature = "diagnostics")]
        {
            self.despawned_this_tick += 1;
        }
        log::trace!("Despawned {} ({id})", node.object.kind());
    }

    // ── Subscription bookkeeping (used by MessageBus) ────────────────

    pub(crate) fn has_subscription(&self, id: ObjectId, channel: &str) -> bool {
        self.node(id)
            .is_some_and(|n| n.subscriptions.contains_key(channel))
    }

    pub(crate) fn record_subscription(
        &mut self,
        id: ObjectId,
        channel: &str,
        callable: Callable<Payload>,
    ) {
        self.node_mut(id)
            .expect("subscription recorded for dead object")
            .subscriptions
            .insert(channel.to_string(), callable);
    }

    pub(crate) fn take_subscription(
        &mut self,
        id: ObjectId,
        channel: &str,
    ) -> Option<Callable<Payload>> {
        self.node_mut(id)?.subscriptions.remove(channel)
    }

    // ── Diagnostics ──────────────────────────────────────────────────

    /// Storage stats since the last call; resets the per-tick counters.
    #[cfg(feature = "diagnostics")]
    pub fn stats(&mut self) -> TreeStats {
        let stats = TreeStats {
            total_slots: self.allocator.total_slots(),
            free_slots: self.allocator.free_count(),
            alive: self.allocator.alive_count(),
            spawned_this_tick: self.spawned_this_tick,
            despawned_this_tick: self.despawned_this_tick,
        };
        self.spawned_this_tick = 0;
        self.despawned_this_tick = 0;
        stats
    }

    // ── Internals ────────────────────────────────────────────────────

    fn node(&self, id: ObjectId) -> Option<&Node> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get(id.index() as usize)?.as_ref()
    }

    fn node_mut(&mut self, id: ObjectId) -> Option<&mut Node> {
        if !self.allocator.is_alive(id) {
            return None;
        }
        self.slots.get_mut(id.index() as usize)?.as_mut()
    }

    /// Whether `ancestor` appears on `id`'s parent chain.
    fn is_ancestor_of(&self, ancestor: ObjectId, mut id: ObjectId) -> bool {
        while let Some(p) = self.parent(id) {
            if p == ancestor {
                return true;
            }
            id = p;
        }
        false
    }
}

impl Default for ObjectTree {
    fn default() -> Self {
        Self::new()
    }
}
