//! # ObjectId — Generational Handles into the Object Tree
//!
//! An [`ObjectId`] is a lightweight, copyable handle to an object owned by an
//! [`ObjectTree`](crate::tree::ObjectTree). It never dangles: the tree stores
//! objects in slot storage, and every handle carries the **generation** of the
//! slot it was minted from.
//!
//! ## Why generations
//!
//! Handles outlive the objects they point at all the time — a subscription
//! list, a saved "current target", a parent field. With bare indices this goes
//! wrong as soon as a slot is recycled:
//!
//! ```text
//! 1. Spawn object in slot #3
//! 2. Keep a handle: saved = 3
//! 3. Despawn it; slot #3 goes on the free list
//! 4. Spawn something new — it lands in slot #3
//! 5. Use `saved` — it now points at a stranger
//! ```
//!
//! Pairing the index with a generation counter fixes this. Recycling a slot
//! bumps its generation, so the stale handle no longer matches and every
//! lookup through it fails safely with `None`. This is the property the whole
//! messaging layer leans on: a callable bound to a destroyed object resolves
//! to nothing instead of invoking through freed state.
//!
//! The layout is deliberately plain — two `u32` fields, no bit packing.

use std::fmt;

/// A handle to an object in an [`ObjectTree`](crate::tree::ObjectTree).
///
/// Handles are minted by [`ObjectTree::spawn`](crate::tree::ObjectTree::spawn)
/// and friends, and are valid only for the tree that produced them, only while
/// the generation matches. A stale handle is harmless: lookups return `None`.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectId {
    /// Slot index. Recycled when the object is despawned.
    pub(crate) index: u32,
    /// Generation of the slot at mint time. A slot's generation is bumped on
    /// every despawn, so this detects recycled slots.
    pub(crate) generation: u32,
}

impl ObjectId {
    /// Raw slot index. Intended for diagnostics output, not lookups.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Generation this handle was minted with.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectId({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Hands out slot indices and tracks which handles are still live.
///
/// ```text
/// generations: [0, 2, 0, 1]   ← current generation of every slot ever used
/// free:        [1]             ← slots waiting to be recycled
/// next:        4               ← first never-used index
/// ```
///
/// Minting prefers the free list; despawning bumps the slot's generation and
/// returns the index to the free list.
pub(crate) struct HandleAllocator {
    /// Current generation per slot, indexed by `ObjectId::index`.
    generations: Vec<u32>,
    /// Recycled slot indices available for reuse.
    free: Vec<u32>,
    /// First index that has never been handed out.
    next: u32,
}

impl HandleAllocator {
    pub fn new() -> Self {
        Self {
            generations: Vec::new(),
            free: Vec::new(),
            next: 0,
        }
    }

    /// Mint a handle, recycling a freed slot when one is available.
    pub fn allocate(&mut self) -> ObjectId {
        if let Some(index) = self.free.pop() {
            // The generation was already bumped when the slot was freed.
            ObjectId {
                index,
                generation: self.generations[index as usize],
            }
        } else {
            let index = self.next;
            self.next += 1;
            self.generations.push(0);
            ObjectId {
                index,
                generation: 0,
            }
        }
    }

    /// Retire a handle, bumping the slot generation so every copy of it goes
    /// stale at once.
    ///
    /// Returns `false` if the handle was already stale.
    pub fn deallocate(&mut self, id: ObjectId) -> bool {
        let idx = id.index as usize;
        if idx < self.generations.len() && self.generations[idx] == id.generation {
            self.generations[idx] += 1;
            self.free.push(id.index);
            true
        } else {
            false
        }
    }

    /// Whether the handle still refers to a live object.
    pub fn is_alive(&self, id: ObjectId) -> bool {
        let idx = id.index as usize;
        idx < self.generations.len() && self.generations[idx] == id.generation
    }

    /// Current generation of a slot, if it has ever been handed out. An
    /// occupied slot's live handle is `(index, generation_of(index))`.
    pub(crate) fn generation_of(&self, index: u32) -> Option<u32> {
        self.generations.get(index as usize).copied()
    }

    /// Number of currently live objects.
    pub fn alive_count(&self) -> usize {
        (self.next as usize) - self.free.len()
    }

    /// Number of recyclable slots.
    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn free_count(&self) -> usize {
        self.free.len()
    }

    /// Total number of slots ever handed out.
    #[cfg(any(feature = "diagnostics", test))]
    pub(crate) fn total_slots(&self) -> u32 {
        self.next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_handles_are_sequential() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        let b = alloc.allocate();
        assert_eq!(a.index, 0);
        assert_eq!(b.index, 1);
        assert_eq!(a.generation, 0);
        assert_eq!(b.generation, 0);
    }

    #[test]
    fn recycling_bumps_the_generation() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.deallocate(a));
        let reused = alloc.allocate();
        assert_eq!(reused.index, 0);
        assert_eq!(reused.generation, 1);
        assert_ne!(a, reused);
    }

    #[test]
    fn stale_handles_are_detected() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.is_alive(a));
        alloc.deallocate(a);
        assert!(!alloc.is_alive(a));
        // Recycle the slot — the old handle must stay dead.
        let _b = alloc.allocate();
        assert!(!alloc.is_alive(a));
    }

    #[test]
    fn double_deallocate_is_refused() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        assert!(alloc.deallocate(a));
        assert!(!alloc.deallocate(a));
        assert_eq!(alloc.free_count(), 1);
    }

    #[test]
    fn alive_count_tracks_churn() {
        let mut alloc = HandleAllocator::new();
        let a = alloc.allocate();
        let _b = alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        alloc.deallocate(a);
        assert_eq!(alloc.alive_count(), 1);
        alloc.allocate();
        assert_eq!(alloc.alive_count(), 2);
        assert_eq!(alloc.total_slots(), 2);
    }
}
