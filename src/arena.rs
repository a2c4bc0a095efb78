use std::fmt;
use std::mem;

use crate::index::{DefaultIx, IndexType};
use crate::node::Node;
use crate::sublist::Sublist;

/// Position of a sublist in the arena of its set.
///
/// Only meaningful for the set that allocated it; a released handle may be handed out
/// again for an unrelated list.
#[derive(Copy, Clone, Default, PartialEq, PartialOrd, Eq, Ord, Hash)]
pub struct SlotId<Ix = DefaultIx>(Ix);

impl<Ix: IndexType> SlotId<Ix> {
    #[inline]
    pub fn new(x: usize) -> Self {
        SlotId(IndexType::new(x))
    }

    #[inline]
    pub fn index(self) -> usize {
        self.0.index()
    }

    /// First handle past the arena's capacity.
    #[inline]
    pub fn end() -> Self {
        SlotId(IndexType::max())
    }
}

impl<Ix: fmt::Debug> fmt::Debug for SlotId<Ix> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "slot#{:?}", self.0)
    }
}

/// Slot storage for every sublist of a set, with a free-list of released slots.
#[derive(Debug, Clone)]
pub(crate) struct Arena<P, N, T, Ix> {
    /// Sublists addressed by `SlotId`
    slots: Vec<Sublist<P, N, T, Ix>>,
    /// Released slots waiting for reuse
    free: Vec<SlotId<Ix>>,
}

impl<P, N, T, Ix> Default for Arena<P, N, T, Ix> {
    fn default() -> Self {
        Arena {
            slots: Vec::new(),
            free: Vec::new(),
        }
    }
}

impl<P, N, T, Ix> Arena<P, N, T, Ix>
where
    Ix: IndexType,
{
    /// Hand out an empty slot, reusing a released one when possible.
    ///
    /// # Panics
    ///
    /// This method panics when the arena is at the maximum number of slots for its index
    pub fn alloc(&mut self) -> SlotId<Ix> {
        if let Some(slot) = self.free.pop() {
            debug_assert!(self.slots[slot.index()].is_empty());
            return slot;
        }
        let slot = SlotId::new(self.slots.len());
        // check for max capacity, except if we use usize
        assert!(
            <Ix as IndexType>::max().index() == !0 || SlotId::end() != slot,
            "Reached maximum number of slots"
        );
        self.slots.push(Sublist::default());
        slot
    }

    /// Allocate a slot already holding `nodes`.
    pub fn alloc_with(&mut self, nodes: Vec<Node<P, N, T, Ix>>) -> SlotId<Ix> {
        let slot = self.alloc();
        self.slots[slot.index()] = Sublist::from_nodes(nodes);
        slot
    }

    /// Empty the slot, returning what it held, and queue it for reuse.
    pub fn release(&mut self, slot: SlotId<Ix>) -> Sublist<P, N, T, Ix> {
        let list = mem::take(&mut self.slots[slot.index()]);
        self.free.push(slot);
        list
    }

    pub fn get(&self, slot: SlotId<Ix>) -> &Sublist<P, N, T, Ix> {
        &self.slots[slot.index()]
    }

    pub fn get_mut(&mut self, slot: SlotId<Ix>) -> &mut Sublist<P, N, T, Ix> {
        &mut self.slots[slot.index()]
    }

    /// Number of slots currently handed out.
    pub fn live(&self) -> usize {
        self.slots.len() - self.free.len()
    }

    pub fn clear(&mut self) {
        self.slots.clear();
        self.free.clear();
    }
}
