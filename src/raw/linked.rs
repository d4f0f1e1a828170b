//! The linked node representation: one arena record per node.
//!
//! Everything the representation needs lives here, like [`packed`] owns
//! its `Slot`: the [`NodeId`] handle, the slab-style arena behind it, and
//! the [`LinkedNodes`] store. Handles are `Option<NodeId>`, so nil is the
//! absent value and costs no extra bits; removing a node vacates its slot
//! for reuse by a later insert.
//!
//! [`packed`]: super::packed

use alloc::vec::Vec;
use core::num::NonZero;

use super::store::{Augment, Color, ColorStore, Height, HeightStore, NodeStore};

// The delete algorithms vacate one slot per call and the arena must keep
// serving handles at its high-water mark, so the slot count is bounded
// only by the handle encoding. Small under test so the exhaustion panic
// is actually reachable.
#[cfg(test)]
const MAX_SLOTS: usize = 4096;
#[cfg(not(test))]
const MAX_SLOTS: usize = (u32::MAX - 1) as usize;

/// Handle of a linked-store node.
///
/// The slot index is stored one's-complemented in a `NonZero<u32>`:
/// index 0 becomes `!0`, and no representable index complements to zero
/// because the arena never grows to `u32::MAX` slots. `Option<NodeId>` is
/// therefore the same four bytes as the bare index, with `None` serving
/// as the linked representation's nil.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct NodeId(NonZero<u32>);

impl NodeId {
    const fn from_index(index: usize) -> Self {
        assert!(index < u32::MAX as usize, "`NodeId::from_index()` - index does not fit the handle encoding!");
        #[allow(clippy::cast_possible_truncation)]
        let bits = !(index as u32);
        // Complementing anything below u32::MAX cannot produce zero.
        Self(NonZero::new(bits).unwrap())
    }

    const fn index(self) -> usize {
        (!self.0.get()) as usize
    }
}

/// One arena slot. A vacant slot remembers the next vacant slot, so the
/// free list threads through the storage itself and both `free` and the
/// reuse path of `alloc` are O(1) swaps.
#[derive(Clone)]
enum Entry<T> {
    Occupied(T),
    Vacant(Option<NodeId>),
}

#[derive(Clone)]
struct Arena<T> {
    slots: Vec<Entry<T>>,
    /// Head of the vacant chain.
    next_free: Option<NodeId>,
    live: usize,
}

impl<T> Arena<T> {
    const fn new() -> Self {
        Self {
            slots: Vec::new(),
            next_free: None,
            live: 0,
        }
    }

    const fn len(&self) -> usize {
        self.live
    }

    fn alloc(&mut self, element: T) -> NodeId {
        let id = if let Some(id) = self.next_free {
            let slot = &mut self.slots[id.index()];
            match *slot {
                Entry::Vacant(next) => self.next_free = next,
                Entry::Occupied(_) => unreachable!("`Arena::alloc()` - free list reached a live slot!"),
            }
            *slot = Entry::Occupied(element);
            id
        } else {
            assert!(self.slots.len() < MAX_SLOTS, "`Arena::alloc()` - no slots left (limit {MAX_SLOTS})!");
            self.slots.push(Entry::Occupied(element));
            NodeId::from_index(self.slots.len() - 1)
        };
        self.live += 1;
        id
    }

    #[inline]
    fn get(&self, id: NodeId) -> &T {
        match &self.slots[id.index()] {
            Entry::Occupied(element) => element,
            Entry::Vacant(_) => panic!("`Arena::get()` - slot {} is vacant!", id.index()),
        }
    }

    #[inline]
    fn get_mut(&mut self, id: NodeId) -> &mut T {
        match &mut self.slots[id.index()] {
            Entry::Occupied(element) => element,
            Entry::Vacant(_) => panic!("`Arena::get_mut()` - slot {} is vacant!", id.index()),
        }
    }

    fn free(&mut self, id: NodeId) {
        let slot = &mut self.slots[id.index()];
        match slot {
            Entry::Occupied(_) => {
                *slot = Entry::Vacant(self.next_free);
                self.next_free = Some(id);
                self.live -= 1;
            }
            Entry::Vacant(_) => panic!("`Arena::free()` - slot {} is already vacant!", id.index()),
        }
    }

    fn clear(&mut self) {
        self.slots.clear();
        self.next_free = None;
        self.live = 0;
    }
}

/// The linked node representation, backed by the slab arena above.
#[derive(Clone)]
pub struct LinkedNodes<K, A = ()> {
    arena: Arena<LinkedNode<K, A>>,
}

#[derive(Clone)]
struct LinkedNode<K, A> {
    key: K,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
    aug: A,
}

impl<K, A> LinkedNodes<K, A> {
    #[must_use]
    pub const fn new() -> Self {
        Self { arena: Arena::new() }
    }

    /// The number of live nodes.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.arena.len()
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    fn node(&self, n: Option<NodeId>) -> &LinkedNode<K, A> {
        self.arena.get(n.expect("`LinkedNodes` - accessed the nil handle!"))
    }

    #[inline]
    fn node_mut(&mut self, n: Option<NodeId>) -> &mut LinkedNode<K, A> {
        self.arena.get_mut(n.expect("`LinkedNodes` - accessed the nil handle!"))
    }
}

impl<K, A> Default for LinkedNodes<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A: Augment> NodeStore<K> for LinkedNodes<K, A> {
    type Ref = Option<NodeId>;

    const NIL: Option<NodeId> = None;

    #[inline]
    fn left(&self, n: Self::Ref) -> Self::Ref {
        self.node(n).left
    }

    #[inline]
    fn right(&self, n: Self::Ref) -> Self::Ref {
        self.node(n).right
    }

    #[inline]
    fn parent(&self, n: Self::Ref) -> Self::Ref {
        self.node(n).parent
    }

    #[inline]
    fn set_left(&mut self, n: Self::Ref, child: Self::Ref) {
        self.node_mut(n).left = child;
    }

    #[inline]
    fn set_right(&mut self, n: Self::Ref, child: Self::Ref) {
        self.node_mut(n).right = child;
    }

    #[inline]
    fn set_parent(&mut self, n: Self::Ref, parent: Self::Ref) {
        self.node_mut(n).parent = parent;
    }

    #[inline]
    fn key(&self, n: Self::Ref) -> &K {
        &self.node(n).key
    }

    fn build(&mut self, key: K) -> Self::Ref {
        Some(self.arena.alloc(LinkedNode {
            key,
            left: None,
            right: None,
            parent: None,
            aug: A::fresh(),
        }))
    }

    fn discard(&mut self, n: Self::Ref) {
        self.arena.free(n.expect("`LinkedNodes::discard()` - discarded the nil handle!"));
    }

    fn clear(&mut self) {
        self.arena.clear();
    }
}

impl<K> HeightStore<K> for LinkedNodes<K, Height> {
    #[inline]
    fn height(&self, n: Self::Ref) -> i32 {
        self.node(n).aug.0
    }

    #[inline]
    fn set_height(&mut self, n: Self::Ref, height: i32) {
        self.node_mut(n).aug = Height(height);
    }
}

impl<K> ColorStore<K> for LinkedNodes<K, Color> {
    #[inline]
    fn color(&self, n: Self::Ref) -> Color {
        self.node(n).aug
    }

    #[inline]
    fn set_color(&mut self, n: Self::Ref, color: Color) {
        self.node_mut(n).aug = color;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use proptest::prelude::*;
    use static_assertions::assert_eq_size;

    use super::*;

    // The whole point of the complement encoding: nil rides in the niche.
    assert_eq_size!(Option<NodeId>, u32);

    #[test]
    fn complement_encoding_round_trips() {
        for index in [0, 1, 2, MAX_SLOTS - 1] {
            let id = NodeId::from_index(index);
            assert_eq!(id.index(), index);
        }
        // Index 0 must not collide with the forbidden zero bit pattern.
        assert_eq!(NodeId::from_index(0).0.get(), u32::MAX);
    }

    #[test]
    fn build_starts_detached() {
        let mut nodes: LinkedNodes<i32> = LinkedNodes::new();
        let n = nodes.build(7);
        assert!(!<LinkedNodes<i32>>::is_nil(n));
        assert_eq!(nodes.key(n), &7);
        assert_eq!(nodes.left(n), None);
        assert_eq!(nodes.right(n), None);
        assert_eq!(nodes.parent(n), None);
    }

    #[test]
    fn fresh_annotations() {
        let mut heights: LinkedNodes<i32, Height> = LinkedNodes::new();
        let n = heights.build(1);
        assert_eq!(heights.height(n), 1);

        let mut colors: LinkedNodes<i32, Color> = LinkedNodes::new();
        let n = colors.build(1);
        assert_eq!(colors.color(n), Color::Red);
    }

    #[test]
    fn vacated_slots_are_reused_in_lifo_order() {
        let mut nodes: LinkedNodes<i32> = LinkedNodes::new();
        let a = nodes.build(1);
        let b = nodes.build(2);
        let c = nodes.build(3);
        nodes.discard(a);
        nodes.discard(c);
        assert_eq!(nodes.len(), 1);

        // The vacant chain heads at the most recent discard.
        assert_eq!(nodes.build(30), c);
        assert_eq!(nodes.build(10), a);
        assert_eq!(nodes.len(), 3);
        assert_eq!(nodes.key(b), &2);
        assert_eq!(nodes.key(c), &30);
    }

    #[test]
    #[should_panic(expected = "`Arena::free()` - slot 0 is already vacant!")]
    fn double_discard_panics() {
        let mut nodes: LinkedNodes<i32> = LinkedNodes::new();
        let a = nodes.build(1);
        nodes.discard(a);
        nodes.discard(a);
    }

    #[test]
    #[should_panic(expected = "no slots left")]
    fn exhausted_arena_panics() {
        let mut nodes: LinkedNodes<u32> = LinkedNodes::new();
        for key in 0..=MAX_SLOTS as u32 {
            nodes.build(key);
        }
    }

    #[derive(Clone, Debug)]
    enum Churn {
        Build(i32),
        Discard(usize),
        Clear,
    }

    fn churn_strategy() -> impl Strategy<Value = Churn> {
        prop_oneof![
            6 => any::<i32>().prop_map(Churn::Build),
            3 => any::<usize>().prop_map(Churn::Discard),
            1 => Just(Churn::Clear),
        ]
    }

    proptest! {
        /// Drives the store through arbitrary build/discard/clear churn
        /// while a handle-to-key ledger plays the oracle: every live
        /// handle must keep answering with its key, whatever slot reuse
        /// happened underneath.
        #[test]
        fn live_handles_survive_churn(ops in prop::collection::vec(churn_strategy(), 0..256)) {
            let mut ledger: alloc::vec::Vec<(Option<NodeId>, i32)> = alloc::vec::Vec::new();
            let mut nodes: LinkedNodes<i32> = LinkedNodes::new();

            for op in ops {
                match op {
                    Churn::Build(key) => {
                        ledger.push((nodes.build(key), key));
                    }
                    Churn::Discard(which) => {
                        if ledger.is_empty() {
                            continue;
                        }
                        let (handle, _) = ledger.swap_remove(which % ledger.len());
                        nodes.discard(handle);
                    }
                    Churn::Clear => {
                        nodes.clear();
                        ledger.clear();
                    }
                }

                prop_assert_eq!(nodes.len(), ledger.len());
                prop_assert_eq!(nodes.is_empty(), ledger.is_empty());
                for &(handle, key) in &ledger {
                    prop_assert_eq!(*nodes.key(handle), key);
                }
            }
        }
    }
}
