use alloc::vec::Vec;

use super::store::{Augment, Color, ColorStore, Height, HeightStore, NodeStore};

/// Handle of an array-packed node: an index into the parallel columns.
///
/// The sentinel `-1` is the nil handle, so a handle fits in four bytes and
/// identity is integer equality.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(transparent)]
pub struct Slot(i32);

impl Slot {
    pub(crate) const NIL: Self = Self(-1);

    #[inline]
    #[allow(clippy::cast_sign_loss)]
    fn index(self) -> usize {
        debug_assert!(self.0 >= 0, "`Slot::index()` - nil slot!");
        self.0 as usize
    }
}

/// The array-packed node representation: parallel columns indexed by [`Slot`].
///
/// `build` appends one row across all columns. `discard` is deliberately a
/// no-op: rows of removed nodes are never reclaimed or reused, so a tree
/// that deletes heavily keeps the dead rows around until `clear`. Callers
/// that churn elements and care about the footprint should prefer
/// [`LinkedNodes`](super::linked::LinkedNodes).
#[derive(Clone)]
pub struct PackedNodes<K, A = ()> {
    keys: Vec<K>,
    lefts: Vec<Slot>,
    rights: Vec<Slot>,
    parents: Vec<Slot>,
    augs: Vec<A>,
}

impl<K, A> PackedNodes<K, A> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            keys: Vec::new(),
            lefts: Vec::new(),
            rights: Vec::new(),
            parents: Vec::new(),
            augs: Vec::new(),
        }
    }

    /// The number of rows ever built, dead ones included.
    #[must_use]
    pub fn rows(&self) -> usize {
        self.keys.len()
    }
}

impl<K, A> Default for PackedNodes<K, A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, A: Augment> NodeStore<K> for PackedNodes<K, A> {
    type Ref = Slot;

    const NIL: Slot = Slot::NIL;

    #[inline]
    fn left(&self, n: Slot) -> Slot {
        self.lefts[n.index()]
    }

    #[inline]
    fn right(&self, n: Slot) -> Slot {
        self.rights[n.index()]
    }

    #[inline]
    fn parent(&self, n: Slot) -> Slot {
        self.parents[n.index()]
    }

    #[inline]
    fn set_left(&mut self, n: Slot, child: Slot) {
        self.lefts[n.index()] = child;
    }

    #[inline]
    fn set_right(&mut self, n: Slot, child: Slot) {
        self.rights[n.index()] = child;
    }

    #[inline]
    fn set_parent(&mut self, n: Slot, parent: Slot) {
        self.parents[n.index()] = parent;
    }

    #[inline]
    fn key(&self, n: Slot) -> &K {
        &self.keys[n.index()]
    }

    fn build(&mut self, key: K) -> Slot {
        let row = i32::try_from(self.keys.len())
            .expect("`PackedNodes::build()` - store is at maximum capacity!");
        self.keys.push(key);
        self.lefts.push(Slot::NIL);
        self.rights.push(Slot::NIL);
        self.parents.push(Slot::NIL);
        self.augs.push(A::fresh());
        Slot(row)
    }

    fn discard(&mut self, _n: Slot) {
        // Rows are not reclaimed; the dead row just becomes unreachable.
    }

    fn clear(&mut self) {
        self.keys.clear();
        self.lefts.clear();
        self.rights.clear();
        self.parents.clear();
        self.augs.clear();
    }
}

impl<K> HeightStore<K> for PackedNodes<K, Height> {
    #[inline]
    fn height(&self, n: Slot) -> i32 {
        self.augs[n.index()].0
    }

    #[inline]
    fn set_height(&mut self, n: Slot, height: i32) {
        self.augs[n.index()] = Height(height);
    }
}

impl<K> ColorStore<K> for PackedNodes<K, Color> {
    #[inline]
    fn color(&self, n: Slot) -> Color {
        self.augs[n.index()]
    }

    #[inline]
    fn set_color(&mut self, n: Slot, color: Color) {
        self.augs[n.index()] = color;
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use super::*;

    #[test]
    fn nil_is_minus_one() {
        assert_eq!(Slot::NIL, Slot(-1));
        assert!(<PackedNodes<i32>>::is_nil(Slot::NIL));
        assert!(!<PackedNodes<i32>>::is_nil(Slot(0)));
    }

    #[test]
    fn build_appends_rows() {
        let mut nodes: PackedNodes<i32> = PackedNodes::new();
        let a = nodes.build(10);
        let b = nodes.build(20);
        assert_eq!(a, Slot(0));
        assert_eq!(b, Slot(1));
        assert_eq!(nodes.key(a), &10);
        assert_eq!(nodes.left(a), Slot::NIL);
        assert_eq!(nodes.parent(b), Slot::NIL);
    }

    #[test]
    fn discard_leaks_rows() {
        let mut nodes: PackedNodes<i32> = PackedNodes::new();
        let a = nodes.build(10);
        nodes.discard(a);
        // The row sticks around and a new build takes a fresh one.
        assert_eq!(nodes.rows(), 1);
        let b = nodes.build(30);
        assert_eq!(b, Slot(1));
        assert_eq!(nodes.rows(), 2);
    }
}
