use core::cmp::Ordering;
use core::fmt;

use alloc::string::String;

use crate::compare::{Comparator, FnComparator, Natural};
use crate::iter::Iter;
use crate::raw::avl;
use crate::raw::bst::{self, SearchResult};
use crate::raw::linked::LinkedNodes;
use crate::raw::packed::PackedNodes;
use crate::raw::store::{Height, HeightStore};
use crate::validate::{self, ValidateError};

/// An ordered set over a height-balanced (AVL) binary search tree.
///
/// Every node stores the height of its subtree and the heights of any two
/// sibling subtrees differ by at most one, so lookups, inserts, and
/// removals are `O(log n)` whatever the key order. Compared to
/// [`RbSet`](crate::RbSet) the balance is tighter: shallower searches, a
/// few more rotations on mutation.
///
/// # Examples
///
/// ```
/// use bonsai_tree::AvlSet;
///
/// let mut set = AvlSet::new();
/// for key in [1, 2, 3, 4, 5, 6, 7] {
///     set.insert(key);
/// }
/// // Ascending inserts would chain a plain BST; here the tree stays
/// // logarithmic and the order is intact.
/// assert_eq!(set.iter().copied().collect::<Vec<_>>(), [1, 2, 3, 4, 5, 6, 7]);
/// assert!(set.validate().is_ok());
/// ```
pub struct AvlSet<K, C = Natural, R = LinkedNodes<K, Height>>
where
    R: HeightStore<K>,
{
    nodes: R,
    root: R::Ref,
    len: usize,
    cmp: C,
}

/// [`AvlSet`] over the array-packed node representation.
pub type PackedAvlSet<K, C = Natural> = AvlSet<K, C, PackedNodes<K, Height>>;

impl<K: Ord> AvlSet<K> {
    /// Creates an empty set with the natural key order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Natural, LinkedNodes::new())
    }
}

impl<K, F> AvlSet<K, FnComparator<F>>
where
    F: Fn(&K, &K) -> Ordering,
{
    /// Creates an empty set ordered by the given comparison closure.
    pub fn with_comparator(cmp: F) -> Self {
        Self::with_parts(FnComparator(cmp), LinkedNodes::new())
    }
}

impl<K, C, R> AvlSet<K, C, R>
where
    C: Comparator<K>,
    R: HeightStore<K>,
{
    /// Creates an empty set in the given node store, with the default
    /// comparator.
    pub fn with_store(nodes: R) -> Self
    where
        C: Default,
    {
        Self::with_parts(C::default(), nodes)
    }

    /// Creates an empty set from a comparator and a node store.
    pub fn with_parts(cmp: C, nodes: R) -> Self {
        Self { nodes, root: R::NIL, len: 0, cmp }
    }

    /// Returns true if `key` is in the set.
    pub fn contains(&self, key: &K) -> bool {
        matches!(bst::search(&self.nodes, self.root, key, &self.cmp), SearchResult::Found(_))
    }

    /// Adds `key` to the set; returns whether it was newly inserted.
    pub fn insert(&mut self, key: K) -> bool {
        let out = avl::insert(&mut self.nodes, self.root, key, &self.cmp);
        self.root = out.root;
        if out.is_new {
            self.len += 1;
        }
        out.is_new
    }

    /// Removes `key` from the set; returns whether it was present.
    pub fn remove(&mut self, key: &K) -> bool {
        match bst::search(&self.nodes, self.root, key, &self.cmp) {
            SearchResult::Found(node) => {
                self.root = avl::remove(&mut self.nodes, self.root, node);
                self.len -= 1;
                true
            }
            SearchResult::Miss { .. } => false,
        }
    }

    /// Checks the structural invariants of this variant: parent adjacency,
    /// strict in-order ascent, stored-vs-recomputed heights, and the
    /// balance-factor bound.
    pub fn validate(&self) -> Result<(), ValidateError>
    where
        K: fmt::Debug,
    {
        validate::check_adjacency(&self.nodes, self.root)?;
        validate::check_order(&self.nodes, self.root, &self.cmp)?;
        validate::check_avl(&self.nodes, self.root)
    }
}

impl<K, C, R> AvlSet<K, C, R>
where
    R: HeightStore<K>,
{
    /// The number of keys in the set.
    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Drops every key.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = R::NIL;
        self.len = 0;
    }

    /// The least key under the set's order.
    #[must_use]
    pub fn first(&self) -> Option<&K> {
        if R::is_nil(self.root) {
            None
        } else {
            Some(self.nodes.key(bst::minimum(&self.nodes, self.root)))
        }
    }

    /// The greatest key under the set's order.
    #[must_use]
    pub fn last(&self) -> Option<&K> {
        if R::is_nil(self.root) {
            None
        } else {
            Some(self.nodes.key(bst::maximum(&self.nodes, self.root)))
        }
    }

    /// Iterates the keys in ascending order.
    pub fn iter(&self) -> Iter<'_, K, R> {
        Iter::new(&self.nodes, self.root, self.len)
    }

    /// Renders the tree shape as a compact snapshot string, heights
    /// included (`key^height`).
    #[must_use]
    pub fn render(&self) -> String
    where
        K: fmt::Debug,
    {
        validate::render_avl(&self.nodes, self.root)
    }

    pub(crate) fn raw_parts(&self) -> (&R, R::Ref) {
        (&self.nodes, self.root)
    }
}

impl<K, C, R> Default for AvlSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: HeightStore<K> + Default,
{
    fn default() -> Self {
        Self::with_parts(C::default(), R::default())
    }
}

impl<K: fmt::Debug, C, R: HeightStore<K>> fmt::Debug for AvlSet<K, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C, R> Extend<K> for AvlSet<K, C, R>
where
    C: Comparator<K>,
    R: HeightStore<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, C, R> FromIterator<K> for AvlSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: HeightStore<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for AvlSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C, R: HeightStore<K>> IntoIterator for &'a AvlSet<K, C, R> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use super::*;

    #[test]
    fn stays_valid_through_churn() {
        let mut set = AvlSet::new();
        for key in 0..100 {
            assert!(set.insert(key * 7 % 100));
            set.validate().unwrap();
        }
        for key in 0..50 {
            assert!(set.remove(&(key * 3 % 100)) || !set.contains(&(key * 3 % 100)));
            set.validate().unwrap();
        }
    }

    #[test]
    fn duplicate_inserts_leave_shape_alone() {
        let mut set = AvlSet::from([4, 2, 6, 1, 3]);
        let before = set.render();
        assert!(!set.insert(4));
        assert_eq!(set.render(), before);
        assert_eq!(set.len(), 5);
    }

    #[test]
    fn packed_store_behaves_the_same() {
        let mut set: PackedAvlSet<i32> = PackedAvlSet::default();
        set.extend(0..32);
        set.validate().unwrap();
        assert!(set.remove(&17));
        set.validate().unwrap();
        let keys: Vec<i32> = set.iter().copied().collect();
        assert_eq!(keys.len(), 31);
        assert!(!keys.contains(&17));
    }

    #[test]
    fn comparator_reverses() {
        let set: AvlSet<i32, _> = {
            let mut set = AvlSet::with_comparator(|a: &i32, b: &i32| b.cmp(a));
            set.extend([1, 2, 3, 4]);
            set
        };
        let keys: Vec<i32> = set.iter().copied().collect();
        assert_eq!(keys, [4, 3, 2, 1]);
        set.validate().unwrap();
    }
}
