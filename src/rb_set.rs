use core::cmp::Ordering;
use core::fmt;

use alloc::string::String;

use crate::compare::{Comparator, FnComparator, Natural};
use crate::iter::Iter;
use crate::raw::bst::{self, SearchResult};
use crate::raw::linked::LinkedNodes;
use crate::raw::packed::PackedNodes;
use crate::raw::rb;
use crate::raw::store::{Color, ColorStore};
use crate::validate::{self, ValidateError};

/// An ordered set over a red-black binary search tree.
///
/// Nodes carry one of two colors and the tree maintains the classic rules:
/// black root, no red node with a red child, and the same number of black
/// nodes on every root-to-nil path. That keeps the tree within twice the
/// minimal height with at most three rotations per mutation, trading a
/// little search depth against [`AvlSet`](crate::AvlSet) for cheaper
/// updates.
///
/// # Examples
///
/// ```
/// use bonsai_tree::RbSet;
///
/// let mut set = RbSet::new();
/// set.extend([2, 1, 4]);
/// assert!(set.contains(&4));
/// assert!(set.remove(&1));
/// assert_eq!(set.len(), 2);
/// assert!(set.validate().is_ok());
/// ```
pub struct RbSet<K, C = Natural, R = LinkedNodes<K, Color>>
where
    R: ColorStore<K>,
{
    nodes: R,
    root: R::Ref,
    len: usize,
    cmp: C,
}

/// [`RbSet`] over the array-packed node representation.
pub type PackedRbSet<K, C = Natural> = RbSet<K, C, PackedNodes<K, Color>>;

impl<K: Ord> RbSet<K> {
    /// Creates an empty set with the natural key order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Natural, LinkedNodes::new())
    }
}

impl<K, F> RbSet<K, FnComparator<F>>
where
    F: Fn(&K, &K) -> Ordering,
{
    /// Creates an empty set ordered by the given comparison closure.
    pub fn with_comparator(cmp: F) -> Self {
        Self::with_parts(FnComparator(cmp), LinkedNodes::new())
    }
}

impl<K, C, R> RbSet<K, C, R>
where
    C: Comparator<K>,
    R: ColorStore<K>,
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
        let out = rb::insert(&mut self.nodes, self.root, key, &self.cmp);
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
                self.root = rb::remove(&mut self.nodes, self.root, node);
                self.len -= 1;
                true
            }
            SearchResult::Miss { .. } => false,
        }
    }

    /// Checks the structural invariants of this variant: parent adjacency,
    /// strict in-order ascent, and the red-black color rules.
    pub fn validate(&self) -> Result<(), ValidateError>
    where
        K: fmt::Debug,
    {
        validate::check_adjacency(&self.nodes, self.root)?;
        validate::check_order(&self.nodes, self.root, &self.cmp)?;
        validate::check_rb(&self.nodes, self.root)
    }
}

impl<K, C, R> RbSet<K, C, R>
where
    R: ColorStore<K>,
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

    /// Renders the tree shape as a compact snapshot string, colors
    /// included (`key:R` / `key:B`).
    #[must_use]
    pub fn render(&self) -> String
    where
        K: fmt::Debug,
    {
        validate::render_rb(&self.nodes, self.root)
    }

    pub(crate) fn raw_parts(&self) -> (&R, R::Ref) {
        (&self.nodes, self.root)
    }
}

impl<K, C, R> Default for RbSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: ColorStore<K> + Default,
{
    fn default() -> Self {
        Self::with_parts(C::default(), R::default())
    }
}

impl<K: fmt::Debug, C, R: ColorStore<K>> fmt::Debug for RbSet<K, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C, R> Extend<K> for RbSet<K, C, R>
where
    C: Comparator<K>,
    R: ColorStore<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, C, R> FromIterator<K> for RbSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: ColorStore<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for RbSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C, R: ColorStore<K>> IntoIterator for &'a RbSet<K, C, R> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
