use core::cmp::Ordering;
use core::fmt;

use alloc::string::String;

use crate::compare::{Comparator, FnComparator, Natural};
use crate::iter::Iter;
use crate::raw::bst::{self, SearchResult};
use crate::raw::linked::LinkedNodes;
use crate::raw::packed::PackedNodes;
use crate::raw::store::NodeStore;
use crate::validate::{self, ValidateError};

/// An ordered set over an unbalanced binary search tree.
///
/// The simplest of the three variants: no balancing at all, so a sorted
/// insertion order degenerates the tree into a list. Useful as the baseline
/// the balanced variants are differentially tested against, and perfectly
/// serviceable for small or well-shuffled key sets.
///
/// `C` is the comparator (natural [`Ord`] order by default) and `R` the
/// node representation, defaulting to arena-allocated linked nodes; see
/// [`PackedBstSet`] for the parallel-columns flavor.
///
/// # Examples
///
/// ```
/// use bonsai_tree::BstSet;
///
/// let mut set = BstSet::new();
/// assert!(set.insert(3));
/// assert!(set.insert(1));
/// assert!(!set.insert(3)); // duplicates collapse
/// assert!(set.contains(&1));
/// assert_eq!(set.len(), 2);
/// assert!(set.remove(&1));
/// assert!(!set.contains(&1));
/// ```
pub struct BstSet<K, C = Natural, R = LinkedNodes<K>>
where
    R: NodeStore<K>,
{
    nodes: R,
    root: R::Ref,
    len: usize,
    cmp: C,
}

/// [`BstSet`] over the array-packed node representation.
pub type PackedBstSet<K, C = Natural> = BstSet<K, C, PackedNodes<K>>;

impl<K: Ord> BstSet<K> {
    /// Creates an empty set with the natural key order.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(Natural, LinkedNodes::new())
    }
}

impl<K, F> BstSet<K, FnComparator<F>>
where
    F: Fn(&K, &K) -> Ordering,
{
    /// Creates an empty set ordered by the given comparison closure.
    ///
    /// ```
    /// use bonsai_tree::BstSet;
    ///
    /// let mut set = BstSet::with_comparator(|a: &i32, b: &i32| b.cmp(a));
    /// set.extend([1, 2, 3]);
    /// assert_eq!(set.first(), Some(&3));
    /// ```
    pub fn with_comparator(cmp: F) -> Self {
        Self::with_parts(FnComparator(cmp), LinkedNodes::new())
    }
}

impl<K, C, R> BstSet<K, C, R>
where
    C: Comparator<K>,
    R: NodeStore<K>,
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
        let out = bst::insert(&mut self.nodes, self.root, key, &self.cmp);
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
                self.root = bst::remove(&mut self.nodes, self.root, node).root;
                self.len -= 1;
                true
            }
            SearchResult::Miss { .. } => false,
        }
    }

    /// Checks the structural invariants of this variant: parent adjacency
    /// and strict in-order ascent.
    pub fn validate(&self) -> Result<(), ValidateError>
    where
        K: fmt::Debug,
    {
        validate::check_adjacency(&self.nodes, self.root)?;
        validate::check_order(&self.nodes, self.root, &self.cmp)
    }
}

impl<K, C, R> BstSet<K, C, R>
where
    R: NodeStore<K>,
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

    /// Renders the tree shape as a compact snapshot string.
    #[must_use]
    pub fn render(&self) -> String
    where
        K: fmt::Debug,
    {
        validate::render(&self.nodes, self.root)
    }

    pub(crate) fn raw_parts(&self) -> (&R, R::Ref) {
        (&self.nodes, self.root)
    }
}

impl<K, C, R> Default for BstSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: NodeStore<K> + Default,
{
    fn default() -> Self {
        Self::with_parts(C::default(), R::default())
    }
}

impl<K: fmt::Debug, C, R: NodeStore<K>> fmt::Debug for BstSet<K, C, R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<K, C, R> Extend<K> for BstSet<K, C, R>
where
    C: Comparator<K>,
    R: NodeStore<K>,
{
    fn extend<I: IntoIterator<Item = K>>(&mut self, iter: I) {
        for key in iter {
            self.insert(key);
        }
    }
}

impl<K, C, R> FromIterator<K> for BstSet<K, C, R>
where
    C: Comparator<K> + Default,
    R: NodeStore<K> + Default,
{
    fn from_iter<I: IntoIterator<Item = K>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<K: Ord, const N: usize> From<[K; N]> for BstSet<K> {
    fn from(keys: [K; N]) -> Self {
        keys.into_iter().collect()
    }
}

impl<'a, K, C, R: NodeStore<K>> IntoIterator for &'a BstSet<K, C, R> {
    type Item = &'a K;
    type IntoIter = Iter<'a, K, R>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
