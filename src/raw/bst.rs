//! Plain binary-search-tree algorithms over any [`NodeStore`].
//!
//! Everything here is shared by the three set variants: the AVL and
//! red-black layers call back into these primitives and add their own
//! bookkeeping on top. Functions that restructure the tree return the
//! (possibly new) tree root; callers own the root handle and must store it
//! back.

use crate::compare::Comparator;

use super::store::NodeStore;

/// A child direction, used wherever an algorithm must remember which slot
/// of a parent it came through.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum Side {
    Left,
    Right,
}

impl Side {
    pub(crate) fn opposite(self) -> Self {
        match self {
            Self::Left => Self::Right,
            Self::Right => Self::Left,
        }
    }
}

/// Result of a key lookup.
pub(crate) enum SearchResult<H> {
    /// The key is present at this node.
    Found(H),
    /// The key is absent; it would be inserted as the `side` child of
    /// `parent`. A nil `parent` means the tree is empty.
    Miss { parent: H, side: Side },
}

/// Result of an insertion attempt.
pub(crate) struct InsertResult<H> {
    /// The tree root after the operation.
    pub(crate) root: H,
    /// The inserted node, or the already-present node for a duplicate key.
    pub(crate) node: H,
    /// Whether a node was actually built.
    pub(crate) is_new: bool,
}

/// Result of a removal.
pub(crate) struct RemoveResult<H> {
    /// The tree root after the operation.
    pub(crate) root: H,
    /// The deepest node whose subtree shrank: the parent of the spliced-out
    /// slot. The balancing layers start their repair walk here; nil when
    /// the removed node was the last one.
    pub(crate) anchor: H,
}

#[inline]
pub(crate) fn child<K, S: NodeStore<K>>(store: &S, n: S::Ref, side: Side) -> S::Ref {
    match side {
        Side::Left => store.left(n),
        Side::Right => store.right(n),
    }
}

#[inline]
pub(crate) fn set_child<K, S: NodeStore<K>>(store: &mut S, n: S::Ref, side: Side, c: S::Ref) {
    match side {
        Side::Left => store.set_left(n, c),
        Side::Right => store.set_right(n, c),
    }
}

/// Which slot of `parent` holds `node`.
#[inline]
pub(crate) fn side_of<K, S: NodeStore<K>>(store: &S, parent: S::Ref, node: S::Ref) -> Side {
    if store.left(parent) == node { Side::Left } else { Side::Right }
}

/// Walks from `root` deciding left/right by the comparator. On a miss the
/// result carries the insertion hint, so an insert that follows pays no
/// second descent.
pub(crate) fn search<K, S, C>(store: &S, root: S::Ref, key: &K, cmp: &C) -> SearchResult<S::Ref>
where
    S: NodeStore<K>,
    C: Comparator<K>,
{
    let mut parent = S::NIL;
    let mut side = Side::Left;
    let mut cur = root;

    while !S::is_nil(cur) {
        match cmp.compare(key, store.key(cur)) {
            core::cmp::Ordering::Less => {
                parent = cur;
                side = Side::Left;
                cur = store.left(cur);
            }
            core::cmp::Ordering::Greater => {
                parent = cur;
                side = Side::Right;
                cur = store.right(cur);
            }
            core::cmp::Ordering::Equal => return SearchResult::Found(cur),
        }
    }

    SearchResult::Miss { parent, side }
}

/// Leftmost node of the subtree at `n`. `n` must be non-nil.
pub(crate) fn minimum<K, S: NodeStore<K>>(store: &S, mut n: S::Ref) -> S::Ref {
    debug_assert!(!S::is_nil(n), "`bst::minimum()` - nil subtree!");
    loop {
        let left = store.left(n);
        if S::is_nil(left) {
            return n;
        }
        n = left;
    }
}

/// Rightmost node of the subtree at `n`. `n` must be non-nil.
pub(crate) fn maximum<K, S: NodeStore<K>>(store: &S, mut n: S::Ref) -> S::Ref {
    debug_assert!(!S::is_nil(n), "`bst::maximum()` - nil subtree!");
    loop {
        let right = store.right(n);
        if S::is_nil(right) {
            return n;
        }
        n = right;
    }
}

/// The in-order successor of `n`, or nil if `n` holds the greatest key.
///
/// Either the minimum of the right subtree, or the first ancestor reached
/// from a left branch.
pub(crate) fn successor<K, S: NodeStore<K>>(store: &S, n: S::Ref) -> S::Ref {
    let right = store.right(n);
    if !S::is_nil(right) {
        return minimum(store, right);
    }

    let mut node = n;
    let mut up = store.parent(n);
    while !S::is_nil(up) && store.right(up) == node {
        node = up;
        up = store.parent(up);
    }
    up
}

/// The in-order predecessor of `n`, or nil if `n` holds the least key.
pub(crate) fn predecessor<K, S: NodeStore<K>>(store: &S, n: S::Ref) -> S::Ref {
    let left = store.left(n);
    if !S::is_nil(left) {
        return maximum(store, left);
    }

    let mut node = n;
    let mut up = store.parent(n);
    while !S::is_nil(up) && store.left(up) == node {
        node = up;
        up = store.parent(up);
    }
    up
}

/// Inserts `key`, or finds it already present. The new node is linked into
/// the slot the search hinted at, parent back-pointer included.
pub(crate) fn insert<K, S, C>(store: &mut S, root: S::Ref, key: K, cmp: &C) -> InsertResult<S::Ref>
where
    S: NodeStore<K>,
    C: Comparator<K>,
{
    match search(store, root, &key, cmp) {
        SearchResult::Found(node) => InsertResult { root, node, is_new: false },
        SearchResult::Miss { parent, side } => {
            let node = store.build(key);
            if S::is_nil(parent) {
                // The tree was empty; the new node is the root.
                InsertResult { root: node, node, is_new: true }
            } else {
                set_child(store, parent, side, node);
                store.set_parent(node, parent);
                InsertResult { root, node, is_new: true }
            }
        }
    }
}

/// Replaces the subtree rooted at `u` with the one rooted at `v` (possibly
/// nil) in `u`'s parent slot, repairing `v`'s parent back-pointer. Returns
/// the tree root, which changes when `u` was the root.
fn shift<K, S: NodeStore<K>>(store: &mut S, root: S::Ref, u: S::Ref, v: S::Ref) -> S::Ref {
    let parent = store.parent(u);
    if !S::is_nil(v) {
        store.set_parent(v, parent);
    }
    if S::is_nil(parent) {
        v
    } else {
        let side = side_of(store, parent, u);
        set_child(store, parent, side, v);
        root
    }
}

/// Unlinks and discards `node`, which must be in the tree rooted at `root`.
///
/// A node with two children trades places with its in-order successor (the
/// minimum of its right subtree), which by construction has no left child;
/// the removal then reduces to splicing out a node with at most one child.
pub(crate) fn remove<K, S: NodeStore<K>>(store: &mut S, root: S::Ref, node: S::Ref) -> RemoveResult<S::Ref> {
    let mut root = root;
    let anchor;

    let left = store.left(node);
    let right = store.right(node);
    if S::is_nil(left) {
        anchor = store.parent(node);
        root = shift(store, root, node, right);
    } else if S::is_nil(right) {
        anchor = store.parent(node);
        root = shift(store, root, node, left);
    } else {
        let succ = minimum(store, right);
        if store.parent(succ) == node {
            anchor = succ;
        } else {
            anchor = store.parent(succ);
            let succ_right = store.right(succ);
            root = shift(store, root, succ, succ_right);
            let right = store.right(node);
            store.set_right(succ, right);
            store.set_parent(right, succ);
        }
        root = shift(store, root, node, succ);
        let left = store.left(node);
        store.set_left(succ, left);
        store.set_parent(left, succ);
    }

    store.discard(node);
    RemoveResult { root, anchor }
}

/// Rotates the subtree at `n` to the left; `n`'s right child becomes the
/// subtree root. Returns that new subtree root. The caller must install it
/// as the tree root when `n` was the root (its parent is then nil).
pub(crate) fn rotate_left<K, S: NodeStore<K>>(store: &mut S, n: S::Ref) -> S::Ref {
    let pivot = store.right(n);
    assert!(!S::is_nil(pivot), "`bst::rotate_left()` - node has no right child!");

    let inner = store.left(pivot);
    let parent = store.parent(n);

    store.set_right(n, inner);
    if !S::is_nil(inner) {
        store.set_parent(inner, n);
    }
    store.set_left(pivot, n);
    store.set_parent(n, pivot);
    store.set_parent(pivot, parent);
    if !S::is_nil(parent) {
        let side = side_of(store, parent, n);
        set_child(store, parent, side, pivot);
    }

    pivot
}

/// Mirror image of [`rotate_left`]: `n`'s left child becomes the subtree
/// root.
pub(crate) fn rotate_right<K, S: NodeStore<K>>(store: &mut S, n: S::Ref) -> S::Ref {
    let pivot = store.left(n);
    assert!(!S::is_nil(pivot), "`bst::rotate_right()` - node has no left child!");

    let inner = store.right(pivot);
    let parent = store.parent(n);

    store.set_left(n, inner);
    if !S::is_nil(inner) {
        store.set_parent(inner, n);
    }
    store.set_right(pivot, n);
    store.set_parent(n, pivot);
    store.set_parent(pivot, parent);
    if !S::is_nil(parent) {
        let side = side_of(store, parent, n);
        set_child(store, parent, side, pivot);
    }

    pivot
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use alloc::vec::Vec;

    use crate::compare::Natural;
    use crate::raw::linked::LinkedNodes;
    use crate::raw::packed::PackedNodes;
    use crate::validate::{check_adjacency, render};

    use super::*;

    fn grow<S: NodeStore<i32>>(store: &mut S, keys: &[i32]) -> S::Ref {
        let mut root = S::NIL;
        for &key in keys {
            root = insert(store, root, key, &Natural).root;
        }
        root
    }

    fn keys_in_order<S: NodeStore<i32>>(store: &S, root: S::Ref) -> Vec<i32> {
        let mut out = Vec::new();
        if S::is_nil(root) {
            return out;
        }
        let mut cur = minimum(store, root);
        while !S::is_nil(cur) {
            out.push(*store.key(cur));
            cur = successor(store, cur);
        }
        out
    }

    #[test]
    fn search_reports_hints() {
        type S = LinkedNodes<i32>;

        let mut store: S = LinkedNodes::new();
        let root = grow(&mut store, &[10, 5, 15]);

        assert!(matches!(search(&store, root, &5, &Natural), SearchResult::Found(_)));
        match search(&store, root, &7, &Natural) {
            SearchResult::Miss { parent, side } => {
                assert_eq!(store.key(parent), &5);
                assert_eq!(side, Side::Right);
            }
            SearchResult::Found(_) => panic!("7 is not in the tree"),
        }
        match search(&store, S::NIL, &7, &Natural) {
            SearchResult::Miss { parent, .. } => assert!(S::is_nil(parent)),
            SearchResult::Found(_) => panic!("empty tree has no nodes"),
        }
    }

    #[test]
    fn insert_chains() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[1, 2, 3]);
        assert_eq!(render(&store, root), "(1 - (2 - 3))");

        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[3, 2, 1]);
        assert_eq!(render(&store, root), "(3 (2 1 -) -)");
    }

    #[test]
    fn duplicate_insert_is_a_no_op() {
        let mut store: PackedNodes<i32> = PackedNodes::new();
        let root = grow(&mut store, &[10, 5, 15]);
        let before = render(&store, root);

        let out = insert(&mut store, root, 5, &Natural);
        assert!(!out.is_new);
        assert_eq!(out.root, root);
        assert_eq!(store.key(out.node), &5);
        assert_eq!(render(&store, root), before);
    }

    #[test]
    fn successor_predecessor_walk() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[8, 3, 10, 1, 6, 14, 4, 7, 13]);
        assert_eq!(keys_in_order(&store, root), [1, 3, 4, 6, 7, 8, 10, 13, 14]);

        let last = maximum(&store, root);
        assert_eq!(store.key(last), &14);
        let mut cur = last;
        let mut reversed = Vec::new();
        while !<LinkedNodes<i32>>::is_nil(cur) {
            reversed.push(*store.key(cur));
            cur = predecessor(&store, cur);
        }
        assert_eq!(reversed, [14, 13, 10, 8, 7, 6, 4, 3, 1]);
    }

    #[test]
    fn remove_leaf_and_single_child() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let mut root = grow(&mut store, &[10, 5, 15, 12]);

        // Leaf.
        let SearchResult::Found(n) = search(&store, root, &5, &Natural) else { panic!() };
        root = remove(&mut store, root, n).root;
        assert_eq!(render(&store, root), "(10 - (15 12 -))");

        // Single child: 15 is replaced by 12.
        let SearchResult::Found(n) = search(&store, root, &15, &Natural) else { panic!() };
        let out = remove(&mut store, root, n);
        root = out.root;
        assert_eq!(store.key(out.anchor), &10);
        assert_eq!(render(&store, root), "(10 - 12)");
        check_adjacency(&store, root).unwrap();
    }

    #[test]
    fn remove_two_children_adjacent_successor() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let mut root = grow(&mut store, &[10, 5, 15, 20]);

        // 15 is 10's successor and its direct right child.
        let SearchResult::Found(n) = search(&store, root, &10, &Natural) else { panic!() };
        let out = remove(&mut store, root, n);
        root = out.root;
        assert_eq!(store.key(out.anchor), &15);
        assert_eq!(render(&store, root), "(15 5 20)");
        check_adjacency(&store, root).unwrap();
    }

    #[test]
    fn remove_two_children_deep_successor() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let mut root = grow(&mut store, &[10, 5, 20, 15, 25, 12, 17]);

        // 10's successor is 12, two levels down; its old parent 15 is the
        // anchor after the splice.
        let SearchResult::Found(n) = search(&store, root, &10, &Natural) else { panic!() };
        let out = remove(&mut store, root, n);
        root = out.root;
        assert_eq!(store.key(out.anchor), &15);
        assert_eq!(render(&store, root), "(12 5 (20 (15 - 17) 25))");
        assert_eq!(keys_in_order(&store, root), [5, 12, 15, 17, 20, 25]);
        check_adjacency(&store, root).unwrap();
    }

    #[test]
    fn remove_root_of_singleton() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[42]);
        let out = remove(&mut store, root, root);
        assert!(<LinkedNodes<i32>>::is_nil(out.root));
        assert!(<LinkedNodes<i32>>::is_nil(out.anchor));
        assert_eq!(store.len(), 0);
    }

    #[test]
    fn rotations_round_trip() {
        let mut store: PackedNodes<i32> = PackedNodes::new();
        let mut root = grow(&mut store, &[10, 5, 15, 12, 20]);
        let before = render(&store, root);

        root = rotate_left(&mut store, root);
        assert_eq!(render(&store, root), "(15 (10 5 12) 20)");
        check_adjacency(&store, root).unwrap();

        root = rotate_right(&mut store, root);
        assert_eq!(render(&store, root), before);
        check_adjacency(&store, root).unwrap();
    }

    #[test]
    #[should_panic(expected = "`bst::rotate_left()` - node has no right child!")]
    fn rotate_left_needs_a_pivot() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1]);
        let _ = rotate_left(&mut store, root);
    }
}
