//! AVL balancing on top of the plain BST primitives.
//!
//! Every node stores its subtree height (leaf = 1, nil = 0). Mutations
//! repair heights and rotate along the walk back to the root: an insert can
//! stop after the first rotation (the subtree is back at its pre-insert
//! height), a removal must keep walking because a rotation there can shrink
//! the subtree further.

use crate::compare::Comparator;

use super::bst::{self, InsertResult};
use super::store::HeightStore;

#[inline]
fn height<K, S: HeightStore<K>>(store: &S, n: S::Ref) -> i32 {
    if S::is_nil(n) { 0 } else { store.height(n) }
}

/// Recomputes `n`'s height from its children.
pub(crate) fn update_height<K, S: HeightStore<K>>(store: &mut S, n: S::Ref) {
    let left = height(store, store.left(n));
    let right = height(store, store.right(n));
    store.set_height(n, 1 + left.max(right));
}

/// Left height minus right height. In a valid AVL tree this is in `-1..=1`.
pub(crate) fn balance_factor<K, S: HeightStore<K>>(store: &S, n: S::Ref) -> i32 {
    height(store, store.left(n)) - height(store, store.right(n))
}

/// [`bst::rotate_left`] plus height repair: the demoted node first, then
/// the node that rose above it.
fn rotate_left<K, S: HeightStore<K>>(store: &mut S, n: S::Ref) -> S::Ref {
    let top = bst::rotate_left(store, n);
    update_height(store, n);
    update_height(store, top);
    top
}

fn rotate_right<K, S: HeightStore<K>>(store: &mut S, n: S::Ref) -> S::Ref {
    let top = bst::rotate_right(store, n);
    update_height(store, n);
    update_height(store, top);
    top
}

/// Restores `|balance factor| <= 1` at `n`, whose height must already be
/// up to date. A zig-zag shape (heavy child leaning the other way) takes
/// the extra inner rotation first. Returns the subtree root after the
/// repair and whether anything rotated.
pub(crate) fn rebalance<K, S: HeightStore<K>>(store: &mut S, n: S::Ref) -> (S::Ref, bool) {
    let bf = balance_factor(store, n);
    if bf > 1 {
        let left = store.left(n);
        if balance_factor(store, left) < 0 {
            rotate_left(store, left);
        }
        (rotate_right(store, n), true)
    } else if bf < -1 {
        let right = store.right(n);
        if balance_factor(store, right) > 0 {
            rotate_right(store, right);
        }
        (rotate_left(store, n), true)
    } else {
        (n, false)
    }
}

/// BST insert followed by the repair walk from the new node's parent to
/// the root.
pub(crate) fn insert<K, S, C>(store: &mut S, root: S::Ref, key: K, cmp: &C) -> InsertResult<S::Ref>
where
    S: HeightStore<K>,
    C: Comparator<K>,
{
    let out = bst::insert(store, root, key, cmp);
    if !out.is_new {
        return out;
    }

    let mut root = out.root;
    let mut cur = store.parent(out.node);
    while !S::is_nil(cur) {
        update_height(store, cur);
        let parent = store.parent(cur);
        let (top, rotated) = rebalance(store, cur);
        if S::is_nil(parent) {
            root = top;
        }
        if rotated {
            // One rotation restores the pre-insert height of this subtree;
            // no ancestor can be out of balance anymore.
            break;
        }
        cur = parent;
    }

    InsertResult { root, node: out.node, is_new: true }
}

/// BST removal followed by the repair walk from the rebalance anchor all
/// the way to the root.
pub(crate) fn remove<K, S: HeightStore<K>>(store: &mut S, root: S::Ref, node: S::Ref) -> S::Ref {
    let out = bst::remove(store, root, node);

    let mut root = out.root;
    let mut cur = out.anchor;
    while !S::is_nil(cur) {
        update_height(store, cur);
        let parent = store.parent(cur);
        let (top, _) = rebalance(store, cur);
        if S::is_nil(parent) {
            root = top;
        }
        cur = parent;
    }
    root
}
