//! Red-black balancing on top of the plain BST primitives.
//!
//! The three invariants maintained here: the root is black, a red node has
//! no red child, and every root-to-nil path crosses the same number of
//! black nodes. New nodes enter red (black-heights stay intact, only a
//! red-red pair can appear) and the insertion walk repairs upward. Removal
//! is the involved direction: deleting a childless black node leaves its
//! parent's slot one black short, and the deficit is repaid by the
//! [`FixupCase`] state machine below.

use crate::compare::Comparator;

use super::bst::{self, InsertResult, Side};
use super::store::{Color, ColorStore};

#[inline]
fn color<K, S: ColorStore<K>>(store: &S, n: S::Ref) -> Color {
    if S::is_nil(n) { Color::Black } else { store.color(n) }
}

/// Rotates at `parent` so that the subtree on `side` gains a level; the
/// sibling side's child becomes the new subtree root.
fn rotate_toward<K, S: ColorStore<K>>(store: &mut S, parent: S::Ref, side: Side) -> S::Ref {
    match side {
        Side::Left => bst::rotate_left(store, parent),
        Side::Right => bst::rotate_right(store, parent),
    }
}

/// BST insert followed by the red-red repair walk.
pub(crate) fn insert<K, S, C>(store: &mut S, root: S::Ref, key: K, cmp: &C) -> InsertResult<S::Ref>
where
    S: ColorStore<K>,
    C: Comparator<K>,
{
    let out = bst::insert(store, root, key, cmp);
    if !out.is_new {
        return out;
    }

    let mut root = out.root;
    let mut node = out.node;
    loop {
        let parent = store.parent(node);
        if S::is_nil(parent) {
            // The walk reached the root (or the new node is the root);
            // the root is always repainted black.
            store.set_color(node, Color::Black);
            break;
        }
        if store.color(parent) == Color::Black {
            // A red child under a black parent violates nothing.
            break;
        }

        let grand = store.parent(parent);
        if S::is_nil(grand) {
            // The parent is a red root; blackening it fixes the pair and
            // raises every path's black-height equally.
            store.set_color(parent, Color::Black);
            break;
        }

        let parent_side = bst::side_of(store, grand, parent);
        let uncle = bst::child(store, grand, parent_side.opposite());
        if color(store, uncle) == Color::Red {
            // Red uncle: push the blackness down from the grandparent and
            // retry two levels up.
            store.set_color(parent, Color::Black);
            store.set_color(uncle, Color::Black);
            store.set_color(grand, Color::Red);
            node = grand;
            continue;
        }

        // Black uncle: one or two rotations finish the repair. An inner
        // grandchild is first rotated out so the red pair lines up.
        let node_side = bst::side_of(store, parent, node);
        let outer = if node_side == parent_side {
            parent
        } else {
            rotate_toward(store, parent, parent_side);
            node
        };
        let top = rotate_toward(store, grand, parent_side.opposite());
        debug_assert!(top == outer, "`rb::insert()` - rotation did not raise the red pair!");
        store.set_color(outer, Color::Black);
        store.set_color(grand, Color::Red);
        if S::is_nil(store.parent(top)) {
            root = top;
        }
        break;
    }

    InsertResult { root, node: out.node, is_new: true }
}

/// Unlinks and discards `node`, then repairs the color invariants.
pub(crate) fn remove<K, S: ColorStore<K>>(store: &mut S, root: S::Ref, node: S::Ref) -> S::Ref {
    let mut root = root;

    // A node with two children trades places (links and colors, not keys)
    // with its in-order successor, which has no left child; the removal
    // then reduces to a node with at most one child.
    let left = store.left(node);
    let right = store.right(node);
    if !S::is_nil(left) && !S::is_nil(right) {
        root = swap_with_successor(store, root, node);
    }

    let left = store.left(node);
    let child = if S::is_nil(left) { store.right(node) } else { left };
    let parent = store.parent(node);

    if !S::is_nil(child) {
        // A black node with a single child; that child is a red leaf and
        // inherits the slot painted black.
        store.set_parent(child, parent);
        if S::is_nil(parent) {
            root = child;
        } else {
            let side = bst::side_of(store, parent, node);
            bst::set_child(store, parent, side, child);
        }
        store.set_color(child, Color::Black);
        store.discard(node);
        return root;
    }

    if S::is_nil(parent) {
        // Childless root; the tree empties.
        store.discard(node);
        return S::NIL;
    }

    let side = bst::side_of(store, parent, node);
    bst::set_child(store, parent, side, S::NIL);
    let was_red = store.color(node) == Color::Red;
    store.discard(node);
    if was_red {
        // A red leaf leaves every black-height intact.
        return root;
    }
    fixup(store, root, parent, side)
}

/// The deletion-fixup configurations, in decision order. The `side` slot of
/// `parent` roots a subtree that is one black short.
enum FixupCase {
    /// The sibling is red; a rotation turns it into one of the black-sibling
    /// cases under a red parent.
    SiblingRed,
    /// The distant nephew is red; one rotation and three recolors finish.
    DistantRed,
    /// Only the close nephew is red; a rotation at the sibling surfaces it,
    /// reducing to `DistantRed`.
    CloseRed,
    /// Sibling and nephews black under a red parent; recoloring finishes.
    ParentRed,
    /// Everything black; the deficit moves up one level.
    AllBlack,
}

/// The single decision point of the fixup loop. Nephews are re-read on
/// every call, so a preceding rotation cannot leave a stale view.
fn classify<K, S: ColorStore<K>>(store: &S, parent: S::Ref, side: Side) -> FixupCase {
    let sibling = bst::child(store, parent, side.opposite());
    assert!(!S::is_nil(sibling), "`rb::classify()` - a short subtree has no sibling!");

    if store.color(sibling) == Color::Red {
        return FixupCase::SiblingRed;
    }
    if color(store, bst::child(store, sibling, side.opposite())) == Color::Red {
        return FixupCase::DistantRed;
    }
    if color(store, bst::child(store, sibling, side)) == Color::Red {
        return FixupCase::CloseRed;
    }
    if store.color(parent) == Color::Red {
        return FixupCase::ParentRed;
    }
    FixupCase::AllBlack
}

fn fixup<K, S: ColorStore<K>>(store: &mut S, mut root: S::Ref, mut parent: S::Ref, mut side: Side) -> S::Ref {
    loop {
        match classify(store, parent, side) {
            FixupCase::SiblingRed => {
                let sibling = bst::child(store, parent, side.opposite());
                let top = rotate_toward(store, parent, side);
                store.set_color(sibling, Color::Black);
                store.set_color(parent, Color::Red);
                if S::is_nil(store.parent(top)) {
                    root = top;
                }
                // Same deficit, new black sibling (the former close
                // nephew); go around again.
            }
            FixupCase::DistantRed => {
                let sibling = bst::child(store, parent, side.opposite());
                let distant = bst::child(store, sibling, side.opposite());
                let top = rotate_toward(store, parent, side);
                let inherited = store.color(parent);
                store.set_color(sibling, inherited);
                store.set_color(parent, Color::Black);
                store.set_color(distant, Color::Black);
                if S::is_nil(store.parent(top)) {
                    root = top;
                }
                return root;
            }
            FixupCase::CloseRed => {
                let sibling = bst::child(store, parent, side.opposite());
                let close = bst::child(store, sibling, side);
                match side {
                    Side::Left => bst::rotate_right(store, sibling),
                    Side::Right => bst::rotate_left(store, sibling),
                };
                store.set_color(close, Color::Black);
                store.set_color(sibling, Color::Red);
                // The red nephew now sits distant; next round finishes.
            }
            FixupCase::ParentRed => {
                let sibling = bst::child(store, parent, side.opposite());
                store.set_color(sibling, Color::Red);
                store.set_color(parent, Color::Black);
                return root;
            }
            FixupCase::AllBlack => {
                let sibling = bst::child(store, parent, side.opposite());
                store.set_color(sibling, Color::Red);
                let grand = store.parent(parent);
                if S::is_nil(grand) {
                    // The whole tree lost one black level evenly; done.
                    return root;
                }
                side = bst::side_of(store, grand, parent);
                parent = grand;
            }
        }
    }
}

/// Exchanges `u` with its in-order successor by relinking both nodes'
/// parent, child, and color fields. Keys never move, so outstanding handles
/// keep their meaning.
fn swap_with_successor<K, S: ColorStore<K>>(store: &mut S, root: S::Ref, u: S::Ref) -> S::Ref {
    let y = bst::minimum(store, store.right(u));

    let u_color = store.color(u);
    let y_color = store.color(y);
    store.set_color(u, y_color);
    store.set_color(y, u_color);

    let u_parent = store.parent(u);
    let u_left = store.left(u);
    let u_right = store.right(u);
    let y_parent = store.parent(y);
    let y_right = store.right(y);

    // y takes u's place under u's parent.
    let root = if S::is_nil(u_parent) {
        y
    } else {
        let side = bst::side_of(store, u_parent, u);
        bst::set_child(store, u_parent, side, y);
        root
    };
    store.set_parent(y, u_parent);

    // u's left flank moves under y wholesale.
    store.set_left(y, u_left);
    store.set_parent(u_left, y);

    if y_parent == u {
        // y was u's right child; they swap directly.
        store.set_right(y, u);
        store.set_parent(u, y);
    } else {
        // y sat deeper as a left child; u drops into y's old slot.
        store.set_right(y, u_right);
        store.set_parent(u_right, y);
        store.set_left(y_parent, u);
        store.set_parent(u, y_parent);
    }

    // y's only possible child, a right one, moves under u.
    store.set_left(u, S::NIL);
    store.set_right(u, y_right);
    if !S::is_nil(y_right) {
        store.set_parent(y_right, u);
    }

    root
}
