//! Structural validators and the compact tree renderer.
//!
//! Every check here is generic over the node-store contract, so the linked
//! and the array-packed representations go through the identical suite. The
//! sets run the checks behind [`validate`](crate::BstSet::validate); the
//! fuzz harness runs them after every mutation.

use alloc::collections::BTreeSet;
use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;
use core::cmp::Ordering;
use core::fmt::Debug;

use thiserror::Error;

use crate::compare::Comparator;
use crate::raw::store::{Color, ColorStore, HeightStore, NodeStore};

/// A structural invariant violation, as reported by the checks below.
///
/// Keys are captured as their `Debug` rendering so the error is
/// self-contained once the tree moves on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidateError {
    /// A parent back-pointer disagrees with the child links.
    #[error("adjacency violation at {node}: {reason}")]
    Adjacency { node: String, reason: String },
    /// In-order traversal is not strictly ascending.
    #[error("order violation: {prev} precedes {next} in traversal order")]
    Order { prev: String, next: String },
    /// The tree's key set differs from the oracle's.
    #[error("content mismatch: missing {missing:?}, excess {excess:?}")]
    Content { missing: Vec<String>, excess: Vec<String> },
    /// A stored AVL height disagrees with the recomputed one.
    #[error("height violation at {node}: stored {stored}, recomputed {actual}")]
    Height { node: String, stored: i32, actual: i32 },
    /// An AVL balance factor left the `-1..=1` band.
    #[error("balance violation at {node}: balance factor {bf}")]
    Balance { node: String, bf: i32 },
    /// The red-black root is red.
    #[error("color violation: root {node} is red")]
    RedRoot { node: String },
    /// Two red nodes are adjacent.
    #[error("color violation: red {node} has red child {child}")]
    RedRed { node: String, child: String },
    /// The two subtrees of a node disagree on black-height.
    #[error("black-height violation at {node}: left {left}, right {right}")]
    BlackHeight { node: String, left: u32, right: u32 },
}

fn label<K: Debug, S: NodeStore<K>>(store: &S, n: S::Ref) -> String {
    format!("{:?}", store.key(n))
}

fn collect_in_order<K, S: NodeStore<K>>(store: &S, n: S::Ref, out: &mut Vec<S::Ref>) {
    if S::is_nil(n) {
        return;
    }
    collect_in_order(store, store.left(n), out);
    out.push(n);
    collect_in_order(store, store.right(n), out);
}

/// Checks that every child's parent back-pointer names the node it hangs
/// from, and that the root is parentless.
pub fn check_adjacency<K, S>(store: &S, root: S::Ref) -> Result<(), ValidateError>
where
    K: Debug,
    S: NodeStore<K>,
{
    if S::is_nil(root) {
        return Ok(());
    }
    if !S::is_nil(store.parent(root)) {
        return Err(ValidateError::Adjacency {
            node: label(store, root),
            reason: String::from("the root has a parent"),
        });
    }
    walk_adjacency(store, root)
}

fn walk_adjacency<K, S>(store: &S, n: S::Ref) -> Result<(), ValidateError>
where
    K: Debug,
    S: NodeStore<K>,
{
    for child in [store.left(n), store.right(n)] {
        if S::is_nil(child) {
            continue;
        }
        if store.parent(child) != n {
            return Err(ValidateError::Adjacency {
                node: label(store, child),
                reason: format!("parent pointer does not name {}", label(store, n)),
            });
        }
        walk_adjacency(store, child)?;
    }
    Ok(())
}

/// Checks that in-order traversal ascends strictly under `cmp`. Strictness
/// also rules out duplicate keys.
pub fn check_order<K, S, C>(store: &S, root: S::Ref, cmp: &C) -> Result<(), ValidateError>
where
    K: Debug,
    S: NodeStore<K>,
    C: Comparator<K>,
{
    let mut nodes = Vec::new();
    collect_in_order(store, root, &mut nodes);
    for pair in nodes.windows(2) {
        if cmp.compare(store.key(pair[0]), store.key(pair[1])) != Ordering::Less {
            return Err(ValidateError::Order {
                prev: label(store, pair[0]),
                next: label(store, pair[1]),
            });
        }
    }
    Ok(())
}

/// Checks that the tree holds exactly the oracle's keys, reporting both
/// directions of any difference.
pub fn check_content<K, S>(store: &S, root: S::Ref, oracle: &BTreeSet<K>) -> Result<(), ValidateError>
where
    K: Debug + Ord,
    S: NodeStore<K>,
{
    let mut nodes = Vec::new();
    collect_in_order(store, root, &mut nodes);
    let held: BTreeSet<&K> = nodes.iter().map(|&n| store.key(n)).collect();

    let excess: Vec<String> = held.iter().filter(|k| !oracle.contains(**k)).map(|k| format!("{k:?}")).collect();
    let missing: Vec<String> = oracle.iter().filter(|k| !held.contains(*k)).map(|k| format!("{k:?}")).collect();

    if missing.is_empty() && excess.is_empty() {
        Ok(())
    } else {
        Err(ValidateError::Content { missing, excess })
    }
}

/// Recomputes every subtree height bottom-up, comparing against the stored
/// heights and bounding every balance factor to `-1..=1`.
pub fn check_avl<K, S>(store: &S, root: S::Ref) -> Result<(), ValidateError>
where
    K: Debug,
    S: HeightStore<K>,
{
    recompute_height(store, root).map(|_| ())
}

fn recompute_height<K, S>(store: &S, n: S::Ref) -> Result<i32, ValidateError>
where
    K: Debug,
    S: HeightStore<K>,
{
    if S::is_nil(n) {
        return Ok(0);
    }
    let left = recompute_height(store, store.left(n))?;
    let right = recompute_height(store, store.right(n))?;

    let actual = 1 + left.max(right);
    let stored = store.height(n);
    if stored != actual {
        return Err(ValidateError::Height { node: label(store, n), stored, actual });
    }
    let bf = left - right;
    if bf.abs() > 1 {
        return Err(ValidateError::Balance { node: label(store, n), bf });
    }
    Ok(actual)
}

/// Checks the red-black rules: black root, no red-red adjacency, and a
/// single black-height across all root-to-nil paths (nil counts 1).
pub fn check_rb<K, S>(store: &S, root: S::Ref) -> Result<(), ValidateError>
where
    K: Debug,
    S: ColorStore<K>,
{
    if S::is_nil(root) {
        return Ok(());
    }
    if store.color(root) == Color::Red {
        return Err(ValidateError::RedRoot { node: label(store, root) });
    }
    walk_red_pairs(store, root)?;
    black_height(store, root).map(|_| ())
}

fn walk_red_pairs<K, S>(store: &S, n: S::Ref) -> Result<(), ValidateError>
where
    K: Debug,
    S: ColorStore<K>,
{
    for child in [store.left(n), store.right(n)] {
        if S::is_nil(child) {
            continue;
        }
        if store.color(n) == Color::Red && store.color(child) == Color::Red {
            return Err(ValidateError::RedRed {
                node: label(store, n),
                child: label(store, child),
            });
        }
        walk_red_pairs(store, child)?;
    }
    Ok(())
}

fn black_height<K, S>(store: &S, n: S::Ref) -> Result<u32, ValidateError>
where
    K: Debug,
    S: ColorStore<K>,
{
    if S::is_nil(n) {
        return Ok(1);
    }
    let left = black_height(store, store.left(n))?;
    let right = black_height(store, store.right(n))?;
    if left != right {
        return Err(ValidateError::BlackHeight { node: label(store, n), left, right });
    }
    Ok(left + u32::from(store.color(n) == Color::Black))
}

fn render_with<K, S, F>(store: &S, n: S::Ref, node_label: &F, out: &mut String)
where
    S: NodeStore<K>,
    F: Fn(&S, S::Ref) -> String,
{
    if S::is_nil(n) {
        out.push('-');
        return;
    }
    let left = store.left(n);
    let right = store.right(n);
    if S::is_nil(left) && S::is_nil(right) {
        out.push_str(&node_label(store, n));
        return;
    }
    out.push('(');
    out.push_str(&node_label(store, n));
    out.push(' ');
    render_with(store, left, node_label, out);
    out.push(' ');
    render_with(store, right, node_label, out);
    out.push(')');
}

/// Renders the tree as a compact parenthesized snapshot: `-` for nil, a
/// bare label for a leaf, `(label left right)` otherwise. Good enough to
/// reconstruct a failing case by hand.
pub fn render<K, S>(store: &S, root: S::Ref) -> String
where
    K: Debug,
    S: NodeStore<K>,
{
    let mut out = String::new();
    render_with(store, root, &|s: &S, n| label(s, n), &mut out);
    out
}

/// [`render`] with `key^height` labels.
pub fn render_avl<K, S>(store: &S, root: S::Ref) -> String
where
    K: Debug,
    S: HeightStore<K>,
{
    let mut out = String::new();
    render_with(store, root, &|s: &S, n| format!("{:?}^{}", s.key(n), s.height(n)), &mut out);
    out
}

/// [`render`] with `key:R` / `key:B` labels.
pub fn render_rb<K, S>(store: &S, root: S::Ref) -> String
where
    K: Debug,
    S: ColorStore<K>,
{
    let mut out = String::new();
    let node_label = |s: &S, n: S::Ref| {
        let tag = match s.color(n) {
            Color::Red => 'R',
            Color::Black => 'B',
        };
        format!("{:?}:{tag}", s.key(n))
    };
    render_with(store, root, &node_label, &mut out);
    out
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::compare::Natural;
    use crate::raw::bst;
    use crate::raw::linked::LinkedNodes;
    use crate::raw::store::Height;

    use super::*;

    fn grow<S: NodeStore<i32>>(store: &mut S, keys: &[i32]) -> S::Ref {
        let mut root = S::NIL;
        for &key in keys {
            root = bst::insert(store, root, key, &Natural).root;
        }
        root
    }

    #[test]
    fn clean_trees_pass() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[10, 5, 15]);
        check_adjacency(&store, root).unwrap();
        check_order(&store, root, &Natural).unwrap();

        let oracle: BTreeSet<i32> = [5, 10, 15].into();
        check_content(&store, root, &oracle).unwrap();
    }

    #[test]
    fn empty_trees_pass() {
        type S = LinkedNodes<i32>;

        let store: S = LinkedNodes::new();
        check_adjacency(&store, S::NIL).unwrap();
        check_order(&store, S::NIL, &Natural).unwrap();
        check_content(&store, S::NIL, &BTreeSet::new()).unwrap();
    }

    #[test]
    fn torn_parent_pointer_is_reported() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[10, 5, 15]);

        let five = store.left(root);
        let fifteen = store.right(root);
        store.set_parent(five, fifteen);
        assert!(matches!(
            check_adjacency(&store, root),
            Err(ValidateError::Adjacency { .. })
        ));
    }

    #[test]
    fn root_with_parent_is_reported() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[10, 5]);
        let five = store.left(root);
        store.set_parent(root, five);
        assert!(matches!(
            check_adjacency(&store, root),
            Err(ValidateError::Adjacency { .. })
        ));
    }

    #[test]
    fn swapped_children_break_order() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1, 3]);

        let one = store.left(root);
        let three = store.right(root);
        store.set_left(root, three);
        store.set_right(root, one);
        assert_eq!(
            check_order(&store, root, &Natural),
            Err(ValidateError::Order { prev: String::from("3"), next: String::from("2") })
        );
    }

    #[test]
    fn content_reports_both_directions() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[1, 2]);
        let oracle: BTreeSet<i32> = [2, 3].into();
        assert_eq!(
            check_content(&store, root, &oracle),
            Err(ValidateError::Content {
                missing: alloc::vec![String::from("3")],
                excess: alloc::vec![String::from("1")],
            })
        );
    }

    #[test]
    fn stale_height_is_reported() {
        let mut store: LinkedNodes<i32, Height> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1, 3]);
        store.set_height(root, 2);
        let left = store.left(root);
        store.set_height(left, 1);
        let right = store.right(root);
        store.set_height(right, 1);
        check_avl(&store, root).unwrap();

        store.set_height(right, 7);
        assert_eq!(
            check_avl(&store, root),
            Err(ValidateError::Height { node: String::from("3"), stored: 7, actual: 1 })
        );
    }

    #[test]
    fn lopsided_chain_breaks_balance() {
        let mut store: LinkedNodes<i32, Height> = LinkedNodes::new();
        let root = grow(&mut store, &[1, 2, 3]);
        // Make the stored heights truthful so only the balance rule trips.
        let two = store.right(root);
        let three = store.right(two);
        store.set_height(three, 1);
        store.set_height(two, 2);
        store.set_height(root, 3);
        assert_eq!(
            check_avl(&store, root),
            Err(ValidateError::Balance { node: String::from("1"), bf: -2 })
        );
    }

    #[test]
    fn color_rules_are_reported() {
        let mut store: LinkedNodes<i32, Color> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1, 3, 4]);
        // bst::insert leaves everything at the fresh color, red.
        assert!(matches!(check_rb(&store, root), Err(ValidateError::RedRoot { .. })));

        // Black root, but 3 and its child 4 are still a red pair.
        store.set_color(root, Color::Black);
        assert!(matches!(check_rb(&store, root), Err(ValidateError::RedRed { .. })));

        let one = store.left(root);
        let three = store.right(root);
        store.set_color(one, Color::Black);
        store.set_color(three, Color::Black);
        check_rb(&store, root).unwrap();

        // Blackening the lone leaf under 3 unbalances its black-heights.
        let four = store.right(three);
        store.set_color(four, Color::Black);
        assert_eq!(
            check_rb(&store, root),
            Err(ValidateError::BlackHeight { node: String::from("3"), left: 1, right: 2 })
        );
    }

    #[test]
    fn renders_are_compact() {
        let mut store: LinkedNodes<i32> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1, 3]);
        assert_eq!(render(&store, root), "(2 1 3)");

        let empty: LinkedNodes<i32> = LinkedNodes::new();
        assert_eq!(render(&empty, None), "-");

        let mut store: LinkedNodes<i32, Color> = LinkedNodes::new();
        let root = grow(&mut store, &[2, 1]);
        store.set_color(root, Color::Black);
        assert_eq!(render_rb(&store, root), "(2:B 1:R -)");
    }
}
