//! Ordered-set collections over three binary search trees.
//!
//! This crate provides [`BstSet`], [`AvlSet`], and [`RbSet`] — strict
//! ordered sets (equal keys collapse) backed by an unbalanced binary
//! search tree, a height-balanced AVL tree, and a red-black tree. All
//! three share one algorithm kernel written against a node-accessor
//! contract, so each set runs over either of two node representations:
//!
//! - [`LinkedNodes`] - arena-allocated records, one per node, with slot
//!   reuse after removal (the default);
//! - [`PackedNodes`] - parallel columns indexed by a sentinel-based
//!   integer handle, which never reclaims removed rows.
//!
//! # Example
//!
//! ```
//! use bonsai_tree::RbSet;
//!
//! let mut set = RbSet::new();
//! for key in [40, 10, 30, 20] {
//!     set.insert(key);
//! }
//!
//! assert!(set.contains(&30));
//! assert!(!set.insert(20)); // already present
//! assert_eq!(set.iter().copied().collect::<Vec<_>>(), [10, 20, 30, 40]);
//!
//! set.remove(&10);
//! assert_eq!(set.len(), 3);
//! ```
//!
//! Ordering is pluggable per set ([`Comparator`]), and every variant
//! exposes its structural validators through `validate()`, so a test can
//! assert the tree's invariants directly:
//!
//! ```
//! use bonsai_tree::AvlSet;
//!
//! let set: AvlSet<u32> = (0..100).collect();
//! assert!(set.validate().is_ok()); // adjacency, order, heights, balance
//! ```
//!
//! # Fuzzing
//!
//! With the default `std` feature, the [`fuzz`] module drives any variant
//! through randomized grow/shrink epochs against a `BTreeSet` oracle,
//! re-validating the structure after every mutation. The `fuzz::fuzz_*`
//! entry points run until a failure turns up; `fuzz::run_epochs` is the
//! bounded, seeded flavor for test suites.
//!
//! # Features
//!
//! - **`no_std` compatible** - the sets and validators only require
//!   `alloc`; the fuzz harness sits behind the default `std` feature
//! - **Zero dynamic dispatch** - algorithms are generic over the node
//!   store and monomorphize to direct field access
//! - **Strict sets** - no duplicate keys, total `insert`/`remove`/
//!   `contains` with boolean answers

#![no_std]
// These forbid rules and lint groups are meant to be very restrictive.
#![forbid(unsafe_code)]
#![forbid(keyword_idents)]
#![forbid(non_ascii_idents)]
#![forbid(unreachable_pub)]
#![warn(clippy::all)]
#![warn(clippy::cargo)]
#![warn(clippy::pedantic)]
// Enable coverage attributes for nightly builds.
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

extern crate alloc;
#[cfg(any(test, feature = "std"))]
extern crate std;

mod avl_set;
mod bst_set;
mod compare;
mod iter;
mod raw;
mod rb_set;

pub mod validate;

#[cfg(feature = "std")]
pub mod fuzz;

pub use avl_set::{AvlSet, PackedAvlSet};
pub use bst_set::{BstSet, PackedBstSet};
pub use compare::{Comparator, FnComparator, Natural};
pub use iter::Iter;
pub use raw::linked::{LinkedNodes, NodeId};
pub use raw::packed::{PackedNodes, Slot};
pub use raw::store::{Augment, Color, ColorStore, Height, HeightStore, NodeStore};
pub use rb_set::{PackedRbSet, RbSet};
