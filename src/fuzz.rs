//! The differential fuzz harness.
//!
//! An epoch builds a fresh tree and an empty oracle [`BTreeSet`], grows
//! both with random keys until the tree holds `max_elements`, then shrinks
//! both back to empty. Every mutation must return the same boolean on the
//! tree and the oracle, and the variant's full validator battery (plus a
//! content comparison against the oracle) runs after each one. The first
//! discrepancy stops the run with the pre-operation snapshot attached, so
//! a failure is immediately replayable.
//!
//! The harness is variant-agnostic: anything implementing [`Subject`] can
//! be driven, and the three `fuzz_*` entry points wire up the linked-store
//! sets. Keys are drawn uniformly from `[0, 4 * max_elements)`, wide
//! enough to miss often and tight enough to collide often.

use alloc::collections::BTreeSet;
use alloc::string::String;
use core::fmt;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::avl_set::AvlSet;
use crate::bst_set::BstSet;
use crate::compare::Natural;
use crate::raw::store::{ColorStore, HeightStore, NodeStore};
use crate::rb_set::RbSet;
use crate::validate::{self, ValidateError};

/// A tree the harness can drive: the mutating surface plus the variant's
/// validators.
pub trait Subject {
    fn insert(&mut self, key: i64) -> bool;
    fn remove(&mut self, key: i64) -> bool;
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs the variant's structural validators.
    fn validate(&self) -> Result<(), ValidateError>;
    /// Compares the held keys against the oracle.
    fn check_content(&self, oracle: &BTreeSet<i64>) -> Result<(), ValidateError>;
    /// Captures the tree for the failure report.
    fn snapshot(&self) -> String;
}

impl<R: NodeStore<i64>> Subject for BstSet<i64, Natural, R> {
    fn insert(&mut self, key: i64) -> bool {
        BstSet::insert(self, key)
    }

    fn remove(&mut self, key: i64) -> bool {
        BstSet::remove(self, &key)
    }

    fn len(&self) -> usize {
        BstSet::len(self)
    }

    fn validate(&self) -> Result<(), ValidateError> {
        BstSet::validate(self)
    }

    fn check_content(&self, oracle: &BTreeSet<i64>) -> Result<(), ValidateError> {
        let (nodes, root) = self.raw_parts();
        validate::check_content(nodes, root, oracle)
    }

    fn snapshot(&self) -> String {
        self.render()
    }
}

impl<R: HeightStore<i64>> Subject for AvlSet<i64, Natural, R> {
    fn insert(&mut self, key: i64) -> bool {
        AvlSet::insert(self, key)
    }

    fn remove(&mut self, key: i64) -> bool {
        AvlSet::remove(self, &key)
    }

    fn len(&self) -> usize {
        AvlSet::len(self)
    }

    fn validate(&self) -> Result<(), ValidateError> {
        AvlSet::validate(self)
    }

    fn check_content(&self, oracle: &BTreeSet<i64>) -> Result<(), ValidateError> {
        let (nodes, root) = self.raw_parts();
        validate::check_content(nodes, root, oracle)
    }

    fn snapshot(&self) -> String {
        self.render()
    }
}

impl<R: ColorStore<i64>> Subject for RbSet<i64, Natural, R> {
    fn insert(&mut self, key: i64) -> bool {
        RbSet::insert(self, key)
    }

    fn remove(&mut self, key: i64) -> bool {
        RbSet::remove(self, &key)
    }

    fn len(&self) -> usize {
        RbSet::len(self)
    }

    fn validate(&self) -> Result<(), ValidateError> {
        RbSet::validate(self)
    }

    fn check_content(&self, oracle: &BTreeSet<i64>) -> Result<(), ValidateError> {
        let (nodes, root) = self.raw_parts();
        validate::check_content(nodes, root, oracle)
    }

    fn snapshot(&self) -> String {
        self.render()
    }
}

/// A mutation the harness applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FuzzOp {
    Insert(i64),
    Remove(i64),
}

impl fmt::Display for FuzzOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Insert(key) => write!(f, "insert({key})"),
            Self::Remove(key) => write!(f, "remove({key})"),
        }
    }
}

/// Why an epoch aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FailureKind {
    #[error(transparent)]
    Validation(#[from] ValidateError),
    #[error("tree answered {tree} but the oracle answered {oracle}")]
    Disagreement { tree: bool, oracle: bool },
    #[error("tree holds {tree} keys but the oracle holds {oracle}")]
    LengthDrift { tree: usize, oracle: usize },
}

/// A full failure report: where the run was, what it did, what the tree
/// looked like just before, and what went wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FuzzFailure {
    pub epoch: u64,
    /// `None` when the initial validation of a fresh tree failed.
    pub op: Option<FuzzOp>,
    /// The tree rendered before the failing operation.
    pub snapshot: String,
    pub kind: FailureKind,
}

impl fmt::Display for FuzzFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.op {
            Some(op) => write!(f, "epoch {}, {op}: {}", self.epoch, self.kind)?,
            None => write!(f, "epoch {}, initial validation: {}", self.epoch, self.kind)?,
        }
        write!(f, "\npre-operation tree: {}", self.snapshot)
    }
}

impl std::error::Error for FuzzFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.kind)
    }
}

fn verify<S: Subject>(tree: &S, oracle: &BTreeSet<i64>) -> Result<(), FailureKind> {
    tree.validate()?;
    tree.check_content(oracle)?;
    if tree.len() == oracle.len() {
        Ok(())
    } else {
        Err(FailureKind::LengthDrift { tree: tree.len(), oracle: oracle.len() })
    }
}

fn run_one<S: Subject>(
    mut tree: S,
    rng: &mut SmallRng,
    max_elements: usize,
    epoch: u64,
) -> Result<(), FuzzFailure> {
    let mut oracle: BTreeSet<i64> = BTreeSet::new();
    let span = 4 * max_elements as i64;

    verify(&tree, &oracle).map_err(|kind| FuzzFailure {
        epoch,
        op: None,
        snapshot: tree.snapshot(),
        kind,
    })?;

    // Grow phase.
    while tree.len() < max_elements {
        let key = rng.gen_range(0..span);
        let snapshot = tree.snapshot();
        let expected = oracle.insert(key);
        let answered = tree.insert(key);
        let kind = if answered == expected {
            verify(&tree, &oracle).err()
        } else {
            Some(FailureKind::Disagreement { tree: answered, oracle: expected })
        };
        if let Some(kind) = kind {
            return Err(FuzzFailure { epoch, op: Some(FuzzOp::Insert(key)), snapshot, kind });
        }
    }

    // Shrink phase.
    while !tree.is_empty() {
        let key = rng.gen_range(0..span);
        let snapshot = tree.snapshot();
        let expected = oracle.remove(&key);
        let answered = tree.remove(key);
        let kind = if answered == expected {
            verify(&tree, &oracle).err()
        } else {
            Some(FailureKind::Disagreement { tree: answered, oracle: expected })
        };
        if let Some(kind) = kind {
            return Err(FuzzFailure { epoch, op: Some(FuzzOp::Remove(key)), snapshot, kind });
        }
    }

    Ok(())
}

/// Runs `epochs` grow/shrink epochs deterministically from `seed`. Returns
/// the number of epochs completed.
///
/// This is the bounded runner the test suites use; the unbounded `fuzz_*`
/// functions below loop it forever.
pub fn run_epochs<S, F>(
    mut make: F,
    max_elements: usize,
    epochs: u64,
    seed: u64,
) -> Result<u64, FuzzFailure>
where
    S: Subject,
    F: FnMut() -> S,
{
    let mut rng = SmallRng::seed_from_u64(seed);
    for epoch in 0..epochs {
        run_one(make(), &mut rng, max_elements, epoch)?;
    }
    Ok(epochs)
}

/// Fuzzes subjects built by `make` until a failure turns up, printing the
/// epoch counter every 100 epochs. Only a failure returns.
pub fn fuzz<S, F>(mut make: F, max_elements: usize) -> FuzzFailure
where
    S: Subject,
    F: FnMut() -> S,
{
    let mut rng = SmallRng::from_entropy();
    let mut epoch = 0u64;
    loop {
        if let Err(failure) = run_one(make(), &mut rng, max_elements, epoch) {
            std::println!("{failure}");
            return failure;
        }
        epoch += 1;
        if epoch % 100 == 0 {
            std::println!("epoch {epoch}");
        }
    }
}

/// Fuzzes the plain-BST set. See [`fuzz`].
pub fn fuzz_bst(max_elements: usize) -> FuzzFailure {
    fuzz(BstSet::<i64>::new, max_elements)
}

/// Fuzzes the AVL set. See [`fuzz`].
pub fn fuzz_avl(max_elements: usize) -> FuzzFailure {
    fuzz(AvlSet::<i64>::new, max_elements)
}

/// Fuzzes the red-black set. See [`fuzz`].
pub fn fuzz_rb(max_elements: usize) -> FuzzFailure {
    fuzz(RbSet::<i64>::new, max_elements)
}

#[cfg(test)]
#[cfg_attr(coverage_nightly, coverage(off))]
mod tests {
    use crate::avl_set::PackedAvlSet;
    use crate::bst_set::PackedBstSet;
    use crate::rb_set::PackedRbSet;

    use super::*;

    #[test]
    fn all_subjects_survive_bounded_runs() {
        run_epochs(BstSet::<i64>::new, 48, 8, 0x1).unwrap();
        run_epochs(AvlSet::<i64>::new, 48, 8, 0x2).unwrap();
        run_epochs(RbSet::<i64>::new, 48, 8, 0x3).unwrap();
        run_epochs(PackedBstSet::<i64>::default, 48, 8, 0x4).unwrap();
        run_epochs(PackedAvlSet::<i64>::default, 48, 8, 0x5).unwrap();
        run_epochs(PackedRbSet::<i64>::default, 48, 8, 0x6).unwrap();
    }

    #[test]
    fn failures_carry_the_snapshot() {
        // A subject that lies about removals: claims success for any key.
        struct Liar(BstSet<i64>);

        impl Subject for Liar {
            fn insert(&mut self, key: i64) -> bool {
                self.0.insert(key)
            }

            fn remove(&mut self, key: i64) -> bool {
                self.0.remove(&key);
                true
            }

            fn len(&self) -> usize {
                self.0.len()
            }

            fn validate(&self) -> Result<(), ValidateError> {
                self.0.validate()
            }

            fn check_content(&self, oracle: &BTreeSet<i64>) -> Result<(), ValidateError> {
                let (nodes, root) = self.0.raw_parts();
                validate::check_content(nodes, root, oracle)
            }

            fn snapshot(&self) -> String {
                self.0.render()
            }
        }

        let failure = run_epochs(|| Liar(BstSet::new()), 8, 4, 0x7).unwrap_err();
        assert!(matches!(failure.kind, FailureKind::Disagreement { tree: true, oracle: false }));
        let Some(FuzzOp::Remove(_)) = failure.op else {
            panic!("the lie is in remove");
        };
        assert!(!failure.snapshot.is_empty());
    }
}
