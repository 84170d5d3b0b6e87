//! # Testament Tree - Layer 2: Commitment Tree
//!
//! Fixed-depth binary hash tree over the beneficiaries of a will. The tree
//! proves that one beneficiary (address plus share) is part of the committed
//! set without revealing the other leaves.
//!
//! The encoding must match the remote verifier bit for bit:
//!
//! - depth 4 (16 slots), leaves assigned in list order from index 0
//! - unset slots hold `0field`
//! - parents are `combine(left, right)` through the pluggable hasher
//! - bit `i` of `path_indices` is 1 iff the node at level `i` is a right child
//!
//! The `path_indices` convention has historically been the source of silent
//! failures. Swapping it yields proofs that only verify for half the leaves.
//! Check any hasher or verifier change against the verifier's reference
//! vectors.

#![forbid(unsafe_code)]

pub mod leaf;
pub mod proof;
pub mod tree;

pub use leaf::{leaf_from_beneficiary, Beneficiary};
pub use proof::{verify_proof, Proof};
pub use tree::{CommitmentTree, Leaf, MAX_TREE_DEPTH};
