//! Inclusion proofs and their stand-alone verification.

use serde::{Deserialize, Serialize};

use testament_core::{FieldElement, FieldHasher};

use crate::tree::MAX_TREE_DEPTH;

/// Sibling path plus bit-packed direction metadata for one leaf
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    /// Slot the proof was generated for
    pub index: usize,
    /// Leaf value at generation time
    pub leaf: FieldElement,
    /// Siblings from the leaf level up to just below the root
    pub path: Vec<FieldElement>,
    /// Bit `i` set iff the node at level `i` is the right operand
    pub path_indices: u32,
    /// Root the proof commits to
    pub root: FieldElement,
}

impl Proof {
    /// Whether the node at `level` is the right operand
    pub fn path_bit(&self, level: usize) -> bool {
        level < 32 && (self.path_indices >> level) & 1 == 1
    }

    /// Verify `leaf` against this proof
    pub fn verify<H: FieldHasher + ?Sized>(&self, hasher: &H, leaf: &FieldElement) -> bool {
        verify_proof(hasher, leaf, self)
    }

    /// Sibling path as a protocol array literal, e.g. `[1field, 2field]`
    pub fn encode_path(&self) -> String {
        let items: Vec<String> = self.path.iter().map(ToString::to_string).collect();
        format!("[{}]", items.join(", "))
    }

    /// Direction bits as a `u32` literal
    pub fn encode_path_indices(&self) -> String {
        format!("{}u32", self.path_indices)
    }

    /// Verifier inputs in call order: path, direction bits, root
    pub fn to_inputs(&self) -> [String; 3] {
        [
            self.encode_path(),
            self.encode_path_indices(),
            self.root.to_string(),
        ]
    }
}

/// Recompute the root from `leaf` and compare it with `proof.root`.
///
/// Pure: depends only on its arguments, never on a tree instance, so proofs
/// can be checked on another machine or long after construction. Proofs with
/// an empty or oversized path, or with direction bits above the path length,
/// are rejected.
pub fn verify_proof<H: FieldHasher + ?Sized>(hasher: &H, leaf: &FieldElement, proof: &Proof) -> bool {
    let depth = proof.path.len();
    if depth == 0 || depth > MAX_TREE_DEPTH as usize {
        return false;
    }
    if proof.path_indices >> depth != 0 {
        return false;
    }

    let computed = proof
        .path
        .iter()
        .enumerate()
        .fold(leaf.clone(), |node, (level, sibling)| {
            if proof.path_bit(level) {
                hasher.combine(sibling, &node)
            } else {
                hasher.combine(&node, sibling)
            }
        });

    computed == proof.root
}
