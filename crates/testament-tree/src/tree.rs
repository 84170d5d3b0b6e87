//! Tree construction and proof generation.

use std::collections::BTreeMap;
use tracing::debug;

use testament_core::{
    FieldElement, FieldHasher, Result, TestamentError, DEFAULT_TREE_DEPTH, MAX_SHARE_BPS,
};

use crate::leaf::{leaf_from_beneficiary, Beneficiary};
use crate::proof::Proof;

/// Largest supported depth; keeps `path_indices` inside a `u32`
pub const MAX_TREE_DEPTH: u32 = 20;

/// One populated slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Leaf {
    /// Slot index, unique within a tree
    pub index: usize,
    /// Committed value
    pub value: FieldElement,
    /// Caller-owned data carried alongside the leaf, never hashed
    pub metadata: Option<Vec<u8>>,
}

impl Leaf {
    /// Leaf without metadata
    pub fn new(index: usize, value: FieldElement) -> Self {
        Self {
            index,
            value,
            metadata: None,
        }
    }

    /// Attach opaque metadata
    pub fn with_metadata(mut self, metadata: Vec<u8>) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// Immutable fixed-depth commitment tree.
///
/// `layers[0]` holds the leaves, `layers[depth]` the single root, and
/// `layers[i + 1][j] == combine(layers[i][2j], layers[i][2j + 1])`.
#[derive(Debug, Clone)]
pub struct CommitmentTree<H> {
    depth: u32,
    layers: Vec<Vec<FieldElement>>,
    metadata: BTreeMap<usize, Vec<u8>>,
    hasher: H,
}

impl<H: FieldHasher> CommitmentTree<H> {
    /// Build a tree of the given depth.
    ///
    /// Fails with `InvalidDepth`, `CapacityExceeded` (too many leaves or an
    /// index past the last slot) or `DuplicateLeafIndex`. No partially built
    /// tree is ever returned.
    pub fn build(leaves: impl IntoIterator<Item = Leaf>, depth: u32, hasher: H) -> Result<Self> {
        if depth == 0 || depth > MAX_TREE_DEPTH {
            return Err(TestamentError::InvalidDepth {
                depth,
                max: MAX_TREE_DEPTH,
            });
        }
        let capacity = 1usize << depth;
        let leaves: Vec<Leaf> = leaves.into_iter().collect();
        if leaves.len() > capacity {
            return Err(TestamentError::CapacityExceeded {
                supplied: leaves.len(),
                capacity,
            });
        }

        let mut slots = vec![FieldElement::zero(); capacity];
        let mut occupied = vec![false; capacity];
        let mut metadata = BTreeMap::new();
        for leaf in leaves {
            if leaf.index >= capacity {
                return Err(TestamentError::CapacityExceeded {
                    supplied: leaf.index,
                    capacity,
                });
            }
            if occupied[leaf.index] {
                return Err(TestamentError::DuplicateLeafIndex { index: leaf.index });
            }
            occupied[leaf.index] = true;
            if let Some(data) = leaf.metadata {
                metadata.insert(leaf.index, data);
            }
            slots[leaf.index] = leaf.value;
        }

        let mut layers = Vec::with_capacity(depth as usize + 1);
        layers.push(slots);
        for level in 0..depth as usize {
            let next: Vec<FieldElement> = layers[level]
                .chunks_exact(2)
                .map(|pair| hasher.combine(&pair[0], &pair[1]))
                .collect();
            layers.push(next);
        }

        let tree = Self {
            depth,
            layers,
            metadata,
            hasher,
        };
        debug!(
            depth,
            populated = occupied.iter().filter(|o| **o).count(),
            root = %tree.root(),
            "built commitment tree"
        );
        Ok(tree)
    }

    /// Build at the protocol depth
    pub fn with_default_depth(leaves: impl IntoIterator<Item = Leaf>, hasher: H) -> Result<Self> {
        Self::build(leaves, DEFAULT_TREE_DEPTH, hasher)
    }

    /// Build from beneficiaries, assigning slots in list order from 0.
    ///
    /// Shares must each be valid and sum to at most `MAX_SHARE_BPS`; a list
    /// longer than the tree capacity is `TooManyBeneficiaries`.
    pub fn from_beneficiaries(beneficiaries: &[Beneficiary], depth: u32, hasher: H) -> Result<Self> {
        if (1..=MAX_TREE_DEPTH).contains(&depth) && beneficiaries.len() > 1usize << depth {
            return Err(TestamentError::TooManyBeneficiaries {
                max: 1usize << depth,
            });
        }

        let mut allocated = 0u32;
        let mut leaves = Vec::with_capacity(beneficiaries.len());
        for (index, beneficiary) in beneficiaries.iter().enumerate() {
            beneficiary.validate()?;
            let requested = u32::from(beneficiary.share_bps);
            if allocated + requested > MAX_SHARE_BPS {
                return Err(TestamentError::AllocationExceeded {
                    allocated,
                    requested,
                });
            }
            allocated += requested;
            leaves.push(Leaf::new(
                index,
                leaf_from_beneficiary(&hasher, &beneficiary.address, beneficiary.share_bps),
            ));
        }
        Self::build(leaves, depth, hasher)
    }

    /// Root of the tree
    pub fn root(&self) -> &FieldElement {
        &self.layers[self.depth as usize][0]
    }

    /// Tree depth
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of slots
    pub fn capacity(&self) -> usize {
        self.layers[0].len()
    }

    /// Value at a slot; unset slots read as zero
    pub fn leaf(&self, index: usize) -> Result<&FieldElement> {
        self.layers[0]
            .get(index)
            .ok_or(TestamentError::IndexOutOfRange {
                index,
                capacity: self.capacity(),
            })
    }

    /// Metadata attached to a slot at build time
    pub fn metadata(&self, index: usize) -> Option<&[u8]> {
        self.metadata.get(&index).map(Vec::as_slice)
    }

    /// All layers, leaves first
    pub fn layers(&self) -> &[Vec<FieldElement>] {
        &self.layers
    }

    /// Hasher the tree was built with
    pub fn hasher(&self) -> &H {
        &self.hasher
    }

    /// Inclusion proof for a slot.
    ///
    /// At each level the sibling is the node at `position ^ 1`; bit `level`
    /// of `path_indices` is set iff `position` is odd (the node is the right
    /// operand when recombining).
    pub fn proof(&self, index: usize) -> Result<Proof> {
        let leaf = self.leaf(index)?.clone();
        let mut path = Vec::with_capacity(self.depth as usize);
        let mut path_indices = 0u32;
        let mut position = index;

        for level in 0..self.depth as usize {
            path.push(self.layers[level][position ^ 1].clone());
            if position & 1 == 1 {
                path_indices |= 1 << level;
            }
            position >>= 1;
        }

        Ok(Proof {
            index,
            leaf,
            path,
            path_indices,
            root: self.root().clone(),
        })
    }

    /// Verify a proof without a tree instance.
    ///
    /// Forwards to [`crate::verify_proof`].
    pub fn verify(hasher: &H, leaf: &FieldElement, proof: &Proof) -> bool {
        crate::proof::verify_proof(hasher, leaf, proof)
    }
}
