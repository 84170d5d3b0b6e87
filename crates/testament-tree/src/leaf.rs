//! Beneficiary leaf derivation.

use serde::{Deserialize, Serialize};

use testament_core::validation::validate_share_bps;
use testament_core::{FieldElement, FieldHasher, Result};

/// A beneficiary as committed into the tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Beneficiary {
    /// Account address
    pub address: String,
    /// Share in basis points
    pub share_bps: u16,
}

impl Beneficiary {
    /// New beneficiary, validating the share
    pub fn new(address: impl Into<String>, share_bps: u32) -> Result<Self> {
        let share_bps = validate_share_bps(share_bps)?;
        Ok(Self {
            address: address.into(),
            share_bps,
        })
    }

    /// Re-check the share, for values built by struct literal or serde
    pub fn validate(&self) -> Result<()> {
        validate_share_bps(u32::from(self.share_bps)).map(|_| ())
    }

    /// Leaf value of this beneficiary
    pub fn leaf<H: FieldHasher + ?Sized>(&self, hasher: &H) -> FieldElement {
        leaf_from_beneficiary(hasher, &self.address, self.share_bps)
    }
}

/// Leaf value for a beneficiary: `hash_field(hash_bytes(address) + share)`.
///
/// Depends only on the address and share. The will identifier is not part of
/// the leaf, so one beneficiary maps to the same leaf in every will.
pub fn leaf_from_beneficiary<H: FieldHasher + ?Sized>(
    hasher: &H,
    address: &str,
    share_bps: u16,
) -> FieldElement {
    let address_hash = hasher.hash_bytes(address.as_bytes());
    hasher.hash_field(&(address_hash + FieldElement::from(share_bps)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use testament_core::{Sha256FieldHasher, TestamentError};

    const ALICE: &str = "aleo1alice0000000000000000000000000000000000000000000000000";

    #[test]
    fn leaf_matches_formula() {
        let h = Sha256FieldHasher;
        let expected = h.hash_field(&(h.hash_bytes(ALICE.as_bytes()) + FieldElement::from(5000u16)));
        assert_eq!(leaf_from_beneficiary(&h, ALICE, 5000), expected);
    }

    #[test]
    fn share_changes_leaf() {
        let h = Sha256FieldHasher;
        assert_ne!(
            leaf_from_beneficiary(&h, ALICE, 5000),
            leaf_from_beneficiary(&h, ALICE, 5001)
        );
    }

    #[test]
    fn constructor_rejects_bad_share() {
        assert_matches!(
            Beneficiary::new(ALICE, 0),
            Err(TestamentError::InvalidShare { bps: 0 })
        );
        assert_matches!(
            Beneficiary::new(ALICE, 10_001),
            Err(TestamentError::InvalidShare { .. })
        );
        let b = Beneficiary::new(ALICE, 2_500).unwrap();
        assert_eq!(b.leaf(&Sha256FieldHasher), leaf_from_beneficiary(&Sha256FieldHasher, ALICE, 2_500));
    }
}
