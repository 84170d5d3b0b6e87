//! Commitment tree behaviour against the verifier contract.

use assert_matches::assert_matches;
use proptest::prelude::*;
use std::collections::BTreeSet;

use testament_core::{FieldElement, FieldHasher, Sha256FieldHasher, TestamentError};
use testament_tree::{
    leaf_from_beneficiary, verify_proof, Beneficiary, CommitmentTree, Leaf, MAX_TREE_DEPTH,
};

fn field(n: u64) -> FieldElement {
    FieldElement::from(n)
}

fn tree_of(indices: &BTreeSet<usize>, seed: u64) -> CommitmentTree<Sha256FieldHasher> {
    let leaves = indices
        .iter()
        .map(|&i| Leaf::new(i, field(seed + i as u64)));
    CommitmentTree::with_default_depth(leaves, Sha256FieldHasher).unwrap()
}

mod worked_example {
    use super::*;

    #[test]
    fn two_leaf_proof_for_index_one() {
        let tree = CommitmentTree::with_default_depth(
            vec![Leaf::new(0, field(10)), Leaf::new(1, field(20))],
            Sha256FieldHasher,
        )
        .unwrap();

        let proof = tree.proof(1).unwrap();
        assert_eq!(proof.path.len(), 4);
        assert_eq!(proof.path[0], "10field".parse().unwrap());
        assert!(proof.path_bit(0));
        assert_eq!(proof.path_indices & 1, 1);

        let h = Sha256FieldHasher;
        assert!(verify_proof(&h, &"20field".parse().unwrap(), &proof));
        assert!(!verify_proof(&h, &"99field".parse().unwrap(), &proof));
        assert!(CommitmentTree::verify(&h, &field(20), &proof));
    }

    #[test]
    fn first_level_combines_left_then_right() {
        let h = Sha256FieldHasher;
        let tree = CommitmentTree::with_default_depth(
            vec![Leaf::new(0, field(10)), Leaf::new(1, field(20))],
            h,
        )
        .unwrap();
        assert_eq!(tree.layers()[1][0], h.combine(&field(10), &field(20)));
    }
}

mod capacity {
    use super::*;

    #[test]
    fn seventeen_leaves_do_not_fit() {
        let leaves = (0..17).map(|i| Leaf::new(i, field(i as u64 + 1)));
        assert_matches!(
            CommitmentTree::with_default_depth(leaves, Sha256FieldHasher),
            Err(TestamentError::CapacityExceeded {
                supplied: 17,
                capacity: 16
            })
        );
    }

    #[test]
    fn proof_outside_slots_fails() {
        let tree = tree_of(&BTreeSet::from([0, 5]), 1);
        assert_matches!(
            tree.proof(16),
            Err(TestamentError::IndexOutOfRange {
                index: 16,
                capacity: 16
            })
        );
        assert_matches!(tree.proof(usize::MAX), Err(TestamentError::IndexOutOfRange { .. }));
    }

    #[test]
    fn oversized_proof_is_rejected() {
        let tree = tree_of(&BTreeSet::from([3]), 7);
        let mut proof = tree.proof(3).unwrap();
        proof.path = vec![field(1); MAX_TREE_DEPTH as usize + 1];
        assert!(!verify_proof(&Sha256FieldHasher, &field(10), &proof));
    }

    #[test]
    fn unset_slots_prove_zero() {
        let tree = tree_of(&BTreeSet::from([0]), 1);
        let proof = tree.proof(9).unwrap();
        assert!(proof.leaf.is_zero());
        assert!(verify_proof(&Sha256FieldHasher, &FieldElement::zero(), &proof));
    }
}

mod beneficiaries {
    use super::*;

    const ALICE: &str = "aleo1alice0000000000000000000000000000000000000000000000000";
    const BOB: &str = "aleo1bob000000000000000000000000000000000000000000000000000";
    const CAROL: &str = "aleo1carol0000000000000000000000000000000000000000000000000";

    #[test]
    fn leaf_is_independent_of_the_will() {
        let h = Sha256FieldHasher;
        let first = CommitmentTree::from_beneficiaries(
            &[
                Beneficiary::new(ALICE, 6_000).unwrap(),
                Beneficiary::new(BOB, 4_000).unwrap(),
            ],
            4,
            h,
        )
        .unwrap();
        let second = CommitmentTree::from_beneficiaries(
            &[
                Beneficiary::new(CAROL, 1_000).unwrap(),
                Beneficiary::new(ALICE, 6_000).unwrap(),
            ],
            4,
            h,
        )
        .unwrap();

        let expected = leaf_from_beneficiary(&h, ALICE, 6_000);
        assert_eq!(first.leaf(0).unwrap(), &expected);
        assert_eq!(second.leaf(1).unwrap(), &expected);
        assert_ne!(first.root(), second.root());
    }

    #[test]
    fn invalid_share_fails_the_whole_build() {
        let bad = Beneficiary {
            address: BOB.to_string(),
            share_bps: 0,
        };
        assert_matches!(
            CommitmentTree::from_beneficiaries(
                &[Beneficiary::new(ALICE, 5_000).unwrap(), bad],
                4,
                Sha256FieldHasher
            ),
            Err(TestamentError::InvalidShare { bps: 0 })
        );
    }

    #[test]
    fn shares_may_not_exceed_the_whole() {
        assert_matches!(
            CommitmentTree::from_beneficiaries(
                &[
                    Beneficiary::new(ALICE, 6_000).unwrap(),
                    Beneficiary::new(BOB, 6_000).unwrap(),
                ],
                4,
                Sha256FieldHasher
            ),
            Err(TestamentError::AllocationExceeded {
                allocated: 6_000,
                requested: 6_000
            })
        );
        CommitmentTree::from_beneficiaries(
            &[
                Beneficiary::new(ALICE, 6_000).unwrap(),
                Beneficiary::new(BOB, 3_000).unwrap(),
                Beneficiary::new(CAROL, 1_000).unwrap(),
            ],
            4,
            Sha256FieldHasher,
        )
        .unwrap();
    }

    #[test]
    fn seventeen_beneficiaries_are_too_many() {
        let list: Vec<Beneficiary> = (0..17).map(|_| Beneficiary::new(ALICE, 1).unwrap()).collect();
        assert_matches!(
            CommitmentTree::from_beneficiaries(&list, 4, Sha256FieldHasher),
            Err(TestamentError::TooManyBeneficiaries { max: 16 })
        );
    }
}

proptest! {
    #[test]
    fn every_populated_leaf_round_trips(
        indices in proptest::collection::btree_set(0usize..16, 0..=16),
        seed in 1u64..(u64::MAX / 2),
    ) {
        let tree = tree_of(&indices, seed);
        for &i in &indices {
            let proof = tree.proof(i).unwrap();
            prop_assert_eq!(proof.path_indices as usize, i);
            prop_assert!(verify_proof(&Sha256FieldHasher, &field(seed + i as u64), &proof));
        }
    }

    #[test]
    fn tampering_breaks_verification(
        indices in proptest::collection::btree_set(0usize..16, 1..=16),
        seed in 1u64..(u64::MAX / 2),
        level in 0usize..4,
        pick in any::<prop::sample::Index>(),
    ) {
        let tree = tree_of(&indices, seed);
        let ordered: Vec<usize> = indices.iter().copied().collect();
        let index = ordered[pick.index(ordered.len())];
        let leaf = field(seed + index as u64);
        let proof = tree.proof(index).unwrap();
        let h = Sha256FieldHasher;

        let mut bad_path = proof.clone();
        bad_path.path[level] = &bad_path.path[level] + &field(1);
        prop_assert!(!verify_proof(&h, &leaf, &bad_path));

        let mut bad_bits = proof.clone();
        bad_bits.path_indices ^= 1 << level;
        prop_assert!(!verify_proof(&h, &leaf, &bad_bits));

        prop_assert!(!verify_proof(&h, &(&leaf + &field(1)), &proof));
    }
}
