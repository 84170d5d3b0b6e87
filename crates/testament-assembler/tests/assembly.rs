//! Payload assembly against an in-memory record source.

use assert_matches::assert_matches;

use testament_assembler::{
    OperationKind, TransactionAssembler, ALLOCATED_BPS_MAPPING, BENEFICIARY_COUNT_MAPPING,
};
use testament_core::{ClientConfig, FieldElement, FieldHasher, Sha256FieldHasher, TestamentError};
use testament_ledger::RecordLedger;
use testament_testkit::{record, MemoryRecordSource, ALICE, BOB, OWNER};
use testament_tree::{Beneficiary, CommitmentTree};

const PROGRAM: &str = "digital_will.aleo";

fn will() -> FieldElement {
    FieldElement::from(7u64)
}

fn assembler(
    config: ClientConfig,
    source: &MemoryRecordSource,
) -> TransactionAssembler<MemoryRecordSource, Sha256FieldHasher> {
    TransactionAssembler::new(config, source.clone(), Sha256FieldHasher).unwrap()
}

fn private_fee_config() -> ClientConfig {
    let mut config = ClientConfig::default();
    config.fees.private_fee = true;
    config
}

mod beneficiaries {
    use super::*;

    #[tokio::test]
    async fn add_beneficiary_orders_typed_inputs() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);

        let payload = asm.add_beneficiary(&will(), ALICE, 5_000).await.unwrap();
        assert_eq!(payload.program_target, PROGRAM);
        assert_eq!(payload.operation_name, "add_beneficiary");
        assert_eq!(payload.ordered_inputs, vec!["7field", ALICE, "5000u16"]);
        assert_eq!(payload.fee, 20_000);
        assert!(payload.reserved_record.is_none());
        assert_eq!(source.mapping_reads(), 2);
    }

    #[tokio::test]
    async fn cumulative_allocation_is_capped() {
        let source = MemoryRecordSource::new();
        source.set_mapping(PROGRAM, ALLOCATED_BPS_MAPPING, "7field", "6000u16");
        let mut asm = assembler(ClientConfig::default(), &source);

        assert_matches!(
            asm.add_beneficiary(&will(), BOB, 5_000).await,
            Err(TestamentError::AllocationExceeded {
                allocated: 6_000,
                requested: 5_000
            })
        );
        asm.add_beneficiary(&will(), BOB, 4_000).await.unwrap();
    }

    #[tokio::test]
    async fn full_will_rejects_another_beneficiary() {
        let source = MemoryRecordSource::new();
        source.set_mapping(PROGRAM, BENEFICIARY_COUNT_MAPPING, "7field", "16u8");
        let mut asm = assembler(ClientConfig::default(), &source);
        assert_matches!(
            asm.add_beneficiary(&will(), BOB, 100).await,
            Err(TestamentError::TooManyBeneficiaries { max: 16 })
        );
    }

    #[tokio::test]
    async fn local_validation_runs_before_mapping_reads() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);

        assert_matches!(
            asm.add_beneficiary(&will(), ALICE, 0).await,
            Err(TestamentError::InvalidShare { bps: 0 })
        );
        assert_matches!(
            asm.add_beneficiary(&will(), ALICE, 10_001).await,
            Err(TestamentError::InvalidShare { .. })
        );
        assert_matches!(
            asm.add_beneficiary(&will(), "bc1notanaleoaddress", 100).await,
            Err(TestamentError::InvalidInput { .. })
        );
        assert_eq!(source.mapping_reads(), 0);
    }

    #[tokio::test]
    async fn decoys_follow_real_inputs() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);

        let first = asm
            .add_beneficiary_with_decoys(&will(), ALICE, 2_500)
            .await
            .unwrap();
        let second = asm
            .add_beneficiary_with_decoys(&will(), ALICE, 2_500)
            .await
            .unwrap();

        assert_eq!(first.ordered_inputs.len(), 3 + 3);
        assert_eq!(first.ordered_inputs[..3], ["7field", ALICE, "2500u16"]);
        for decoy in &first.ordered_inputs[3..] {
            decoy.parse::<FieldElement>().unwrap();
        }
        assert_ne!(first.ordered_inputs[3..], second.ordered_inputs[3..]);
        assert_eq!(first.operation_name, "add_beneficiary_private");
    }
}

mod value {
    use super::*;

    fn funded(config: ClientConfig) -> TransactionAssembler<MemoryRecordSource, Sha256FieldHasher> {
        let source = MemoryRecordSource::new();
        assembler(config, &source).with_ledger(RecordLedger::with_records([
            record(50_000, "big"),
            record(5_000, "small"),
            record(5_000, "small2"),
        ]))
    }

    #[tokio::test]
    async fn deposit_embeds_reference_to_smallest_record() {
        let mut asm = funded(ClientConfig::default());

        let payload = asm.deposit(&will(), 4_000).await.unwrap();
        assert_eq!(payload.ordered_inputs, vec!["record:small", "7field", "4000u64"]);
        assert_eq!(payload.reserved_record.unwrap().amount, 5_000);

        let second = asm.deposit(&will(), 4_000).await.unwrap();
        assert_eq!(second.ordered_inputs[0], "record:small2");
        let third = asm.deposit(&will(), 4_000).await.unwrap();
        assert_eq!(third.ordered_inputs[0], "record:big");
        assert_matches!(
            asm.deposit(&will(), 4_000).await,
            Err(TestamentError::InsufficientBalance { required: 4_000 })
        );

        asm.ledger_mut().clear_session();
        assert_eq!(asm.deposit(&will(), 4_000).await.unwrap().ordered_inputs[0], "record:small");
    }

    #[tokio::test]
    async fn rejected_amount_reserves_nothing() {
        let mut asm = funded(ClientConfig::default());
        assert_matches!(
            asm.deposit(&will(), 999).await,
            Err(TestamentError::AmountBelowMinimum {
                amount: 999,
                minimum: 1_000
            })
        );
        assert_matches!(
            asm.deposit(&will(), u128::from(u64::MAX) + 1).await,
            Err(TestamentError::FieldOverflow { field: "amount", width: 64, .. })
        );
        assert!(asm.ledger().reserved_nonces().is_empty());
    }

    #[tokio::test]
    async fn private_fee_deposit_covers_amount_and_fee() {
        let mut asm = funded(private_fee_config());
        let payload = asm.deposit(&will(), 4_000).await.unwrap();
        assert_eq!(payload.fee, 20_000);
        assert_eq!(payload.ordered_inputs[0], "record:big");
    }

    #[tokio::test]
    async fn private_fee_reserves_fee_record_for_plain_operations() {
        let mut asm = funded(private_fee_config());
        let payload = asm.check_in(&will()).await.unwrap();
        assert_eq!(payload.ordered_inputs, vec!["7field", "record:big"]);
        assert_eq!(payload.fee, 10_000);

        assert_matches!(
            asm.trigger(&will()).await,
            Err(TestamentError::InsufficientFee { required: 20_000 })
        );
    }

    #[tokio::test]
    async fn withdraw_and_recovery_check_amounts() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);

        let payload = asm.withdraw(&will(), 2_000).await.unwrap();
        assert_eq!(payload.ordered_inputs, vec!["7field", "2000u64"]);

        let payload = asm.emergency_recovery(&will(), OWNER, 3_000).await.unwrap();
        assert_eq!(payload.ordered_inputs, vec!["7field", OWNER, "3000u64"]);
        assert_eq!(payload.fee, 40_000);

        assert_matches!(
            asm.withdraw(&will(), 10).await,
            Err(TestamentError::AmountBelowMinimum { .. })
        );
    }
}

mod lifecycle_ops {
    use super::*;

    #[tokio::test]
    async fn create_will_checks_period_widths() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);
        let root = FieldElement::from(99u64);

        let payload = asm.create_will(&will(), 86_400, 3_600, &root).await.unwrap();
        assert_eq!(
            payload.ordered_inputs,
            vec!["7field", "86400u32", "3600u32", "99field"]
        );
        assert_eq!(payload.fee, 30_000);

        assert_matches!(
            asm.create_will(&will(), u64::from(u32::MAX) + 1, 0, &root).await,
            Err(TestamentError::FieldOverflow {
                field: "check_in_period",
                width: 32,
                ..
            })
        );
    }

    #[tokio::test]
    async fn state_changes_carry_only_the_will() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);
        let w = will();

        for (payload, op) in [
            (asm.check_in(&w).await.unwrap(), OperationKind::CheckIn),
            (asm.trigger(&w).await.unwrap(), OperationKind::Trigger),
            (asm.deactivate(&w).await.unwrap(), OperationKind::Deactivate),
            (asm.reactivate(&w).await.unwrap(), OperationKind::Reactivate),
        ] {
            assert_eq!(payload.operation_name, op.name());
            assert_eq!(payload.ordered_inputs, vec!["7field"]);
            assert_eq!(payload.fee, asm.estimate_fee(op).unwrap());
        }
    }

    #[tokio::test]
    async fn payload_serializes_for_wallet_handoff() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);
        let payload = asm.claim_by_mapping(&will(), BOB).await.unwrap();
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(json["operation_name"], "claim_inheritance");
        assert_eq!(json["ordered_inputs"][1], BOB);
    }
}

mod proofs {
    use super::*;

    fn tree() -> CommitmentTree<Sha256FieldHasher> {
        CommitmentTree::from_beneficiaries(
            &[
                Beneficiary::new(ALICE, 6_000).unwrap(),
                Beneficiary::new(BOB, 4_000).unwrap(),
            ],
            4,
            Sha256FieldHasher,
        )
        .unwrap()
    }

    #[tokio::test]
    async fn claim_by_proof_encodes_verified_path() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);
        let tree = tree();
        let bob = Beneficiary::new(BOB, 4_000).unwrap();

        let payload = asm.claim_by_proof(&will(), &bob, 1, &tree).await.unwrap();
        let proof = tree.proof(1).unwrap();
        assert_eq!(
            payload.ordered_inputs,
            vec![
                "7field".to_string(),
                BOB.to_string(),
                "4000u16".to_string(),
                proof.encode_path(),
                "1u32".to_string(),
                tree.root().to_string(),
            ]
        );
        assert!(payload.ordered_inputs[3].starts_with('['));
        assert_eq!(payload.fee, 50_000);
    }

    #[tokio::test]
    async fn wrong_slot_or_share_fails_verification() {
        let source = MemoryRecordSource::new();
        let mut asm = assembler(ClientConfig::default(), &source);
        let tree = tree();

        let bob = Beneficiary::new(BOB, 4_000).unwrap();
        assert_matches!(
            asm.claim_by_proof(&will(), &bob, 0, &tree).await,
            Err(TestamentError::ProofVerificationFailed { index: 0 })
        );
        let greedy = Beneficiary::new(BOB, 9_000).unwrap();
        assert_matches!(
            asm.claim_by_proof(&will(), &greedy, 1, &tree).await,
            Err(TestamentError::ProofVerificationFailed { index: 1 })
        );
        assert_matches!(
            asm.claim_by_proof(&will(), &bob, 16, &tree).await,
            Err(TestamentError::IndexOutOfRange { index: 16, .. })
        );
    }

    /// Placeholder hash with a domain tag, standing in for a verifier primitive
    #[derive(Debug, Clone, Copy)]
    struct TaggedHasher;

    impl FieldHasher for TaggedHasher {
        fn combine(&self, left: &FieldElement, right: &FieldElement) -> FieldElement {
            let mut bytes = b"node".to_vec();
            bytes.extend(left.to_bytes_le());
            bytes.extend(right.to_bytes_le());
            Sha256FieldHasher.hash_bytes(&bytes)
        }

        fn hash_bytes(&self, data: &[u8]) -> FieldElement {
            let mut bytes = b"leaf".to_vec();
            bytes.extend_from_slice(data);
            Sha256FieldHasher.hash_bytes(&bytes)
        }
    }

    #[tokio::test]
    async fn claim_uses_the_hasher_the_tree_was_built_with() {
        let source = MemoryRecordSource::new();
        let mut asm =
            TransactionAssembler::new(ClientConfig::default(), source, TaggedHasher).unwrap();
        let alice = Beneficiary::new(ALICE, 6_000).unwrap();
        let tagged = CommitmentTree::from_beneficiaries(
            &[alice.clone(), Beneficiary::new(BOB, 4_000).unwrap()],
            4,
            TaggedHasher,
        )
        .unwrap();
        assert_ne!(tagged.root(), tree().root());

        let payload = asm.claim_by_proof(&will(), &alice, 0, &tagged).await.unwrap();
        assert_eq!(payload.ordered_inputs[5], tagged.root().to_string());
    }
}
