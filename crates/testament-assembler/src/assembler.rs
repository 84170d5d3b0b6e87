//! Payload assembly.
//!
//! Every operation validates its inputs first, then reads the will's public
//! mappings, and only then touches the tree or reserves records. A failed
//! validation therefore leaves the ledger session untouched.

use rand::thread_rng;
use tracing::{debug, info};

use testament_core::effects::RecordSourceEffects;
use testament_core::validation::{to_u32_field, to_u64_field, validate_share_bps};
use testament_core::{
    AssembledPayload, ClientConfig, FieldElement, FieldHasher, Result, Sha256FieldHasher,
    TestamentError, ValueRecord, MAX_SHARE_BPS,
};
use testament_ledger::RecordLedger;
use testament_tree::{verify_proof, Beneficiary, CommitmentTree};

use crate::encoding;
use crate::operation::{fee_for, OperationKind};

/// Mapping holding the basis points already allocated per will
pub const ALLOCATED_BPS_MAPPING: &str = "allocated_bps";
/// Mapping holding the beneficiary count per will
pub const BENEFICIARY_COUNT_MAPPING: &str = "beneficiary_count";

/// Builds payloads for one client, owning its record ledger
#[derive(Debug)]
pub struct TransactionAssembler<S, H = Sha256FieldHasher> {
    config: ClientConfig,
    source: S,
    hasher: H,
    ledger: RecordLedger,
}

impl<S: RecordSourceEffects, H: FieldHasher> TransactionAssembler<S, H> {
    /// Assembler with an empty ledger; fails on invalid configuration
    pub fn new(config: ClientConfig, source: S, hasher: H) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            config,
            source,
            hasher,
            ledger: RecordLedger::new(),
        })
    }

    /// Replace the ledger
    pub fn with_ledger(mut self, ledger: RecordLedger) -> Self {
        self.ledger = ledger;
        self
    }

    /// Active configuration
    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Record ledger
    pub fn ledger(&self) -> &RecordLedger {
        &self.ledger
    }

    /// Mutable record ledger, e.g. to clear the session or mark records spent
    pub fn ledger_mut(&mut self) -> &mut RecordLedger {
        &mut self.ledger
    }

    /// Reload spendable records from the source
    pub async fn refresh_records(&mut self) -> Result<usize> {
        self.ledger.refresh(&self.source).await
    }

    /// Fee for an operation at the configured base fee
    pub fn estimate_fee(&self, op: OperationKind) -> Result<u64> {
        fee_for(self.config.fees.base_fee, op.name())
    }

    /// Open a will committing to a beneficiary tree root
    pub async fn create_will(
        &mut self,
        will_id: &FieldElement,
        check_in_period: u64,
        grace_period: u64,
        beneficiary_root: &FieldElement,
    ) -> Result<AssembledPayload> {
        let check_in_period = to_u32_field("check_in_period", check_in_period)?;
        let grace_period = to_u32_field("grace_period", grace_period)?;
        if check_in_period == 0 {
            return Err(TestamentError::invalid_input("check_in_period must be positive"));
        }
        let inputs = vec![
            encoding::field(will_id),
            encoding::u32_literal(check_in_period),
            encoding::u32_literal(grace_period),
            encoding::field(beneficiary_root),
        ];
        self.assemble(OperationKind::CreateWill, inputs, 0)
    }

    /// Add a beneficiary after checking the will's allocation and size
    pub async fn add_beneficiary(
        &mut self,
        will_id: &FieldElement,
        beneficiary: &str,
        share_bps: u32,
    ) -> Result<AssembledPayload> {
        let inputs = self
            .beneficiary_inputs(will_id, beneficiary, share_bps)
            .await?;
        self.assemble(OperationKind::AddBeneficiary, inputs, 0)
    }

    /// [`Self::add_beneficiary`] followed by `decoy_count` random field inputs
    pub async fn add_beneficiary_with_decoys(
        &mut self,
        will_id: &FieldElement,
        beneficiary: &str,
        share_bps: u32,
    ) -> Result<AssembledPayload> {
        let inputs = self
            .beneficiary_inputs(will_id, beneficiary, share_bps)
            .await?;
        let decoys = self.config.assembler.decoy_count;
        self.assemble(OperationKind::AddBeneficiaryWithDecoys, inputs, decoys)
    }

    /// Lock `amount` into a will, funded by a reserved record.
    ///
    /// With private fees the record must also cover the fee.
    pub async fn deposit(&mut self, will_id: &FieldElement, amount: u128) -> Result<AssembledPayload> {
        let amount = self.check_amount(amount)?;
        let op = OperationKind::Deposit;
        let fee = self.estimate_fee(op)?;
        let required = if self.config.fees.private_fee {
            amount
                .checked_add(fee)
                .ok_or(TestamentError::FieldOverflow {
                    field: "amount",
                    value: u128::from(amount) + u128::from(fee),
                    width: 64,
                })?
        } else {
            amount
        };

        let record = self.ledger.select_and_reserve(required)?;
        let inputs = vec![
            record.reference(),
            encoding::field(will_id),
            encoding::u64_literal(amount),
        ];
        Ok(self.finish(op, inputs, fee, Some(record), 0))
    }

    /// Refresh the will's deadline
    pub async fn check_in(&mut self, will_id: &FieldElement) -> Result<AssembledPayload> {
        self.assemble(OperationKind::CheckIn, vec![encoding::field(will_id)], 0)
    }

    /// Trigger a will whose deadline passed
    pub async fn trigger(&mut self, will_id: &FieldElement) -> Result<AssembledPayload> {
        self.assemble(OperationKind::Trigger, vec![encoding::field(will_id)], 0)
    }

    /// Pause a will
    pub async fn deactivate(&mut self, will_id: &FieldElement) -> Result<AssembledPayload> {
        self.assemble(OperationKind::Deactivate, vec![encoding::field(will_id)], 0)
    }

    /// Resume a paused will
    pub async fn reactivate(&mut self, will_id: &FieldElement) -> Result<AssembledPayload> {
        self.assemble(OperationKind::Reactivate, vec![encoding::field(will_id)], 0)
    }

    /// Claim the share recorded for `claimant` in the public mapping
    pub async fn claim_by_mapping(
        &mut self,
        will_id: &FieldElement,
        claimant: &str,
    ) -> Result<AssembledPayload> {
        let claimant = encoding::address(claimant, &self.config.program.address_prefix)?;
        self.assemble(
            OperationKind::ClaimByMapping,
            vec![encoding::field(will_id), claimant],
            0,
        )
    }

    /// Claim by proving `claimant` sits at `index` in the committed tree.
    ///
    /// The proof is checked locally before the payload is returned.
    pub async fn claim_by_proof(
        &mut self,
        will_id: &FieldElement,
        claimant: &Beneficiary,
        index: usize,
        tree: &CommitmentTree<H>,
    ) -> Result<AssembledPayload> {
        claimant.validate()?;
        let address = encoding::address(&claimant.address, &self.config.program.address_prefix)?;

        let leaf = claimant.leaf(&self.hasher);
        if *tree.leaf(index)? != leaf {
            debug!(index, "claimant leaf differs from committed leaf");
            return Err(TestamentError::ProofVerificationFailed { index });
        }
        let proof = tree.proof(index)?;
        if !verify_proof(&self.hasher, &leaf, &proof) {
            return Err(TestamentError::ProofVerificationFailed { index });
        }

        let [path, path_indices, root] = proof.to_inputs();
        let inputs = vec![
            encoding::field(will_id),
            address,
            encoding::u16_literal(claimant.share_bps),
            path,
            path_indices,
            root,
        ];
        self.assemble(OperationKind::ClaimByProof, inputs, 0)
    }

    /// Owner recovery of `amount` to `recipient`
    pub async fn emergency_recovery(
        &mut self,
        will_id: &FieldElement,
        recipient: &str,
        amount: u128,
    ) -> Result<AssembledPayload> {
        let recipient = encoding::address(recipient, &self.config.program.address_prefix)?;
        let amount = self.check_amount(amount)?;
        let inputs = vec![
            encoding::field(will_id),
            recipient,
            encoding::u64_literal(amount),
        ];
        self.assemble(OperationKind::EmergencyRecovery, inputs, 0)
    }

    /// Withdraw `amount` from an active will
    pub async fn withdraw(&mut self, will_id: &FieldElement, amount: u128) -> Result<AssembledPayload> {
        let amount = self.check_amount(amount)?;
        let inputs = vec![encoding::field(will_id), encoding::u64_literal(amount)];
        self.assemble(OperationKind::Withdraw, inputs, 0)
    }

    async fn beneficiary_inputs(
        &self,
        will_id: &FieldElement,
        beneficiary: &str,
        share_bps: u32,
    ) -> Result<Vec<String>> {
        let share = validate_share_bps(share_bps)?;
        let address = encoding::address(beneficiary, &self.config.program.address_prefix)?;

        let max = 1usize << self.config.tree.depth;
        let count = self.read_counter(BENEFICIARY_COUNT_MAPPING, will_id).await?;
        if count >= max as u64 {
            return Err(TestamentError::TooManyBeneficiaries { max });
        }

        let allocated = self.read_counter(ALLOCATED_BPS_MAPPING, will_id).await?;
        if allocated.saturating_add(u64::from(share)) > u64::from(MAX_SHARE_BPS) {
            return Err(TestamentError::AllocationExceeded {
                allocated: u32::try_from(allocated).unwrap_or(u32::MAX),
                requested: u32::from(share),
            });
        }

        Ok(vec![
            encoding::field(will_id),
            address,
            encoding::u16_literal(share),
        ])
    }

    /// Counter mapping value for a will; absent keys read as zero
    async fn read_counter(&self, mapping: &str, will_id: &FieldElement) -> Result<u64> {
        let key = will_id.to_string();
        let value = self
            .source
            .read_mapping(&self.config.program.program_id, mapping, &key)
            .await?;
        let parsed = value
            .as_deref()
            .map(encoding::parse_unsigned_literal)
            .transpose()?
            .unwrap_or(0);
        debug!(mapping, %key, value = parsed, "read will mapping");
        Ok(parsed)
    }

    fn check_amount(&self, amount: u128) -> Result<u64> {
        let amount = to_u64_field("amount", amount)?;
        let minimum = self.config.assembler.min_transfer_amount;
        if amount < minimum {
            return Err(TestamentError::AmountBelowMinimum { amount, minimum });
        }
        Ok(amount)
    }

    /// Price and finish a non-value operation, reserving a fee record in
    /// private fee mode
    fn assemble(
        &mut self,
        op: OperationKind,
        mut inputs: Vec<String>,
        decoys: usize,
    ) -> Result<AssembledPayload> {
        let fee = self.estimate_fee(op)?;
        let fee_record = if self.config.fees.private_fee {
            let record = self.ledger.select_and_reserve(fee).map_err(|err| match err {
                TestamentError::InsufficientBalance { required } => {
                    TestamentError::InsufficientFee { required }
                }
                other => other,
            })?;
            inputs.push(record.reference());
            Some(record)
        } else {
            None
        };
        Ok(self.finish(op, inputs, fee, fee_record, decoys))
    }

    fn finish(
        &self,
        op: OperationKind,
        mut inputs: Vec<String>,
        fee: u64,
        reserved_record: Option<ValueRecord>,
        decoys: usize,
    ) -> AssembledPayload {
        let mut rng = thread_rng();
        inputs.extend((0..decoys).map(|_| encoding::field(&FieldElement::random(&mut rng))));

        info!(
            operation = %op,
            fee,
            inputs = inputs.len(),
            decoys,
            reserved = ?reserved_record.as_ref().map(|r| r.nonce.as_str()),
            "assembled payload"
        );
        AssembledPayload {
            program_target: self.config.program.program_id.clone(),
            operation_name: op.name().to_string(),
            ordered_inputs: inputs,
            fee,
            reserved_record,
        }
    }
}
