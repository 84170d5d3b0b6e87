//! Protocol operations and their fee multipliers.

use std::fmt;

use testament_core::{Result, TestamentError};

/// Logical operations of the will program
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OperationKind {
    /// Open a will with its check-in deadline
    CreateWill,
    /// Add one beneficiary and share
    AddBeneficiary,
    /// Add a beneficiary with random decoy inputs
    AddBeneficiaryWithDecoys,
    /// Lock value into a will
    Deposit,
    /// Refresh the check-in deadline
    CheckIn,
    /// Trigger a will whose deadline passed
    Trigger,
    /// Claim a share recorded in the public mapping
    ClaimByMapping,
    /// Claim a share by proving tree membership
    ClaimByProof,
    /// Pause a will
    Deactivate,
    /// Resume a paused will
    Reactivate,
    /// Owner recovery of locked value
    EmergencyRecovery,
    /// Withdraw value from an active will
    Withdraw,
}

impl OperationKind {
    /// Every operation, in declaration order
    pub const ALL: [OperationKind; 12] = [
        OperationKind::CreateWill,
        OperationKind::AddBeneficiary,
        OperationKind::AddBeneficiaryWithDecoys,
        OperationKind::Deposit,
        OperationKind::CheckIn,
        OperationKind::Trigger,
        OperationKind::ClaimByMapping,
        OperationKind::ClaimByProof,
        OperationKind::Deactivate,
        OperationKind::Reactivate,
        OperationKind::EmergencyRecovery,
        OperationKind::Withdraw,
    ];

    /// Program function name
    pub fn name(&self) -> &'static str {
        match self {
            OperationKind::CreateWill => "create_will",
            OperationKind::AddBeneficiary => "add_beneficiary",
            OperationKind::AddBeneficiaryWithDecoys => "add_beneficiary_private",
            OperationKind::Deposit => "deposit",
            OperationKind::CheckIn => "check_in",
            OperationKind::Trigger => "trigger_will",
            OperationKind::ClaimByMapping => "claim_inheritance",
            OperationKind::ClaimByProof => "claim_with_proof",
            OperationKind::Deactivate => "deactivate_will",
            OperationKind::Reactivate => "reactivate_will",
            OperationKind::EmergencyRecovery => "emergency_recovery",
            OperationKind::Withdraw => "withdraw",
        }
    }

    /// Operation by program function name
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.name() == name)
    }

    /// Whether the operation moves value and so consumes a record
    pub fn moves_value(&self) -> bool {
        matches!(self, OperationKind::Deposit)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Relative verification cost per program function
static COMPLEXITY_MULTIPLIERS: &[(&str, u64)] = &[
    ("create_will", 3),
    ("add_beneficiary", 2),
    ("add_beneficiary_private", 3),
    ("deposit", 2),
    ("check_in", 1),
    ("trigger_will", 2),
    ("claim_inheritance", 3),
    ("claim_with_proof", 5),
    ("deactivate_will", 1),
    ("reactivate_will", 1),
    ("emergency_recovery", 4),
    ("withdraw", 2),
];

/// Multiplier for a function name; unknown names cost 1
pub fn complexity_multiplier(name: &str) -> u64 {
    COMPLEXITY_MULTIPLIERS
        .iter()
        .find(|(op, _)| *op == name)
        .map_or(1, |(_, multiplier)| *multiplier)
}

/// `base_fee * multiplier[name]`, rejecting overflow
pub fn fee_for(base_fee: u64, name: &str) -> Result<u64> {
    let multiplier = complexity_multiplier(name);
    base_fee
        .checked_mul(multiplier)
        .ok_or(TestamentError::FieldOverflow {
            field: "fee",
            value: u128::from(base_fee) * u128::from(multiplier),
            width: 64,
        })
}
