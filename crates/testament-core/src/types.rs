//! Shared domain types.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::field::FieldElement;

/// Opaque, unique nonce of a spendable record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RecordNonce(String);

impl RecordNonce {
    /// Wrap a nonce as reported by the record source
    pub fn new(nonce: impl Into<String>) -> Self {
        Self(nonce.into())
    }

    /// Borrow the nonce text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RecordNonce {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RecordNonce {
    fn from(nonce: &str) -> Self {
        Self::new(nonce)
    }
}

/// A unit of spendable custody value
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRecord {
    /// Amount held by the record
    pub amount: u64,
    /// Unique nonce
    pub nonce: RecordNonce,
    /// Whether the network has confirmed the record as consumed
    pub spent: bool,
    /// Commitment to the owning address
    pub owner_commitment: FieldElement,
}

impl ValueRecord {
    /// Construct an unspent record
    pub fn new(amount: u64, nonce: impl Into<String>, owner_commitment: FieldElement) -> Self {
        Self {
            amount,
            nonce: RecordNonce::new(nonce),
            spent: false,
            owner_commitment,
        }
    }

    /// Reference embedded in payloads in place of the raw balance
    pub fn reference(&self) -> String {
        format!("record:{}", self.nonce)
    }
}

/// Externally assigned identifier of a submitted transaction
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OperationId(String);

impl OperationId {
    /// Wrap an identifier returned by a signer or broadcaster
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the identifier text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Fully formed transaction payload, ready for a signer or broadcaster.
///
/// Immutable once returned by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssembledPayload {
    /// Program the transaction executes against
    pub program_target: String,
    /// Program function name
    pub operation_name: String,
    /// Protocol-typed inputs in call order
    pub ordered_inputs: Vec<String>,
    /// Fee in the ledger's base unit
    pub fee: u64,
    /// Record reserved for this payload, if any
    pub reserved_record: Option<ValueRecord>,
}

/// Status reported by the broadcast/status collaborator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChainStatus {
    /// Accepted into the mempool
    Queued,
    /// Being executed
    Processing,
    /// Included and confirmed
    Finalized,
    /// Rejected by the network
    Rejected(String),
    /// Execution failed
    Failed(String),
    /// Not yet visible to the queried node
    Unknown,
}

/// Inclusion details of a confirmed transaction
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Height of the including block, when known
    pub block_height: Option<u64>,
}
