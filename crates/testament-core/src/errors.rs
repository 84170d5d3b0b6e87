//! Unified error system for the Testament client
//!
//! A single error type covers every subsystem. Each variant belongs to one
//! [`ErrorCategory`], carries a stable machine-readable code and renders a
//! human-readable default message. Network errors can wrap the underlying
//! cause without losing it.

use std::error::Error as StdError;
use std::fmt;

/// Boxed source error preserved on transient failures.
pub type BoxedCause = Box<dyn StdError + Send + Sync + 'static>;

/// Coarse classification used by callers to decide what to do next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Bad caller input; fix the input and resubmit.
    Validation,
    /// Funds or reservations are missing; acquire funds or clear the session.
    Resource,
    /// Programming or upstream data error in tree or proof handling.
    Structural,
    /// Network or signer condition that may clear on its own.
    Transient,
    /// Terminal verdict from the ledger.
    OnChain,
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Validation => "validation",
            Self::Resource => "resource",
            Self::Structural => "structural",
            Self::Transient => "transient",
            Self::OnChain => "on-chain",
        };
        f.write_str(name)
    }
}

/// Unified error type for all Testament operations
#[derive(Debug, thiserror::Error)]
pub enum TestamentError {
    /// Share basis points outside (0, 10000]
    #[error("Invalid share: {bps} basis points is outside (0, 10000]")]
    InvalidShare {
        /// Offending share
        bps: u32,
    },

    /// Cumulative allocation would exceed 100%
    #[error("Allocation exceeded: {allocated} bps already allocated, {requested} bps requested, limit 10000")]
    AllocationExceeded {
        /// Basis points already allocated to other beneficiaries
        allocated: u32,
        /// Basis points requested by this operation
        requested: u32,
    },

    /// Value does not fit the fixed-width protocol field
    #[error("Field overflow: {field} = {value} does not fit in {width} bits")]
    FieldOverflow {
        /// Protocol field name
        field: &'static str,
        /// Value supplied by the caller
        value: u128,
        /// Bit width mandated by the protocol
        width: u32,
    },

    /// Will already holds the maximum number of beneficiaries
    #[error("Too many beneficiaries: at most {max} are supported")]
    TooManyBeneficiaries {
        /// Maximum beneficiary count
        max: usize,
    },

    /// Amount under the dust floor
    #[error("Amount {amount} is below the minimum transferable amount {minimum}")]
    AmountBelowMinimum {
        /// Requested amount
        amount: u64,
        /// Protocol floor
        minimum: u64,
    },

    /// Malformed input value
    #[error("Invalid input: {message}")]
    InvalidInput {
        /// Description of the malformed input
        message: String,
    },

    /// Configuration rejected by validation
    #[error("Invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the rejected setting
        message: String,
    },

    /// No unreserved record covers the requested amount
    #[error("Insufficient balance: no unreserved record holds at least {required}")]
    InsufficientBalance {
        /// Amount that had to be covered
        required: u64,
    },

    /// No unreserved record covers the fee
    #[error("Insufficient fee: no unreserved record holds at least {required} for the fee")]
    InsufficientFee {
        /// Fee that had to be covered
        required: u64,
    },

    /// Record nonce reserved twice in one session
    #[error("Record nonce {nonce} is already reserved in this session")]
    NonceAlreadyReserved {
        /// Nonce reserved twice
        nonce: String,
    },

    /// Leaf index outside the tree
    #[error("Index {index} is out of range for a tree with {capacity} slots")]
    IndexOutOfRange {
        /// Requested index
        index: usize,
        /// Number of slots in the tree
        capacity: usize,
    },

    /// Leaves do not fit the tree
    #[error("Capacity exceeded: {supplied} does not fit a tree with {capacity} slots")]
    CapacityExceeded {
        /// Offending leaf count or index
        supplied: usize,
        /// Number of slots in the tree
        capacity: usize,
    },

    /// Unsupported tree depth
    #[error("Invalid tree depth {depth}: must be within 1..={max}")]
    InvalidDepth {
        /// Requested depth
        depth: u32,
        /// Largest supported depth
        max: u32,
    },

    /// Two leaves claim the same slot
    #[error("Duplicate leaf index {index}")]
    DuplicateLeafIndex {
        /// Slot supplied twice
        index: usize,
    },

    /// Proof does not recompute the expected root
    #[error("Proof verification failed for leaf index {index}")]
    ProofVerificationFailed {
        /// Leaf index of the proof
        index: usize,
    },

    /// Transport or status-query failure
    #[error("Network error: {message}")]
    Network {
        /// Description of the failure
        message: String,
        /// Underlying cause
        #[source]
        source: Option<BoxedCause>,
    },

    /// Wallet is not ready to sign yet
    #[error("Signer not ready")]
    SignerNotReady,

    /// Retries or polling attempts exhausted
    #[error("Timed out after {attempts} attempts")]
    Timeout {
        /// Attempts made
        attempts: u32,
    },

    /// Rejected by the signer or the ledger
    #[error("Transaction rejected: {reason}")]
    Rejected {
        /// Raw reason for display
        reason: String,
    },

    /// Execution failed on chain
    #[error("Transaction failed: {reason}")]
    Failed {
        /// Raw reason for display
        reason: String,
    },
}

impl TestamentError {
    /// Create an invalid input error
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an invalid configuration error
    pub fn invalid_config(message: impl Into<String>) -> Self {
        Self::InvalidConfig {
            message: message.into(),
        }
    }

    /// Create a network error without an underlying cause
    pub fn network(message: impl Into<String>) -> Self {
        Self::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error wrapping its cause
    pub fn network_with_cause(
        message: impl Into<String>,
        cause: impl StdError + Send + Sync + 'static,
    ) -> Self {
        Self::Network {
            message: message.into(),
            source: Some(Box::new(cause)),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            Self::InvalidShare { .. } => "VALIDATION_INVALID_SHARE",
            Self::AllocationExceeded { .. } => "VALIDATION_ALLOCATION_EXCEEDED",
            Self::FieldOverflow { .. } => "VALIDATION_FIELD_OVERFLOW",
            Self::TooManyBeneficiaries { .. } => "VALIDATION_TOO_MANY_BENEFICIARIES",
            Self::AmountBelowMinimum { .. } => "VALIDATION_AMOUNT_BELOW_MINIMUM",
            Self::InvalidInput { .. } => "VALIDATION_INVALID_INPUT",
            Self::InvalidConfig { .. } => "VALIDATION_INVALID_CONFIG",
            Self::InsufficientBalance { .. } => "RESOURCE_INSUFFICIENT_BALANCE",
            Self::InsufficientFee { .. } => "RESOURCE_INSUFFICIENT_FEE",
            Self::NonceAlreadyReserved { .. } => "RESOURCE_NONCE_ALREADY_RESERVED",
            Self::IndexOutOfRange { .. } => "STRUCTURAL_INDEX_OUT_OF_RANGE",
            Self::CapacityExceeded { .. } => "STRUCTURAL_CAPACITY_EXCEEDED",
            Self::InvalidDepth { .. } => "STRUCTURAL_INVALID_DEPTH",
            Self::DuplicateLeafIndex { .. } => "STRUCTURAL_DUPLICATE_LEAF_INDEX",
            Self::ProofVerificationFailed { .. } => "STRUCTURAL_PROOF_VERIFICATION_FAILED",
            Self::Network { .. } => "TRANSIENT_NETWORK",
            Self::SignerNotReady => "TRANSIENT_SIGNER_NOT_READY",
            Self::Timeout { .. } => "TRANSIENT_TIMEOUT",
            Self::Rejected { .. } => "ONCHAIN_REJECTED",
            Self::Failed { .. } => "ONCHAIN_FAILED",
        }
    }

    /// Category of this error
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidShare { .. }
            | Self::AllocationExceeded { .. }
            | Self::FieldOverflow { .. }
            | Self::TooManyBeneficiaries { .. }
            | Self::AmountBelowMinimum { .. }
            | Self::InvalidInput { .. }
            | Self::InvalidConfig { .. } => ErrorCategory::Validation,
            Self::InsufficientBalance { .. }
            | Self::InsufficientFee { .. }
            | Self::NonceAlreadyReserved { .. } => ErrorCategory::Resource,
            Self::IndexOutOfRange { .. }
            | Self::CapacityExceeded { .. }
            | Self::InvalidDepth { .. }
            | Self::DuplicateLeafIndex { .. }
            | Self::ProofVerificationFailed { .. } => ErrorCategory::Structural,
            Self::Network { .. } | Self::SignerNotReady | Self::Timeout { .. } => {
                ErrorCategory::Transient
            }
            Self::Rejected { .. } | Self::Failed { .. } => ErrorCategory::OnChain,
        }
    }

    /// Whether the internal retry policy may retry this error.
    ///
    /// `Timeout` is transient in category but already marks exhausted retries.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::SignerNotReady)
    }
}

/// Standard Result type for Testament operations
pub type Result<T> = std::result::Result<T, TestamentError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    fn every_variant() -> Vec<TestamentError> {
        vec![
            TestamentError::InvalidShare { bps: 0 },
            TestamentError::AllocationExceeded {
                allocated: 9000,
                requested: 2000,
            },
            TestamentError::FieldOverflow {
                field: "period",
                value: 1 << 40,
                width: 32,
            },
            TestamentError::TooManyBeneficiaries { max: 16 },
            TestamentError::AmountBelowMinimum {
                amount: 1,
                minimum: 1000,
            },
            TestamentError::invalid_input("x"),
            TestamentError::invalid_config("x"),
            TestamentError::InsufficientBalance { required: 5 },
            TestamentError::InsufficientFee { required: 5 },
            TestamentError::NonceAlreadyReserved {
                nonce: "n".to_string(),
            },
            TestamentError::IndexOutOfRange {
                index: 16,
                capacity: 16,
            },
            TestamentError::CapacityExceeded {
                supplied: 17,
                capacity: 16,
            },
            TestamentError::InvalidDepth { depth: 0, max: 20 },
            TestamentError::DuplicateLeafIndex { index: 3 },
            TestamentError::ProofVerificationFailed { index: 1 },
            TestamentError::network("down"),
            TestamentError::SignerNotReady,
            TestamentError::Timeout { attempts: 3 },
            TestamentError::Rejected {
                reason: "user".to_string(),
            },
            TestamentError::Failed {
                reason: "vm".to_string(),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let errors = every_variant();
        let codes: HashSet<_> = errors.iter().map(|e| e.code()).collect();
        assert_eq!(codes.len(), errors.len());
    }

    #[test]
    fn only_transient_errors_are_retryable() {
        for err in every_variant() {
            if err.is_retryable() {
                assert_eq!(err.category(), ErrorCategory::Transient, "{}", err.code());
            }
        }
        assert!(!TestamentError::Timeout { attempts: 1 }.is_retryable());
        assert!(!TestamentError::Rejected {
            reason: "no".to_string()
        }
        .is_retryable());
    }

    #[test]
    fn network_error_keeps_its_cause() {
        let io_err = std::io::Error::new(std::io::ErrorKind::ConnectionReset, "reset by peer");
        let err = TestamentError::network_with_cause("status query failed", io_err);
        let source = err.source().map(|s| s.to_string());
        assert_eq!(source.as_deref(), Some("reset by peer"));
        assert_eq!(err.to_string(), "Network error: status query failed");
    }

    #[test]
    fn overflow_message_is_descriptive() {
        let err = TestamentError::FieldOverflow {
            field: "check_in_period",
            value: 4_294_967_296,
            width: 32,
        };
        assert_eq!(
            err.to_string(),
            "Field overflow: check_in_period = 4294967296 does not fit in 32 bits"
        );
    }
}
