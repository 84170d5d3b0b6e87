//! # Testament Core - Layer 1: Foundation
//!
//! Foundation types shared by every Testament crate:
//!
//! - [`FieldElement`]: reduced base-field values in the ledger's literal syntax
//! - [`FieldHasher`]: the single swappable hash primitive of the verifier
//! - [`TestamentError`]: unified error taxonomy with stable codes
//! - [`effects`]: collaborator traits (chain, signer, record source, clock)
//! - [`ClientConfig`]: TOML and environment driven configuration
//! - [`RetryPolicy`]: bounded retry for transient wallet failures
//!
//! ## What Does NOT Belong Here
//!
//! - Tree, ledger, assembly or lifecycle logic (layer 2 and 3 crates)
//! - Concrete RPC, wallet or storage handlers

#![forbid(unsafe_code)]

pub mod config;
pub mod effects;
pub mod errors;
pub mod field;
pub mod hash;
pub mod reliability;
pub mod types;
pub mod validation;

pub use config::{ClientConfig, DEFAULT_TREE_DEPTH};
pub use errors::{ErrorCategory, Result, TestamentError};
pub use field::FieldElement;
pub use hash::{FieldHasher, Sha256FieldHasher};
pub use reliability::{BackoffStrategy, RetryPolicy, RetryResult};
pub use types::{
    AssembledPayload, ChainStatus, OperationId, RecordNonce, TransactionRecord, ValueRecord,
};

/// Largest share expressible in basis points (100%)
pub const MAX_SHARE_BPS: u32 = 10_000;
