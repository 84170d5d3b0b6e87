//! # Testament Assembler - Layer 3: Payload Construction
//!
//! Turns logical will operations into [`AssembledPayload`]s: ordered
//! protocol-typed inputs, a fee, and the record reserved to fund it. The
//! assembler never submits anything; hand the payload to a lifecycle.
//!
//! [`AssembledPayload`]: testament_core::AssembledPayload

#![forbid(unsafe_code)]

pub mod assembler;
pub mod encoding;
pub mod operation;

pub use assembler::{TransactionAssembler, ALLOCATED_BPS_MAPPING, BENEFICIARY_COUNT_MAPPING};
pub use operation::{complexity_multiplier, fee_for, OperationKind};
