//! # Testament Lifecycle - Layer 3: Transaction Tracking
//!
//! Drives a payload through `idle -> signing -> broadcasting ->
//! {queued|processing} -> finalized`, or into one of the terminal failures
//! `rejected`, `failed` and `timeout`.
//!
//! Polling is an explicit loop over a [`TimeEffects`] clock with a
//! cancellation token, so tests run it on virtual time. Only one loop is
//! live per lifecycle.
//!
//! [`TimeEffects`]: testament_core::effects::TimeEffects

#![forbid(unsafe_code)]

pub mod lifecycle;
pub mod state;

pub use lifecycle::{Canceller, TransactionLifecycle};
pub use state::{LifecycleState, LifecycleStatus, PollOutcome};
