//! # Testament Testkit - Layer 8: Test Infrastructure
//!
//! Deterministic fakes for every effect trait in `testament-core`, plus
//! small fixtures. Nothing here uses real time or network.
//!
//! ```toml
//! [dev-dependencies]
//! testament-testkit = { path = "../testament-testkit" }
//! ```

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod chain;
pub mod fixtures;
pub mod logging;
pub mod records;
pub mod signer;
pub mod time;

pub use chain::{QueryHook, ScriptedChain, StatusStep};
pub use fixtures::*;
pub use logging::init_test_tracing;
pub use records::MemoryRecordSource;
pub use signer::ScriptedSigner;
pub use time::FakeClock;
