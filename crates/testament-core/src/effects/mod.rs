//! Effect traits for the collaborators the client talks to
//!
//! The core never performs I/O itself. Everything that may suspend (status
//! queries, broadcast, wallet calls, record reads, sleeping) sits behind one
//! of these traits. Production handlers wrap RPC and wallet adapters; the
//! testkit provides deterministic fakes.

pub mod chain;
pub mod records;
pub mod signer;
pub mod task;
pub mod time;

pub use chain::ChainEffects;
pub use records::RecordSourceEffects;
pub use signer::{SignError, SignerEffects};
pub use task::CancellationToken;
pub use time::{TimeEffects, TokioTimeEffects};
