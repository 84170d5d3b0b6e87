//! # Testament Ledger - Layer 2: Record Reservation
//!
//! Chooses which spendable record funds a payload and makes sure no record
//! feeds two payloads built in the same construction session.
//!
//! Record states: discovered, reserved (nonce held by the session),
//! consumed (embedded in a submitted payload) and spent (network confirmed).
//! Reservations are in-process only; a second client instance on the same
//! account has its own view.

#![forbid(unsafe_code)]

pub mod ledger;
pub mod session;

pub use ledger::RecordLedger;
pub use session::ReservationSession;
