//! Construction session state.

use std::collections::BTreeSet;

use testament_core::{RecordNonce, Result, TestamentError};

/// Nonces reserved since the session was last cleared
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationSession {
    reserved: BTreeSet<RecordNonce>,
}

impl ReservationSession {
    /// Empty session
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a nonce; a second reservation of the same nonce fails
    pub fn reserve(&mut self, nonce: &RecordNonce) -> Result<()> {
        if !self.reserved.insert(nonce.clone()) {
            return Err(TestamentError::NonceAlreadyReserved {
                nonce: nonce.to_string(),
            });
        }
        Ok(())
    }

    /// Whether the nonce is held
    pub fn contains(&self, nonce: &RecordNonce) -> bool {
        self.reserved.contains(nonce)
    }

    /// Reserved nonces in order
    pub fn nonces(&self) -> &BTreeSet<RecordNonce> {
        &self.reserved
    }

    /// Number of reserved nonces
    pub fn len(&self) -> usize {
        self.reserved.len()
    }

    /// True when nothing is reserved
    pub fn is_empty(&self) -> bool {
        self.reserved.is_empty()
    }

    /// Release every reservation
    pub fn clear(&mut self) {
        self.reserved.clear();
    }
}
