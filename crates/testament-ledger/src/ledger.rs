//! Record pool and selection.

use std::collections::BTreeSet;
use tracing::{debug, info, warn};

use testament_core::effects::RecordSourceEffects;
use testament_core::{RecordNonce, Result, TestamentError, ValueRecord};

use crate::session::ReservationSession;

/// Candidate pool plus the session that guards it against double use
#[derive(Debug, Clone, Default)]
pub struct RecordLedger {
    records: Vec<ValueRecord>,
    spent: BTreeSet<RecordNonce>,
    session: ReservationSession,
}

impl RecordLedger {
    /// Empty ledger
    pub fn new() -> Self {
        Self::default()
    }

    /// Ledger over a known pool
    pub fn with_records(records: impl IntoIterator<Item = ValueRecord>) -> Self {
        let mut ledger = Self::new();
        ledger.replace_records(records.into_iter().collect());
        ledger
    }

    /// Reload the pool from the record source.
    ///
    /// Spent records are dropped, as are records this ledger already marked
    /// spent while the source lags behind. Reservations survive a refresh.
    pub async fn refresh<S: RecordSourceEffects + ?Sized>(&mut self, source: &S) -> Result<usize> {
        let records = source.fetch_records().await?;
        self.replace_records(records);
        debug!(candidates = self.records.len(), "refreshed record pool");
        Ok(self.records.len())
    }

    fn replace_records(&mut self, records: Vec<ValueRecord>) {
        let spent = &self.spent;
        self.records = records
            .into_iter()
            .filter(|r| !r.spent && !spent.contains(&r.nonce))
            .collect();
    }

    /// Smallest unspent record with `amount >= min_amount` whose nonce is
    /// not in `excluded`. Ties on amount resolve by nonce order.
    pub fn find_value_record(
        &self,
        min_amount: u64,
        excluded: &BTreeSet<RecordNonce>,
    ) -> Result<ValueRecord> {
        self.records
            .iter()
            .filter(|r| !r.spent && r.amount >= min_amount && !excluded.contains(&r.nonce))
            .min_by(|a, b| a.amount.cmp(&b.amount).then_with(|| a.nonce.cmp(&b.nonce)))
            .cloned()
            .ok_or_else(|| {
                warn!(
                    required = min_amount,
                    candidates = self.records.len(),
                    excluded = excluded.len(),
                    "no record satisfies amount"
                );
                TestamentError::InsufficientBalance {
                    required: min_amount,
                }
            })
    }

    /// Hold a record's nonce for the rest of the session
    pub fn reserve(&mut self, record: &ValueRecord) -> Result<()> {
        self.session.reserve(&record.nonce)?;
        debug!(nonce = %record.nonce, amount = record.amount, "reserved record");
        Ok(())
    }

    /// Find against this session's reservations and reserve the result
    pub fn select_and_reserve(&mut self, min_amount: u64) -> Result<ValueRecord> {
        let record = self.find_value_record(min_amount, self.session.nonces())?;
        self.reserve(&record)?;
        Ok(record)
    }

    /// Release every reservation
    pub fn clear_session(&mut self) {
        let released = self.session.len();
        self.session.clear();
        debug!(released, "cleared reservation session");
    }

    /// Record network confirmation that a record was consumed.
    ///
    /// Returns whether the nonce was in the pool.
    pub fn mark_spent(&mut self, nonce: &RecordNonce) -> bool {
        self.spent.insert(nonce.clone());
        let before = self.records.len();
        self.records.retain(|r| &r.nonce != nonce);
        let found = self.records.len() != before;
        info!(%nonce, found, "marked record spent");
        found
    }

    /// Current session
    pub fn session(&self) -> &ReservationSession {
        &self.session
    }

    /// Reserved nonces
    pub fn reserved_nonces(&self) -> &BTreeSet<RecordNonce> {
        self.session.nonces()
    }

    /// Unspent candidates
    pub fn records(&self) -> &[ValueRecord] {
        &self.records
    }

    /// Sum of all unspent records
    pub fn total_unspent(&self) -> u64 {
        self.records
            .iter()
            .fold(0u64, |acc, r| acc.saturating_add(r.amount))
    }

    /// Sum of unspent records not reserved in this session
    pub fn available_balance(&self) -> u64 {
        self.records
            .iter()
            .filter(|r| !self.session.contains(&r.nonce))
            .fold(0u64, |acc, r| acc.saturating_add(r.amount))
    }
}
