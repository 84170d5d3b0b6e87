//! Record source collaborator.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::ValueRecord;
use crate::Result;

/// Supplies spendable records and public mapping reads
#[async_trait]
pub trait RecordSourceEffects: Send + Sync {
    /// Raw candidate pool (amount, nonce, spent flag)
    async fn fetch_records(&self) -> Result<Vec<ValueRecord>>;

    /// Read one entry of a program's public mapping.
    ///
    /// Returns the value literal as stored on chain (e.g. `"5000u16"`), or
    /// `None` when the key is absent.
    async fn read_mapping(&self, program: &str, mapping: &str, key: &str)
        -> Result<Option<String>>;
}

#[async_trait]
impl<T: RecordSourceEffects + ?Sized> RecordSourceEffects for Arc<T> {
    async fn fetch_records(&self) -> Result<Vec<ValueRecord>> {
        (**self).fetch_records().await
    }

    async fn read_mapping(
        &self,
        program: &str,
        mapping: &str,
        key: &str,
    ) -> Result<Option<String>> {
        (**self).read_mapping(program, mapping, key).await
    }
}
