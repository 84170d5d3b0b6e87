//! Broadcast and status-query collaborator.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{AssembledPayload, ChainStatus, OperationId, TransactionRecord};
use crate::Result;

/// Broadcast/status interface of the remote ledger
///
/// `ChainStatus::Unknown` means "not visible yet" and is distinct from a
/// terminal `Rejected` or `Failed`.
#[async_trait]
pub trait ChainEffects: Send + Sync {
    /// Broadcast a payload, returning its tracking identifier
    async fn submit(&self, payload: &AssembledPayload) -> Result<OperationId>;

    /// Current status of a submitted operation
    async fn query_status(&self, operation_id: &OperationId) -> Result<ChainStatus>;

    /// Inclusion details of a submitted operation
    async fn query_record(&self, operation_id: &OperationId) -> Result<TransactionRecord>;
}

#[async_trait]
impl<T: ChainEffects + ?Sized> ChainEffects for Arc<T> {
    async fn submit(&self, payload: &AssembledPayload) -> Result<OperationId> {
        (**self).submit(payload).await
    }

    async fn query_status(&self, operation_id: &OperationId) -> Result<ChainStatus> {
        (**self).query_status(operation_id).await
    }

    async fn query_record(&self, operation_id: &OperationId) -> Result<TransactionRecord> {
        (**self).query_record(operation_id).await
    }
}
