//! Wallet signing collaborator.

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{AssembledPayload, OperationId};
use crate::TestamentError;

/// Failure modes of a wallet call
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SignError {
    /// Wallet is still connecting or locked; the only retried condition
    #[error("Signer not ready")]
    NotReady,
    /// User or wallet declined the payload
    #[error("Signing rejected: {0}")]
    Rejected(String),
    /// Any other wallet failure
    #[error("Signer unavailable: {0}")]
    Unavailable(String),
}

impl From<SignError> for TestamentError {
    fn from(err: SignError) -> Self {
        match err {
            SignError::NotReady => TestamentError::SignerNotReady,
            SignError::Rejected(reason) => TestamentError::Rejected { reason },
            SignError::Unavailable(message) => TestamentError::network(message),
        }
    }
}

/// Opaque wallet that signs and broadcasts a payload
#[async_trait]
pub trait SignerEffects: Send + Sync {
    /// Sign and hand off a payload, returning the operation identifier
    async fn sign(&self, payload: &AssembledPayload) -> Result<OperationId, SignError>;
}

#[async_trait]
impl<T: SignerEffects + ?Sized> SignerEffects for Arc<T> {
    async fn sign(&self, payload: &AssembledPayload) -> Result<OperationId, SignError> {
        (**self).sign(payload).await
    }
}
