//! Scripted wallet

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use testament_core::effects::{SignError, SignerEffects};
use testament_core::{AssembledPayload, OperationId};

#[derive(Debug, Default)]
struct SignerState {
    replies: VecDeque<Result<OperationId, SignError>>,
    calls: u32,
    signed: Vec<AssembledPayload>,
}

/// Wallet fake replaying scripted replies, then signing successfully
#[derive(Debug, Clone, Default)]
pub struct ScriptedSigner {
    state: Arc<Mutex<SignerState>>,
}

impl ScriptedSigner {
    /// Signer that always succeeds
    pub fn new() -> Self {
        Self::default()
    }

    /// Signer replaying `replies` first
    pub fn with_replies(replies: impl IntoIterator<Item = Result<OperationId, SignError>>) -> Self {
        let signer = Self::new();
        signer.state.lock().replies.extend(replies);
        signer
    }

    /// Signer that is not ready `times` times before succeeding
    pub fn not_ready_times(times: usize) -> Self {
        Self::with_replies(std::iter::repeat_with(|| Err(SignError::NotReady)).take(times))
    }

    /// Calls made so far
    pub fn calls(&self) -> u32 {
        self.state.lock().calls
    }

    /// Payloads seen, successful or not
    pub fn signed(&self) -> Vec<AssembledPayload> {
        self.state.lock().signed.clone()
    }
}

#[async_trait]
impl SignerEffects for ScriptedSigner {
    async fn sign(&self, payload: &AssembledPayload) -> Result<OperationId, SignError> {
        let mut state = self.state.lock();
        state.calls += 1;
        state.signed.push(payload.clone());
        let calls = state.calls;
        state
            .replies
            .pop_front()
            .unwrap_or_else(|| Ok(OperationId::new(format!("at1signed{calls}"))))
    }
}
