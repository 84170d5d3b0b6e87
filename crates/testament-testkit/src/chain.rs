//! Scripted broadcast/status collaborator

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use testament_core::effects::ChainEffects;
use testament_core::{
    AssembledPayload, ChainStatus, OperationId, Result, TestamentError, TransactionRecord,
};

/// Callback run with the 1-based query number before each status reply
pub type QueryHook = Arc<dyn Fn(u32) + Send + Sync>;

/// One scripted status reply
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatusStep {
    /// Reply with a status
    Status(ChainStatus),
    /// Fail the query with a network error
    Error(String),
}

impl From<ChainStatus> for StatusStep {
    fn from(status: ChainStatus) -> Self {
        StatusStep::Status(status)
    }
}

struct ChainState {
    steps: VecDeque<StatusStep>,
    fallback: ChainStatus,
    query_calls: u32,
    record_calls: u32,
    submitted: Vec<AssembledPayload>,
    submit_error: Option<String>,
    next_id: u32,
    block_height: Option<u64>,
    record_error: bool,
    hook: Option<QueryHook>,
}

/// Chain fake replaying a queue of status replies.
///
/// Once the queue is drained every query returns the fallback status
/// (`Unknown` unless set). Clones share state.
#[derive(Clone)]
pub struct ScriptedChain {
    state: Arc<Mutex<ChainState>>,
}

impl Default for ScriptedChain {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ScriptedChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("ScriptedChain")
            .field("pending_steps", &state.steps.len())
            .field("query_calls", &state.query_calls)
            .field("submitted", &state.submitted.len())
            .finish()
    }
}

impl ScriptedChain {
    /// Chain with an empty script
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ChainState {
                steps: VecDeque::new(),
                fallback: ChainStatus::Unknown,
                query_calls: 0,
                record_calls: 0,
                submitted: Vec::new(),
                submit_error: None,
                next_id: 0,
                block_height: None,
                record_error: false,
                hook: None,
            })),
        }
    }

    /// Chain replaying `steps` in order
    pub fn with_steps(steps: impl IntoIterator<Item = StatusStep>) -> Self {
        let chain = Self::new();
        chain.state.lock().steps.extend(steps);
        chain
    }

    /// Chain answering `Queued` `pending` times, then `Finalized`
    pub fn finalizing_after(pending: u32, block_height: u64) -> Self {
        let steps = (0..pending)
            .map(|_| StatusStep::Status(ChainStatus::Queued))
            .chain(std::iter::once(StatusStep::Status(ChainStatus::Finalized)));
        Self::with_steps(steps).with_block_height(block_height)
    }

    /// Status once the script is drained
    pub fn with_fallback(self, status: ChainStatus) -> Self {
        self.state.lock().fallback = status;
        self
    }

    /// Block height reported by `query_record`
    pub fn with_block_height(self, height: u64) -> Self {
        self.state.lock().block_height = Some(height);
        self
    }

    /// Make `query_record` fail
    pub fn with_failing_record_query(self) -> Self {
        self.state.lock().record_error = true;
        self
    }

    /// Make `submit` fail with a network error
    pub fn with_submit_error(self, message: impl Into<String>) -> Self {
        self.state.lock().submit_error = Some(message.into());
        self
    }

    /// Install a hook run before every status reply
    pub fn with_query_hook(self, hook: QueryHook) -> Self {
        self.state.lock().hook = Some(hook);
        self
    }

    /// Append a step to the script
    pub fn push_step(&self, step: impl Into<StatusStep>) {
        self.state.lock().steps.push_back(step.into());
    }

    /// Status queries received so far
    pub fn query_calls(&self) -> u32 {
        self.state.lock().query_calls
    }

    /// Record queries received so far
    pub fn record_calls(&self) -> u32 {
        self.state.lock().record_calls
    }

    /// Payloads broadcast through `submit`
    pub fn submitted(&self) -> Vec<AssembledPayload> {
        self.state.lock().submitted.clone()
    }
}

#[async_trait]
impl ChainEffects for ScriptedChain {
    async fn submit(&self, payload: &AssembledPayload) -> Result<OperationId> {
        let mut state = self.state.lock();
        if let Some(message) = state.submit_error.clone() {
            return Err(TestamentError::network(message));
        }
        state.submitted.push(payload.clone());
        state.next_id += 1;
        Ok(OperationId::new(format!("at1scripted{}", state.next_id)))
    }

    async fn query_status(&self, _operation_id: &OperationId) -> Result<ChainStatus> {
        let (call, step, hook) = {
            let mut state = self.state.lock();
            state.query_calls += 1;
            let fallback = state.fallback.clone();
            let step = state
                .steps
                .pop_front()
                .unwrap_or(StatusStep::Status(fallback));
            (state.query_calls, step, state.hook.clone())
        };
        if let Some(hook) = hook {
            hook(call);
        }
        match step {
            StatusStep::Status(status) => Ok(status),
            StatusStep::Error(message) => Err(TestamentError::network(message)),
        }
    }

    async fn query_record(&self, _operation_id: &OperationId) -> Result<TransactionRecord> {
        let mut state = self.state.lock();
        state.record_calls += 1;
        if state.record_error {
            return Err(TestamentError::network("record lookup failed"));
        }
        Ok(TransactionRecord {
            block_height: state.block_height,
        })
    }
}
