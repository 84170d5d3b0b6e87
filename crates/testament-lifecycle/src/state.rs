//! Lifecycle states and observable status.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

use testament_core::OperationId;

/// Advisory duration of the wallet signing phase
pub const SIGNING_ESTIMATE: Duration = Duration::from_secs(15);
/// Advisory duration of broadcast until first visibility
pub const BROADCAST_ESTIMATE: Duration = Duration::from_secs(5);
/// Advisory mempool wait
pub const QUEUED_ESTIMATE: Duration = Duration::from_secs(20);
/// Advisory execution and confirmation time
pub const PROCESSING_ESTIMATE: Duration = Duration::from_secs(10);

/// Where a transaction is in its lifecycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleState {
    /// Nothing in flight
    #[default]
    Idle,
    /// Waiting on the wallet
    Signing,
    /// Submitted, not yet visible
    Broadcasting,
    /// Visible in the mempool
    Queued,
    /// Executing
    Processing,
    /// Confirmed
    Finalized,
    /// Rejected by the wallet or the network
    Rejected,
    /// Execution failed
    Failed,
    /// No terminal status within the attempt budget
    Timeout,
}

impl LifecycleState {
    /// No transition follows without `reset` or a new `start_signing`
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            LifecycleState::Finalized
                | LifecycleState::Rejected
                | LifecycleState::Failed
                | LifecycleState::Timeout
        )
    }

    /// Advisory time left from the start of this state
    pub fn estimated_remaining(&self) -> Duration {
        match self {
            LifecycleState::Idle | LifecycleState::Signing => {
                SIGNING_ESTIMATE + BROADCAST_ESTIMATE + QUEUED_ESTIMATE + PROCESSING_ESTIMATE
            }
            LifecycleState::Broadcasting => {
                BROADCAST_ESTIMATE + QUEUED_ESTIMATE + PROCESSING_ESTIMATE
            }
            LifecycleState::Queued => QUEUED_ESTIMATE + PROCESSING_ESTIMATE,
            LifecycleState::Processing => PROCESSING_ESTIMATE,
            _ => Duration::ZERO,
        }
    }
}

impl fmt::Display for LifecycleState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleState::Idle => "idle",
            LifecycleState::Signing => "signing",
            LifecycleState::Broadcasting => "broadcasting",
            LifecycleState::Queued => "queued",
            LifecycleState::Processing => "processing",
            LifecycleState::Finalized => "finalized",
            LifecycleState::Rejected => "rejected",
            LifecycleState::Failed => "failed",
            LifecycleState::Timeout => "timeout",
        };
        f.write_str(name)
    }
}

/// Snapshot published to observers on every change
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifecycleStatus {
    /// Current state
    pub state: LifecycleState,
    /// Tracking identifier once known
    pub operation_id: Option<OperationId>,
    /// Including block, once finalized and reported
    pub block_height: Option<u64>,
    /// Raw failure reason for display
    pub error: Option<String>,
    /// Status queries made by the current poll loop
    pub attempt_count: u32,
    /// Milliseconds since the operation started
    pub elapsed_ms: u64,
}

/// How a poll loop ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Confirmed on chain
    Finalized {
        /// Including block, if the record query succeeded
        block_height: Option<u64>,
    },
    /// Rejected, with the raw reason
    Rejected(String),
    /// Execution failed, with the raw reason
    Failed(String),
    /// Attempt budget exhausted
    Timeout {
        /// Queries made
        attempts: u32,
    },
    /// Abandoned by the caller; no result was recorded
    Cancelled,
}

impl PollOutcome {
    /// Whether the loop reached a terminal state, as opposed to being cancelled
    pub fn is_terminal(&self) -> bool {
        !matches!(self, PollOutcome::Cancelled)
    }
}
