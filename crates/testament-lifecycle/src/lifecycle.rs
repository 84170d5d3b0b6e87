//! Transaction lifecycle driver.

use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use testament_core::config::PollingConfig;
use testament_core::effects::{
    CancellationToken, ChainEffects, SignError, SignerEffects, TimeEffects,
};
use testament_core::{
    AssembledPayload, ChainStatus, ClientConfig, OperationId, Result, RetryPolicy, TestamentError,
};

use crate::state::{LifecycleState, LifecycleStatus, PollOutcome};

#[derive(Debug, Default)]
struct Slot {
    token: CancellationToken,
    origin_ms: u64,
}

/// Stops whichever loop is active on the lifecycle it came from.
///
/// Obtained ahead of time and cloned freely; it always targets the current
/// loop, not the one active when it was created.
#[derive(Debug, Clone)]
pub struct Canceller {
    slot: Arc<Mutex<Slot>>,
}

impl Canceller {
    /// Cancel the active loop, if any
    pub fn cancel(&self) {
        self.slot.lock().token.cancel();
    }
}

/// Drives one payload at a time from signing to a terminal state.
///
/// At most one poll loop is live: every `start_signing`, `start_polling` and
/// `reset` cancels the current token and installs a fresh one, and a loop
/// only publishes status while its token is both current and uncancelled.
pub struct TransactionLifecycle<C, T> {
    chain: C,
    clock: T,
    polling: PollingConfig,
    signer_retry: RetryPolicy,
    slot: Arc<Mutex<Slot>>,
    status: watch::Sender<LifecycleStatus>,
}

impl<C: ChainEffects, T: TimeEffects> TransactionLifecycle<C, T> {
    /// Lifecycle with explicit polling and wallet retry settings
    pub fn new(chain: C, clock: T, polling: PollingConfig, signer_retry: RetryPolicy) -> Self {
        let (status, _) = watch::channel(LifecycleStatus::default());
        Self {
            chain,
            clock,
            polling,
            signer_retry,
            slot: Arc::new(Mutex::new(Slot::default())),
            status,
        }
    }

    /// Lifecycle configured from the client configuration
    pub fn from_config(chain: C, clock: T, config: &ClientConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self::new(
            chain,
            clock,
            config.polling.clone(),
            config.signer_retry.clone(),
        ))
    }

    /// Current status snapshot
    pub fn status(&self) -> LifecycleStatus {
        self.status.borrow().clone()
    }

    /// Receiver notified on every status change
    pub fn subscribe(&self) -> watch::Receiver<LifecycleStatus> {
        self.status.subscribe()
    }

    /// Handle that cancels whatever loop is active when it is used
    pub fn canceller(&self) -> Canceller {
        Canceller {
            slot: self.slot.clone(),
        }
    }

    /// Stop the active loop. Status keeps its last observed value.
    pub fn cancel(&self) {
        let slot = self.slot.lock();
        if !slot.token.is_cancelled() {
            info!(state = %self.status.borrow().state, "cancelling lifecycle");
        }
        slot.token.cancel();
    }

    /// Advisory time to finality from fixed per-phase constants.
    ///
    /// Never consulted by the lifecycle itself.
    pub fn estimated_time_remaining(&self) -> Duration {
        self.status.borrow().state.estimated_remaining()
    }

    /// Cancel any loop and return to idle
    pub fn reset(&self) {
        self.supersede(|status| *status = LifecycleStatus::default());
        debug!("lifecycle reset");
    }

    /// Enter `signing`, cancelling any loop in flight
    pub fn start_signing(&self) {
        self.begin_signing();
    }

    /// Enter `broadcasting` and return the poll loop for `operation_id`.
    ///
    /// The state change and the cancellation of any previous loop happen
    /// before this returns; polling starts when the future is awaited.
    pub fn start_polling(
        &self,
        operation_id: OperationId,
    ) -> impl Future<Output = PollOutcome> + '_ {
        let token = self.begin_broadcasting(None, &operation_id);
        async move {
            match token {
                Some(token) => self.poll_loop(operation_id, token).await,
                None => PollOutcome::Cancelled,
            }
        }
    }

    /// Have the wallet sign and broadcast `payload`, then poll to an outcome.
    ///
    /// `SignerNotReady` is retried under the wallet retry policy; once the
    /// retries run out the lifecycle ends in `failed` with `Timeout`. A
    /// wallet rejection ends in `rejected` without retry. Other wallet
    /// failures end in `failed` and return the error.
    pub async fn execute_with_signer<S: SignerEffects + ?Sized>(
        &self,
        signer: &S,
        payload: &AssembledPayload,
    ) -> Result<PollOutcome> {
        let token = self.begin_signing();
        info!(operation = %payload.operation_name, "requesting signature");

        let signing = self.signer_retry.execute_if(
            &self.clock,
            || signer.sign(payload),
            |err| matches!(err, SignError::NotReady),
        );
        let retried = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(PollOutcome::Cancelled),
            retried = signing => retried,
        };
        if token.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }
        let attempts = retried.attempts;
        if retried.had_retries() {
            debug!(attempts, "signer retries finished");
        }

        match retried.into_result() {
            Ok(operation_id) => match self.begin_broadcasting(Some(&token), &operation_id) {
                Some(poll_token) => Ok(self.poll_loop(operation_id, poll_token).await),
                None => Ok(PollOutcome::Cancelled),
            },
            Err(SignError::Rejected(reason)) => {
                warn!(%reason, "signature rejected");
                self.publish(&token, |status| {
                    status.state = LifecycleState::Rejected;
                    status.error = Some(reason.clone());
                });
                Ok(PollOutcome::Rejected(reason))
            }
            Err(SignError::NotReady) => {
                let err = TestamentError::Timeout { attempts };
                self.fail(&token, &err);
                Err(err)
            }
            Err(err) => {
                let err = TestamentError::from(err);
                self.fail(&token, &err);
                Err(err)
            }
        }
    }

    /// Broadcast `payload` directly through the chain, then poll to an outcome
    pub async fn execute_broadcast(&self, payload: &AssembledPayload) -> Result<PollOutcome> {
        let token = self.supersede(|status| {
            *status = LifecycleStatus {
                state: LifecycleState::Broadcasting,
                ..LifecycleStatus::default()
            };
        });
        info!(operation = %payload.operation_name, "broadcasting payload");

        let submitted = tokio::select! {
            biased;
            _ = token.cancelled() => return Ok(PollOutcome::Cancelled),
            submitted = self.chain.submit(payload) => submitted,
        };
        if token.is_cancelled() {
            return Ok(PollOutcome::Cancelled);
        }

        match submitted {
            Ok(operation_id) => match self.begin_broadcasting(Some(&token), &operation_id) {
                Some(poll_token) => Ok(self.poll_loop(operation_id, poll_token).await),
                None => Ok(PollOutcome::Cancelled),
            },
            Err(err) => {
                self.fail(&token, &err);
                Err(err)
            }
        }
    }

    fn begin_signing(&self) -> CancellationToken {
        let token = self.supersede(|status| {
            *status = LifecycleStatus {
                state: LifecycleState::Signing,
                ..LifecycleStatus::default()
            };
        });
        info!("lifecycle signing");
        token
    }

    /// Enter `broadcasting` for a known operation id. With `expected`, only
    /// if that token is still current.
    fn begin_broadcasting(
        &self,
        expected: Option<&CancellationToken>,
        operation_id: &OperationId,
    ) -> Option<CancellationToken> {
        let mut slot = self.slot.lock();
        if let Some(expected) = expected {
            if !slot.token.is_same(expected) || expected.is_cancelled() {
                return None;
            }
        }
        slot.token.cancel();
        slot.token = CancellationToken::new();

        let previous = self.status.borrow().state;
        if !matches!(previous, LifecycleState::Signing | LifecycleState::Broadcasting) {
            slot.origin_ms = self.clock.now_ms();
        }
        let elapsed_ms = self.clock.now_ms().saturating_sub(slot.origin_ms);
        self.status.send_modify(|status| {
            *status = LifecycleStatus {
                state: LifecycleState::Broadcasting,
                operation_id: Some(operation_id.clone()),
                elapsed_ms,
                ..LifecycleStatus::default()
            };
        });
        info!(%operation_id, "lifecycle broadcasting");
        Some(slot.token.clone())
    }

    /// Cancel the current token, install a fresh one and rewrite status
    fn supersede(&self, update: impl FnOnce(&mut LifecycleStatus)) -> CancellationToken {
        let mut slot = self.slot.lock();
        slot.token.cancel();
        slot.token = CancellationToken::new();
        slot.origin_ms = self.clock.now_ms();
        self.status.send_modify(update);
        slot.token.clone()
    }

    /// Apply `update` only if `token` still owns the lifecycle
    fn publish(&self, token: &CancellationToken, update: impl FnOnce(&mut LifecycleStatus)) -> bool {
        let slot = self.slot.lock();
        if !slot.token.is_same(token) || token.is_cancelled() {
            return false;
        }
        let elapsed_ms = self.clock.now_ms().saturating_sub(slot.origin_ms);
        self.status.send_modify(|status| {
            update(status);
            status.elapsed_ms = elapsed_ms;
        });
        true
    }

    fn fail(&self, token: &CancellationToken, err: &TestamentError) {
        warn!(code = err.code(), error = %err, "lifecycle failed");
        self.publish(token, |status| {
            status.state = LifecycleState::Failed;
            status.error = Some(err.to_string());
        });
    }

    async fn poll_loop(&self, operation_id: OperationId, token: CancellationToken) -> PollOutcome {
        let max_attempts = self.polling.max_attempts;
        let max_interval = self.polling.max_interval_ms;
        let mut delay = self.polling.initial_interval_ms.min(max_interval);

        for attempt in 1..=max_attempts {
            tokio::select! {
                biased;
                _ = token.cancelled() => return PollOutcome::Cancelled,
                _ = self.clock.sleep_ms(delay) => {}
            }
            if token.is_cancelled() {
                return PollOutcome::Cancelled;
            }

            let queried = tokio::select! {
                biased;
                _ = token.cancelled() => return PollOutcome::Cancelled,
                queried = self.chain.query_status(&operation_id) => queried,
            };
            // A reply that lands after cancellation is discarded.
            if token.is_cancelled() {
                return PollOutcome::Cancelled;
            }
            debug!(%operation_id, attempt, delay_ms = delay, status = ?queried.as_ref().ok(), "polled status");

            match queried {
                Ok(ChainStatus::Finalized) => {
                    return self.finalize(&operation_id, &token, attempt).await;
                }
                Ok(ChainStatus::Rejected(reason)) => {
                    return self.terminate(&token, attempt, LifecycleState::Rejected, reason);
                }
                Ok(ChainStatus::Failed(reason)) => {
                    return self.terminate(&token, attempt, LifecycleState::Failed, reason);
                }
                Ok(ChainStatus::Queued) => {
                    self.record_attempt(&token, attempt, Some(LifecycleState::Queued));
                }
                Ok(ChainStatus::Processing) => {
                    self.record_attempt(&token, attempt, Some(LifecycleState::Processing));
                }
                Ok(ChainStatus::Unknown) => self.record_attempt(&token, attempt, None),
                Err(err) => {
                    warn!(%operation_id, attempt, error = %err, "status query failed");
                    self.record_attempt(&token, attempt, None);
                }
            }

            let next = (delay as f64 * self.polling.backoff_factor).min(max_interval as f64);
            delay = next as u64;
        }

        warn!(%operation_id, attempts = max_attempts, "polling timed out");
        self.publish(&token, |status| {
            status.state = LifecycleState::Timeout;
            status.attempt_count = max_attempts;
            status.error = Some(TestamentError::Timeout { attempts: max_attempts }.to_string());
        });
        PollOutcome::Timeout {
            attempts: max_attempts,
        }
    }

    fn record_attempt(&self, token: &CancellationToken, attempt: u32, state: Option<LifecycleState>) {
        self.publish(token, |status| {
            status.attempt_count = attempt;
            if let Some(state) = state {
                status.state = state;
            }
        });
    }

    fn terminate(
        &self,
        token: &CancellationToken,
        attempt: u32,
        state: LifecycleState,
        reason: String,
    ) -> PollOutcome {
        warn!(%state, attempt, %reason, "transaction ended on chain");
        self.publish(token, |status| {
            status.state = state;
            status.attempt_count = attempt;
            status.error = Some(reason.clone());
        });
        if state == LifecycleState::Rejected {
            PollOutcome::Rejected(reason)
        } else {
            PollOutcome::Failed(reason)
        }
    }

    async fn finalize(
        &self,
        operation_id: &OperationId,
        token: &CancellationToken,
        attempt: u32,
    ) -> PollOutcome {
        let block_height = match self.chain.query_record(operation_id).await {
            Ok(record) => record.block_height,
            Err(err) => {
                warn!(%operation_id, error = %err, "block height lookup failed");
                None
            }
        };
        if token.is_cancelled() {
            return PollOutcome::Cancelled;
        }
        info!(%operation_id, attempt, ?block_height, "transaction finalized");
        self.publish(token, |status| {
            status.state = LifecycleState::Finalized;
            status.attempt_count = attempt;
            status.block_height = block_height;
        });
        PollOutcome::Finalized { block_height }
    }
}

impl<C, T> Drop for TransactionLifecycle<C, T> {
    fn drop(&mut self) {
        self.slot.lock().token.cancel();
    }
}
