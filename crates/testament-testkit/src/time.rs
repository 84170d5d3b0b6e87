//! Virtual clock for deterministic polling tests

use async_trait::async_trait;
use parking_lot::Mutex;
use std::sync::Arc;

use testament_core::effects::TimeEffects;

#[derive(Debug, Default)]
struct ClockState {
    now_ms: u64,
    sleeps: Vec<u64>,
}

/// Clock that advances only when slept on or advanced by hand.
///
/// Every `sleep_ms` is recorded and yields once to the scheduler so other
/// tasks (a canceller, for instance) get to run. Clones share state.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    state: Arc<Mutex<ClockState>>,
}

impl FakeClock {
    /// Clock at time zero
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance without recording a sleep
    pub fn advance(&self, ms: u64) {
        self.state.lock().now_ms += ms;
    }

    /// Every sleep requested so far, in order
    pub fn sleeps(&self) -> Vec<u64> {
        self.state.lock().sleeps.clone()
    }

    /// Total virtual time slept
    pub fn total_slept_ms(&self) -> u64 {
        self.state.lock().sleeps.iter().sum()
    }
}

#[async_trait]
impl TimeEffects for FakeClock {
    fn now_ms(&self) -> u64 {
        self.state.lock().now_ms
    }

    async fn sleep_ms(&self, ms: u64) {
        {
            let mut state = self.state.lock();
            state.now_ms += ms;
            state.sleeps.push(ms);
        }
        tokio::task::yield_now().await;
    }
}
