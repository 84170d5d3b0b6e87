//! Clock abstraction driving backoff and polling.

use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;

/// Monotonic clock plus cooperative sleep
#[async_trait]
pub trait TimeEffects: Send + Sync {
    /// Milliseconds elapsed on this clock's monotonic timeline
    fn now_ms(&self) -> u64;

    /// Suspend for `ms` milliseconds
    async fn sleep_ms(&self, ms: u64);
}

#[async_trait]
impl<T: TimeEffects + ?Sized> TimeEffects for Arc<T> {
    fn now_ms(&self) -> u64 {
        (**self).now_ms()
    }

    async fn sleep_ms(&self, ms: u64) {
        (**self).sleep_ms(ms).await;
    }
}

/// Real clock backed by the tokio timer
#[derive(Debug, Clone)]
pub struct TokioTimeEffects {
    origin: tokio::time::Instant,
}

impl TokioTimeEffects {
    /// Clock whose timeline starts now
    pub fn new() -> Self {
        Self {
            origin: tokio::time::Instant::now(),
        }
    }
}

impl Default for TokioTimeEffects {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl TimeEffects for TokioTimeEffects {
    fn now_ms(&self) -> u64 {
        u64::try_from(self.origin.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    async fn sleep_ms(&self, ms: u64) {
        tokio::time::sleep(Duration::from_millis(ms)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn tokio_clock_advances_with_sleep() {
        let clock = TokioTimeEffects::new();
        let before = clock.now_ms();
        clock.sleep_ms(1_500).await;
        assert!(clock.now_ms() >= before + 1_500);
    }
}
