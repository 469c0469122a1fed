//! Clock abstraction for testable time-dependent logic
//!
//! Production code uses `SystemClock` which delegates to `tokio::time::sleep`.
//! Tests use `MockClock` to control time deterministically.

use async_trait::async_trait;
use std::time::Duration;

/// Trait for suspending until a delay has elapsed
///
/// Injected into phase timers and handlers to allow tests to control time.
#[async_trait]
pub trait Clock: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Production clock that delegates to `tokio::time::sleep`
pub struct SystemClock;

#[async_trait]
impl Clock for SystemClock {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Mock clock for testing with controllable time
///
/// Time only moves when `advance` is called. Every pending `sleep` holds a
/// subscription to the elapsed-time channel, so `sleepers` reports how many
/// callers are currently suspended.
#[cfg(test)]
pub struct MockClock {
    elapsed: tokio::sync::watch::Sender<Duration>,
}

#[cfg(test)]
impl MockClock {
    pub fn new() -> Self {
        let (elapsed, _) = tokio::sync::watch::channel(Duration::ZERO);
        Self { elapsed }
    }

    pub fn advance(&self, duration: Duration) {
        self.elapsed.send_modify(|elapsed| *elapsed += duration);
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.borrow()
    }

    pub fn sleepers(&self) -> usize {
        self.elapsed.receiver_count()
    }

    /// Yield until at least `count` callers are suspended in `sleep`
    pub async fn wait_for_sleepers(&self, count: usize) {
        while self.sleepers() < count {
            tokio::task::yield_now().await;
        }
    }
}

#[cfg(test)]
impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[async_trait]
impl Clock for MockClock {
    async fn sleep(&self, duration: Duration) {
        let mut elapsed = self.elapsed.subscribe();
        let deadline = *elapsed.borrow() + duration;
        // Sender lives as long as self, so this only errors during teardown
        let _ = elapsed.wait_for(|now| *now >= deadline).await;
    }
}
