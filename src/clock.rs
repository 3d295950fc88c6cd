//! Wall-clock source for cache timestamps, swappable in tests.

use parking_lot::RwLock;
use std::sync::Arc;
use std::time::Duration;

/// Provides the current time as epoch milliseconds.
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Reads the system clock through chrono.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Manually driven clock for deterministic expiry tests.
#[derive(Clone, Debug)]
pub struct MockTimeProvider {
    current: Arc<RwLock<i64>>,
}

impl MockTimeProvider {
    #[must_use]
    pub fn new(start_millis: i64) -> Self {
        Self { current: Arc::new(RwLock::new(start_millis)) }
    }

    pub fn advance(&self, by: Duration) {
        let delta = i64::try_from(by.as_millis()).unwrap_or(i64::MAX);
        let mut now = self.current.write();
        *now = now.saturating_add(delta);
    }

    pub fn set_millis(&self, millis: i64) {
        *self.current.write() = millis;
    }
}

impl Default for MockTimeProvider {
    fn default() -> Self {
        Self::new(SystemTimeProvider.now_millis())
    }
}

impl TimeProvider for MockTimeProvider {
    fn now_millis(&self) -> i64 {
        *self.current.read()
    }
}

/// Converts a duration to whole milliseconds, saturating at `i64::MAX`.
#[inline]
#[must_use]
pub fn duration_to_millis(d: Duration) -> i64 {
    i64::try_from(d.as_millis()).unwrap_or(i64::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mock_clock_advances_and_resets() {
        let clock = MockTimeProvider::new(1_000);
        clock.advance(Duration::from_millis(250));
        assert_eq!(clock.now_millis(), 1_250);
        clock.set_millis(42);
        assert_eq!(clock.now_millis(), 42);
    }

    #[test]
    fn clones_share_the_same_instant() {
        let a = MockTimeProvider::new(0);
        let b = a.clone();
        a.advance(Duration::from_secs(1));
        assert_eq!(b.now_millis(), 1_000);
    }
}
