//! Request pacing shared by all fetch workers
//!
//! The pacer hands out dispatch slots at least `interval` apart, so the
//! aggregate request rate (not the per-worker rate) respects the delay.

use std::sync::Mutex;
use std::time::Duration;
use tokio::time::Instant;

/// Global rate limiter for fetch dispatches
#[derive(Debug, Default)]
pub struct Pacer {
    last_slot: Mutex<Option<Instant>>,
}

impl Pacer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reserves the next dispatch slot and returns when it is due
    ///
    /// Each call is spaced at least `interval` after the previous reservation.
    /// A zero interval never waits.
    pub fn reserve(&self, interval: Duration) -> Instant {
        let now = Instant::now();

        let mut last = match self.last_slot.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let slot = match *last {
            Some(previous) if !interval.is_zero() => (previous + interval).max(now),
            _ => now,
        };
        *last = Some(slot);
        slot
    }

    /// Waits for the next dispatch slot
    pub async fn wait(&self, interval: Duration) {
        let slot = self.reserve(interval);
        if slot > Instant::now() {
            tracing::trace!("Pacing: waiting {:?}", slot - Instant::now());
            tokio::time::sleep_until(slot).await;
        }
    }
}
