/*!
 * Fixed-interval rate gate.
 *
 * Every provider call acquires the gate first. The gate holds the caller until
 * `interval` has elapsed since the previous call released it, so consecutive
 * batches are always separated by at least one full cooldown, whether the
 * previous batch succeeded or not.
 */

use log::debug;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::time::Instant;

/// Gate that spaces provider calls by a fixed cooldown
#[derive(Debug)]
pub struct RateGate {
    interval: Duration,
    last_release: Mutex<Option<Instant>>,
    waits: AtomicUsize,
}

impl RateGate {
    /// Create a gate with the given cooldown
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last_release: Mutex::new(None),
            waits: AtomicUsize::new(0),
        }
    }

    /// Wait until the cooldown since the last release has elapsed
    pub async fn acquire(&self) {
        let ready_at = (*self.last_release.lock()).map(|released| released + self.interval);

        if let Some(ready_at) = ready_at {
            if ready_at > Instant::now() {
                self.waits.fetch_add(1, Ordering::SeqCst);
                debug!(
                    "Cooling down for {:.1}s before next batch",
                    (ready_at - Instant::now()).as_secs_f64()
                );
                tokio::time::sleep_until(ready_at).await;
            }
        }
    }

    /// Mark the end of a provider call; the next `acquire` waits from now
    pub fn release(&self) {
        *self.last_release.lock() = Some(Instant::now());
    }

    /// Forget the previous release so the next `acquire` passes at once
    pub fn reset(&self) {
        *self.last_release.lock() = None;
    }

    /// Number of times `acquire` actually had to wait
    pub fn cooldowns_applied(&self) -> usize {
        self.waits.load(Ordering::SeqCst)
    }
}
