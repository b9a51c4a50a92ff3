//! Inter-record pacing.
//!
//! The pacer turns consecutive capture timestamps into wall-clock delays.
//! The first record is sent immediately; after that each record waits out
//! the gap the capture recorded. The wait itself happens in the replay
//! loop so it stays preemptible.

use std::time::Duration;

/// Delay at or above which an operator notice is emitted before waiting,
/// so a long pause reads as expected rather than a hang.
pub const LONG_WAIT_THRESHOLD: Duration = Duration::from_secs(2);

/// Computes the delay to wait before each record.
#[derive(Debug)]
pub struct Pacer {
    previous: Option<f64>,
    long_wait_threshold: Duration,
}

impl Pacer {
    /// Pacer with the standard long-wait threshold.
    pub fn new() -> Self {
        Self::with_threshold(LONG_WAIT_THRESHOLD)
    }

    /// Pacer with an explicit long-wait threshold.
    pub fn with_threshold(long_wait_threshold: Duration) -> Self {
        Self {
            previous: None,
            long_wait_threshold,
        }
    }

    /// Delay to wait before sending the record stamped `timestamp`.
    ///
    /// Zero for the very first record. A timestamp that runs backwards is
    /// an anomaly in the capture; the delta is clamped to zero and
    /// reported rather than silently reordered.
    pub fn delay_for(&mut self, timestamp: f64) -> Duration {
        let delay = match self.previous {
            None => Duration::ZERO,
            Some(previous) => {
                let delta = timestamp - previous;
                if delta < 0.0 {
                    tracing::warn!(
                        previous,
                        current = timestamp,
                        "capture timestamp ran backwards, not delaying"
                    );
                    Duration::ZERO
                } else {
                    Duration::from_secs_f64(delta)
                }
            }
        };
        self.previous = Some(timestamp);
        delay
    }

    /// Whether this delay is long enough to warrant an operator notice.
    pub fn is_long_wait(&self, delay: Duration) -> bool {
        delay >= self.long_wait_threshold
    }
}

impl Default for Pacer {
    fn default() -> Self {
        Self::new()
    }
}
