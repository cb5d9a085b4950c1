use std::{thread, time::Duration};

/// Number of steps spent busy-spinning before the backoff starts sleeping.
const SPIN_LIMIT: u32 = 6;

/// Spin-then-sleep backoff for threads polling a non-blocking structure.
///
/// The first [`SPIN_LIMIT`] calls to [`Backoff::snooze`] busy-spin for an exponentially growing
/// number of iterations. After that every call sleeps, starting at `initial` and doubling up to
/// `max`. Call [`Backoff::reset`] once the polled structure makes progress again.
#[derive(Debug, Clone)]
pub struct Backoff {
    /// Current step. Steps below `SPIN_LIMIT` spin, the rest sleep.
    step: u32,
    /// The first sleep duration.
    initial: Duration,
    /// The next sleep duration.
    current: Duration,
    /// Upper bound for the sleep duration.
    max: Duration,
}

impl Backoff {
    pub fn new(initial: Duration, max: Duration) -> Self {
        let max = max.max(initial);
        Self { step: 0, initial, current: initial, max }
    }

    /// Backs off once, either by spinning or by putting the thread to sleep.
    pub fn snooze(&mut self) {
        if self.step < SPIN_LIMIT {
            for _ in 0..(1u32 << self.step) {
                std::hint::spin_loop();
            }
            self.step += 1;
            return;
        }

        thread::sleep(self.current);
        self.current = (self.current * 2).min(self.max);
    }

    /// Resets the backoff to its initial state.
    pub fn reset(&mut self) {
        self.step = 0;
        self.current = self.initial;
    }
}

impl Default for Backoff {
    fn default() -> Self {
        Self::new(Duration::from_micros(50), Duration::from_millis(1))
    }
}
