//! Exponential backoff with jitter.

use std::time::Duration;

use rand::Rng;

/// Calculate exponential backoff delay with jitter.
pub fn calculate_backoff(attempt: u32, base_ms: u64, max_ms: u64) -> Duration {
    if attempt == 0 {
        return Duration::from_millis(0);
    }

    let exponential_base = 2u64.saturating_pow(attempt - 1);
    let delay_ms = base_ms.saturating_mul(exponential_base);
    let capped_delay = delay_ms.min(max_ms);

    // Apply jitter (0 to 10% of the delay)
    let jitter_range = capped_delay / 10;
    let jitter = if jitter_range > 0 {
        rand::thread_rng().gen_range(0..jitter_range)
    } else {
        0
    };

    Duration::from_millis(capped_delay + jitter)
}

/// Pacing for consecutive accept failures (e.g. file descriptor exhaustion).
///
/// Starts at 5ms, doubles per failure, caps at one second; any success resets it.
#[derive(Debug, Default)]
pub struct AcceptBackoff {
    failures: u32,
}

impl AcceptBackoff {
    const BASE_MS: u64 = 5;
    const MAX_MS: u64 = 1000;

    pub fn new() -> Self {
        Self::default()
    }

    /// Record a failure and return how long to pause before the next accept.
    pub fn next_delay(&mut self) -> Duration {
        self.failures = self.failures.saturating_add(1);
        calculate_backoff(self.failures, Self::BASE_MS, Self::MAX_MS)
    }

    pub fn reset(&mut self) {
        self.failures = 0;
    }
}
