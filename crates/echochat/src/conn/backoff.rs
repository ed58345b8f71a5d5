use rand::Rng;
use std::time::Duration;

/// Base delay of the first reconnect attempt.
pub const BASE_DELAY_MS: u64 = 500;

/// Exponent cap: attempts past this wait `2^6 * 500ms` (about 32s) plus jitter.
pub const MAX_EXPONENT: u32 = 6;

/// Upper bound (exclusive) of the random jitter added to every delay.
pub const MAX_JITTER_MS: u64 = 250;

/// Deterministic part of the delay for a 0-indexed attempt.
pub fn base_delay(attempt: u32) -> Duration {
    let exp = attempt.min(MAX_EXPONENT);
    Duration::from_millis(BASE_DELAY_MS * (1u64 << exp))
}

/// Delay before reconnect attempt `attempt`, jitter drawn from `rng`.
pub fn reconnect_delay<R: Rng>(attempt: u32, rng: &mut R) -> Duration {
    let jitter = rng.random_range(0..MAX_JITTER_MS * 1000);
    base_delay(attempt) + Duration::from_micros(jitter)
}

/// Capped exponential backoff with jitter. There is no retry limit; the
/// counter only goes back to zero on a successful open.
#[derive(Debug, Default)]
pub struct Backoff {
    attempt: u32,
}

impl Backoff {
    pub fn attempt(&self) -> u32 {
        self.attempt
    }

    /// Delay for the current attempt, advancing the counter.
    pub fn next_delay(&mut self) -> Duration {
        let delay = reconnect_delay(self.attempt, &mut rand::rng());
        self.attempt = self.attempt.saturating_add(1);
        delay
    }

    pub fn reset(&mut self) {
        self.attempt = 0;
    }
}
