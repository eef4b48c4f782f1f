/// Capped exponential backoff for polling loops
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct Backoff {
    base: Duration,
    max: Duration,
    attempt: u32,
}

impl Backoff {
    pub fn new(base: Duration, max: Duration) -> Self {
        Self {
            base,
            max: max.max(base),
            attempt: 0,
        }
    }

    /// Delay to wait before the next attempt; doubles each call up to `max`.
    pub fn next_delay(&mut self) -> Duration {
        let shift = self.attempt.min(16);
        self.attempt = self.attempt.saturating_add(1);

        let delay = self.base.saturating_mul(1_u32 << shift);
        delay.min(self.max)
    }

    pub fn attempts(&self) -> u32 {
        self.attempt
    }
}
