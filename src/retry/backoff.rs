use std::time::Duration;

/// Exponential delay between attempts, capped
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Backoff {
    base_ms: u64,
    max_ms: u64,
}

impl Backoff {
    pub const fn new(base_ms: u64, max_ms: u64) -> Self {
        Self { base_ms, max_ms }
    }

    /// No delay at all
    pub const fn none() -> Self {
        Self::new(0, 0)
    }

    /// Delay after the `attempt`-th failure (1-based)
    pub fn delay(&self, attempt: u32) -> Duration {
        let exponent = attempt.saturating_sub(1).min(20);
        let delay = self.base_ms.saturating_mul(2u64.saturating_pow(exponent));
        Duration::from_millis(delay.min(self.max_ms))
    }
}
