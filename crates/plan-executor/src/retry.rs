//! Exponential backoff policy for retried actions

use tokio::time::Duration;

/// Backoff schedule: `min(base * 2^(attempt - 1), cap)` after failed attempt
/// `attempt`.
#[derive(Debug, Clone, Copy)]
pub struct BackoffPolicy {
    pub base_ms: u64,
    pub cap_ms: u64,
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base_ms: 1_000,
            cap_ms: 10_000,
        }
    }
}

impl BackoffPolicy {
    pub fn new(base_ms: u64, cap_ms: u64) -> Self {
        Self { base_ms, cap_ms }
    }

    /// Delay to apply after failed attempt `attempt` (1-based).
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let multiplier = 2u64.saturating_pow(attempt.saturating_sub(1));
        let total_ms = self.base_ms.saturating_mul(multiplier);
        Duration::from_millis(total_ms.min(self.cap_ms))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_doubles_and_caps() {
        let policy = BackoffPolicy::default();
        assert_eq!(policy.delay_for_attempt(1).as_millis(), 1_000);
        assert_eq!(policy.delay_for_attempt(2).as_millis(), 2_000);
        assert_eq!(policy.delay_for_attempt(3).as_millis(), 4_000);
        assert_eq!(policy.delay_for_attempt(4).as_millis(), 8_000);
        assert_eq!(policy.delay_for_attempt(5).as_millis(), 10_000);
        assert_eq!(policy.delay_for_attempt(12).as_millis(), 10_000);
    }

    #[test]
    fn custom_base_and_cap() {
        let policy = BackoffPolicy::new(50, 200);
        assert_eq!(policy.delay_for_attempt(1).as_millis(), 50);
        assert_eq!(policy.delay_for_attempt(2).as_millis(), 100);
        assert_eq!(policy.delay_for_attempt(3).as_millis(), 200);
        assert_eq!(policy.delay_for_attempt(4).as_millis(), 200);
    }
}
