//! Reconnect backoff for interrupted readings.

use std::time::Duration;

/// Longest delay the backoff curve can reach.
pub const MAX_RETRY_DELAY: Duration = Duration::from_secs(300);

/// Exponential backoff with multiplicative jitter and a retry ceiling.
///
/// The delay before retry `n` (0-based) is
/// `base × multiplier^n × (1 + U[0, jitter))`, where `base` is the session's
/// current retry delay. Delays are capped at [`MAX_RETRY_DELAY`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Retries allowed before the reading fails terminally
    pub max_retries: u32,
    /// Growth factor per retry
    pub multiplier: f64,
    /// Upper bound of the random fraction added on top of the delay
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            multiplier: 1.5,
            jitter: 0.3,
        }
    }
}

impl RetryPolicy {
    /// Create a policy with a custom ceiling and the default curve.
    pub fn with_max_retries(max_retries: u32) -> Self {
        Self {
            max_retries,
            ..Self::default()
        }
    }

    /// True once `retry_count` retries have already fired.
    pub fn exhausted(&self, retry_count: u32) -> bool {
        retry_count >= self.max_retries
    }

    /// Delay before the next retry, jitter included.
    pub fn delay_for(&self, base: Duration, retry_count: u32) -> Duration {
        let factor = 1.0 + rand::random::<f64>() * self.jitter;
        self.scaled(base, retry_count, factor)
    }

    /// Smallest and largest delay [`delay_for`](Self::delay_for) can return.
    pub fn delay_bounds(&self, base: Duration, retry_count: u32) -> (Duration, Duration) {
        (
            self.scaled(base, retry_count, 1.0),
            self.scaled(base, retry_count, 1.0 + self.jitter),
        )
    }

    fn scaled(&self, base: Duration, retry_count: u32, factor: f64) -> Duration {
        if base.is_zero() {
            return Duration::ZERO;
        }
        let exponent = retry_count.min(i32::MAX as u32) as i32;
        let secs = base.as_secs_f64() * self.multiplier.powi(exponent) * factor;
        Duration::try_from_secs_f64(secs)
            .unwrap_or(MAX_RETRY_DELAY)
            .min(MAX_RETRY_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.max_retries, 3);
        assert_eq!(policy.multiplier, 1.5);
        assert_eq!(policy.jitter, 0.3);
    }

    #[test]
    fn test_exhausted_at_ceiling() {
        let policy = RetryPolicy::default();
        assert!(!policy.exhausted(0));
        assert!(!policy.exhausted(2));
        assert!(policy.exhausted(3));
        assert!(policy.exhausted(4));
    }

    #[test]
    fn test_delay_within_bounds() {
        let policy = RetryPolicy::default();
        let base = Duration::from_secs(2);
        for retry_count in 0..3 {
            let lower = base.mul_f64(1.5f64.powi(retry_count as i32));
            let upper = lower.mul_f64(1.3);
            for _ in 0..200 {
                let delay = policy.delay_for(base, retry_count);
                assert!(
                    delay >= lower && delay <= upper,
                    "retry {}: {:?} not in [{:?}, {:?}]",
                    retry_count,
                    delay,
                    lower,
                    upper
                );
            }
        }
    }

    #[test]
    fn test_delay_bounds() {
        let policy = RetryPolicy::default();
        let (low, high) = policy.delay_bounds(Duration::from_secs(1), 2);
        assert_eq!(low, Duration::from_secs_f64(2.25));
        assert_eq!(high, Duration::from_secs_f64(2.25 * 1.3));
    }

    #[test]
    fn test_deep_retries_are_capped() {
        let policy = RetryPolicy::with_max_retries(500);
        assert_eq!(policy.delay_for(Duration::from_secs(1), 200), MAX_RETRY_DELAY);
        assert_eq!(
            policy.delay_for(Duration::from_secs(1), u32::MAX),
            MAX_RETRY_DELAY
        );
        assert_eq!(policy.delay_for(Duration::from_secs(1), 20), MAX_RETRY_DELAY);
        assert_eq!(policy.delay_for(Duration::ZERO, 200), Duration::ZERO);
    }

    #[test]
    fn test_zero_jitter_is_deterministic() {
        let policy = RetryPolicy {
            jitter: 0.0,
            ..RetryPolicy::default()
        };
        assert_eq!(
            policy.delay_for(Duration::from_millis(100), 1),
            Duration::from_millis(150)
        );
    }
}
