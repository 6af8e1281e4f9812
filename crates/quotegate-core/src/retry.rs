//! Retry policy with exponential backoff.

use std::time::Duration;

/// Backoff strategy between attempts.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Backoff {
    /// Uses a fixed delay between retries.
    Fixed {
        /// Delay between retries.
        delay: Duration,
    },
    /// Uses an exponential delay between retries.
    ///
    /// The delay is calculated as `base * (factor ^ retry)`.
    Exponential {
        /// The initial backoff duration.
        base: Duration,
        /// The multiplicative factor for each subsequent retry.
        factor: f64,
        /// The maximum duration to wait between retries.
        max: Duration,
    },
}

impl Default for Backoff {
    fn default() -> Self {
        Self::Exponential {
            base: Duration::from_secs(1),
            factor: 2.0,
            max: Duration::from_secs(60),
        }
    }
}

impl Backoff {
    /// Delay before retry number `retry` (0-based: the wait after the first failure is `delay(0)`).
    pub fn delay(self, retry: u32) -> Duration {
        match self {
            Self::Fixed { delay } => delay,
            Self::Exponential { base, factor, max } => {
                let scale = factor.powi(retry.min(i32::MAX as u32) as i32);
                let seconds = base.as_secs_f64() * scale;
                Duration::from_secs_f64(seconds.min(max.as_secs_f64()).max(0.0))
            }
        }
    }
}

/// Attempt budget and backoff for one retry sequence.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts, the first one included. Always at least one.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

impl RetryPolicy {
    pub fn new(max_attempts: u32, backoff: Backoff) -> Self {
        Self {
            max_attempts: max_attempts.max(1),
            backoff,
        }
    }

    /// Three attempts on the requested interval.
    pub fn primary() -> Self {
        Self::new(3, Backoff::default())
    }

    /// Two attempts on the fallback interval.
    pub fn fallback() -> Self {
        Self::new(2, Backoff::default())
    }

    /// Wait between attempt `attempt` (1-based) and the next one, or `None`
    /// when `attempt` was the last.
    pub fn delay_after(&self, attempt: u32) -> Option<Duration> {
        (attempt >= 1 && attempt < self.max_attempts).then(|| self.backoff.delay(attempt - 1))
    }

    /// Every wait this policy can issue, in order.
    pub fn schedule(&self) -> Vec<Duration> {
        (1..self.max_attempts)
            .filter_map(|attempt| self.delay_after(attempt))
            .collect()
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::primary()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_backoff() {
        let backoff = Backoff::Fixed {
            delay: Duration::from_millis(100),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(10), Duration::from_millis(100));
    }

    #[test]
    fn test_exponential_backoff() {
        let backoff = Backoff::Exponential {
            base: Duration::from_millis(100),
            factor: 2.0,
            max: Duration::from_secs(1),
        };

        assert_eq!(backoff.delay(0), Duration::from_millis(100));
        assert_eq!(backoff.delay(1), Duration::from_millis(200));
        assert_eq!(backoff.delay(2), Duration::from_millis(400));
        assert_eq!(backoff.delay(3), Duration::from_millis(800));
        assert_eq!(backoff.delay(4), Duration::from_secs(1)); // capped
    }

    #[test]
    fn nonsensical_factor_never_yields_negative_delay() {
        let backoff = Backoff::Exponential {
            base: Duration::from_secs(1),
            factor: -2.0,
            max: Duration::from_secs(60),
        };

        assert_eq!(backoff.delay(1), Duration::ZERO);
        assert_eq!(backoff.delay(2), Duration::from_secs(4));

        let nan = Backoff::Exponential {
            base: Duration::from_secs(1),
            factor: f64::NAN,
            max: Duration::from_secs(5),
        };
        assert_eq!(nan.delay(1), Duration::from_secs(5));
    }

    #[test]
    fn primary_sleeps_twice_and_doubles() {
        let schedule = RetryPolicy::primary().schedule();
        assert_eq!(
            schedule,
            vec![Duration::from_secs(1), Duration::from_secs(2)]
        );
        assert!(schedule[1] >= schedule[0] * 2);
    }

    #[test]
    fn fallback_sleeps_once() {
        assert_eq!(
            RetryPolicy::fallback().schedule(),
            vec![Duration::from_secs(1)]
        );
    }

    #[test]
    fn no_delay_after_final_attempt() {
        let policy = RetryPolicy::primary();
        assert_eq!(policy.delay_after(1), Some(Duration::from_secs(1)));
        assert_eq!(policy.delay_after(2), Some(Duration::from_secs(2)));
        assert_eq!(policy.delay_after(3), None);
        assert_eq!(policy.delay_after(0), None);
    }

    #[test]
    fn zero_attempts_is_raised_to_one() {
        let policy = RetryPolicy::new(0, Backoff::default());
        assert_eq!(policy.max_attempts, 1);
        assert!(policy.schedule().is_empty());
    }
}
