use std::time::Duration;
use thiserror::Error;

/// Exponential backoff settings.
///
/// `delay(attempt) = min(base_delay * backoff_factor^attempt, max_delay)` with a
/// zero-based `attempt`. With the defaults (1s base, factor 2, 60s cap) the waits
/// after the first, second and third failures are 1s, 2s and 4s.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

#[derive(Debug, Error, PartialEq)]
pub enum PolicyError {
    #[error("max_attempts must be at least 1")]
    ZeroAttempts,
    #[error("backoff_factor must be a finite number >= 1.0, got {0}")]
    InvalidBackoffFactor(f64),
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(60),
            backoff_factor: 2.0,
        }
    }
}

impl RetryPolicy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        if self.max_attempts == 0 {
            return Err(PolicyError::ZeroAttempts);
        }
        if !self.backoff_factor.is_finite() || self.backoff_factor < 1.0 {
            return Err(PolicyError::InvalidBackoffFactor(self.backoff_factor));
        }
        Ok(())
    }

    /// Wait before the attempt following the zero-based `attempt`
    pub fn delay(&self, attempt: u32) -> Duration {
        let max_secs = self.max_delay.as_secs_f64();
        let secs = self.base_delay.as_secs_f64() * self.backoff_factor.powf(f64::from(attempt));
        if !secs.is_finite() || secs >= max_secs {
            return self.max_delay;
        }
        Duration::try_from_secs_f64(secs.max(0.0)).unwrap_or(self.max_delay)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_backoff_sequence() {
        let policy = RetryPolicy::default();
        assert_eq!(policy.delay(0), Duration::from_secs(1));
        assert_eq!(policy.delay(1), Duration::from_secs(2));
        assert_eq!(policy.delay(2), Duration::from_secs(4));
        assert_eq!(policy.delay(10), Duration::from_secs(60));
        assert_eq!(policy.delay(u32::MAX), Duration::from_secs(60));
    }

    #[test]
    fn test_half_second_base() {
        let policy = RetryPolicy {
            base_delay: Duration::from_millis(500),
            ..RetryPolicy::default()
        };
        assert_eq!(policy.delay(0), Duration::from_millis(500));
        assert_eq!(policy.delay(1), Duration::from_secs(1));
    }

    #[test]
    fn test_validation() {
        assert!(RetryPolicy::default().validate().is_ok());
        assert_eq!(
            RetryPolicy {
                max_attempts: 0,
                ..RetryPolicy::default()
            }
            .validate(),
            Err(PolicyError::ZeroAttempts)
        );
        assert_eq!(
            RetryPolicy {
                backoff_factor: 0.5,
                ..RetryPolicy::default()
            }
            .validate(),
            Err(PolicyError::InvalidBackoffFactor(0.5))
        );
    }
}
