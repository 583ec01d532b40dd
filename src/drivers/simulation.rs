use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use thiserror::Error;

use crate::retry::{ErrorKind, WorkflowError};

pub const DEFAULT_FAILURE_RATE: f64 = 0.7;

const FAILURE_KINDS: [ErrorKind; 3] = [ErrorKind::Network, ErrorKind::Timeout, ErrorKind::Validation];

#[derive(Debug, Error, PartialEq)]
#[error("failure rate must be a number between 0 and 1, got {0}")]
pub struct InvalidFailureRate(pub f64);

/// Stand-in for an unreliable downstream call such as a credit bureau lookup
#[derive(Debug)]
pub struct RiskyOperation {
    rng: StdRng,
    failure_rate: f64,
    calls: u32,
}

impl RiskyOperation {
    pub fn new(failure_rate: f64) -> Result<Self, InvalidFailureRate> {
        Ok(Self::from_rng(StdRng::from_os_rng(), check_rate(failure_rate)?))
    }

    /// Reproducible sequence of outcomes for a given seed
    pub fn seeded(seed: u64, failure_rate: f64) -> Result<Self, InvalidFailureRate> {
        Ok(Self::from_rng(StdRng::seed_from_u64(seed), check_rate(failure_rate)?))
    }

    fn from_rng(rng: StdRng, failure_rate: f64) -> Self {
        Self {
            rng,
            failure_rate,
            calls: 0,
        }
    }

    pub fn failure_rate(&self) -> f64 {
        self.failure_rate
    }

    pub fn calls(&self) -> u32 {
        self.calls
    }

    /// Run once. Fails with probability `failure_rate`; validation
    /// failures are marked non-retryable.
    pub fn attempt(&mut self) -> Result<&'static str, WorkflowError> {
        self.calls += 1;
        if !self.rng.random_bool(self.failure_rate) {
            return Ok("Success!");
        }

        let kind = FAILURE_KINDS[self.rng.random_range(0..FAILURE_KINDS.len())];
        let error = WorkflowError::new(kind, format!("Simulated {} failure", kind));
        Err(match kind {
            ErrorKind::Validation => error.with_retryable(false),
            _ => error,
        })
    }
}

impl Default for RiskyOperation {
    fn default() -> Self {
        Self::from_rng(StdRng::from_os_rng(), DEFAULT_FAILURE_RATE)
    }
}

/// Accept only probabilities `random_bool` can take; NaN fails both bounds
pub fn check_rate(failure_rate: f64) -> Result<f64, InvalidFailureRate> {
    if (0.0..=1.0).contains(&failure_rate) {
        Ok(failure_rate)
    } else {
        Err(InvalidFailureRate(failure_rate))
    }
}
