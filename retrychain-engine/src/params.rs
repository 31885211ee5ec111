//! Validated process parameters shared by the solver and the simulator.
use serde::Serialize;

use crate::constants::{MAX_ATTEMPTS, MAX_WORKERS};
use crate::error::ChainError;

/// Per-attempt success probability and attempt limit for one run.
///
/// Construction validates `0 < p <= 1` and `1 <= max_attempts <= MAX_ATTEMPTS`, so every
/// consumer may assume a well-formed chain.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ProcessParams {
    success_probability: f64,
    max_attempts: u32,
}

impl ProcessParams {
    /// Build and validate a parameter pair.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` when the probability lies outside
    /// `(0, 1]` (NaN included) or the attempt limit is zero or above
    /// [`MAX_ATTEMPTS`].
    pub fn new(success_probability: f64, max_attempts: u32) -> Result<Self, ChainError> {
        validate_probability(success_probability)?;
        validate_attempts(max_attempts)?;
        Ok(Self {
            success_probability,
            max_attempts,
        })
    }

    #[must_use]
    pub const fn success_probability(&self) -> f64 {
        self.success_probability
    }

    /// Probability that a single attempt fails.
    #[must_use]
    pub fn failure_probability(&self) -> f64 {
        1.0 - self.success_probability
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }
}

pub(crate) fn validate_probability(value: f64) -> Result<(), ChainError> {
    // Written so NaN fails the check.
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ChainError::invalid(
            "success_probability",
            value,
            "must lie in (0, 1]",
        ))
    }
}

pub(crate) fn validate_attempts(value: u32) -> Result<(), ChainError> {
    if value == 0 {
        return Err(ChainError::invalid(
            "max_attempts",
            value,
            "must be at least 1",
        ));
    }
    if value > MAX_ATTEMPTS {
        return Err(ChainError::invalid(
            "max_attempts",
            value,
            "exceeds the supported attempt limit",
        ));
    }
    Ok(())
}

pub(crate) fn validate_trials(value: u64) -> Result<(), ChainError> {
    if value == 0 {
        return Err(ChainError::invalid("num_trials", value, "must be at least 1"));
    }
    Ok(())
}

pub(crate) fn validate_workers(value: usize) -> Result<(), ChainError> {
    if value == 0 {
        return Err(ChainError::invalid("workers", value, "must be at least 1"));
    }
    if value > MAX_WORKERS {
        return Err(ChainError::invalid(
            "workers",
            value,
            "exceeds the supported worker limit",
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_unit_probability() {
        let params = ProcessParams::new(1.0, 3).unwrap();
        assert!((params.failure_probability() - 0.0).abs() < f64::EPSILON);
        assert_eq!(params.max_attempts(), 3);
    }

    #[test]
    fn rejects_out_of_range_inputs() {
        for p in [0.0, -0.1, 1.000_001, f64::NAN, f64::INFINITY] {
            let err = ProcessParams::new(p, 3).unwrap_err();
            assert!(
                matches!(err, ChainError::InvalidParameter { field, .. } if field == "success_probability"),
                "p = {p} should be rejected"
            );
        }
        assert!(matches!(
            ProcessParams::new(0.5, 0),
            Err(ChainError::InvalidParameter { field, .. }) if field == "max_attempts"
        ));
    }

    #[test]
    fn attempt_limit_is_enforced() {
        assert!(ProcessParams::new(0.5, MAX_ATTEMPTS).is_ok());
        for n in [MAX_ATTEMPTS + 1, 100_000, u32::MAX] {
            let err = ProcessParams::new(0.5, n).unwrap_err();
            assert!(
                matches!(err, ChainError::InvalidParameter { field, .. } if field == "max_attempts"),
                "n = {n} should be rejected"
            );
        }
    }

    #[test]
    fn trial_count_must_be_positive() {
        assert!(validate_trials(0).is_err());
        assert!(validate_trials(1).is_ok());
    }

    #[test]
    fn worker_count_is_bounded() {
        assert!(validate_workers(0).is_err());
        assert!(validate_workers(1).is_ok());
        assert!(validate_workers(MAX_WORKERS).is_ok());
        assert!(validate_workers(MAX_WORKERS + 1).is_err());
    }
}
