//! Run configuration shared by both components.
use serde::{Deserialize, Serialize};

use crate::chain::SolverMethod;
use crate::constants::{
    DEFAULT_MAX_ATTEMPTS, DEFAULT_NUM_TRIALS, DEFAULT_SUCCESS_PROBABILITY, DEFAULT_WORKERS,
};
use crate::error::ChainError;
use crate::params::{ProcessParams, validate_trials, validate_workers};

/// Options recognized for one solver/simulator comparison.
///
/// Field names also accept the camelCase spelling (`successProbability`,
/// `maxAttempts`, `numTrials`, `randomSeed`) so parameter files written for
/// other tooling load unchanged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    #[serde(
        default = "RunConfig::default_success_probability",
        alias = "successProbability"
    )]
    pub success_probability: f64,
    #[serde(default = "RunConfig::default_max_attempts", alias = "maxAttempts")]
    pub max_attempts: u32,
    #[serde(default = "RunConfig::default_num_trials", alias = "numTrials")]
    pub num_trials: u64,
    /// `None` makes the run non-reproducible; the seed actually used is
    /// still recorded in the report.
    #[serde(default, alias = "randomSeed")]
    pub random_seed: Option<u64>,
    #[serde(default = "RunConfig::default_workers")]
    pub workers: usize,
    #[serde(default)]
    pub method: SolverMethod,
}

impl RunConfig {
    #[must_use]
    pub const fn default_success_probability() -> f64 {
        DEFAULT_SUCCESS_PROBABILITY
    }

    #[must_use]
    pub const fn default_max_attempts() -> u32 {
        DEFAULT_MAX_ATTEMPTS
    }

    #[must_use]
    pub const fn default_num_trials() -> u64 {
        DEFAULT_NUM_TRIALS
    }

    #[must_use]
    pub const fn default_workers() -> usize {
        DEFAULT_WORKERS
    }

    /// Parse a JSON configuration document.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::Config` for malformed JSON or unknown fields.
    pub fn from_json_str(raw: &str) -> Result<Self, ChainError> {
        serde_json::from_str(raw).map_err(|err| ChainError::Config(err.to_string()))
    }

    #[must_use]
    pub const fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.random_seed = seed;
        self
    }

    /// Validate every field and return the process parameters.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` naming the first offending field.
    pub fn validate(&self) -> Result<ProcessParams, ChainError> {
        let params = ProcessParams::new(self.success_probability, self.max_attempts)?;
        validate_trials(self.num_trials)?;
        validate_workers(self.workers)?;
        Ok(params)
    }
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            success_probability: Self::default_success_probability(),
            max_attempts: Self::default_max_attempts(),
            num_trials: Self::default_num_trials(),
            random_seed: None,
            workers: Self::default_workers(),
            method: SolverMethod::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_document_uses_defaults() {
        let cfg = RunConfig::from_json_str("{}").unwrap();
        assert_eq!(cfg, RunConfig::default());
        assert_eq!(cfg.max_attempts, 3);
        assert_eq!(cfg.num_trials, 1_000_000);
        assert!(cfg.random_seed.is_none());
    }

    #[test]
    fn camel_case_aliases_are_accepted() {
        let cfg = RunConfig::from_json_str(
            r#"{"successProbability": 0.25, "maxAttempts": 5, "numTrials": 10, "randomSeed": 42}"#,
        )
        .unwrap();
        assert!((cfg.success_probability - 0.25).abs() < f64::EPSILON);
        assert_eq!(cfg.max_attempts, 5);
        assert_eq!(cfg.num_trials, 10);
        assert_eq!(cfg.random_seed, Some(42));
    }

    #[test]
    fn unknown_fields_are_rejected() {
        let err = RunConfig::from_json_str(r#"{"confidence_interval": 0.95}"#).unwrap_err();
        assert!(matches!(err, ChainError::Config(_)));
    }

    #[test]
    fn method_parses_snake_case() {
        let cfg = RunConfig::from_json_str(r#"{"method": "closed_form", "workers": 4}"#).unwrap();
        assert_eq!(cfg.method, SolverMethod::ClosedForm);
        assert_eq!(cfg.workers, 4);
    }

    #[test]
    fn validate_rejects_each_bad_field() {
        let bad_trials = RunConfig {
            num_trials: 0,
            ..RunConfig::default()
        };
        assert!(matches!(
            bad_trials.validate(),
            Err(ChainError::InvalidParameter { field, .. }) if field == "num_trials"
        ));
        let bad_workers = RunConfig {
            workers: 0,
            ..RunConfig::default()
        };
        assert!(bad_workers.validate().is_err());
        let too_many_workers = RunConfig {
            workers: 100_000,
            ..RunConfig::default()
        };
        assert!(matches!(
            too_many_workers.validate(),
            Err(ChainError::InvalidParameter { field, .. }) if field == "workers"
        ));
        let bad_probability = RunConfig {
            success_probability: 1.5,
            ..RunConfig::default()
        };
        assert!(bad_probability.validate().is_err());
        assert!(RunConfig::default().validate().is_ok());
    }
}
