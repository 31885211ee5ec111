//! Result record joining the analytic solution and the Monte Carlo estimate.
use log::debug;
use rand::RngCore;
use serde::Serialize;

use crate::chain::{AbsorptionSummary, SolverMethod, solve};
use crate::config::RunConfig;
use crate::error::ChainError;
use crate::params::ProcessParams;
use crate::rng::entropy_seed;
use crate::simulation::{SimulationSummary, simulate, simulate_partitioned};

/// Both result sets for one run, ready for an external reporter.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub success_probability: f64,
    pub max_attempts: u32,
    pub num_trials: u64,
    /// Seed that drove the simulation; replaying it reproduces the counters.
    pub seed: u64,
    /// Whether the seed came from the caller rather than OS entropy.
    pub seed_supplied: bool,
    pub workers: usize,
    pub method: SolverMethod,
    pub analytic_success_probability: f64,
    pub analytic_failure_probability: f64,
    pub analytic_expected_attempts: f64,
    pub empirical_success_probability: f64,
    pub empirical_failure_probability: f64,
    pub empirical_mean_attempts: f64,
    pub success_by_attempt: Vec<u64>,
}

impl ComparisonReport {
    fn new(
        config: &RunConfig,
        seed: u64,
        analytic: &AbsorptionSummary,
        empirical: &SimulationSummary,
    ) -> Self {
        Self {
            success_probability: config.success_probability,
            max_attempts: config.max_attempts,
            num_trials: config.num_trials,
            seed,
            seed_supplied: config.random_seed.is_some(),
            workers: config.workers,
            method: config.method,
            analytic_success_probability: analytic.success_probability,
            analytic_failure_probability: analytic.failure_probability,
            analytic_expected_attempts: analytic.expected_attempts,
            empirical_success_probability: empirical.success_probability,
            empirical_failure_probability: empirical.failure_probability,
            empirical_mean_attempts: empirical.mean_attempts,
            success_by_attempt: empirical.counters.success_by_attempt().to_vec(),
        }
    }

    /// Empirical minus analytic success probability.
    #[must_use]
    pub fn success_delta(&self) -> f64 {
        self.empirical_success_probability - self.analytic_success_probability
    }

    /// Empirical minus analytic failure probability.
    #[must_use]
    pub fn failure_delta(&self) -> f64 {
        self.empirical_failure_probability - self.analytic_failure_probability
    }

    /// Empirical mean minus analytic expected attempts.
    #[must_use]
    pub fn mean_attempts_delta(&self) -> f64 {
        self.empirical_mean_attempts - self.analytic_expected_attempts
    }

    /// Labelled empirical-minus-analytic gaps larger than `tolerance`.
    #[must_use]
    pub fn drifted(&self, tolerance: f64) -> Vec<(&'static str, f64)> {
        [
            ("success probability", self.success_delta()),
            ("failure probability", self.failure_delta()),
            ("mean attempts", self.mean_attempts_delta()),
        ]
        .into_iter()
        .filter(|(_, delta)| tolerance.is_nan() || delta.abs() > tolerance)
        .collect()
    }

    /// Whether every empirical value lies within `tolerance` of its analytic
    /// counterpart. A NaN tolerance never passes.
    #[must_use]
    pub fn within(&self, tolerance: f64) -> bool {
        self.drifted(tolerance).is_empty()
    }
}

/// Validate `config`, solve analytically, simulate, and join the results.
///
/// # Errors
///
/// Returns `ChainError::InvalidParameter` for bad options,
/// `ChainError::NumericalError` when the analytic path is unstable, and
/// `ChainError::WorkerSpawn` or `ChainError::WorkerPanicked` if a
/// partitioned worker cannot start or dies.
pub fn run_comparison(config: &RunConfig) -> Result<ComparisonReport, ChainError> {
    let params = config.validate()?;
    let seed = config.random_seed.unwrap_or_else(entropy_seed);
    debug!(
        "comparing p={} n={} over {} trials (seed {seed}, {} workers, {} method)",
        config.success_probability,
        config.max_attempts,
        config.num_trials,
        config.workers,
        config.method
    );

    let analytic = solve(&params, config.method)?;
    let empirical = simulate_partitioned(&params, config.num_trials, seed, config.workers)?;
    Ok(ComparisonReport::new(config, seed, &analytic, &empirical))
}

/// Solve and simulate against a caller-owned random source.
///
/// # Errors
///
/// Same as [`run_comparison`], minus worker failures.
pub fn compare_with_rng<R: RngCore + ?Sized>(
    params: &ProcessParams,
    method: SolverMethod,
    num_trials: u64,
    rng: &mut R,
) -> Result<(AbsorptionSummary, SimulationSummary), ChainError> {
    let analytic = solve(params, method)?;
    let empirical = simulate(params, num_trials, rng)?;
    Ok((analytic, empirical))
}
