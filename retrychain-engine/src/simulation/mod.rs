//! Monte Carlo estimator for the retry chain.
//!
//! Each trial draws at most `max_attempts` uniforms and is folded straight
//! into [`TrialCounters`]; no per-trial outcome outlives its iteration.
use log::debug;
use rand::RngCore;
use serde::Serialize;

use crate::error::ChainError;
use crate::numbers::{ratio, u32_to_usize};
use crate::params::{ProcessParams, validate_trials};
use crate::rng::{trial_rng, unit_interval};

pub mod partition;

pub use partition::{partition_trials, simulate_partitioned};

/// Result of one simulated run of the retry process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrialOutcome {
    /// Succeeded on the given one-based attempt.
    Success { attempts: u32 },
    /// Every attempt failed.
    Failure,
}

impl TrialOutcome {
    /// Attempts credited to this trial; a failure spends the whole budget.
    #[must_use]
    pub const fn attempts_consumed(self, max_attempts: u32) -> u32 {
        match self {
            Self::Success { attempts } => attempts,
            Self::Failure => max_attempts,
        }
    }
}

/// Simulate a single user working through their attempts.
pub fn run_single_trial<R: RngCore + ?Sized>(params: &ProcessParams, rng: &mut R) -> TrialOutcome {
    let p = params.success_probability();
    for attempt in 1..=params.max_attempts() {
        if unit_interval(rng) < p {
            return TrialOutcome::Success { attempts: attempt };
        }
    }
    TrialOutcome::Failure
}

/// Running totals owned by one simulation call (or one worker).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TrialCounters {
    max_attempts: u32,
    trials: u64,
    successes: u64,
    failures: u64,
    attempts: u64,
    /// `success_by_attempt[k]`: trials that succeeded on attempt `k + 1`.
    success_by_attempt: Vec<u64>,
}

impl TrialCounters {
    /// Empty totals sized for `params`.
    #[must_use]
    pub fn new(params: &ProcessParams) -> Self {
        let max_attempts = params.max_attempts();
        Self {
            max_attempts,
            trials: 0,
            successes: 0,
            failures: 0,
            attempts: 0,
            success_by_attempt: vec![0; u32_to_usize(max_attempts)],
        }
    }

    /// Fold one outcome into the totals.
    pub fn record(&mut self, outcome: TrialOutcome) {
        self.trials += 1;
        self.attempts += u64::from(outcome.attempts_consumed(self.max_attempts));
        match outcome {
            TrialOutcome::Success { attempts } => {
                self.successes += 1;
                let slot = u32_to_usize(attempts.saturating_sub(1));
                if let Some(count) = self.success_by_attempt.get_mut(slot) {
                    *count += 1;
                }
            }
            TrialOutcome::Failure => self.failures += 1,
        }
    }

    /// Add another worker's totals into these.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` when the counters were built
    /// for different attempt limits.
    pub fn merge(&mut self, other: &Self) -> Result<(), ChainError> {
        if self.max_attempts != other.max_attempts {
            return Err(ChainError::invalid(
                "max_attempts",
                other.max_attempts,
                "must match when merging counters",
            ));
        }
        self.trials += other.trials;
        self.successes += other.successes;
        self.failures += other.failures;
        self.attempts += other.attempts;
        for (mine, theirs) in self
            .success_by_attempt
            .iter_mut()
            .zip(&other.success_by_attempt)
        {
            *mine += theirs;
        }
        Ok(())
    }

    #[must_use]
    pub const fn max_attempts(&self) -> u32 {
        self.max_attempts
    }

    #[must_use]
    pub const fn trials(&self) -> u64 {
        self.trials
    }

    #[must_use]
    pub const fn successes(&self) -> u64 {
        self.successes
    }

    #[must_use]
    pub const fn failures(&self) -> u64 {
        self.failures
    }

    /// Total attempts credited across all trials.
    #[must_use]
    pub const fn attempts(&self) -> u64 {
        self.attempts
    }

    #[must_use]
    pub fn success_by_attempt(&self) -> &[u64] {
        &self.success_by_attempt
    }
}

/// Immutable summary of a simulation run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SimulationSummary {
    pub counters: TrialCounters,
    pub success_probability: f64,
    pub failure_probability: f64,
    pub mean_attempts: f64,
}

impl SimulationSummary {
    #[must_use]
    pub fn from_counters(counters: TrialCounters) -> Self {
        let trials = counters.trials();
        Self {
            success_probability: ratio(counters.successes(), trials),
            failure_probability: ratio(counters.failures(), trials),
            mean_attempts: ratio(counters.attempts(), trials),
            counters,
        }
    }
}

/// Run `num_trials` trials against an already validated parameter set.
pub(crate) fn run_trials<R: RngCore + ?Sized>(
    params: &ProcessParams,
    num_trials: u64,
    rng: &mut R,
) -> TrialCounters {
    let mut counters = TrialCounters::new(params);
    for _ in 0..num_trials {
        counters.record(run_single_trial(params, rng));
    }
    counters
}

/// Estimate absorption statistics from `num_trials` independent trials
/// drawn from `rng`.
///
/// # Errors
///
/// Returns `ChainError::InvalidParameter` when `num_trials` is zero.
pub fn simulate<R: RngCore + ?Sized>(
    params: &ProcessParams,
    num_trials: u64,
    rng: &mut R,
) -> Result<SimulationSummary, ChainError> {
    validate_trials(num_trials)?;
    let counters = run_trials(params, num_trials, rng);
    debug!(
        "simulated {} trials: {} successes, {} failures, {} attempts",
        counters.trials(),
        counters.successes(),
        counters.failures(),
        counters.attempts()
    );
    Ok(SimulationSummary::from_counters(counters))
}

/// [`simulate`] on the reproducible stream for `seed`.
///
/// # Errors
///
/// Returns `ChainError::InvalidParameter` when `num_trials` is zero.
pub fn simulate_seeded(
    params: &ProcessParams,
    num_trials: u64,
    seed: u64,
) -> Result<SimulationSummary, ChainError> {
    let mut rng = trial_rng(seed);
    simulate(params, num_trials, &mut rng)
}
