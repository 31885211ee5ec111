//! Retry Chain Engine
//!
//! Models a bounded-retry process (up to `n` attempts, each succeeding with
//! probability `p`) as an absorbing Markov chain and cross-checks the exact
//! solution against a seeded Monte Carlo estimate. This crate performs no
//! I/O; formatting and printing belong to the caller.

pub mod chain;
pub mod comparison;
pub mod config;
pub mod constants;
pub mod error;
pub mod numbers;
pub mod params;
pub mod rng;
pub mod simulation;

// Re-export commonly used types
pub use chain::{
    AbsorptionSummary, ChainState, DenseMatrix, FundamentalSolution, SolverMethod, StateSpace,
    TransitionStructure, closed_form, solve, solve_fundamental,
};
pub use comparison::{ComparisonReport, compare_with_rng, run_comparison};
pub use config::RunConfig;
pub use error::ChainError;
pub use params::ProcessParams;
pub use rng::{CountingRng, TrialRng, derive_stream_seed, entropy_seed, trial_rng};
pub use simulation::{
    SimulationSummary, TrialCounters, TrialOutcome, partition_trials, run_single_trial, simulate,
    simulate_partitioned, simulate_seeded,
};
