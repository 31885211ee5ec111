//! Centralized defaults and numeric tolerances for the retry chain engine.
//!
//! The tolerances below define when the analytic path is trusted. Keeping them
//! together means a change in numerical policy is a reviewed code change rather
//! than a tweak buried inside one solver.

// Run defaults -------------------------------------------------------------
pub const DEFAULT_SUCCESS_PROBABILITY: f64 = 0.6;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;
pub const DEFAULT_NUM_TRIALS: u64 = 1_000_000;
pub const DEFAULT_WORKERS: usize = 1;

// Limits -------------------------------------------------------------------
/// Largest attempt budget accepted; the dense solver is O(n^3) in it.
pub const MAX_ATTEMPTS: u32 = 1_024;
/// Largest worker count accepted for partitioned runs.
pub const MAX_WORKERS: usize = 256;

// Analytic tolerances ------------------------------------------------------
/// Allowed drift of `P(success) + P(failure)` away from 1.
pub const PROBABILITY_SUM_TOLERANCE: f64 = 1e-9;
/// Maximum absolute entry of `(I - Q)·N - I` accepted after inversion.
pub const INVERSION_RESIDUAL_TOLERANCE: f64 = 1e-9;
/// Pivots smaller than this are treated as a singular matrix.
pub const SINGULAR_PIVOT_EPSILON: f64 = 1e-12;
/// Allowed drift of each transition row sum away from 1.
pub const ROW_SUM_TOLERANCE: f64 = 1e-12;

// Simulation ---------------------------------------------------------------
/// Domain tag used when deriving per-worker trial streams.
pub(crate) const TRIAL_STREAM_TAG: &[u8] = b"trials";
/// 2^-53, scales the top 53 bits of a `u64` draw onto `[0, 1)`.
pub(crate) const UNIT_INTERVAL_SCALE: f64 = 1.0 / 9_007_199_254_740_992.0;
