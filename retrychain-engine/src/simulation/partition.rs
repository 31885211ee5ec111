//! Multi-worker trial runs.
//!
//! With more than one worker, each owns an independent ChaCha stream derived
//! from the user seed and its worker index. Partial counters are summed after
//! all workers join, so the result depends only on `(seed, workers)`.
use log::debug;
use std::thread;

use super::{SimulationSummary, TrialCounters, run_trials};
use crate::constants::{MAX_WORKERS, TRIAL_STREAM_TAG};
use crate::error::ChainError;
use crate::numbers::usize_to_u64;
use crate::params::{ProcessParams, validate_trials, validate_workers};
use crate::rng::{derive_stream_seed, trial_rng};

/// Split `num_trials` into at most `workers` contiguous shares.
///
/// The first `num_trials % workers` shares carry one extra trial. Workers
/// beyond the trial count are dropped rather than given empty shares.
#[must_use]
pub fn partition_trials(num_trials: u64, workers: usize) -> Vec<u64> {
    if workers == 0 || num_trials == 0 {
        return Vec::new();
    }
    let workers = usize_to_u64(workers).min(num_trials);
    let base = num_trials / workers;
    let extra = num_trials % workers;
    (0..workers)
        .map(|index| base + u64::from(index < extra))
        .collect()
}

/// Run `num_trials` trials across `workers` scoped threads.
///
/// A single worker runs inline on the stream for `seed`, matching
/// [`simulate_seeded`](super::simulate_seeded).
///
/// # Errors
///
/// Returns `ChainError::InvalidParameter` when `num_trials` is zero or
/// `workers` is zero or above [`MAX_WORKERS`], `ChainError::WorkerSpawn` if
/// the OS refuses a thread, and `ChainError::WorkerPanicked` if a worker
/// thread panics.
pub fn simulate_partitioned(
    params: &ProcessParams,
    num_trials: u64,
    seed: u64,
    workers: usize,
) -> Result<SimulationSummary, ChainError> {
    validate_trials(num_trials)?;
    validate_workers(workers)?;
    let shares = partition_trials(num_trials, workers);
    if shares.len() == 1 {
        let mut rng = trial_rng(seed);
        return Ok(SimulationSummary::from_counters(run_trials(
            params, num_trials, &mut rng,
        )));
    }
    debug!(
        "partitioning {num_trials} trials across {} workers",
        shares.len()
    );

    let partials = thread::scope(|scope| -> Result<Vec<TrialCounters>, ChainError> {
        let mut handles = Vec::with_capacity(shares.len());
        for (index, &share) in shares.iter().enumerate() {
            let stream_seed = derive_stream_seed(seed, TRIAL_STREAM_TAG, usize_to_u64(index));
            let handle = thread::Builder::new()
                .name(format!("trials-{index}"))
                .spawn_scoped(scope, move || {
                    let mut rng = trial_rng(stream_seed);
                    run_trials(params, share, &mut rng)
                })
                .map_err(|err| ChainError::WorkerSpawn {
                    worker: index,
                    reason: err.to_string(),
                })?;
            handles.push(handle);
        }
        handles
            .into_iter()
            .enumerate()
            .map(|(worker, handle)| {
                handle
                    .join()
                    .map_err(|_| ChainError::WorkerPanicked { worker })
            })
            .collect()
    })?;

    let mut totals = TrialCounters::new(params);
    for partial in &partials {
        totals.merge(partial)?;
    }
    debug_assert_eq!(totals.trials(), num_trials);
    Ok(SimulationSummary::from_counters(totals))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shares_cover_every_trial() {
        assert_eq!(partition_trials(10, 3), vec![4, 3, 3]);
        assert_eq!(partition_trials(2, 8), vec![1, 1]);
        assert!(partition_trials(5, 0).is_empty());
        assert_eq!(partition_trials(1_000_000, 4).iter().sum::<u64>(), 1_000_000);
    }

    #[test]
    fn partitioned_run_is_deterministic_per_worker_count() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let first = simulate_partitioned(&params, 20_000, 0xBEEF, 4).unwrap();
        let second = simulate_partitioned(&params, 20_000, 0xBEEF, 4).unwrap();
        assert_eq!(first.counters, second.counters);
        assert_eq!(first.counters.trials(), 20_000);
    }

    #[test]
    fn zero_workers_is_invalid() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let err = simulate_partitioned(&params, 10, 1, 0).unwrap_err();
        assert!(matches!(
            err,
            ChainError::InvalidParameter { field, .. } if field == "workers"
        ));
    }

    #[test]
    fn single_worker_matches_seeded_run() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let partitioned = simulate_partitioned(&params, 10_000, 42, 1).unwrap();
        let seeded = crate::simulation::simulate_seeded(&params, 10_000, 42).unwrap();
        assert_eq!(partitioned.counters, seeded.counters);

        // One trial clamps any worker count down to a single inline worker.
        let clamped = simulate_partitioned(&params, 1, 42, 8).unwrap();
        let single = crate::simulation::simulate_seeded(&params, 1, 42).unwrap();
        assert_eq!(clamped.counters, single.counters);
    }

    #[test]
    fn excessive_worker_count_is_rejected_before_spawning() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let err = simulate_partitioned(&params, 100_000, 1, 100_000).unwrap_err();
        assert!(matches!(
            err,
            ChainError::InvalidParameter { field, .. } if field == "workers"
        ));
        assert!(simulate_partitioned(&params, 1_000, 1, MAX_WORKERS).is_ok());
    }
}
