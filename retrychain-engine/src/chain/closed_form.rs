//! Geometric identities for the attempt ladder.
//!
//! Failure needs every attempt to fail, so `P(failure) = (1 - p)^n`. Attempt
//! `k + 1` happens only when the first `k` failed, so the expected number of
//! attempts is `sum_{k < n} (1 - p)^k`.
use super::AbsorptionSummary;
use crate::error::ChainError;
use crate::params::ProcessParams;

/// Absorption summary from the first attempt without building any matrix.
///
/// # Errors
///
/// Returns `ChainError::NumericalError` when a result is non-finite or the
/// probabilities do not sum to one.
pub fn closed_form(params: &ProcessParams) -> Result<AbsorptionSummary, ChainError> {
    let q = params.failure_probability();
    let mut reach = 1.0;
    let mut expected_attempts = 0.0;
    for _ in 0..params.max_attempts() {
        expected_attempts += reach;
        reach *= q;
        if reach == 0.0 {
            break;
        }
    }
    let failure_probability = reach;
    AbsorptionSummary {
        success_probability: 1.0 - failure_probability,
        failure_probability,
        expected_attempts,
    }
    .checked("closed form")
}
