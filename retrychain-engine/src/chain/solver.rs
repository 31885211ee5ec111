//! Fundamental-matrix solution of the absorbing chain.
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::{
    DenseMatrix, FAILURE_COLUMN, SUCCESS_COLUMN, TransitionStructure, closed_form::closed_form,
};
use crate::constants::{INVERSION_RESIDUAL_TOLERANCE, PROBABILITY_SUM_TOLERANCE};
use crate::error::ChainError;
use crate::params::ProcessParams;

/// Which analytic path produces the summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// General `N = (I - Q)^-1` method.
    #[default]
    Fundamental,
    /// Geometric identities specific to the attempt ladder.
    ClosedForm,
}

impl SolverMethod {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Fundamental => "fundamental",
            Self::ClosedForm => "closed_form",
        }
    }
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SolverMethod {
    type Err = ChainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "fundamental" => Ok(Self::Fundamental),
            "closed_form" => Ok(Self::ClosedForm),
            _ => Err(ChainError::invalid(
                "method",
                value,
                "must be fundamental or closed_form",
            )),
        }
    }
}

/// Absorption probabilities and expected duration from one start state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct AbsorptionSummary {
    pub success_probability: f64,
    pub failure_probability: f64,
    pub expected_attempts: f64,
}

impl AbsorptionSummary {
    /// Surface NaN/∞ and probability mass leaks as numerical errors.
    pub(crate) fn checked(self, context: &str) -> Result<Self, ChainError> {
        let values = [
            self.success_probability,
            self.failure_probability,
            self.expected_attempts,
        ];
        if values.iter().any(|value| !value.is_finite()) {
            return Err(ChainError::numerical(format!(
                "{context} produced a non-finite value: {self:?}"
            )));
        }
        let total = self.success_probability + self.failure_probability;
        if (total - 1.0).abs() > PROBABILITY_SUM_TOLERANCE {
            return Err(ChainError::numerical(format!(
                "{context} absorption probabilities sum to {total}"
            )));
        }
        Ok(self)
    }
}

/// `N`, `B = N·R` and `t = N·1` for every transient start state.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundamentalSolution {
    fundamental: DenseMatrix,
    absorption: DenseMatrix,
    expected_steps: Vec<f64>,
}

impl FundamentalSolution {
    /// Solve an arbitrary absorbing/transient split.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` when `I - Q` is singular, the
    /// inverse fails the residual check, or any derived value is non-finite.
    pub fn from_structure(structure: &TransitionStructure) -> Result<Self, ChainError> {
        let n = structure.space().transient_count();
        let system = DenseMatrix::identity(n)?.sub(structure.transient())?;
        let fundamental = system.inverse()?;

        let residual = system.mul(&fundamental)?.max_identity_deviation();
        if residual > INVERSION_RESIDUAL_TOLERANCE {
            return Err(ChainError::numerical(format!(
                "(I - Q)·N deviates from identity by {residual:e}"
            )));
        }

        let absorption = fundamental.mul(structure.absorbing())?;
        let expected_steps = fundamental.row_sums();
        if !absorption.is_finite() || expected_steps.iter().any(|value| !value.is_finite()) {
            return Err(ChainError::numerical(
                "absorption matrix holds non-finite entries",
            ));
        }
        debug!(
            "fundamental matrix solved: {n} transient states, inversion residual {residual:e}"
        );
        Ok(Self {
            fundamental,
            absorption,
            expected_steps,
        })
    }

    /// `N[i][j]`: expected visits to transient `j` starting from `i`.
    #[must_use]
    pub const fn fundamental(&self) -> &DenseMatrix {
        &self.fundamental
    }

    /// `B[i][k]`: probability of absorbing into `k` starting from `i`.
    #[must_use]
    pub const fn absorption(&self) -> &DenseMatrix {
        &self.absorption
    }

    /// `t[i]`: expected steps before absorption starting from `i`.
    #[must_use]
    pub fn expected_steps(&self) -> &[f64] {
        &self.expected_steps
    }

    /// Summary for a process that starts in transient state `start`.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` for a start outside the
    /// transient states, or `ChainError::NumericalError` when the row does
    /// not form a distribution.
    pub fn summary_from(&self, start: usize) -> Result<AbsorptionSummary, ChainError> {
        let (Some(row), Some(&expected_attempts)) =
            (self.absorption.row(start), self.expected_steps.get(start))
        else {
            return Err(ChainError::invalid(
                "start_state",
                start,
                "must be a transient state index",
            ));
        };
        AbsorptionSummary {
            success_probability: row[SUCCESS_COLUMN],
            failure_probability: row[FAILURE_COLUMN],
            expected_attempts,
        }
        .checked("fundamental matrix")
    }

    /// Summary for a process that starts at the first attempt.
    ///
    /// # Errors
    ///
    /// See [`FundamentalSolution::summary_from`].
    pub fn summary(&self) -> Result<AbsorptionSummary, ChainError> {
        self.summary_from(0)
    }
}

/// Build and solve the retry chain for `params` with the matrix method.
///
/// # Errors
///
/// See [`FundamentalSolution::from_structure`].
pub fn solve_fundamental(params: &ProcessParams) -> Result<FundamentalSolution, ChainError> {
    let structure = TransitionStructure::new(params)?;
    structure.validate_rows()?;
    FundamentalSolution::from_structure(&structure)
}

/// Absorption summary from the first attempt using the chosen method.
///
/// # Errors
///
/// Returns `ChainError::NumericalError` when the analytic result is unstable
/// or non-finite.
pub fn solve(params: &ProcessParams, method: SolverMethod) -> Result<AbsorptionSummary, ChainError> {
    match method {
        SolverMethod::Fundamental => solve_fundamental(params)?.summary(),
        SolverMethod::ClosedForm => closed_form(params),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_close(actual: f64, expected: f64, tolerance: f64) {
        assert!(
            (actual - expected).abs() <= tolerance,
            "expected {expected}, got {actual}"
        );
    }

    #[test]
    fn three_attempts_at_sixty_percent() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let summary = solve(&params, SolverMethod::Fundamental).unwrap();
        assert_close(summary.success_probability, 0.936, 1e-12);
        assert_close(summary.failure_probability, 0.064, 1e-12);
        assert_close(summary.expected_attempts, 1.56, 1e-12);
    }

    #[test]
    fn fundamental_matrix_counts_visits() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let solution = solve_fundamental(&params).unwrap();
        let n = solution.fundamental();
        assert_close(n[(0, 0)], 1.0, 1e-12);
        assert_close(n[(0, 1)], 0.4, 1e-12);
        assert_close(n[(0, 2)], 0.16, 1e-12);
        assert_close(n[(2, 0)], 0.0, 1e-12);
        assert_eq!(solution.expected_steps().len(), 3);
    }

    #[test]
    fn later_start_states_have_fewer_chances() {
        let params = ProcessParams::new(0.6, 3).unwrap();
        let solution = solve_fundamental(&params).unwrap();
        let last = solution.summary_from(2).unwrap();
        assert_close(last.success_probability, 0.6, 1e-12);
        assert_close(last.failure_probability, 0.4, 1e-12);
        assert_close(last.expected_attempts, 1.0, 1e-12);
        assert!(solution.summary_from(3).unwrap_err().is_invalid_parameter());
    }

    #[test]
    fn solver_is_idempotent() {
        let params = ProcessParams::new(0.37, 5).unwrap();
        let first = solve(&params, SolverMethod::Fundamental).unwrap();
        let second = solve(&params, SolverMethod::Fundamental).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn singular_system_surfaces_numerical_error() {
        // A transient self-loop with probability one never absorbs.
        let q = DenseMatrix::from_rows(&[vec![1.0]]).unwrap();
        let r = DenseMatrix::from_rows(&[vec![0.0, 0.0]]).unwrap();
        let structure = TransitionStructure::from_blocks(q, r).unwrap();
        let err = FundamentalSolution::from_structure(&structure).unwrap_err();
        assert!(err.is_numerical(), "unexpected error {err:?}");
    }

    #[test]
    fn method_parses_from_text() {
        assert_eq!(
            "closed-form".parse::<SolverMethod>().unwrap(),
            SolverMethod::ClosedForm
        );
        assert_eq!(
            "Fundamental".parse::<SolverMethod>().unwrap(),
            SolverMethod::Fundamental
        );
        assert!("lu".parse::<SolverMethod>().is_err());
        assert_eq!(SolverMethod::default().to_string(), "fundamental");
    }
}
