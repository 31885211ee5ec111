//! Absorbing Markov chain model of a bounded-retry process.
//!
//! Transient state `i` means "about to make attempt `i + 1`". Each attempt
//! either absorbs into [`ChainState::Success`] or advances to the next
//! transient state; the final attempt advances into [`ChainState::Failure`].
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::constants::ROW_SUM_TOLERANCE;
use crate::error::ChainError;
use crate::numbers::u32_to_usize;
use crate::params::ProcessParams;

pub mod closed_form;
pub mod matrix;
pub mod solver;

pub use closed_form::closed_form;
pub use matrix::DenseMatrix;
pub use solver::{AbsorptionSummary, FundamentalSolution, SolverMethod, solve, solve_fundamental};

/// Column of `R` holding the probability of absorbing into `Success`.
pub const SUCCESS_COLUMN: usize = 0;
/// Column of `R` holding the probability of absorbing into `Failure`.
pub const FAILURE_COLUMN: usize = 1;
/// Number of absorbing states.
pub const ABSORBING_STATES: usize = 2;

/// A state of the retry chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainState {
    /// Zero-based attempt index still to be made.
    Attempt(u32),
    Success,
    Failure,
}

impl ChainState {
    #[must_use]
    pub const fn is_absorbing(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

impl fmt::Display for ChainState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attempt(index) => write!(f, "attempt-{}", index + 1),
            Self::Success => write!(f, "success"),
            Self::Failure => write!(f, "failure"),
        }
    }
}

/// Fixed state space: `max_attempts` transient states, then `Success`, then
/// `Failure`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateSpace {
    max_attempts: u32,
}

impl StateSpace {
    #[must_use]
    pub const fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    #[must_use]
    pub fn transient_count(&self) -> usize {
        u32_to_usize(self.max_attempts)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.transient_count() + ABSORBING_STATES
    }

    #[must_use]
    pub const fn is_empty(&self) -> bool {
        false
    }

    /// Canonical index of a state, or `None` for an attempt outside the space.
    #[must_use]
    pub fn index_of(&self, state: ChainState) -> Option<usize> {
        let transient = self.transient_count();
        match state {
            ChainState::Attempt(index) if index < self.max_attempts => Some(u32_to_usize(index)),
            ChainState::Attempt(_) => None,
            ChainState::Success => Some(transient),
            ChainState::Failure => Some(transient + 1),
        }
    }

    /// State stored at a canonical index.
    #[must_use]
    pub fn state_at(&self, index: usize) -> Option<ChainState> {
        let transient = self.transient_count();
        if index < transient {
            u32::try_from(index).ok().map(ChainState::Attempt)
        } else if index == transient {
            Some(ChainState::Success)
        } else if index == transient + 1 {
            Some(ChainState::Failure)
        } else {
            None
        }
    }

    /// All states in canonical order.
    pub fn states(&self) -> impl Iterator<Item = ChainState> + '_ {
        (0..self.len()).filter_map(|index| self.state_at(index))
    }
}

/// Canonical-form blocks of the transition matrix: `Q` among transient
/// states and `R` from transient to absorbing states.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitionStructure {
    space: StateSpace,
    transient: DenseMatrix,
    absorbing: DenseMatrix,
}

impl TransitionStructure {
    /// Build `Q` (n×n) and `R` (n×2) for the retry chain.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` if the blocks cannot be sized.
    pub fn new(params: &ProcessParams) -> Result<Self, ChainError> {
        let space = StateSpace::new(params.max_attempts());
        let n = space.transient_count();
        let p = params.success_probability();
        let q = params.failure_probability();

        let mut transient = DenseMatrix::zeros(n, n)?;
        let mut absorbing = DenseMatrix::zeros(n, ABSORBING_STATES)?;
        for i in 0..n {
            absorbing[(i, SUCCESS_COLUMN)] = p;
            if i + 1 < n {
                transient[(i, i + 1)] = q;
            } else {
                absorbing[(i, FAILURE_COLUMN)] = q;
            }
        }
        Ok(Self {
            space,
            transient,
            absorbing,
        })
    }

    /// Build from explicit blocks, e.g. a chain whose attempts are not a
    /// simple ladder.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` when the block shapes disagree
    /// or any row of `[Q | R]` does not sum to one.
    pub fn from_blocks(transient: DenseMatrix, absorbing: DenseMatrix) -> Result<Self, ChainError> {
        if !transient.is_square()
            || transient.rows() != absorbing.rows()
            || absorbing.cols() != ABSORBING_STATES
            || transient.rows() == 0
        {
            return Err(ChainError::invalid(
                "transition_blocks",
                format!(
                    "Q {}x{}, R {}x{}",
                    transient.rows(),
                    transient.cols(),
                    absorbing.rows(),
                    absorbing.cols()
                ),
                "must be n x n and n x 2 with n >= 1",
            ));
        }
        let max_attempts = u32::try_from(transient.rows()).map_err(|_| {
            ChainError::invalid("transition_blocks", transient.rows(), "too many states")
        })?;
        let structure = Self {
            space: StateSpace::new(max_attempts),
            transient,
            absorbing,
        };
        structure.validate_rows()?;
        Ok(structure)
    }

    #[must_use]
    pub const fn space(&self) -> StateSpace {
        self.space
    }

    /// `Q`: one-step probabilities among transient states.
    #[must_use]
    pub const fn transient(&self) -> &DenseMatrix {
        &self.transient
    }

    /// `R`: one-step probabilities from transient into absorbing states.
    #[must_use]
    pub const fn absorbing(&self) -> &DenseMatrix {
        &self.absorbing
    }

    /// Check that every transient row of `[Q | R]` is a probability
    /// distribution.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::InvalidParameter` naming the first offending row.
    pub fn validate_rows(&self) -> Result<(), ChainError> {
        let q_sums = self.transient.row_sums();
        let r_sums = self.absorbing.row_sums();
        for (index, (q_sum, r_sum)) in q_sums.iter().zip(&r_sums).enumerate() {
            let total = q_sum + r_sum;
            let negative = self
                .transient
                .row(index)
                .into_iter()
                .flatten()
                .chain(self.absorbing.row(index).into_iter().flatten())
                .any(|value| *value < 0.0);
            if negative || (total - 1.0).abs() > ROW_SUM_TOLERANCE {
                return Err(ChainError::invalid(
                    "transition_row",
                    format!("row {index} sums to {total}"),
                    "must hold non-negative probabilities summing to 1",
                ));
            }
        }
        Ok(())
    }

    /// Full `(n + 2) × (n + 2)` transition matrix in canonical form, with
    /// the absorbing states mapping to themselves.
    ///
    /// # Errors
    ///
    /// Returns `ChainError::NumericalError` if the matrix cannot be sized.
    pub fn full_matrix(&self) -> Result<DenseMatrix, ChainError> {
        let n = self.space.transient_count();
        let size = self.space.len();
        let mut full = DenseMatrix::zeros(size, size)?;
        for i in 0..n {
            for j in 0..n {
                full[(i, j)] = self.transient[(i, j)];
            }
            for k in 0..ABSORBING_STATES {
                full[(i, n + k)] = self.absorbing[(i, k)];
            }
        }
        for k in 0..ABSORBING_STATES {
            full[(n + k, n + k)] = 1.0;
        }
        Ok(full)
    }
}
