//! Typed failures surfaced by the analytic solver and the trial simulator.

use std::fmt::Display;
use thiserror::Error;

/// Errors reported to callers; nothing is retried internally.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChainError {
    #[error("{field} {reason} (got {value})")]
    InvalidParameter {
        field: &'static str,
        value: String,
        reason: &'static str,
    },
    #[error("numerical failure: {context}")]
    NumericalError { context: String },
    #[error("simulation worker {worker} panicked")]
    WorkerPanicked { worker: usize },
    #[error("simulation worker {worker} could not be spawned: {reason}")]
    WorkerSpawn { worker: usize, reason: String },
    #[error("invalid run configuration: {0}")]
    Config(String),
}

impl ChainError {
    pub(crate) fn invalid(field: &'static str, value: impl Display, reason: &'static str) -> Self {
        Self::InvalidParameter {
            field,
            value: value.to_string(),
            reason,
        }
    }

    pub(crate) fn numerical(context: impl Into<String>) -> Self {
        Self::NumericalError {
            context: context.into(),
        }
    }

    /// Whether the error stems from caller-supplied parameters.
    #[must_use]
    pub const fn is_invalid_parameter(&self) -> bool {
        matches!(self, Self::InvalidParameter { .. })
    }

    /// Whether the error stems from an unstable or non-finite computation.
    #[must_use]
    pub const fn is_numerical(&self) -> bool {
        matches!(self, Self::NumericalError { .. })
    }
}
