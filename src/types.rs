//! Core types for the tuner library.

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// The direction of optimization.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Direction {
    /// Minimize the objective value (e.g. an error metric).
    Minimize,
    /// Maximize the objective value (e.g. accuracy or R²).
    Maximize,
}

impl Direction {
    /// Returns `true` if `candidate` is strictly better than `incumbent`.
    ///
    /// Ties are never an improvement, so the earliest of several equal
    /// values stays the incumbent.
    #[must_use]
    pub fn is_improvement(self, candidate: f64, incumbent: f64) -> bool {
        match self {
            Self::Minimize => candidate < incumbent,
            Self::Maximize => candidate > incumbent,
        }
    }

    /// Maps a value into minimization space (negates for `Maximize`).
    ///
    /// Samplers model every study as a minimization problem.
    #[must_use]
    pub fn to_minimize(self, value: f64) -> f64 {
        match self {
            Self::Minimize => value,
            Self::Maximize => -value,
        }
    }
}

/// The state of a recorded trial.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum TrialState {
    /// The trial produced a value.
    Complete,
    /// The trial failed; see its [`FailureCause`](crate::FailureCause).
    Failed,
}
