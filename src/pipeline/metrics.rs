//! Scores used to compare predictions with labels.

use nalgebra::DVector;

/// What kind of labels an estimator predicts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Task {
    /// Discrete class labels, scored by accuracy.
    Classification,
    /// Real-valued targets, scored by R².
    Regression,
}

impl Task {
    /// Scores `y_pred` against `y_true`: accuracy for classification, R²
    /// for regression. Higher is better for both.
    #[must_use]
    pub fn score(self, y_true: &DVector<f64>, y_pred: &DVector<f64>) -> f64 {
        match self {
            Self::Classification => accuracy(y_true, y_pred),
            Self::Regression => r2_score(y_true, y_pred),
        }
    }

    /// The worst possible score for this task's metric, used in place of a
    /// fold that could not be scored: 0.0 for accuracy, and the lowest
    /// finite `f64` for R², which has no lower bound.
    #[must_use]
    pub fn failure_score(self) -> f64 {
        match self {
            Self::Classification => 0.0,
            Self::Regression => f64::MIN,
        }
    }
}

/// Fraction of positions where the labels match exactly.
///
/// Returns `NaN` for empty or mismatched inputs.
#[must_use]
#[allow(clippy::cast_precision_loss, clippy::float_cmp)]
pub fn accuracy(y_true: &DVector<f64>, y_pred: &DVector<f64>) -> f64 {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return f64::NAN;
    }
    let correct = y_true
        .iter()
        .zip(y_pred.iter())
        .filter(|(t, p)| t == p)
        .count();
    correct as f64 / y_true.len() as f64
}

/// Coefficient of determination, `1 - SS_res / SS_tot`.
///
/// A constant target scores 1.0 when predicted exactly and 0.0 otherwise.
/// Returns `NaN` for empty or mismatched inputs.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn r2_score(y_true: &DVector<f64>, y_pred: &DVector<f64>) -> f64 {
    if y_true.is_empty() || y_true.len() != y_pred.len() {
        return f64::NAN;
    }
    let mean = y_true.mean();
    let ss_res: f64 = y_true
        .iter()
        .zip(y_pred.iter())
        .map(|(t, p)| (t - p).powi(2))
        .sum();
    let ss_tot: f64 = y_true.iter().map(|t| (t - mean).powi(2)).sum();
    if ss_tot < f64::EPSILON {
        return if ss_res < f64::EPSILON { 1.0 } else { 0.0 };
    }
    1.0 - ss_res / ss_tot
}
