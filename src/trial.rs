//! Immutable records of evaluated trials.

use core::time::Duration;

use crate::configuration::Configuration;
use crate::error::FailureCause;
use crate::objective::Evaluation;
use crate::types::TrialState;

/// The outcome of one trial: a configuration, its score, and provenance.
///
/// Records are created once the evaluation has finished and are never
/// changed afterwards; all fields are read through accessors. The study's
/// history is an ordered sequence of these records.
///
/// # Examples
///
/// ```
/// use tuner::{Configuration, Evaluation, TrialRecord, TrialState};
///
/// let record = TrialRecord::complete(0, Configuration::empty(), Evaluation::from_value(0.9));
/// assert_eq!(record.state(), TrialState::Complete);
/// assert_eq!(record.value(), Some(0.9));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TrialRecord {
    id: u64,
    configuration: Configuration,
    outer_fold_id: Option<usize>,
    value: Option<f64>,
    state: TrialState,
    failure: Option<FailureCause>,
    fold_scores: Vec<f64>,
    holdout_scores: Vec<f64>,
    n_failed_folds: usize,
    duration: Duration,
}

impl TrialRecord {
    /// Creates a record for a successful evaluation.
    #[must_use]
    pub fn complete(id: u64, configuration: Configuration, evaluation: Evaluation) -> Self {
        Self {
            id,
            configuration,
            outer_fold_id: None,
            value: Some(evaluation.value),
            state: TrialState::Complete,
            failure: None,
            fold_scores: evaluation.fold_scores,
            holdout_scores: evaluation.holdout_scores,
            n_failed_folds: evaluation.n_failed_folds,
            duration: Duration::ZERO,
        }
    }

    /// Creates a record for a failed evaluation.
    ///
    /// An [`AllFoldsFailed`](FailureCause::AllFoldsFailed) cause carries its
    /// fold count into [`n_failed_folds`](Self::n_failed_folds).
    #[must_use]
    pub fn failed(id: u64, configuration: Configuration, cause: FailureCause) -> Self {
        let n_failed_folds = cause.n_failed_folds();
        Self {
            id,
            configuration,
            outer_fold_id: None,
            value: None,
            state: TrialState::Failed,
            failure: Some(cause),
            fold_scores: Vec::new(),
            holdout_scores: Vec::new(),
            n_failed_folds,
            duration: Duration::ZERO,
        }
    }

    /// Tags the record with the outer fold it was tuned on.
    #[must_use]
    pub fn with_outer_fold(mut self, outer_fold_id: usize) -> Self {
        self.outer_fold_id = Some(outer_fold_id);
        self
    }

    /// Attaches the wall-clock time the evaluation took.
    #[must_use]
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    /// Returns the trial id (assigned in proposal order).
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Returns the evaluated configuration.
    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }

    /// Returns the outer fold this trial belongs to, when it was produced
    /// while estimating generalization of the tuning procedure.
    #[must_use]
    pub fn outer_fold_id(&self) -> Option<usize> {
        self.outer_fold_id
    }

    /// Returns the objective value, or `None` for failed trials.
    #[must_use]
    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Returns the trial state.
    #[must_use]
    pub fn state(&self) -> TrialState {
        self.state
    }

    /// Returns `true` if the trial completed.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.state == TrialState::Complete
    }

    /// Returns why the trial failed.
    #[must_use]
    pub fn failure(&self) -> Option<&FailureCause> {
        self.failure.as_ref()
    }

    /// Returns the per-outer-fold inner-mean scores the value was averaged from.
    #[must_use]
    pub fn fold_scores(&self) -> &[f64] {
        &self.fold_scores
    }

    /// Returns the per-outer-fold held-out scores (provenance only).
    #[must_use]
    pub fn holdout_scores(&self) -> &[f64] {
        &self.holdout_scores
    }

    /// Returns how many inner folds fell back to the failure score.
    #[must_use]
    pub fn n_failed_folds(&self) -> usize {
        self.n_failed_folds
    }

    /// Returns the evaluation wall-clock time.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.duration
    }
}
