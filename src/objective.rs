//! The [`Objective`] trait defines what a study scores.
//!
//! The main implementation is [`NestedEvaluator`](crate::NestedEvaluator),
//! which scores a configuration by nested cross-validation. Plain closures
//! work too, which is handy for tests and for objectives that are not
//! pipelines at all:
//!
//! ```
//! use tuner::prelude::*;
//!
//! let space = SearchSpace::builder().float("x", -5.0, 5.0).build().unwrap();
//! let study = Study::builder()
//!     .minimize()
//!     .space(space)
//!     .sampler(RandomSampler::with_seed(7))
//!     .objective(|config: &Configuration| {
//!         let x = config.float("x").unwrap_or_default();
//!         Ok::<_, Error>((x - 1.0).powi(2))
//!     })
//!     .build()
//!     .unwrap();
//!
//! study.run(20).unwrap();
//! assert!(study.best_value().unwrap() < 25.0);
//! ```

use core::ops::ControlFlow;
use std::time::Instant;

use crate::configuration::Configuration;
use crate::error::FailureCause;
use crate::trial::TrialRecord;

/// The scored result of evaluating one configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct Evaluation {
    /// The value the study optimizes.
    pub value: f64,
    /// Scores the value was aggregated from (one per outer fold for nested
    /// evaluation).
    pub fold_scores: Vec<f64>,
    /// Held-out scores reported for provenance, never optimized.
    pub holdout_scores: Vec<f64>,
    /// Number of folds that fell back to the failure score.
    pub n_failed_folds: usize,
}

impl Evaluation {
    /// Wraps a bare value with no fold breakdown.
    #[must_use]
    pub fn from_value(value: f64) -> Self {
        Self {
            value,
            fold_scores: Vec::new(),
            holdout_scores: Vec::new(),
            n_failed_folds: 0,
        }
    }
}

/// Scores configurations for a [`Study`](crate::Study).
///
/// The only required method is [`evaluate`](Objective::evaluate). The
/// optional [`after_trial`](Objective::after_trial) hook can stop a run
/// early.
///
/// Objectives must be `Send + Sync` so batches can be evaluated on worker
/// threads.
pub trait Objective: Send + Sync {
    /// Scores `config`.
    ///
    /// `deadline`, when set, is the instant by which the evaluation should
    /// give up; implementations that can stop between units of work return
    /// [`FailureCause::Timeout`] once it has passed.
    ///
    /// # Errors
    ///
    /// Returns the reason the trial should be recorded as failed.
    fn evaluate(
        &self,
        config: &Configuration,
        deadline: Option<Instant>,
    ) -> Result<Evaluation, FailureCause>;

    /// Called after each trial is recorded.
    ///
    /// Return `ControlFlow::Break(())` to stop the run.
    ///
    /// Default: always continues.
    fn after_trial(&self, _record: &TrialRecord) -> ControlFlow<()> {
        ControlFlow::Continue(())
    }
}

impl<F, E> Objective for F
where
    F: Fn(&Configuration) -> Result<f64, E> + Send + Sync,
    E: ToString,
{
    fn evaluate(
        &self,
        config: &Configuration,
        _deadline: Option<Instant>,
    ) -> Result<Evaluation, FailureCause> {
        match self(config) {
            Ok(value) if value.is_finite() => Ok(Evaluation::from_value(value)),
            Ok(value) => Err(FailureCause::Objective(format!(
                "non-finite objective value {value}"
            ))),
            Err(e) => Err(FailureCause::Objective(e.to_string())),
        }
    }
}
