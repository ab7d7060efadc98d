//! Nested cross-validated scoring of pipeline configurations.
//!
//! [`NestedEvaluator`] is the [`Objective`] used for tuning preprocessing +
//! model pipelines. The outer partition of the dataset is computed once,
//! when the evaluator is built, and every configuration is scored on those
//! same folds. For each outer fold:
//!
//! 1. the outer-train rows are split again by the inner resampler;
//! 2. a fresh pipeline is fit on each inner-train set and scored on the
//!    matching inner-validation set, and the inner scores are averaged;
//! 3. a fresh pipeline is fit on the whole outer-train set and scored on the
//!    outer held-out rows. That score is kept for reporting only.
//!
//! The trial value is the mean of the per-outer-fold inner means, so the
//! outer held-out rows never influence which configuration wins.
//!
//! ```
//! use tuner::pipeline::{Pipeline, Ridge, Task};
//! use tuner::prelude::*;
//!
//! let rows: Vec<Vec<f64>> = (0..40).map(|i| vec![f64::from(i), f64::from(i % 3)]).collect();
//! let labels: Vec<f64> = (0..40).map(|i| f64::from(2 * i + 1)).collect();
//! let data = Dataset::from_rows(&rows, labels).unwrap();
//!
//! let factory = |config: &Configuration| -> tuner::Result<Pipeline> {
//!     let alpha = config.float("alpha").unwrap_or(1.0);
//!     Ok(Pipeline::new("ridge", Ridge::regressor(alpha)))
//! };
//!
//! let evaluator = NestedEvaluator::builder()
//!     .dataset(data)
//!     .factory(factory)
//!     .task(Task::Regression)
//!     .outer(Resampler::k_fold(4, 1))
//!     .inner(Resampler::k_fold(3, 2))
//!     .build()
//!     .unwrap();
//! assert_eq!(evaluator.outer_folds().len(), 4);
//! ```

mod generalization;

pub use generalization::{GeneralizationReport, OuterFoldReport};

use core::fmt;
use std::sync::Arc;
use std::time::Instant;

use crate::configuration::Configuration;
use crate::dataset::Dataset;
use crate::error::{Error, FailureCause, Result};
use crate::objective::{Evaluation, Objective};
use crate::pipeline::{PipelineFactory, Task};
use crate::resample::{Fold, Resampler};

/// Where an outer fold is in its evaluation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum FoldPhase {
    /// Nothing has been fit yet.
    Init,
    /// Scoring on the inner folds of the outer-train rows.
    InnerTuning,
    /// Refitting on outer-train and scoring the held-out rows.
    OuterScoring,
    /// Finished.
    Done,
}

impl fmt::Display for FoldPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Init => "init",
            Self::InnerTuning => "inner_tuning",
            Self::OuterScoring => "outer_scoring",
            Self::Done => "done",
        };
        f.write_str(name)
    }
}

/// Fits and scores pipelines on row subsets of a shared dataset.
#[derive(Clone)]
pub(crate) struct FoldScorer {
    data: Arc<Dataset>,
    factory: Arc<dyn PipelineFactory>,
    failure_score: f64,
}

/// Scores of one pass over a set of folds.
pub(crate) struct CrossValidation {
    pub(crate) scores: Vec<f64>,
    pub(crate) n_failed: usize,
    pub(crate) last_error: Option<String>,
}

impl CrossValidation {
    pub(crate) fn all_failed(&self) -> bool {
        self.n_failed == self.scores.len()
    }

    pub(crate) fn mean(&self) -> f64 {
        mean(&self.scores)
    }
}

impl FoldScorer {
    /// Builds a pipeline for `config`, fits it on `fold.train` and scores it
    /// on `fold.validation`.
    pub(crate) fn score(&self, config: &Configuration, fold: &Fold) -> Result<f64> {
        let mut pipeline = self.factory.build(config)?;
        let (x_train, y_train) = self.data.select(&fold.train);
        pipeline.fit(&x_train, &y_train)?;
        let (x_val, y_val) = self.data.select(&fold.validation);
        let score = pipeline.evaluate(&x_val, &y_val)?;
        if score.is_finite() {
            Ok(score)
        } else {
            Err(Error::FitFailed {
                stage: "score".into(),
                reason: format!("non-finite score {score}"),
            })
        }
    }

    /// Scores `config` on every fold in `folds`.
    ///
    /// Failed folds contribute the failure score. The deadline is checked
    /// before each fit.
    pub(crate) fn cross_validate(
        &self,
        config: &Configuration,
        folds: &[Fold],
        deadline: Option<Instant>,
    ) -> core::result::Result<CrossValidation, FailureCause> {
        let mut cv = CrossValidation {
            scores: Vec::with_capacity(folds.len()),
            n_failed: 0,
            last_error: None,
        };
        for fold in folds {
            check_deadline(deadline)?;
            match self.score(config, fold) {
                Ok(score) => cv.scores.push(score),
                Err(e) => {
                    let reason = e.to_string();
                    trace_debug!(fold = fold.index, %reason, "fold failed");
                    cv.scores.push(self.failure_score);
                    cv.n_failed += 1;
                    cv.last_error = Some(reason);
                }
            }
        }
        Ok(cv)
    }
}

fn check_deadline(deadline: Option<Instant>) -> core::result::Result<(), FailureCause> {
    match deadline {
        Some(d) if Instant::now() >= d => Err(FailureCause::Timeout),
        _ => Ok(()),
    }
}

#[allow(clippy::cast_precision_loss)]
pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    // Divide first so failure scores near `f64::MIN` cannot overflow.
    let n = values.len() as f64;
    values.iter().map(|v| v / n).sum::<f64>().max(f64::MIN)
}

/// Population standard deviation, scaled by the largest deviation so
/// failure scores near `f64::MIN` stay finite.
#[allow(clippy::cast_precision_loss)]
pub(crate) fn population_std(values: &[f64]) -> f64 {
    let centre = mean(values);
    let scale = values
        .iter()
        .map(|v| (v - centre).abs())
        .fold(0.0_f64, f64::max);
    if scale <= 0.0 {
        return 0.0;
    }
    if !scale.is_finite() {
        return f64::NAN;
    }
    let n = values.len() as f64;
    let spread = values
        .iter()
        .map(|v| ((v - centre) / scale).powi(2) / n)
        .sum::<f64>();
    scale * spread.sqrt()
}

/// Scores configurations by nested resampling over a fixed dataset.
///
/// Build one with [`NestedEvaluator::builder`]. The evaluator is immutable
/// once built and can be shared between worker threads.
#[derive(Clone)]
pub struct NestedEvaluator {
    scorer: FoldScorer,
    outer_folds: Vec<Fold>,
    /// Inner folds per outer fold, already mapped to dataset rows.
    inner_folds: Vec<Vec<Fold>>,
    inner: Resampler,
}

impl NestedEvaluator {
    #[must_use]
    pub fn builder() -> NestedEvaluatorBuilder {
        NestedEvaluatorBuilder::new()
    }

    /// The outer partition every configuration is scored on.
    #[must_use]
    pub fn outer_folds(&self) -> &[Fold] {
        &self.outer_folds
    }

    /// The inner folds of outer fold `index`, as dataset rows.
    #[must_use]
    pub fn inner_folds(&self, index: usize) -> Option<&[Fold]> {
        self.inner_folds.get(index).map(Vec::as_slice)
    }

    /// The score assigned to a fold that could not be evaluated.
    #[must_use]
    pub fn failure_score(&self) -> f64 {
        self.scorer.failure_score
    }

    #[must_use]
    pub fn dataset(&self) -> &Dataset {
        &self.scorer.data
    }

    /// The inner resampler (with its base seed).
    #[must_use]
    pub fn inner_resampler(&self) -> Resampler {
        self.inner
    }

    pub(crate) fn scorer(&self) -> &FoldScorer {
        &self.scorer
    }
}

impl fmt::Debug for NestedEvaluator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NestedEvaluator")
            .field("n_samples", &self.scorer.data.n_samples())
            .field("n_outer_folds", &self.outer_folds.len())
            .field("inner", &self.inner)
            .field("failure_score", &self.scorer.failure_score)
            .finish_non_exhaustive()
    }
}

impl Objective for NestedEvaluator {
    fn evaluate(
        &self,
        config: &Configuration,
        deadline: Option<Instant>,
    ) -> core::result::Result<Evaluation, FailureCause> {
        #[cfg(feature = "tracing")]
        let _span = tracing::debug_span!("nested_evaluate", n_outer = self.outer_folds.len()).entered();

        let mut fold_scores = Vec::with_capacity(self.outer_folds.len());
        let mut holdout_scores = Vec::with_capacity(self.outer_folds.len());
        let mut n_failed = 0;
        let mut n_inner = 0;
        let mut last_error = None;

        for (outer, inner) in self.outer_folds.iter().zip(&self.inner_folds) {
            trace_debug!(outer_fold = outer.index, phase = %FoldPhase::InnerTuning, "outer fold");
            let cv = self.scorer.cross_validate(config, inner, deadline)?;
            n_failed += cv.n_failed;
            n_inner += cv.scores.len();
            fold_scores.push(cv.mean());
            if cv.last_error.is_some() {
                last_error = cv.last_error;
            }

            trace_debug!(outer_fold = outer.index, phase = %FoldPhase::OuterScoring, "outer fold");
            check_deadline(deadline)?;
            holdout_scores.push(
                self.scorer
                    .score(config, outer)
                    .unwrap_or(self.scorer.failure_score),
            );
        }

        if n_inner > 0 && n_failed == n_inner {
            return Err(FailureCause::AllFoldsFailed {
                n_folds: n_failed,
                reason: last_error.unwrap_or_else(|| "every fold failed".into()),
            });
        }

        Ok(Evaluation {
            value: mean(&fold_scores),
            fold_scores,
            holdout_scores,
            n_failed_folds: n_failed,
        })
    }
}

/// Builder for [`NestedEvaluator`].
///
/// Defaults: 5 outer folds, 3 inner folds, seed 0, classification task
/// (failure score 0.0).
pub struct NestedEvaluatorBuilder {
    data: Option<Arc<Dataset>>,
    factory: Option<Arc<dyn PipelineFactory>>,
    outer: Option<Resampler>,
    inner: Option<Resampler>,
    outer_folds: Option<Vec<Fold>>,
    seed: u64,
    task: Task,
    failure_score: Option<f64>,
}

impl NestedEvaluatorBuilder {
    fn new() -> Self {
        Self {
            data: None,
            factory: None,
            outer: None,
            inner: None,
            outer_folds: None,
            seed: 0,
            task: Task::Classification,
            failure_score: None,
        }
    }

    #[must_use]
    pub fn dataset(mut self, data: impl Into<Arc<Dataset>>) -> Self {
        self.data = Some(data.into());
        self
    }

    #[must_use]
    pub fn factory(mut self, factory: impl PipelineFactory + 'static) -> Self {
        self.factory = Some(Arc::new(factory));
        self
    }

    /// Sets the outer resampler. Ignored when explicit
    /// [`outer_folds`](Self::outer_folds) are given.
    #[must_use]
    pub fn outer(mut self, resampler: Resampler) -> Self {
        self.outer = Some(resampler);
        self
    }

    #[must_use]
    pub fn inner(mut self, resampler: Resampler) -> Self {
        self.inner = Some(resampler);
        self
    }

    /// Uses a precomputed outer partition instead of splitting the dataset.
    #[must_use]
    pub fn outer_folds(mut self, folds: Vec<Fold>) -> Self {
        self.outer_folds = Some(folds);
        self
    }

    /// Seed for the default resamplers.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// The metric family, which sets the default failure score.
    #[must_use]
    pub fn task(mut self, task: Task) -> Self {
        self.task = task;
        self
    }

    /// Overrides the score given to folds that fail.
    #[must_use]
    pub fn failure_score(mut self, score: f64) -> Self {
        self.failure_score = Some(score);
        self
    }

    /// Computes the outer and inner partitions and builds the evaluator.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingComponent`] without a dataset or factory,
    /// the resampler's error when the dataset (or an outer-train set) is too
    /// small for the requested folds, and [`Error::InvalidFold`] for
    /// malformed explicit outer folds.
    pub fn build(self) -> Result<NestedEvaluator> {
        let data = self.data.ok_or(Error::MissingComponent("dataset"))?;
        let factory = self.factory.ok_or(Error::MissingComponent("factory"))?;
        let n = data.n_samples();

        let outer_folds = match self.outer_folds {
            Some(folds) => {
                validate_folds(&folds, n)?;
                folds
            }
            None => self
                .outer
                .unwrap_or(Resampler::k_fold(5, self.seed))
                .split(n)?,
        };
        let inner = self.inner.unwrap_or(Resampler::k_fold(3, self.seed));

        let mut inner_folds = Vec::with_capacity(outer_folds.len());
        for (i, outer) in (0u64..).zip(&outer_folds) {
            let folds = inner
                .with_seed(inner.seed().wrapping_add(i))
                .split(outer.train.len())?;
            inner_folds.push(folds.iter().map(|f| f.remap(&outer.train)).collect());
        }

        trace_info!(
            n_samples = n,
            n_outer = outer_folds.len(),
            n_inner = inner.n_folds(),
            "nested evaluator ready"
        );

        Ok(NestedEvaluator {
            scorer: FoldScorer {
                data,
                factory,
                failure_score: self.failure_score.unwrap_or(self.task.failure_score()),
            },
            outer_folds,
            inner_folds,
            inner,
        })
    }
}

fn validate_folds(folds: &[Fold], n_samples: usize) -> Result<()> {
    if folds.is_empty() {
        return Err(Error::InvalidFoldCount(0));
    }
    for fold in folds {
        let invalid = |reason: String| Error::InvalidFold {
            index: fold.index,
            reason,
        };
        if fold.train.is_empty() || fold.validation.is_empty() {
            return Err(invalid("train and validation must be non-empty".into()));
        }
        let mut seen = vec![false; n_samples];
        for &row in fold.train.iter().chain(&fold.validation) {
            match seen.get_mut(row) {
                None => {
                    return Err(invalid(format!(
                        "row {row} out of range for {n_samples} samples"
                    )));
                }
                Some(true) => return Err(invalid(format!("row {row} appears twice"))),
                Some(slot) => *slot = true,
            }
        }
    }
    Ok(())
}
