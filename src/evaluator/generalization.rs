//! Unbiased estimate of how well the whole tuning procedure generalizes.

use std::time::Instant;

use super::{FoldPhase, FoldScorer, NestedEvaluator, mean, population_std};
use crate::configuration::Configuration;
use crate::error::{Error, FailureCause, Result};
use crate::objective::{Evaluation, Objective};
use crate::resample::Fold;
use crate::sampler::Sampler;
use crate::space::SearchSpace;
use crate::study::Study;
use crate::trial::TrialRecord;

/// Plain K-fold scoring over a fixed set of folds.
struct FoldObjective {
    scorer: FoldScorer,
    folds: Vec<Fold>,
}

impl Objective for FoldObjective {
    fn evaluate(
        &self,
        config: &Configuration,
        deadline: Option<Instant>,
    ) -> core::result::Result<Evaluation, FailureCause> {
        let cv = self.scorer.cross_validate(config, &self.folds, deadline)?;
        if cv.all_failed() {
            return Err(FailureCause::AllFoldsFailed {
                n_folds: cv.n_failed,
                reason: cv.last_error.unwrap_or_default(),
            });
        }
        Ok(Evaluation {
            value: cv.mean(),
            n_failed_folds: cv.n_failed,
            fold_scores: cv.scores,
            holdout_scores: Vec::new(),
        })
    }
}

/// The result of tuning on one outer fold and scoring its held-out rows.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct OuterFoldReport {
    pub outer_fold_id: usize,
    /// How far the fold got: [`FoldPhase::Done`] unless tuning produced no
    /// complete trial ([`FoldPhase::InnerTuning`]) or the refit failed
    /// ([`FoldPhase::OuterScoring`]).
    pub phase: FoldPhase,
    /// The configuration the inner study picked.
    pub best_configuration: Option<Configuration>,
    /// Its inner cross-validated score.
    pub inner_value: Option<f64>,
    /// Its score on the outer held-out rows (the failure score when the fold
    /// did not reach [`FoldPhase::Done`]).
    pub outer_score: f64,
}

/// Per-fold outcomes of [`NestedEvaluator::estimate_generalization`].
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct GeneralizationReport {
    pub folds: Vec<OuterFoldReport>,
    /// Mean outer score.
    pub mean: f64,
    /// Population standard deviation of the outer scores.
    pub std: f64,
    /// Every inner trial, tagged with its outer fold.
    pub trials: Vec<TrialRecord>,
}

impl NestedEvaluator {
    /// Runs the whole tuning procedure once per outer fold and scores the
    /// winner on rows the tuning never saw.
    ///
    /// For outer fold `i`, a fresh maximizing [`Study`] over `space` with
    /// sampler `make_sampler(i)` runs `n_trials` trials, each scored by plain
    /// cross-validation on the inner folds of outer-train. The best
    /// configuration is then refit on all of outer-train and scored on the
    /// outer held-out rows.
    ///
    /// # Errors
    ///
    /// Returns schema or study construction errors. A fold whose inner study
    /// completes no trial is reported, not an error.
    pub fn estimate_generalization<S, F>(
        &self,
        space: &SearchSpace,
        mut make_sampler: F,
        n_trials: usize,
    ) -> Result<GeneralizationReport>
    where
        S: Sampler + 'static,
        F: FnMut(usize) -> S,
    {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::info_span!("estimate_generalization", n_outer = self.outer_folds.len(), n_trials).entered();

        let scorer = self.scorer();
        let mut folds = Vec::with_capacity(self.outer_folds.len());
        let mut trials = Vec::new();

        for (i, outer) in self.outer_folds.iter().enumerate() {
            let study = Study::builder()
                .maximize()
                .space(space.clone())
                .sampler(make_sampler(i))
                .objective(FoldObjective {
                    scorer: scorer.clone(),
                    folds: self.inner_folds[i].clone(),
                })
                .build()?;
            match study.run(n_trials) {
                Ok(()) | Err(Error::NoCompletedTrials) => {}
                Err(e) => return Err(e),
            }
            trials.extend(study.trials().into_iter().map(|t| t.with_outer_fold(i)));

            let report = match study.best_trial() {
                Ok(best) => {
                    let config = best.configuration().clone();
                    let (phase, outer_score) = match scorer.score(&config, outer) {
                        Ok(score) => (FoldPhase::Done, score),
                        Err(_) => (FoldPhase::OuterScoring, scorer.failure_score),
                    };
                    OuterFoldReport {
                        outer_fold_id: i,
                        phase,
                        best_configuration: Some(config),
                        inner_value: best.value(),
                        outer_score,
                    }
                }
                Err(_) => OuterFoldReport {
                    outer_fold_id: i,
                    phase: FoldPhase::InnerTuning,
                    best_configuration: None,
                    inner_value: None,
                    outer_score: scorer.failure_score,
                },
            };
            trace_info!(
                outer_fold = i,
                phase = %report.phase,
                outer_score = report.outer_score,
                "outer fold finished"
            );
            folds.push(report);
        }

        let scores: Vec<f64> = folds.iter().map(|f| f.outer_score).collect();
        let mean = mean(&scores);
        let std = population_std(&scores);

        Ok(GeneralizationReport {
            folds,
            mean,
            std,
            trials,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::Dataset;
    use crate::pipeline::{KNeighbors, Pipeline, Task};
    use crate::resample::Resampler;
    use crate::sampler::RandomSampler;

    #[test]
    fn reports_every_outer_fold() {
        let rows: Vec<Vec<f64>> = (0..24)
            .map(|i| {
                let c = if i % 2 == 0 { -1.0 } else { 1.0 };
                vec![c + f64::from(i % 4) * 0.05]
            })
            .collect();
        let labels = (0..24).map(|i| f64::from(i % 2)).collect();
        let data = Dataset::from_rows(&rows, labels).unwrap();

        let evaluator = NestedEvaluator::builder()
            .dataset(data)
            .factory(|config: &Configuration| -> Result<Pipeline> {
                let k = usize::try_from(config.int("k").unwrap_or(1)).unwrap_or(1);
                Ok(Pipeline::new("knn", KNeighbors::new(k, Task::Classification)))
            })
            .outer(Resampler::k_fold(3, 5))
            .inner(Resampler::k_fold(2, 6))
            .build()
            .unwrap();
        let space = SearchSpace::builder().int("k", 1, 3).build().unwrap();

        let report = evaluator
            .estimate_generalization(&space, |i| RandomSampler::with_seed(i as u64), 4)
            .unwrap();

        assert_eq!(report.folds.len(), 3);
        assert_eq!(report.trials.len(), 12);
        for (i, fold) in report.folds.iter().enumerate() {
            assert_eq!(fold.outer_fold_id, i);
            assert_eq!(fold.phase, FoldPhase::Done);
            assert!(fold.best_configuration.is_some());
        }
        assert!(report.trials.iter().all(|t| t.outer_fold_id().is_some()));
        assert!((report.mean - 1.0).abs() < 1e-12);
        assert!(report.std.abs() < 1e-12);
    }
}
