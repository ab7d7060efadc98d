use core::ops::ControlFlow;

use crate::configuration::Configuration;
use crate::error::{Error, FailureCause, Result};
use crate::objective::Evaluation;
use crate::trial::TrialRecord;

use super::{Study, evaluate_trial};

/// A configuration handed out by [`Study::ask`], waiting for
/// [`Study::tell`].
#[derive(Clone, Debug, PartialEq)]
pub struct PendingTrial {
    id: u64,
    configuration: Configuration,
}

impl PendingTrial {
    #[must_use]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[must_use]
    pub fn configuration(&self) -> &Configuration {
        &self.configuration
    }
}

impl Study {
    /// Runs `n_trials` trials one after another.
    ///
    /// Each proposal sees every earlier result. Failed trials are recorded
    /// and the run continues; the objective's
    /// [`after_trial`](crate::Objective::after_trial) hook can stop it
    /// early.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if the history holds no complete
    /// trial afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use tuner::prelude::*;
    ///
    /// let space = SearchSpace::builder().log_float("c", 0.1, 10.0).build().unwrap();
    /// let study = Study::builder()
    ///     .minimize()
    ///     .space(space)
    ///     .sampler(TpeSampler::builder().seed(3).build().unwrap())
    ///     .objective(|c: &Configuration| {
    ///         Ok::<_, Error>(c.float("c").map_or(f64::MAX, |v| v.ln().abs()))
    ///     })
    ///     .build()
    ///     .unwrap();
    ///
    /// study.run(30).unwrap();
    /// assert_eq!(study.n_trials(), 30);
    /// assert!(study.best_value().unwrap() < 1.0);
    /// ```
    pub fn run(&self, n_trials: usize) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span = tracing::info_span!("run", n_trials, direction = ?self.direction).entered();

        for _ in 0..n_trials {
            let Some((id, config)) = self.propose(1).pop() else {
                break;
            };
            let record = evaluate_trial(&self.space, self.objective.as_ref(), self.timeout, id, config);
            if self.finish(record).is_break() {
                break;
            }
        }

        self.ensure_complete()
    }

    /// Runs `n_trials` trials in batches of `batch_size`.
    ///
    /// Every batch is proposed with [`suggest_many`](crate::Sampler::suggest_many)
    /// against the same history snapshot, so members of a batch do not see
    /// each other. Results are appended once the whole batch has been
    /// evaluated, and the next batch sees them all. A `batch_size` of 0 is
    /// treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if the history holds no complete
    /// trial afterwards.
    pub fn run_batched(&self, n_trials: usize, batch_size: usize) -> Result<()> {
        #[cfg(feature = "tracing")]
        let _span =
            tracing::info_span!("run_batched", n_trials, batch_size, direction = ?self.direction).entered();

        let batch_size = batch_size.max(1);
        let mut remaining = n_trials;
        while remaining > 0 {
            let size = remaining.min(batch_size);
            remaining -= size;

            let records: Vec<TrialRecord> = self
                .propose(size)
                .into_iter()
                .map(|(id, config)| {
                    evaluate_trial(&self.space, self.objective.as_ref(), self.timeout, id, config)
                })
                .collect();
            trace_debug!(size, "batch evaluated");

            let mut stop = false;
            for record in records {
                stop |= self.finish(record).is_break();
            }
            if stop {
                break;
            }
        }

        self.ensure_complete()
    }

    /// Proposes the next configuration without evaluating it.
    ///
    /// Report the outcome with [`tell`](Self::tell). Configurations queued
    /// with [`enqueue`](Self::enqueue) are handed out first.
    #[must_use]
    pub fn ask(&self) -> PendingTrial {
        let (id, configuration) = self
            .propose(1)
            .pop()
            .unwrap_or_else(|| (self.next_trial_id(), Configuration::empty()));
        PendingTrial { id, configuration }
    }

    /// Records the outcome of a trial obtained from [`ask`](Self::ask).
    ///
    /// The configuration is validated first; an invalid one is recorded as
    /// failed regardless of `outcome`. Errors and non-finite values are
    /// recorded as [`FailureCause::Objective`].
    pub fn tell(&self, trial: PendingTrial, outcome: core::result::Result<f64, impl ToString>) {
        let PendingTrial { id, configuration } = trial;
        let record = match (self.space.validate(&configuration), outcome) {
            (Err(e), _) => TrialRecord::failed(
                id,
                configuration,
                FailureCause::InvalidConfiguration(e.to_string()),
            ),
            (Ok(()), Ok(value)) if value.is_finite() => {
                TrialRecord::complete(id, configuration, Evaluation::from_value(value))
            }
            (Ok(()), Ok(value)) => TrialRecord::failed(
                id,
                configuration,
                FailureCause::Objective(format!("non-finite value {value}")),
            ),
            (Ok(()), Err(e)) => {
                TrialRecord::failed(id, configuration, FailureCause::Objective(e.to_string()))
            }
        };
        self.record(record);
    }

    /// Records `record` and runs the objective's hook on it.
    pub(super) fn finish(&self, record: TrialRecord) -> ControlFlow<()> {
        let flow = self.objective.after_trial(&record);
        self.record(record);
        flow
    }

    pub(super) fn ensure_complete(&self) -> Result<()> {
        if self.has_complete() {
            Ok(())
        } else {
            Err(Error::NoCompletedTrials)
        }
    }
}
