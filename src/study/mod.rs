//! The study: the proposal → evaluation → record loop and its history.

use core::sync::atomic::{AtomicU64, Ordering};
use core::time::Duration;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};

use crate::configuration::Configuration;
use crate::error::FailureCause;
use crate::objective::Objective;
use crate::sampler::Sampler;
use crate::space::SearchSpace;
use crate::trial::TrialRecord;
use crate::types::Direction;

mod analysis;
mod builder;
mod export;
mod optimize;
mod persistence;

#[cfg(feature = "async")]
mod async_impl;

pub use builder::StudyBuilder;
pub use optimize::PendingTrial;
#[cfg(feature = "serde")]
pub use persistence::StudySnapshot;

/// A study drives the optimization of one objective over one search space.
///
/// It owns the ordered history of [`TrialRecord`]s; [`record`](Self::record)
/// is the only way that history changes. The direction is fixed when the
/// study is built.
///
/// # Examples
///
/// ```
/// use tuner::prelude::*;
///
/// let space = SearchSpace::builder().int("n", 0, 10).build().unwrap();
/// let study = Study::builder()
///     .maximize()
///     .space(space)
///     .objective(|c: &Configuration| Ok::<_, Error>(c.int("n").map_or(0.0, |n| n as f64)))
///     .build()
///     .unwrap();
/// assert_eq!(study.direction(), Direction::Maximize);
/// assert_eq!(study.n_trials(), 0);
/// ```
pub struct Study {
    pub(crate) direction: Direction,
    pub(crate) space: Arc<SearchSpace>,
    pub(crate) sampler: Arc<dyn Sampler>,
    pub(crate) objective: Arc<dyn Objective>,
    /// Per-trial wall-clock budget.
    pub(crate) timeout: Option<Duration>,
    pub(crate) history: RwLock<Vec<TrialRecord>>,
    pub(crate) next_id: AtomicU64,
    /// Configurations to evaluate before asking the sampler again.
    pub(crate) enqueued: Mutex<VecDeque<Configuration>>,
}

impl Study {
    /// Returns a [`StudyBuilder`].
    #[must_use]
    pub fn builder() -> StudyBuilder {
        StudyBuilder::new()
    }

    #[must_use]
    pub fn direction(&self) -> Direction {
        self.direction
    }

    #[must_use]
    pub fn space(&self) -> &SearchSpace {
        &self.space
    }

    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        self.timeout
    }

    /// Replaces the sampler. The history is kept, so an adaptive sampler
    /// picks up where the previous one stopped.
    pub fn set_sampler(&mut self, sampler: impl Sampler + 'static) {
        self.sampler = Arc::new(sampler);
    }

    /// Queues `config` to be evaluated before the sampler is consulted
    /// again. Queued configurations are validated like any other.
    pub fn enqueue(&self, config: Configuration) {
        self.enqueued.lock().push_back(config);
    }

    /// Number of queued configurations not yet evaluated.
    #[must_use]
    pub fn n_enqueued(&self) -> usize {
        self.enqueued.lock().len()
    }

    /// Appends a finished trial to the history.
    ///
    /// This is the only mutation path of the history.
    pub fn record(&self, record: TrialRecord) {
        let mut history = self.history.write();

        #[cfg(feature = "tracing")]
        {
            let trial_id = record.id();
            match record.value() {
                Some(value) => {
                    let is_best = history
                        .iter()
                        .filter_map(TrialRecord::value)
                        .all(|v| self.direction.is_improvement(value, v));
                    tracing::info!(trial_id, value, "trial completed");
                    if is_best {
                        tracing::info!(trial_id, value, "new best value found");
                    }
                }
                None => {
                    let cause = record.failure().map(ToString::to_string);
                    tracing::debug!(trial_id, cause = ?cause, "trial failed");
                }
            }
        }

        history.push(record);
    }

    /// Reserves the next trial id.
    pub(crate) fn next_trial_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::SeqCst)
    }

    /// Draws `n` proposals against one history snapshot, queued
    /// configurations first.
    pub(crate) fn propose(&self, n: usize) -> Vec<(u64, Configuration)> {
        let mut configs: Vec<Configuration> = {
            let mut queue = self.enqueued.lock();
            let take = n.min(queue.len());
            queue.drain(..take).collect()
        };
        if configs.len() < n {
            let history = self.history.read();
            configs.extend(self.sampler.suggest_many(
                n - configs.len(),
                &self.space,
                self.direction,
                &history,
            ));
        }
        configs
            .into_iter()
            .map(|config| (self.next_trial_id(), config))
            .collect()
    }

    pub(crate) fn has_complete(&self) -> bool {
        self.history.read().iter().any(TrialRecord::is_complete)
    }
}

/// Validates and evaluates one configuration, producing its record.
///
/// Invalid configurations fail without reaching the objective. A trial that
/// overruns `timeout` fails with [`FailureCause::Timeout`] even when the
/// objective returned a value.
pub(crate) fn evaluate_trial(
    space: &SearchSpace,
    objective: &dyn Objective,
    timeout: Option<Duration>,
    id: u64,
    config: Configuration,
) -> TrialRecord {
    if let Err(e) = space.validate(&config) {
        return TrialRecord::failed(id, config, FailureCause::InvalidConfiguration(e.to_string()));
    }

    let start = Instant::now();
    let deadline = timeout.and_then(|t| start.checked_add(t));
    let outcome = objective.evaluate(&config, deadline);
    let elapsed = start.elapsed();

    let record = match outcome {
        Ok(_) if timeout.is_some_and(|t| elapsed > t) => {
            TrialRecord::failed(id, config, FailureCause::Timeout)
        }
        Ok(evaluation) if evaluation.value.is_finite() => {
            TrialRecord::complete(id, config, evaluation)
        }
        Ok(evaluation) => TrialRecord::failed(
            id,
            config,
            FailureCause::Objective(format!("non-finite value {}", evaluation.value)),
        ),
        Err(cause) => TrialRecord::failed(id, config, cause),
    };
    record.with_duration(elapsed)
}
