use core::sync::atomic::AtomicU64;
use core::time::Duration;
use std::collections::VecDeque;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};

use crate::error::{Error, Result};
use crate::objective::Objective;
use crate::sampler::Sampler;
use crate::sampler::random::RandomSampler;
use crate::space::SearchSpace;
use crate::trial::TrialRecord;
use crate::types::Direction;

use super::Study;

/// Fluent constructor for [`Study`].
///
/// A search space and an objective are required. The direction defaults to
/// [`Direction::Minimize`] and the sampler to [`RandomSampler`].
pub struct StudyBuilder {
    direction: Direction,
    space: Option<SearchSpace>,
    sampler: Option<Box<dyn Sampler>>,
    objective: Option<Arc<dyn Objective>>,
    timeout: Option<Duration>,
    history: Vec<TrialRecord>,
    next_trial_id: u64,
}

impl StudyBuilder {
    pub(super) fn new() -> Self {
        Self {
            direction: Direction::Minimize,
            space: None,
            sampler: None,
            objective: None,
            timeout: None,
            history: Vec::new(),
            next_trial_id: 0,
        }
    }

    #[must_use]
    pub fn minimize(mut self) -> Self {
        self.direction = Direction::Minimize;
        self
    }

    #[must_use]
    pub fn maximize(mut self) -> Self {
        self.direction = Direction::Maximize;
        self
    }

    #[must_use]
    pub fn direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    #[must_use]
    pub fn space(mut self, space: SearchSpace) -> Self {
        self.space = Some(space);
        self
    }

    #[must_use]
    pub fn sampler(mut self, sampler: impl Sampler + 'static) -> Self {
        self.sampler = Some(Box::new(sampler));
        self
    }

    #[must_use]
    pub fn objective(mut self, objective: impl Objective + 'static) -> Self {
        self.objective = Some(Arc::new(objective));
        self
    }

    /// Shares an objective that is also used elsewhere.
    #[must_use]
    pub fn shared_objective(mut self, objective: Arc<dyn Objective>) -> Self {
        self.objective = Some(objective);
        self
    }

    /// Per-trial wall-clock budget. Trials that overrun it are recorded as
    /// failed with [`FailureCause::Timeout`](crate::FailureCause::Timeout).
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Seeds the study with previously recorded trials, e.g. from a
    /// [`StudySnapshot`](super::StudySnapshot). New ids continue after the
    /// largest existing one.
    #[must_use]
    pub fn history(mut self, history: Vec<TrialRecord>) -> Self {
        self.history = history;
        self
    }

    /// Lowest id handed to the next trial. Ids reserved by a previous run
    /// but never recorded (a snapshot's `next_trial_id`) are not reused.
    /// The larger of this and the id after the history's largest wins.
    #[must_use]
    pub fn next_trial_id(mut self, id: u64) -> Self {
        self.next_trial_id = id;
        self
    }

    /// Builds the study.
    ///
    /// # Errors
    ///
    /// Returns [`Error::MissingComponent`] without a search space or an
    /// objective.
    pub fn build(self) -> Result<Study> {
        let space = self.space.ok_or(Error::MissingComponent("space"))?;
        let objective = self.objective.ok_or(Error::MissingComponent("objective"))?;
        let sampler: Arc<dyn Sampler> = match self.sampler {
            Some(sampler) => Arc::from(sampler),
            None => Arc::new(RandomSampler::new()),
        };
        let next_id = self
            .history
            .iter()
            .map(|t| t.id() + 1)
            .max()
            .unwrap_or(0)
            .max(self.next_trial_id);

        Ok(Study {
            direction: self.direction,
            space: Arc::new(space),
            sampler,
            objective,
            timeout: self.timeout,
            history: RwLock::new(self.history),
            next_id: AtomicU64::new(next_id),
            enqueued: Mutex::new(VecDeque::new()),
        })
    }
}
