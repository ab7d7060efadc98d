use core::cmp::Ordering;

use crate::error::{Error, Result};
use crate::trial::TrialRecord;
use crate::types::{Direction, TrialState};

use super::Study;

/// Orders complete trials best first; equal values keep the earlier id
/// first.
fn rank(direction: Direction, a: &TrialRecord, b: &TrialRecord) -> Ordering {
    let (va, vb) = (a.value().unwrap_or(f64::NAN), b.value().unwrap_or(f64::NAN));
    let by_value = match direction {
        Direction::Minimize => va.total_cmp(&vb),
        Direction::Maximize => vb.total_cmp(&va),
    };
    by_value.then(a.id().cmp(&b.id()))
}

impl Study {
    /// Returns the complete trial with the best value.
    ///
    /// Among equal values the trial with the smallest id wins.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if no trial has completed.
    ///
    /// # Examples
    ///
    /// ```
    /// use tuner::prelude::*;
    ///
    /// let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();
    /// let study = Study::builder()
    ///     .maximize()
    ///     .space(space)
    ///     .objective(|_: &Configuration| Ok::<_, Error>(0.0))
    ///     .build()
    ///     .unwrap();
    /// assert!(study.best_trial().is_err());
    ///
    /// let first = study.ask();
    /// study.tell(first, Ok::<_, Error>(0.3));
    /// let second = study.ask();
    /// study.tell(second, Ok::<_, Error>(0.8));
    /// assert_eq!(study.best_trial().unwrap().id(), 1);
    /// ```
    pub fn best_trial(&self) -> Result<TrialRecord> {
        let trials = self.history.read();
        trials
            .iter()
            .filter(|t| t.is_complete())
            .min_by(|a, b| rank(self.direction, a, b))
            .cloned()
            .ok_or(Error::NoCompletedTrials)
    }

    /// Returns the best value found so far.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NoCompletedTrials`] if no trial has completed.
    pub fn best_value(&self) -> Result<f64> {
        self.best_trial()?.value().ok_or(Error::NoCompletedTrials)
    }

    /// Returns up to `n` complete trials, best first.
    #[must_use]
    pub fn top_trials(&self, n: usize) -> Vec<TrialRecord> {
        let mut complete: Vec<TrialRecord> = self
            .history
            .read()
            .iter()
            .filter(|t| t.is_complete())
            .cloned()
            .collect();
        complete.sort_by(|a, b| rank(self.direction, a, b));
        complete.truncate(n);
        complete
    }

    /// Returns a copy of the history in recording order.
    #[must_use]
    pub fn trials(&self) -> Vec<TrialRecord> {
        self.history.read().clone()
    }

    /// Number of recorded trials, complete or failed.
    #[must_use]
    pub fn n_trials(&self) -> usize {
        self.history.read().len()
    }

    #[must_use]
    pub fn n_complete(&self) -> usize {
        self.count(TrialState::Complete)
    }

    #[must_use]
    pub fn n_failed(&self) -> usize {
        self.count(TrialState::Failed)
    }

    fn count(&self, state: TrialState) -> usize {
        self.history
            .read()
            .iter()
            .filter(|t| t.state() == state)
            .count()
    }
}
