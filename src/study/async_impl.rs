use std::sync::Arc;

use tokio::task::JoinSet;

use crate::error::{Error, Result};
use crate::trial::TrialRecord;

use super::{Study, evaluate_trial};

impl Study {
    /// Runs `n_trials` trials, evaluating each batch of `batch_size`
    /// proposals concurrently.
    ///
    /// Every evaluation runs on tokio's blocking pool via a
    /// [`JoinSet`]. Records are appended in completion order as they
    /// arrive; the next batch is proposed only once the whole batch has
    /// finished, so it sees every result. If the objective's
    /// [`after_trial`](crate::Objective::after_trial) hook returns `Break`,
    /// the in-flight batch drains and no further batch starts. A
    /// `batch_size` of 0 is treated as 1.
    ///
    /// # Errors
    ///
    /// Returns [`Error::TaskError`] if an evaluation task panics, and
    /// [`Error::NoCompletedTrials`] if the history holds no complete trial
    /// afterwards.
    ///
    /// # Examples
    ///
    /// ```
    /// use tuner::prelude::*;
    ///
    /// # #[cfg(feature = "async")]
    /// # async fn example() -> tuner::Result<()> {
    /// let space = SearchSpace::builder().float("x", -1.0, 1.0).build()?;
    /// let study = Study::builder()
    ///     .space(space)
    ///     .objective(|c: &Configuration| Ok::<_, Error>(c.float("x").unwrap_or_default().abs()))
    ///     .build()?;
    ///
    /// study.run_parallel(12, 4).await?;
    /// assert_eq!(study.n_trials(), 12);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn run_parallel(&self, n_trials: usize, batch_size: usize) -> Result<()> {
        trace_info!(n_trials, batch_size, direction = ?self.direction, "parallel run started");

        let batch_size = batch_size.max(1);
        let mut remaining = n_trials;
        let mut stop = false;

        while remaining > 0 && !stop {
            let size = remaining.min(batch_size);
            remaining -= size;

            let mut join_set: JoinSet<TrialRecord> = JoinSet::new();
            for (id, config) in self.propose(size) {
                let space = Arc::clone(&self.space);
                let objective = Arc::clone(&self.objective);
                let timeout = self.timeout;
                join_set.spawn_blocking(move || {
                    evaluate_trial(&space, objective.as_ref(), timeout, id, config)
                });
            }

            while let Some(joined) = join_set.join_next().await {
                let record = joined.map_err(|e| Error::TaskError(e.to_string()))?;
                stop |= self.finish(record).is_break();
            }
            trace_debug!(size, "parallel batch drained");
        }

        self.ensure_complete()
    }
}
