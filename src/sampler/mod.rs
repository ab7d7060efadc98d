//! Sampler trait and implementations for proposing configurations.
//!
//! | Sampler | Strategy |
//! |---------|----------|
//! | [`RandomSampler`] | Uniform / log-uniform / uniform-categorical draws |
//! | [`GpSampler`] | Gaussian process surrogate + Expected Improvement |
//! | [`TpeSampler`] | Tree-structured Parzen estimator |
//!
//! Adaptive samplers fall back to random proposals while the history is too
//! short to fit a surrogate, and whenever fitting fails numerically.

pub(crate) mod common;
pub mod gp;
pub mod random;
pub mod tpe;

pub use gp::{GpSampler, GpSamplerBuilder};
pub use random::RandomSampler;
pub use tpe::{TpeSampler, TpeSamplerBuilder};

use crate::configuration::Configuration;
use crate::space::SearchSpace;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// Trait for pluggable configuration proposal strategies.
///
/// Samplers receive the search space, the study direction, and the full
/// history of recorded trials. The trait requires `Send + Sync` so a
/// sampler can be shared with worker threads; stateful samplers keep their
/// RNG behind a lock.
///
/// Proposals must satisfy [`SearchSpace::validate`]: every active
/// hyperparameter assigned, every inactive one absent.
pub trait Sampler: Send + Sync {
    /// Proposes the next configuration to evaluate.
    fn suggest(
        &self,
        space: &SearchSpace,
        direction: Direction,
        history: &[TrialRecord],
    ) -> Configuration;

    /// Proposes `n` configurations that are conditionally independent given
    /// `history`.
    ///
    /// The default calls [`suggest`](Sampler::suggest) `n` times against the
    /// same history snapshot, so no proposal in the batch sees another.
    fn suggest_many(
        &self,
        n: usize,
        space: &SearchSpace,
        direction: Direction,
        history: &[TrialRecord],
    ) -> Vec<Configuration> {
        (0..n)
            .map(|_| self.suggest(space, direction, history))
            .collect()
    }
}

/// A completed trial reduced to what surrogates need: its configuration
/// and its value mapped into minimization space.
#[derive(Clone, Copy, Debug)]
pub(crate) struct Observation<'a> {
    pub(crate) config: &'a Configuration,
    pub(crate) loss: f64,
}

/// Collects complete trials with finite values as minimization-space
/// observations. Failed trials never inform a surrogate.
pub(crate) fn observations(history: &[TrialRecord], direction: Direction) -> Vec<Observation<'_>> {
    history
        .iter()
        .filter(|t| t.is_complete())
        .filter_map(|t| {
            let value = t.value()?;
            value.is_finite().then(|| Observation {
                config: t.configuration(),
                loss: direction.to_minimize(value),
            })
        })
        .collect()
}
