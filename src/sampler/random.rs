//! Random sampler implementation.

use parking_lot::Mutex;

use crate::configuration::Configuration;
use crate::sampler::{Sampler, common};
use crate::space::SearchSpace;
use crate::trial::TrialRecord;
use crate::types::Direction;

/// A simple random sampler that draws each active hyperparameter
/// independently.
///
/// Linear-scale numeric ranges are sampled uniformly, log-scale ranges
/// uniformly in log space, and categorical choices uniformly over their
/// labels. Conditional hyperparameters are only drawn when their activation
/// rule holds for the parents already drawn.
///
/// This sampler ignores the trial history. It serves as a baseline and as
/// the startup / fallback phase of the adaptive samplers.
///
/// # Examples
///
/// ```
/// use tuner::sampler::random::RandomSampler;
///
/// // Create with default RNG
/// let sampler = RandomSampler::new();
///
/// // Create with a fixed seed for reproducibility
/// let sampler = RandomSampler::with_seed(42);
/// ```
pub struct RandomSampler {
    rng: Mutex<fastrand::Rng>,
}

impl RandomSampler {
    /// Creates a new random sampler with a default random seed.
    #[must_use]
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::new()),
        }
    }

    /// Creates a new random sampler with a fixed seed for reproducibility.
    ///
    /// Using the same seed will produce the same sequence of configurations.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(fastrand::Rng::with_seed(seed)),
        }
    }
}

impl Default for RandomSampler {
    fn default() -> Self {
        Self::new()
    }
}

impl Sampler for RandomSampler {
    fn suggest(
        &self,
        space: &SearchSpace,
        _direction: Direction,
        _history: &[TrialRecord],
    ) -> Configuration {
        let mut rng = self.rng.lock();
        common::random_configuration(&mut rng, space)
    }
}

#[cfg(test)]
#[allow(clippy::cast_possible_truncation, clippy::cast_precision_loss)]
mod tests {
    use super::*;
    use crate::space::Hyperparameter;

    fn suggest(sampler: &RandomSampler, space: &SearchSpace) -> Configuration {
        sampler.suggest(space, Direction::Minimize, &[])
    }

    #[test]
    fn test_random_sampler_float() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder().float("x", 0.0, 1.0).build().unwrap();

        for _ in 0..100 {
            let v = suggest(&sampler, &space).float("x").unwrap();
            assert!((0.0..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_random_sampler_float_log() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder().log_float("lr", 1e-5, 1.0).build().unwrap();

        for _ in 0..100 {
            let v = suggest(&sampler, &space).float("lr").unwrap();
            assert!((1e-5..=1.0).contains(&v));
        }
    }

    #[test]
    fn test_random_sampler_float_step() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder()
            .add(Hyperparameter::float("x", 0.0, 1.0).step(0.25))
            .build()
            .unwrap();

        for _ in 0..100 {
            let v = suggest(&sampler, &space).float("x").unwrap();
            assert!((0.0..=1.0).contains(&v));
            let k = (v / 0.25).round() as i64;
            assert!((v - k as f64 * 0.25).abs() < 1e-10);
        }
    }

    #[test]
    fn test_random_sampler_int_log() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder()
            .add(Hyperparameter::int("n", 1, 1000).log_scale())
            .build()
            .unwrap();

        for _ in 0..100 {
            let v = suggest(&sampler, &space).int("n").unwrap();
            assert!((1..=1000).contains(&v));
        }
    }

    #[test]
    fn test_random_sampler_int_step() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder()
            .add(Hyperparameter::int("n", 0, 10).int_step(2))
            .build()
            .unwrap();

        for _ in 0..100 {
            let v = suggest(&sampler, &space).int("n").unwrap();
            assert!((0..=10).contains(&v));
            assert!(v % 2 == 0);
        }
    }

    #[test]
    fn test_random_sampler_categorical_covers_all_labels() {
        let sampler = RandomSampler::with_seed(42);
        let space = SearchSpace::builder()
            .categorical("kernel", ["linear", "poly", "rbf"])
            .build()
            .unwrap();

        let mut seen = [false; 3];
        for _ in 0..100 {
            let config = suggest(&sampler, &space);
            seen[config.categorical_index("kernel").unwrap()] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_random_sampler_reproducibility() {
        let sampler1 = RandomSampler::with_seed(42);
        let sampler2 = RandomSampler::with_seed(42);
        let space = SearchSpace::builder()
            .float("x", 0.0, 1.0)
            .categorical("c", ["a", "b"])
            .build()
            .unwrap();

        for _ in 0..10 {
            assert_eq!(suggest(&sampler1, &space), suggest(&sampler2, &space));
        }
    }
}
