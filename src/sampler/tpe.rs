//! Tree-structured Parzen Estimator (TPE) sampler.
//!
//! TPE models the objective with two densities per hyperparameter: one over
//! values from promising (good) trials and one over values from the rest.
//! Each hyperparameter is modelled only from trials in which it was active,
//! which is what lets TPE handle conditional spaces: a child such as
//! `degree` is fitted on the polynomial-kernel trials alone.

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::configuration::Configuration;
use crate::error::{Error, Result};
use crate::kde::KernelDensityEstimator;
use crate::param::ParamValue;
use crate::sampler::{Observation, Sampler, common, observations};
use crate::space::{Hyperparameter, SearchSpace};
use crate::trial::TrialRecord;
use crate::types::Direction;

/// A Tree-structured Parzen Estimator sampler for Bayesian optimization.
///
/// Completed trials are split at the `gamma` quantile of their
/// (minimization-space) values. For every active hyperparameter a density
/// l(x) is fitted on the good group and g(x) on the bad group;
/// `n_ei_candidates` draws from l(x) are scored by l(x)/g(x) and the best
/// is kept. Categorical hyperparameters use Laplace-smoothed frequencies.
///
/// While fewer than `n_startup_trials` trials have completed, or when a
/// hyperparameter has no observations in one of the groups, values are
/// drawn uniformly.
///
/// # Examples
///
/// ```
/// use tuner::TpeSampler;
///
/// let sampler = TpeSampler::builder()
///     .gamma(0.15)
///     .n_startup_trials(20)
///     .n_ei_candidates(32)
///     .seed(42)
///     .build()
///     .unwrap();
/// ```
pub struct TpeSampler {
    /// Fraction of trials to consider as "good" (gamma quantile).
    gamma: f64,
    n_startup_trials: usize,
    n_ei_candidates: usize,
    /// Fixed KDE bandwidth in internal space; Scott's rule when `None`.
    kde_bandwidth: Option<f64>,
    rng: Mutex<StdRng>,
}

impl TpeSampler {
    /// Creates a new TPE sampler with default settings.
    ///
    /// - gamma: 0.25
    /// - `n_startup_trials`: 10
    /// - `n_ei_candidates`: 24
    /// - `kde_bandwidth`: Scott's rule
    #[must_use]
    pub fn new() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            n_startup_trials: DEFAULT_N_STARTUP,
            n_ei_candidates: DEFAULT_N_EI_CANDIDATES,
            kde_bandwidth: None,
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    /// Default settings with a fixed seed.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            ..Self::new()
        }
    }

    /// Creates a builder for configuring a TPE sampler.
    #[must_use]
    pub fn builder() -> TpeSamplerBuilder {
        TpeSamplerBuilder::new()
    }

    /// Splits observations into good and bad groups at the gamma quantile.
    ///
    /// Both groups are non-empty when at least two observations exist.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    fn split<'a>(
        &self,
        mut observed: Vec<Observation<'a>>,
    ) -> (Vec<Observation<'a>>, Vec<Observation<'a>>) {
        observed.sort_by(|a, b| a.loss.total_cmp(&b.loss));
        let n = observed.len();
        let n_good = ((n as f64 * self.gamma).ceil() as usize).clamp(1, n - 1);
        let bad = observed.split_off(n_good);
        (observed, bad)
    }

    /// Proposes one value for a numeric hyperparameter.
    fn sample_numeric(
        &self,
        param: &Hyperparameter,
        good: &[ParamValue],
        bad: &[ParamValue],
        rng: &mut StdRng,
    ) -> Option<ParamValue> {
        let distribution = param.distribution();
        let bounds = common::internal_bounds(&distribution)?;
        let to_internal = |values: &[ParamValue]| -> Vec<f64> {
            values
                .iter()
                .filter_map(|v| common::to_internal(v, &distribution))
                .collect()
        };

        let l_kde = KernelDensityEstimator::fit(to_internal(good), bounds, self.kde_bandwidth).ok()?;
        let g_kde = KernelDensityEstimator::fit(to_internal(bad), bounds, self.kde_bandwidth).ok()?;

        let mut best_candidate = None;
        let mut best_ratio = f64::NEG_INFINITY;
        for _ in 0..self.n_ei_candidates {
            let candidate = l_kde.sample(rng);
            let l_density = l_kde.pdf(candidate);
            let g_density = g_kde.pdf(candidate);

            let ratio = if g_density < f64::EPSILON {
                if l_density > f64::EPSILON {
                    f64::INFINITY
                } else {
                    0.0
                }
            } else {
                l_density / g_density
            };

            if ratio > best_ratio {
                best_ratio = ratio;
                best_candidate = Some(candidate);
            }
        }

        common::from_internal(best_candidate?, &distribution)
    }

    /// Proposes one categorical index, sampling proportionally to the
    /// smoothed ratio l(c)/g(c).
    #[allow(clippy::cast_precision_loss)]
    fn sample_categorical(
        n_choices: usize,
        good: &[ParamValue],
        bad: &[ParamValue],
        rng: &mut StdRng,
    ) -> ParamValue {
        let counts = |values: &[ParamValue]| {
            let mut counts = vec![0usize; n_choices];
            for v in values {
                if let ParamValue::Categorical(i) = v
                    && *i < n_choices
                {
                    counts[*i] += 1;
                }
            }
            counts
        };
        let good_counts = counts(good);
        let bad_counts = counts(bad);

        let good_total = good.len() as f64 + n_choices as f64;
        let bad_total = bad.len() as f64 + n_choices as f64;
        let weights: Vec<f64> = (0..n_choices)
            .map(|i| {
                let l_prob = (good_counts[i] as f64 + 1.0) / good_total;
                let g_prob = (bad_counts[i] as f64 + 1.0) / bad_total;
                l_prob / g_prob
            })
            .collect();

        let total_weight: f64 = weights.iter().sum();
        let threshold = rng.random::<f64>() * total_weight;
        let mut cumulative = 0.0;
        for (i, &w) in weights.iter().enumerate() {
            cumulative += w;
            if cumulative >= threshold {
                return ParamValue::Categorical(i);
            }
        }
        ParamValue::Categorical(n_choices - 1)
    }
}

impl Default for TpeSampler {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULT_GAMMA: f64 = 0.25;
const DEFAULT_N_STARTUP: usize = 10;
const DEFAULT_N_EI_CANDIDATES: usize = 24;

/// Builder for configuring a [`TpeSampler`].
///
/// # Examples
///
/// ```
/// use tuner::TpeSamplerBuilder;
///
/// let sampler = TpeSamplerBuilder::new()
///     .gamma(0.10)
///     .kde_bandwidth(0.5)
///     .build()
///     .unwrap();
/// ```
#[derive(Debug, Clone)]
pub struct TpeSamplerBuilder {
    gamma: f64,
    n_startup_trials: usize,
    n_ei_candidates: usize,
    kde_bandwidth: Option<f64>,
    seed: Option<u64>,
}

impl TpeSamplerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            gamma: DEFAULT_GAMMA,
            n_startup_trials: DEFAULT_N_STARTUP,
            n_ei_candidates: DEFAULT_N_EI_CANDIDATES,
            kde_bandwidth: None,
            seed: None,
        }
    }

    /// Sets the gamma quantile for splitting trials into good/bad groups.
    ///
    /// Must lie in (0.0, 1.0); checked by [`build`](Self::build).
    #[must_use]
    pub fn gamma(mut self, gamma: f64) -> Self {
        self.gamma = gamma;
        self
    }

    /// Sets the number of completed trials before TPE sampling begins.
    #[must_use]
    pub fn n_startup_trials(mut self, n: usize) -> Self {
        self.n_startup_trials = n;
        self
    }

    /// Sets how many candidates are drawn from l(x) per numeric
    /// hyperparameter.
    #[must_use]
    pub fn n_ei_candidates(mut self, n: usize) -> Self {
        self.n_ei_candidates = n;
        self
    }

    /// Sets a fixed KDE bandwidth (in internal space) instead of Scott's rule.
    #[must_use]
    pub fn kde_bandwidth(mut self, bandwidth: f64) -> Self {
        self.kde_bandwidth = Some(bandwidth);
        self
    }

    /// Sets a seed for reproducible sampling.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured [`TpeSampler`].
    ///
    /// # Errors
    ///
    /// Returns `Error::InvalidGamma` if gamma is not in (0.0, 1.0), and
    /// `Error::InvalidBandwidth` if a fixed bandwidth is not positive.
    pub fn build(self) -> Result<TpeSampler> {
        if !(self.gamma > 0.0 && self.gamma < 1.0) {
            return Err(Error::InvalidGamma(self.gamma));
        }
        if let Some(bw) = self.kde_bandwidth
            && !(bw > 0.0 && bw.is_finite())
        {
            return Err(Error::InvalidBandwidth(bw));
        }

        let rng = match self.seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_os_rng(),
        };

        Ok(TpeSampler {
            gamma: self.gamma,
            n_startup_trials: self.n_startup_trials,
            n_ei_candidates: self.n_ei_candidates.max(1),
            kde_bandwidth: self.kde_bandwidth,
            rng: Mutex::new(rng),
        })
    }
}

impl Default for TpeSamplerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Values `param` took in `group`, skipping trials where it was inactive.
fn values_of(group: &[Observation<'_>], param: &Hyperparameter) -> Vec<ParamValue> {
    group
        .iter()
        .filter_map(|o| o.config.get(param.name()).cloned())
        .collect()
}

impl Sampler for TpeSampler {
    fn suggest(
        &self,
        space: &SearchSpace,
        direction: Direction,
        history: &[TrialRecord],
    ) -> Configuration {
        let mut rng = self.rng.lock();
        let mut uniform = fastrand::Rng::with_seed(rng.random());

        let observed = observations(history, direction);
        if observed.len() < self.n_startup_trials.max(2) {
            return common::random_configuration(&mut uniform, space);
        }

        let (good, bad) = self.split(observed);

        common::assign_in_order(space, |param, _| {
            let good_values = values_of(&good, param);
            let bad_values = values_of(&bad, param);
            if good_values.is_empty() || bad_values.is_empty() {
                return common::sample_random(&mut uniform, &param.distribution());
            }
            match param.choices() {
                Some(choices) => {
                    Self::sample_categorical(choices.len(), &good_values, &bad_values, &mut rng)
                }
                None => self
                    .sample_numeric(param, &good_values, &bad_values, &mut rng)
                    .unwrap_or_else(|| common::sample_random(&mut uniform, &param.distribution())),
            }
        })
    }
}
