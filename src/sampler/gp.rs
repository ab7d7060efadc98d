//! Gaussian Process (GP) sampler with Expected Improvement acquisition.
//!
//! A classical Bayesian optimization sampler that builds a Gaussian Process
//! surrogate model with a **Matérn 5/2 kernel** (with ARD lengthscales) and
//! selects the next configuration by maximizing the **Expected Improvement
//! (EI)** acquisition function.
//!
//! # Algorithm overview
//!
//! 1. **Startup phase**: while fewer than `n_startup_trials` trials have
//!    completed, configurations are sampled uniformly at random.
//! 2. **Encode**: every completed configuration is mapped to a point in
//!    `[0, 1]^d`. Numeric hyperparameters are normalized in their internal
//!    (log for log-scale) space; categorical hyperparameters are one-hot
//!    encoded. Inactive numeric dimensions are imputed at the midpoint and
//!    inactive categorical blocks are all zeros.
//! 3. **Fit GP**: observations are standardized (zero mean, unit variance)
//!    and a GP is fitted via Cholesky decomposition. ARD lengthscales are
//!    the per-dimension standard deviation of the training inputs.
//! 4. **Maximize EI**: `n_candidates` random valid configurations are
//!    scored under the GP posterior and the one with the highest Expected
//!    Improvement is returned.
//!
//! Candidates are drawn from the space itself, so proposals always respect
//! activation rules, step grids, and categorical labels. If the Cholesky
//! factorization fails, or the observed values overflow standardization
//! (as regression failure scores near `f64::MIN` do), the sampler falls
//! back to a random proposal.
//!
//! # Configuration
//!
//! | Option | Default | Description |
//! |--------|---------|-------------|
//! | `n_startup_trials` | 10 | Random trials before GP-guided sampling begins |
//! | `n_candidates` | 1000 | Random candidates for EI maximization |
//! | `noise_variance` | 1e-6 | Observation noise added to kernel diagonal |
//! | `seed` | random | RNG seed for reproducibility |
//!
//! # Examples
//!
//! ```
//! use tuner::sampler::gp::GpSampler;
//!
//! let sampler = GpSampler::builder()
//!     .n_startup_trials(5)
//!     .n_candidates(500)
//!     .seed(42)
//!     .build();
//! ```

use nalgebra::{DMatrix, DVector};
use parking_lot::Mutex;

use crate::configuration::Configuration;
use crate::param::ParamValue;
use crate::sampler::{Observation, Sampler, common, observations};
use crate::space::{Domain, SearchSpace};
use crate::trial::TrialRecord;
use crate::types::Direction;

/// Gaussian Process sampler for Bayesian optimization.
///
/// Uses a GP surrogate with Matérn 5/2 kernel and Expected Improvement
/// acquisition to guide sampling toward promising regions of the search
/// space.
///
/// # Examples
///
/// ```
/// use tuner::sampler::gp::GpSampler;
///
/// // Default configuration
/// let sampler = GpSampler::new();
///
/// // With seed for reproducibility
/// let sampler = GpSampler::with_seed(42);
///
/// // Custom configuration via builder
/// let sampler = GpSampler::builder()
///     .n_startup_trials(15)
///     .n_candidates(2000)
///     .noise_variance(1e-4)
///     .seed(42)
///     .build();
/// ```
pub struct GpSampler {
    rng: Mutex<fastrand::Rng>,
    n_startup_trials: usize,
    n_candidates: usize,
    noise_variance: f64,
}

impl GpSampler {
    /// Creates a new GP sampler with a random seed.
    #[must_use]
    pub fn new() -> Self {
        GpSamplerBuilder::new().build()
    }

    /// Creates a new GP sampler with a fixed seed for reproducibility.
    #[must_use]
    pub fn with_seed(seed: u64) -> Self {
        GpSamplerBuilder::new().seed(seed).build()
    }

    /// Creates a builder for configuring a `GpSampler`.
    #[must_use]
    pub fn builder() -> GpSamplerBuilder {
        GpSamplerBuilder::new()
    }
}

impl Default for GpSampler {
    fn default() -> Self {
        Self::new()
    }
}

/// Builder for configuring a [`GpSampler`].
///
/// All options have sensible defaults:
/// - `n_startup_trials`: 10
/// - `n_candidates`: 1000
/// - `noise_variance`: 1e-6
/// - `seed`: random
#[derive(Debug, Clone, Default)]
pub struct GpSamplerBuilder {
    n_startup_trials: Option<usize>,
    n_candidates: Option<usize>,
    noise_variance: Option<f64>,
    seed: Option<u64>,
}

impl GpSamplerBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the number of completed trials required before GP-guided
    /// sampling begins.
    ///
    /// Default: 10.
    #[must_use]
    pub fn n_startup_trials(mut self, n: usize) -> Self {
        self.n_startup_trials = Some(n);
        self
    }

    /// Sets the number of random candidate configurations scored per
    /// proposal.
    ///
    /// Default: 1000.
    #[must_use]
    pub fn n_candidates(mut self, n: usize) -> Self {
        self.n_candidates = Some(n);
        self
    }

    /// Sets the observation noise variance added to the kernel diagonal.
    ///
    /// Larger values make the GP smoother. Cross-validated scores are noisy,
    /// so values around `1e-3` are often a better fit than the default.
    ///
    /// Default: 1e-6.
    #[must_use]
    pub fn noise_variance(mut self, v: f64) -> Self {
        self.noise_variance = Some(v);
        self
    }

    /// Sets the random seed for reproducibility.
    #[must_use]
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Builds the configured [`GpSampler`].
    #[must_use]
    pub fn build(self) -> GpSampler {
        GpSampler {
            rng: Mutex::new(
                self.seed
                    .map_or_else(fastrand::Rng::new, fastrand::Rng::with_seed),
            ),
            n_startup_trials: self.n_startup_trials.unwrap_or(DEFAULT_N_STARTUP),
            n_candidates: self.n_candidates.unwrap_or(DEFAULT_N_CANDIDATES).max(1),
            noise_variance: self.noise_variance.unwrap_or(DEFAULT_NOISE_VAR),
        }
    }
}

/// Default number of random startup trials before GP kicks in.
const DEFAULT_N_STARTUP: usize = 10;
/// Default number of candidate points for EI optimization.
const DEFAULT_N_CANDIDATES: usize = 1000;
/// Default observation noise variance.
const DEFAULT_NOISE_VAR: f64 = 1e-6;

/// Maximum number of training points to use for the GP.
/// Caps computational cost at O(`MAX_TRAIN_POINTS`^3) per proposal.
const MAX_TRAIN_POINTS: usize = 100;

const SQRT_5: f64 = 2.236_067_977_499_79;

/// A fitted GP model ready for predictions.
struct GpModel {
    /// Cholesky factor L of K + σ²I.
    cholesky: nalgebra::linalg::Cholesky<f64, nalgebra::Dyn>,
    /// α = (K + σ²I)^{-1} y.
    alpha: DVector<f64>,
    /// Training inputs (each row is a data point in [0, 1]^d).
    x_train: Vec<Vec<f64>>,
    lengthscales: Vec<f64>,
    signal_var: f64,
    /// Best observed (standardized) y.
    f_best: f64,
}

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

/// Width of the encoded vector for `space`.
fn encoded_width(space: &SearchSpace) -> usize {
    space
        .hyperparameters()
        .iter()
        .map(|p| match p.domain() {
            Domain::Categorical { choices } => choices.len(),
            _ => 1,
        })
        .sum()
}

/// Maps a configuration into `[0, 1]^d`.
fn encode(space: &SearchSpace, config: &Configuration) -> Vec<f64> {
    let mut x = Vec::with_capacity(encoded_width(space));
    for param in space.hyperparameters() {
        let value = config.get(param.name());
        match param.domain() {
            Domain::Categorical { choices } => {
                let hot = match value {
                    Some(ParamValue::Categorical(i)) => Some(*i),
                    _ => None,
                };
                x.extend((0..choices.len()).map(|i| if hot == Some(i) { 1.0 } else { 0.0 }));
            }
            _ => {
                let distribution = param.distribution();
                let normalized = value
                    .and_then(|v| common::to_internal(v, &distribution))
                    .zip(common::internal_bounds(&distribution))
                    .map_or(0.5, |(v, (lo, hi))| to_normalized(v, lo, hi));
                x.push(normalized);
            }
        }
    }
    x
}

/// Convert an internal-space value to normalized [0, 1] using bounds.
fn to_normalized(value: f64, lo: f64, hi: f64) -> f64 {
    if (hi - lo).abs() < 1e-15 {
        0.5
    } else {
        ((value - lo) / (hi - lo)).clamp(0.0, 1.0)
    }
}

// ---------------------------------------------------------------------------
// Matérn 5/2 kernel
// ---------------------------------------------------------------------------

/// Matérn 5/2 kernel with ARD lengthscales.
///
/// `k(x1, x2) = σ² (1 + √5 r + 5/3 r²) exp(-√5 r)`
/// where `r = sqrt(Σ ((x1_i - x2_i) / l_i)²)`
fn matern52(x1: &[f64], x2: &[f64], lengthscales: &[f64], signal_var: f64) -> f64 {
    let r_sq: f64 = x1
        .iter()
        .zip(x2)
        .zip(lengthscales)
        .map(|((a, b), l)| ((a - b) / l).powi(2))
        .sum();
    let r = r_sq.sqrt();
    let sqrt5_r = SQRT_5 * r;
    signal_var * (1.0 + sqrt5_r + 5.0 / 3.0 * r_sq) * (-sqrt5_r).exp()
}

/// Build the kernel matrix `K + σ²I`.
fn kernel_matrix(
    x: &[Vec<f64>],
    lengthscales: &[f64],
    signal_var: f64,
    noise_var: f64,
) -> DMatrix<f64> {
    let n = x.len();
    DMatrix::from_fn(n, n, |i, j| {
        let k = matern52(&x[i], &x[j], lengthscales, signal_var);
        if i == j { k + noise_var } else { k }
    })
}

/// Compute the kernel vector k(x*, X) for a test point.
fn kernel_vector(
    x_star: &[f64],
    x_train: &[Vec<f64>],
    lengthscales: &[f64],
    signal_var: f64,
) -> DVector<f64> {
    DVector::from_fn(x_train.len(), |i, _| {
        matern52(x_star, &x_train[i], lengthscales, signal_var)
    })
}

// ---------------------------------------------------------------------------
// GP fitting and prediction
// ---------------------------------------------------------------------------

/// Fit a GP model to the training data.
///
/// Returns `None` if fitting fails (e.g. Cholesky decomposition failure).
#[allow(clippy::cast_precision_loss)]
fn fit_gp(x_train: &[Vec<f64>], y_train: &[f64], noise_var: f64) -> Option<GpModel> {
    let n = y_train.len();
    if n == 0 {
        return None;
    }

    let y_mean = y_train.iter().sum::<f64>() / n as f64;
    let y_var = if n > 1 {
        y_train.iter().map(|&y| (y - y_mean).powi(2)).sum::<f64>() / (n - 1) as f64
    } else {
        1.0
    };
    let y_std = y_var.sqrt().max(1e-10);
    if !y_std.is_finite() {
        return None;
    }
    let y_standardized: Vec<f64> = y_train.iter().map(|&y| (y - y_mean) / y_std).collect();

    let f_best = y_standardized.iter().copied().fold(f64::INFINITY, f64::min);

    let d = x_train.first().map_or(0, Vec::len);
    let lengthscales: Vec<f64> = (0..d)
        .map(|j| {
            let mean_j = x_train.iter().map(|x| x[j]).sum::<f64>() / n as f64;
            let var_j = x_train.iter().map(|x| (x[j] - mean_j).powi(2)).sum::<f64>() / n as f64;
            var_j.sqrt().max(0.01)
        })
        .collect();

    // Data is standardized.
    let signal_var = 1.0;

    let k = kernel_matrix(x_train, &lengthscales, signal_var, noise_var);
    let cholesky = nalgebra::linalg::Cholesky::new(k)?;

    let y_vec = DVector::from_column_slice(&y_standardized);
    let alpha = cholesky.solve(&y_vec);
    if alpha.iter().any(|a| !a.is_finite()) {
        return None;
    }

    Some(GpModel {
        cholesky,
        alpha,
        x_train: x_train.to_vec(),
        lengthscales,
        signal_var,
        f_best,
    })
}

/// Predict mean and standard deviation at a test point.
fn predict(model: &GpModel, x: &[f64]) -> (f64, f64) {
    let k_star = kernel_vector(x, &model.x_train, &model.lengthscales, model.signal_var);

    let mean = k_star.dot(&model.alpha);

    // k(x*, x*) - k*^T (K + σ²I)^{-1} k*
    let v = model.cholesky.solve(&k_star);
    let var = (model.signal_var - k_star.dot(&v)).max(0.0);

    (mean, var.sqrt())
}

// ---------------------------------------------------------------------------
// Normal distribution helpers
// ---------------------------------------------------------------------------

/// Standard normal PDF.
fn norm_pdf(x: f64) -> f64 {
    const INV_SQRT_2PI: f64 = 0.398_942_280_401_432_7;
    INV_SQRT_2PI * (-0.5 * x * x).exp()
}

/// Standard normal CDF (Abramowitz-Stegun rational approximation).
fn norm_cdf(x: f64) -> f64 {
    if x < -8.0 {
        return 0.0;
    }
    if x > 8.0 {
        return 1.0;
    }

    let abs_x = x.abs();
    let t = 1.0 / (1.0 + 0.231_641_9 * abs_x);
    let t2 = t * t;
    let t3 = t2 * t;
    let t4 = t3 * t;
    let t5 = t4 * t;

    let poly = 0.319_381_530 * t - 0.356_563_782 * t2 + 1.781_477_937 * t3 - 1.821_255_978 * t4
        + 1.330_274_429 * t5;
    let cdf = 1.0 - norm_pdf(abs_x) * poly;

    if x >= 0.0 { cdf } else { 1.0 - cdf }
}

/// Compute Expected Improvement at a point (minimization).
///
/// `EI(x) = (f_best - mean) Φ(z) + std φ(z)`
/// where `z = (f_best - mean) / std`
fn expected_improvement(mean: f64, std: f64, f_best: f64) -> f64 {
    if std < 1e-12 {
        return (f_best - mean).max(0.0);
    }
    let z = (f_best - mean) / std;
    let improvement = (f_best - mean) * norm_cdf(z) + std * norm_pdf(z);
    improvement.max(0.0)
}

// ---------------------------------------------------------------------------
// Sampler trait implementation
// ---------------------------------------------------------------------------

impl GpSampler {
    /// Fits a GP to the most recent observations.
    fn fit(&self, space: &SearchSpace, observed: &[Observation<'_>]) -> Option<GpModel> {
        let start = observed.len().saturating_sub(MAX_TRAIN_POINTS);
        let recent = &observed[start..];
        let x_train: Vec<Vec<f64>> = recent.iter().map(|o| encode(space, o.config)).collect();
        let y_train: Vec<f64> = recent.iter().map(|o| o.loss).collect();
        fit_gp(&x_train, &y_train, self.noise_variance)
    }
}

impl Sampler for GpSampler {
    fn suggest(
        &self,
        space: &SearchSpace,
        direction: Direction,
        history: &[TrialRecord],
    ) -> Configuration {
        let observed = observations(history, direction);
        let mut rng = self.rng.lock();

        if space.is_empty() || observed.len() < self.n_startup_trials.max(1) {
            return common::random_configuration(&mut rng, space);
        }

        let Some(model) = self.fit(space, &observed) else {
            trace_debug!(n_observations = observed.len(), "GP fit failed, sampling randomly");
            return common::random_configuration(&mut rng, space);
        };

        let mut best: Option<(f64, Configuration)> = None;
        for _ in 0..self.n_candidates {
            let candidate = common::random_configuration(&mut rng, space);
            let (mean, std) = predict(&model, &encode(space, &candidate));
            let ei = expected_improvement(mean, std, model.f_best);
            if best.as_ref().is_none_or(|(b, _)| ei > *b) {
                best = Some((ei, candidate));
            }
        }

        match best {
            Some((_, config)) => config,
            None => common::random_configuration(&mut rng, space),
        }
    }
}
