//! Gaussian kernel density estimation over a bounded interval.
//!
//! Used by the TPE sampler to model the densities l(x) (good trials) and
//! g(x) (bad trials) of one numeric hyperparameter in its internal space.

use rand::Rng;

use crate::error::{Error, Result};

/// Bandwidths never shrink below this fraction of the interval width, so a
/// cluster of identical observations still explores its neighborhood.
const MIN_BANDWIDTH_FRACTION: f64 = 0.01;

/// A Gaussian kernel density estimator restricted to `[low, high]`.
///
/// One kernel is centered on each observation. Draws that land outside the
/// interval are clamped back onto it.
#[derive(Clone, Debug)]
pub(crate) struct KernelDensityEstimator {
    samples: Vec<f64>,
    bandwidth: f64,
    low: f64,
    high: f64,
}

impl KernelDensityEstimator {
    /// Fits a KDE on `[low, high]`.
    ///
    /// With `bandwidth == None` the bandwidth follows Scott's rule,
    /// `h = n^(-1/5) * sigma`, floored at a small fraction of the interval.
    ///
    /// # Errors
    ///
    /// Returns `Error::EmptySamples` if `samples` is empty.
    /// Returns `Error::InvalidBandwidth` if a fixed bandwidth is not positive.
    pub(crate) fn fit(
        samples: Vec<f64>,
        bounds: (f64, f64),
        bandwidth: Option<f64>,
    ) -> Result<Self> {
        if samples.is_empty() {
            return Err(Error::EmptySamples);
        }
        let (low, high) = bounds;
        let floor = ((high - low) * MIN_BANDWIDTH_FRACTION).max(f64::EPSILON);
        let bandwidth = match bandwidth {
            Some(bw) if bw > 0.0 && bw.is_finite() => bw,
            Some(bw) => return Err(Error::InvalidBandwidth(bw)),
            None => scotts_rule(&samples, high - low).max(floor),
        };
        Ok(Self {
            samples,
            bandwidth,
            low,
            high,
        })
    }

    /// Returns the probability density at `x`.
    ///
    /// f(x) = (1/n) * `sum_i` N(x; `x_i`, h²)
    #[allow(clippy::cast_precision_loss)]
    pub(crate) fn pdf(&self, x: f64) -> f64 {
        let n = self.samples.len() as f64;
        let inv_bandwidth = 1.0 / self.bandwidth;
        let normalization = inv_bandwidth / (2.0 * core::f64::consts::PI).sqrt();

        let density: f64 = self
            .samples
            .iter()
            .map(|&xi| {
                let z = (x - xi) * inv_bandwidth;
                normalization * (-0.5 * z * z).exp()
            })
            .sum();

        density / n
    }

    /// Draws a value by picking a kernel center uniformly and adding
    /// Gaussian noise (Box-Muller), clamped to the interval.
    pub(crate) fn sample<R: Rng>(&self, rng: &mut R) -> f64 {
        let center = self.samples[rng.random_range(0..self.samples.len())];

        // `1 - u` keeps the log argument in (0, 1].
        let u1: f64 = 1.0 - rng.random::<f64>();
        let u2: f64 = rng.random();
        let z = (-2.0 * u1.ln()).sqrt() * (2.0 * core::f64::consts::PI * u2).cos();

        (center + z * self.bandwidth).clamp(self.low, self.high)
    }

    #[cfg(test)]
    pub(crate) fn bandwidth(&self) -> f64 {
        self.bandwidth
    }
}

/// Scott's rule; a degenerate sample falls back to a tenth of the interval.
#[allow(clippy::cast_precision_loss)]
fn scotts_rule(samples: &[f64], width: f64) -> f64 {
    let n = samples.len() as f64;
    let mean = samples.iter().sum::<f64>() / n;
    let std_dev = (samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / n).sqrt();
    if std_dev < f64::EPSILON {
        return (width * 0.1).max(f64::EPSILON);
    }
    n.powf(-0.2) * std_dev
}
