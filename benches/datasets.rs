//! Synthetic datasets shared by benchmarks and integration tests.

#![allow(dead_code)]

use tuner::Dataset;

/// Uniform in [-1, 1).
fn unit_noise(rng: &mut fastrand::Rng) -> f64 {
    rng.f64() * 2.0 - 1.0
}

/// Binary classification: two uniform-noise blobs in `n_features`
/// dimensions, centered at ±`separation` on the first two features; the
/// remaining features are pure noise. Labels alternate 0, 1, 0, ...
pub fn binary_blobs(n_samples: usize, n_features: usize, separation: f64, seed: u64) -> Dataset {
    let mut rng = fastrand::Rng::with_seed(seed);
    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for i in 0..n_samples {
        let label = (i % 2) as f64;
        let center = if i % 2 == 0 { -separation } else { separation };
        let row = (0..n_features)
            .map(|j| {
                let base = if j < 2 { center } else { 0.0 };
                base + unit_noise(&mut rng)
            })
            .collect();
        rows.push(row);
        labels.push(label);
    }
    Dataset::from_rows(&rows, labels).expect("synthetic dataset is well formed")
}

/// Regression: `y = 3 x0 - 2 x1 + 0.5 x2 + noise`, features in [-1, 1).
pub fn linear_regression(n_samples: usize, n_features: usize, noise: f64, seed: u64) -> Dataset {
    let mut rng = fastrand::Rng::with_seed(seed);
    let coefs = [3.0, -2.0, 0.5];
    let mut rows = Vec::with_capacity(n_samples);
    let mut labels = Vec::with_capacity(n_samples);
    for _ in 0..n_samples {
        let row: Vec<f64> = (0..n_features).map(|_| unit_noise(&mut rng)).collect();
        let y = row
            .iter()
            .zip(coefs.iter())
            .map(|(x, c)| x * c)
            .sum::<f64>()
            + noise * unit_noise(&mut rng);
        rows.push(row);
        labels.push(y);
    }
    Dataset::from_rows(&rows, labels).expect("synthetic dataset is well formed")
}
